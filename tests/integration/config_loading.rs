use crate::integration::support::{build_tree, data, id};
use aip_bridge::config::BridgeConfig;
use aip_bridge::query::StrategyKind;
use aip_bridge::tooling::cli::load_config;
use aip_bridge::{ApiError, CallContext, ObjectRequest, Repository};
use std::fs;
use tempfile::TempDir;

#[test]
fn repository_opens_from_a_config_file() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("store");
    fs::create_dir_all(&root).unwrap();
    build_tree(&root);
    let config_path = temp.path().join("bridge.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[repository]
id = "test-store"
root = "{}"

[users]
read_only = ["guest"]
read_write = ["admin"]

[index]
path = "{}"

[query]
strategy = "tree-walk"
"#,
            root.display(),
            temp.path().join("index").display()
        ),
    )
    .unwrap();

    let config = load_config(None, Some(&config_path)).unwrap();
    assert_eq!(config.query.strategy, StrategyKind::TreeWalk);
    let repo = Repository::open(&config, None).unwrap();

    let guest = CallContext::new("guest");
    let info = repo.repository_info(&guest).unwrap();
    assert_eq!(info.id, "test-store");
    assert_eq!(info.query_strategy, StrategyKind::TreeWalk);
    assert!(repo
        .get_object(&guest, &id(&data("file.txt")), &ObjectRequest::default())
        .is_ok());
    assert!(matches!(
        repo.create_folder(&guest, &id(&data("sub")), "x", None),
        Err(ApiError::PermissionDenied(_))
    ));
    assert!(repo
        .create_folder(&CallContext::new("admin"), &id(&data("sub")), "x", None)
        .is_ok());
}

#[test]
fn read_group_decides_unit_readability() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());
    fs::write(
        temp.path().join("U2/aip.json"),
        r#"{"permissions":{"groups":{"READ":["archivists"]}}}"#,
    )
    .unwrap();

    let mut config = BridgeConfig::default();
    config.users.read_only = vec!["guest".to_string()];
    config.repository.read_group = "archivists".to_string();
    config.index.path = Some(temp.path().join("index"));
    let repo = Repository::open(&config, Some(temp.path())).unwrap();

    let guest = CallContext::new("guest");
    assert!(repo
        .get_object(
            &guest,
            &id("/U2/representations/rep1/data/secret.txt"),
            &ObjectRequest::default()
        )
        .is_ok());
    assert!(matches!(
        repo.get_object(&guest, &id(&data("file.txt")), &ObjectRequest::default()),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn missing_root_is_a_config_error() {
    let config = BridgeConfig::default();
    assert!(matches!(
        Repository::open(&config, None),
        Err(ApiError::ConfigError(_))
    ));
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Repository::open(&config, Some(&temp.path().join("absent"))),
        Err(ApiError::ConfigError(_))
    ));
}
