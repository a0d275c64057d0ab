use crate::integration::support::{build_tree, data, users, writer, TitleExtractor, U1_DATA};
use aip_bridge::tooling::cli::{CliContext, Commands};
use aip_bridge::Repository;
use std::sync::Arc;
use tempfile::TempDir;

fn cli(temp: &TempDir) -> CliContext {
    build_tree(temp.path());
    let repository = Repository::builder(temp.path())
        .extractor(Arc::new(TitleExtractor))
        .users(users())
        .build()
        .unwrap();
    CliContext::from_repository(repository, writer())
}

#[test]
fn ls_json_contract_has_page_fields() {
    let temp = TempDir::new().unwrap();
    let cli = cli(&temp);
    let output = cli
        .execute(&Commands::Ls {
            target: "/".to_string(),
            skip: 0,
            max: 2,
            filter: None,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(parsed["has_more"].as_bool(), Some(true));
    assert_eq!(parsed["total_count"].as_u64(), Some(3));
    assert!(parsed["items"][0]["properties"]["cmis:objectId"].is_string());
}

#[test]
fn get_json_contract_includes_requested_sections() {
    let temp = TempDir::new().unwrap();
    let cli = cli(&temp);
    let output = cli
        .execute(&Commands::Get {
            target: data("file.txt"),
            filter: None,
            actions: true,
            acl: true,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["properties"]["cmis:contentStreamLength"].as_i64(), Some(10));
    assert!(parsed["allowable_actions"].is_array());
    assert!(parsed["acl"].as_array().map(|a| !a.is_empty()).unwrap_or(false));
}

#[test]
fn text_commands_render() {
    let temp = TempDir::new().unwrap();
    let cli = cli(&temp);

    let info = cli.execute(&Commands::Info { format: "text".to_string() }).unwrap();
    assert!(info.contains("Indexed objects"));

    let tree = cli
        .execute(&Commands::Tree {
            target: "/".to_string(),
            depth: -1,
            folders_only: false,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(tree.contains("  sub/"));
    assert!(tree.contains("    inner.txt"));

    let cat = cli
        .execute(&Commands::Cat {
            target: data("file.txt"),
            offset: Some(5),
            length: None,
            out: None,
        })
        .unwrap();
    assert_eq!(cat, "56789");

    let query = cli
        .execute(&Commands::Query {
            statement: "SELECT * FROM cmis:document WHERE cmis:name LIKE 'inner%'".to_string(),
            strategy: Some("tree-walk".to_string()),
            skip: 0,
            max: -1,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(query.contains("inner.txt"));
    assert!(query.contains("1 of 1 shown"));
}

#[test]
fn write_commands_change_the_store() {
    let temp = TempDir::new().unwrap();
    let cli = cli(&temp);
    cli.execute(&Commands::Mkdir {
        parent: U1_DATA.to_string(),
        name: "made".to_string(),
    })
    .unwrap();
    assert!(temp.path().join("U1/representations/rep1/data/made").is_dir());

    cli.execute(&Commands::Rm {
        target: data("made"),
        recursive: false,
        continue_on_failure: false,
    })
    .unwrap();
    assert!(!temp.path().join("U1/representations/rep1/data/made").exists());

    let err = cli
        .execute(&Commands::Query {
            statement: "SELECT * FROM cmis:document".to_string(),
            strategy: Some("sql".to_string()),
            skip: 0,
            max: -1,
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("Unknown query strategy"));
}

#[test]
fn config_command_prints_effective_toml() {
    let temp = TempDir::new().unwrap();
    let mut config = aip_bridge::config::BridgeConfig::default();
    config.repository.name = "Reading room".to_string();
    let cli = cli(&temp).with_config(config);
    let out = cli.execute(&Commands::Config).unwrap();
    assert!(out.contains("[repository]"));
    assert!(out.contains("name = \"Reading room\""));
    assert!(out.contains("[query]"));
}
