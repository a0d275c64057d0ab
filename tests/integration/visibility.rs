use crate::integration::support::{data, id, names, reader, set, store, U2_DATA};
use aip_bridge::acl::Action;
use aip_bridge::{ApiError, ObjectId, ObjectRequest};

fn root_names(store: &crate::integration::support::Store, folder: &ObjectId) -> std::collections::BTreeSet<String> {
    let page = store
        .repo
        .get_children(&reader(), folder, &ObjectRequest::default(), 0, -1)
        .unwrap();
    names(page.items.iter().map(|i| &i.object))
}

#[test]
fn unreadable_unit_content_is_not_found() {
    let store = store();
    let secret = id(&format!("{}/secret.txt", U2_DATA));
    assert!(matches!(
        store.repo.get_object(&reader(), &secret, &ObjectRequest::default()),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        store.repo.get_object(&reader(), &id("/U2"), &ObjectRequest::default()),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn administrative_folders_list_the_root() {
    let store = store();
    let expected = set(&["empty.bin", "file.txt", "sub"]);
    for folder in ["/U1", "/U1/representations", "/U1/representations/rep1/data", "/U2", U2_DATA] {
        assert_eq!(root_names(&store, &id(folder)), expected, "listing {}", folder);
    }
}

#[test]
fn hidden_and_stray_entries_never_appear() {
    let store = store();
    for path in [
        data(".hidden"),
        "/U1/metadata/descriptive/dc/dc.xml".to_string(),
        "/U1/metadata/descriptive/dc".to_string(),
        "/stray.txt".to_string(),
    ] {
        assert!(
            matches!(
                store.repo.get_object(&reader(), &id(&path), &ObjectRequest::default()),
                Err(ApiError::NotFound(_))
            ),
            "{} should be invisible",
            path
        );
    }
    assert!(matches!(
        store
            .repo
            .get_children(&reader(), &id(&data(".hidden")), &ObjectRequest::default(), 0, -1),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn malformed_ids_and_paths_are_invalid() {
    let store = store();
    for raw in ["", "not base64!", "Li4vZXRj"] {
        assert!(
            matches!(
                store
                    .repo
                    .get_object(&reader(), &ObjectId::from(raw), &ObjectRequest::default()),
                Err(ApiError::InvalidArgument(_))
            ),
            "{:?} should be rejected",
            raw
        );
    }
    assert!(matches!(
        store
            .repo
            .get_object_by_path(&reader(), "/U1/../U2", &ObjectRequest::default()),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn read_only_users_get_read_actions_only() {
    let store = store();
    let file = id(&data("file.txt"));
    let actions = store.repo.get_allowable_actions(&reader(), &file).unwrap();
    assert!(actions.contains(&Action::GetContentStream));
    assert!(!actions.contains(&Action::DeleteObject));

    let actions = store
        .repo
        .get_allowable_actions(&crate::integration::support::writer(), &file)
        .unwrap();
    assert!(actions.contains(&Action::DeleteObject));
}

#[test]
fn filter_limits_properties() {
    let store = store();
    let object = store
        .repo
        .get_object(
            &reader(),
            &id(&data("file.txt")),
            &ObjectRequest::default().with_filter("cmis:name"),
        )
        .unwrap();
    let keys: Vec<&str> = object.properties.keys().collect();
    assert!(keys.contains(&"cmis:name"));
    assert!(keys.contains(&"cmis:objectId"));
    assert!(!keys.contains(&"cmis:contentStreamLength"));

    assert!(matches!(
        store.repo.get_object(
            &reader(),
            &id(&data("file.txt")),
            &ObjectRequest::default().with_filter("cmis:name,,cmis:path"),
        ),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[cfg(unix)]
#[test]
fn symbolic_links_under_data_are_invisible() {
    use aip_bridge::query::StrategyKind;
    use std::os::unix::fs::symlink;

    let store = store();
    let outside = tempfile::TempDir::new().unwrap();
    std::fs::write(outside.path().join("secret.txt"), b"outside-root").unwrap();
    symlink(outside.path(), store.path(&data("link"))).unwrap();
    symlink(outside.path().join("secret.txt"), store.path(&data("alias.txt"))).unwrap();

    for repo_path in [data("link"), data("link/secret.txt"), data("alias.txt")] {
        assert!(matches!(
            store.repo.get_content_stream(&reader(), &id(&repo_path), None, None),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            store.repo.get_object(&reader(), &id(&repo_path), &ObjectRequest::default()),
            Err(ApiError::NotFound(_))
        ));
    }

    let listed = root_names(&store, &id(crate::integration::support::U1_DATA));
    assert!(!listed.contains("link"));
    assert!(!listed.contains("alias.txt"));

    let page = store
        .repo
        .query_with(
            &reader(),
            "SELECT * FROM cmis:document WHERE cmis:name LIKE '%secret%'",
            &ObjectRequest::default(),
            0,
            -1,
            StrategyKind::TreeWalk,
        )
        .unwrap();
    assert!(page.items.is_empty());
}
