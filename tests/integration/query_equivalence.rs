use crate::integration::support::{data, id, names, reader, set, store, writer, Store, U1_DATA};
use aip_bridge::query::StrategyKind;
use aip_bridge::{ApiError, CmisVersion, ObjectId, ObjectRequest};

fn ids(store: &Store, statement: &str, strategy: StrategyKind) -> Vec<ObjectId> {
    let page = store
        .repo
        .query_with(&reader(), statement, &ObjectRequest::default(), 0, -1, strategy)
        .unwrap_or_else(|e| panic!("{} failed with {}: {}", statement, strategy, e));
    let mut ids: Vec<ObjectId> = page.items.into_iter().map(|o| o.id).collect();
    ids.sort();
    ids
}

fn statements() -> Vec<String> {
    let sub = id(&data("sub"));
    let unit = id("/U1");
    vec![
        "SELECT * FROM cmis:document".to_string(),
        "SELECT * FROM cmis:folder".to_string(),
        "SELECT cmis:name FROM cmis:document WHERE cmis:name LIKE '%.txt'".to_string(),
        "SELECT * FROM cmis:document WHERE cmis:contentStreamLength = 10 OR cmis:name = 'empty.bin'"
            .to_string(),
        "SELECT * FROM cmis:document WHERE cmis:name <> 'file.txt' AND cmis:contentStreamLength = 0"
            .to_string(),
        "SELECT * FROM cmis:archivalDocument WHERE metadata:dublinCore:initialDate = '2001-02-03'"
            .to_string(),
        "SELECT * FROM cmis:document WHERE metadata:ead:unitDate IS NULL".to_string(),
        "SELECT * FROM cmis:document WHERE IN_FOLDER('@root@')".to_string(),
        format!("SELECT * FROM cmis:document WHERE IN_FOLDER('{}')", sub),
        format!("SELECT * FROM cmis:folder WHERE IN_FOLDER('{}')", unit),
        "SELECT * FROM cmis:document WHERE IN_TREE('@root@')".to_string(),
        format!("SELECT * FROM cmis:document WHERE IN_TREE(cmis:folder, '{}')", sub),
    ]
}

#[test]
fn indexed_and_tree_walk_agree_after_warm_up() {
    let store = store();
    for statement in statements() {
        assert_eq!(
            ids(&store, &statement, StrategyKind::Indexed),
            ids(&store, &statement, StrategyKind::TreeWalk),
            "strategies disagree on {}",
            statement
        );
    }
}

#[test]
fn strategies_agree_after_old_protocol_listing() {
    let store = store();
    let old = reader().with_version(CmisVersion::V1_0);
    let request = ObjectRequest::default();
    for folder in [ObjectId::root(), id(U1_DATA), id(&data("sub"))] {
        store.repo.get_children(&old, &folder, &request, 0, -1).unwrap();
    }
    store
        .repo
        .get_descendants(&old, &id(U1_DATA), Some(-1), &request)
        .unwrap();

    let statement = "SELECT * FROM cmis:document WHERE cmis:isPrivateWorkingCopy = FALSE";
    let indexed = ids(&store, statement, StrategyKind::Indexed);
    assert_eq!(indexed.len(), 3);
    assert_eq!(indexed, ids(&store, statement, StrategyKind::TreeWalk));
    for statement in statements() {
        assert_eq!(
            ids(&store, &statement, StrategyKind::Indexed),
            ids(&store, &statement, StrategyKind::TreeWalk),
            "strategies disagree on {}",
            statement
        );
    }
}

#[test]
fn strategies_agree_after_writes() {
    let store = store();
    let ctx = writer();
    let sub = id(&data("sub"));
    store
        .repo
        .create_document(&ctx, &sub, "new.txt", None, Some(&mut &b"abc"[..]))
        .unwrap();
    store
        .repo
        .delete_object(&ctx, &id(&data("empty.bin")))
        .unwrap();
    store
        .repo
        .move_object(&ctx, &id(&data("file.txt")), &sub)
        .unwrap();
    for statement in statements() {
        assert_eq!(
            ids(&store, &statement, StrategyKind::Indexed),
            ids(&store, &statement, StrategyKind::TreeWalk),
            "strategies disagree on {}",
            statement
        );
    }
}

#[test]
fn scoped_queries_return_expected_objects() {
    let store = store();
    for strategy in [StrategyKind::Indexed, StrategyKind::TreeWalk] {
        let page = store
            .repo
            .query_with(
                &reader(),
                "SELECT * FROM cmis:document WHERE IN_FOLDER('@root@')",
                &ObjectRequest::default(),
                0,
                -1,
                strategy,
            )
            .unwrap();
        assert_eq!(names(&page.items), set(&["empty.bin", "file.txt"]));

        let page = store
            .repo
            .query_with(
                &reader(),
                "SELECT * FROM cmis:document WHERE IN_TREE('@root@')",
                &ObjectRequest::default(),
                0,
                -1,
                strategy,
            )
            .unwrap();
        assert_eq!(names(&page.items), set(&["empty.bin", "file.txt", "inner.txt"]));
    }
}

#[test]
fn selected_fields_shape_the_result() {
    let store = store();
    let page = store
        .repo
        .query(
            &reader(),
            "SELECT cmis:contentStreamLength FROM cmis:document WHERE cmis:name = 'file.txt'",
            &ObjectRequest::default(),
            0,
            -1,
        )
        .unwrap();
    assert_eq!(page.items.len(), 1);
    let keys: Vec<&str> = page.items[0].properties.keys().collect();
    assert!(keys.contains(&"cmis:contentStreamLength"));
    assert!(keys.contains(&"cmis:name"));
    assert!(!keys.contains(&"cmis:path"));
}

#[test]
fn malformed_statements_are_invalid() {
    let store = store();
    for statement in ["SELECT", "DELETE FROM cmis:document", "SELECT * FROM cmis:document WHERE"] {
        assert!(matches!(
            store
                .repo
                .query(&reader(), statement, &ObjectRequest::default(), 0, -1),
            Err(ApiError::InvalidArgument(_))
        ));
    }
    assert!(matches!(
        store.repo.query(
            &reader(),
            &format!("SELECT * FROM cmis:document WHERE IN_FOLDER('{}')", id(&data("file.txt"))),
            &ObjectRequest::default(),
            0,
            -1
        ),
        Err(ApiError::InvalidArgument(_))
    ));
}
