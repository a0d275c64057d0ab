use crate::integration::support::{data, id, names, reader, set, store, U1_DATA};
use aip_bridge::properties::PropertyValue;
use aip_bridge::query::StrategyKind;
use aip_bridge::schema::{ids, BaseType};
use aip_bridge::{ApiError, CallContext, ObjectId, ObjectRequest};

#[test]
fn root_lists_content_of_readable_units() {
    let store = store();
    let page = store
        .repo
        .get_children(&reader(), &ObjectId::root(), &ObjectRequest::default(), 0, -1)
        .unwrap();
    let objects: Vec<_> = page.items.iter().map(|i| &i.object).collect();
    assert_eq!(names(objects), set(&["empty.bin", "file.txt", "sub"]));
    assert_eq!(page.total_count, 3);
    assert!(!page.has_more);
}

#[test]
fn root_by_path_has_no_parent() {
    let store = store();
    let root = store
        .repo
        .get_object_by_path(&reader(), "/", &ObjectRequest::default())
        .unwrap();
    assert_eq!(root.id, ObjectId::root());
    assert_eq!(root.base_type, BaseType::Folder);
    assert_eq!(root.properties.get(ids::PARENT_ID), Some(&PropertyValue::Null));
}

#[test]
fn document_carries_content_and_descriptive_metadata() {
    let store = store();
    let file = store
        .repo
        .get_object_by_path(&reader(), &data("file.txt"), &ObjectRequest::default())
        .unwrap();
    assert!(file.has_content);
    assert_eq!(
        file.properties.get(ids::CONTENT_STREAM_LENGTH),
        Some(&PropertyValue::Integer(10))
    );
    assert_eq!(
        file.properties.string(ids::CONTENT_STREAM_MIME_TYPE),
        Some("text/plain")
    );
    assert_eq!(
        file.properties.string("metadata:dublinCore:title"),
        Some("Title of U1")
    );
    assert!(matches!(
        file.properties.get("metadata:dublinCore:initialDate"),
        Some(PropertyValue::DateTime(_))
    ));
}

#[test]
fn dublin_core_title_query_finds_unit_documents() {
    let store = store();
    let statement =
        "SELECT * FROM cmis:archivalDocument WHERE metadata:dublinCore:title = 'Title of U1'";
    for strategy in [StrategyKind::Indexed, StrategyKind::TreeWalk] {
        let page = store
            .repo
            .query_with(&reader(), statement, &ObjectRequest::default(), 0, -1, strategy)
            .unwrap();
        assert_eq!(
            names(&page.items),
            set(&["empty.bin", "file.txt", "inner.txt"]),
            "strategy {}",
            strategy
        );
    }
}

#[test]
fn unknown_and_anonymous_callers_are_refused() {
    let store = store();
    for ctx in [CallContext::new("mallory"), CallContext::anonymous()] {
        assert!(matches!(
            store
                .repo
                .get_object(&ctx, &ObjectId::root(), &ObjectRequest::default()),
            Err(ApiError::PermissionDenied(_))
        ));
    }
}

#[test]
fn parents_of_first_level_content_point_at_the_data_folder() {
    let store = store();
    let parents = store
        .repo
        .get_object_parents(&reader(), &id(&data("file.txt")), &ObjectRequest::default().with_path_segment())
        .unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].object.id, id(U1_DATA));
    assert_eq!(parents[0].relative_path_segment.as_deref(), Some("file.txt"));

    assert!(store
        .repo
        .get_object_parents(&reader(), &ObjectId::root(), &ObjectRequest::default())
        .unwrap()
        .is_empty());
    assert!(matches!(
        store
            .repo
            .get_folder_parent(&reader(), &ObjectId::root(), &ObjectRequest::default()),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn descendants_default_to_two_levels() {
    let store = store();
    let tree = store
        .repo
        .get_descendants(&reader(), &ObjectId::root(), None, &ObjectRequest::default())
        .unwrap();
    let sub = tree
        .iter()
        .find(|c| c.object.object.properties.string(ids::NAME) == Some("sub"))
        .unwrap();
    assert_eq!(sub.children.len(), 1);
    assert!(matches!(
        store
            .repo
            .get_descendants(&reader(), &ObjectId::root(), Some(0), &ObjectRequest::default()),
        Err(ApiError::InvalidArgument(_))
    ));

    let folders = store
        .repo
        .get_folder_tree(&reader(), &ObjectId::root(), Some(-1), &ObjectRequest::default())
        .unwrap();
    assert_eq!(folders.len(), 1);
    assert!(folders[0].children.is_empty());
}

#[test]
fn repository_info_and_types() {
    let store = store();
    let info = store.repo.repository_info(&reader()).unwrap();
    assert_eq!(info.root_folder_id, ObjectId::root());
    assert_eq!(info.indexed_objects, 4);

    let base = store.repo.type_children(&reader(), None).unwrap();
    let ids: Vec<_> = base.iter().map(|t| t.id.as_str()).collect();
    assert!(ids.contains(&"cmis:folder"));
    assert!(ids.contains(&"cmis:document"));

    let archival = store
        .repo
        .type_definition(&reader(), "cmis:archivalDocument")
        .unwrap();
    assert!(archival.property("metadata:dublinCore:title").is_some());
    assert!(matches!(
        store.repo.type_definition(&reader(), "cmis:policy"),
        Err(ApiError::NotFound(_))
    ));
}
