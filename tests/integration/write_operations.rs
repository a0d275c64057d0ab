use crate::integration::support::{data, id, reader, store, writer, U1_DATA};
use aip_bridge::properties::{PropertyBag, PropertyValue};
use aip_bridge::schema::ids;
use aip_bridge::{ApiError, ObjectId, ObjectRequest};
use std::fs;

fn name_bag(name: &str) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(ids::NAME, PropertyValue::String(name.to_string()));
    bag
}

#[test]
fn create_document_and_folder() {
    let store = store();
    let ctx = writer();
    let data_folder = id(U1_DATA);

    let doc = store
        .repo
        .create_document(&ctx, &data_folder, "report.txt", None, Some(&mut &b"hello"[..]))
        .unwrap();
    assert_eq!(doc, id(&data("report.txt")));
    assert_eq!(fs::read(store.path(&data("report.txt"))).unwrap(), b"hello");
    assert!(store.repo.index().get(&doc).unwrap().is_some());

    let folder = store
        .repo
        .create_folder(&ctx, &ObjectId::from(doc.as_str()), "x", None)
        .unwrap_err();
    assert!(matches!(folder, ApiError::InvalidArgument(_)));

    let folder = store.repo.create_folder(&ctx, &data_folder, "new", None).unwrap();
    assert!(store.path(&data("new")).is_dir());
    let object = store
        .repo
        .get_object(&reader(), &folder, &ObjectRequest::default())
        .unwrap();
    assert_eq!(object.properties.string(ids::NAME), Some("new"));
}

#[test]
fn create_rejects_bad_names_conflicts_and_types() {
    let store = store();
    let ctx = writer();
    let data_folder = id(U1_DATA);
    for bad in ["", ".", "..", "a/b", "a:b"] {
        assert!(
            matches!(
                store.repo.create_folder(&ctx, &data_folder, bad, None),
                Err(ApiError::InvalidArgument(_))
            ),
            "{:?} accepted",
            bad
        );
    }
    assert!(matches!(
        store.repo.create_document(&ctx, &data_folder, "file.txt", None, None),
        Err(ApiError::NameConflict(_))
    ));
    assert!(matches!(
        store
            .repo
            .create_document(&ctx, &data_folder, "x.txt", Some("cmis:folder"), None),
        Err(ApiError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.repo.create_folder(&ctx, &id("/U1"), "x", None),
        Err(ApiError::Constraint(_))
    ));
}

/// Yields a few bytes, then fails.
struct BrokenReader {
    sent: bool,
}

impl std::io::Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.sent {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upload dropped"));
        }
        self.sent = true;
        buf[..3].copy_from_slice(b"abc");
        Ok(3)
    }
}

#[test]
fn failed_upload_leaves_no_document() {
    let store = store();
    let ctx = writer();
    let data_folder = id(U1_DATA);

    let err = store
        .repo
        .create_document(&ctx, &data_folder, "upload.txt", None, Some(&mut BrokenReader { sent: false }))
        .unwrap_err();
    assert!(matches!(err, ApiError::StorageError(_)), "{}", err);
    assert!(!store.path(&data("upload.txt")).exists());

    let retried = store
        .repo
        .create_document(&ctx, &data_folder, "upload.txt", None, Some(&mut &b"done"[..]))
        .unwrap();
    assert_eq!(fs::read(store.path(&data("upload.txt"))).unwrap(), b"done");
    assert!(store.repo.index().get(&retried).unwrap().is_some());
}

#[test]
fn read_only_users_cannot_write() {
    let store = store();
    assert!(matches!(
        store.repo.create_folder(&reader(), &id(U1_DATA), "x", None),
        Err(ApiError::PermissionDenied(_))
    ));
    assert!(matches!(
        store.repo.delete_object(&reader(), &id(&data("file.txt"))),
        Err(ApiError::PermissionDenied(_))
    ));
}

#[test]
fn rename_through_name_property() {
    let store = store();
    let ctx = writer();
    let old = id(&data("file.txt"));
    let new = store
        .repo
        .update_properties(&ctx, &old, &name_bag("renamed.txt"))
        .unwrap();
    assert_eq!(new, id(&data("renamed.txt")));
    assert!(store.path(&data("renamed.txt")).exists());
    assert!(store.repo.index().get(&old).unwrap().is_none());
    assert!(store.repo.index().get(&new).unwrap().is_some());

    assert!(matches!(
        store.repo.update_properties(&ctx, &new, &name_bag("empty.bin")),
        Err(ApiError::NameConflict(_))
    ));

    let mut bag = PropertyBag::new();
    bag.insert(ids::CONTENT_STREAM_LENGTH, PropertyValue::Integer(3));
    assert!(matches!(
        store.repo.update_properties(&ctx, &new, &bag),
        Err(ApiError::Constraint(_))
    ));
    let mut bag = PropertyBag::new();
    bag.insert("custom:unknown", PropertyValue::String("x".to_string()));
    assert!(matches!(
        store.repo.update_properties(&ctx, &new, &bag),
        Err(ApiError::Constraint(_))
    ));
}

#[test]
fn move_object_relocates_and_reindexes() {
    let store = store();
    let ctx = writer();
    let moved = store
        .repo
        .move_object(&ctx, &id(&data("file.txt")), &id(&data("sub")))
        .unwrap();
    assert_eq!(moved.id, id(&data("sub/file.txt")));
    assert!(store.path(&data("sub/file.txt")).exists());
    assert!(store.repo.index().get(&id(&data("file.txt"))).unwrap().is_none());

    fs::write(store.path(&data("file.txt")), b"again").unwrap();
    assert!(matches!(
        store
            .repo
            .move_object(&ctx, &id(&data("file.txt")), &id(&data("sub"))),
        Err(ApiError::NameConflict(_))
    ));
    assert!(matches!(
        store
            .repo
            .move_object(&ctx, &ObjectId::root(), &id(&data("sub"))),
        Err(ApiError::InvalidArgument(_))
    ));
    assert!(matches!(
        store
            .repo
            .move_object(&ctx, &id(&data("sub")), &id(&data("sub"))),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn delete_object_and_tree() {
    let store = store();
    let ctx = writer();
    assert!(matches!(
        store.repo.delete_object(&ctx, &ObjectId::root()),
        Err(ApiError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.repo.delete_object(&ctx, &id(&data("sub"))),
        Err(ApiError::Constraint(_))
    ));

    store.repo.delete_object(&ctx, &id(&data("empty.bin"))).unwrap();
    assert!(!store.path(&data("empty.bin")).exists());

    let failed = store
        .repo
        .delete_tree(&ctx, &id(&data("sub")), false)
        .unwrap();
    assert!(failed.is_empty());
    assert!(!store.path(&data("sub")).exists());
    assert!(store
        .repo
        .index()
        .get(&id(&data("sub/inner.txt")))
        .unwrap()
        .is_none());
}

#[test]
fn content_overwrite_append_and_delete() {
    let store = store();
    let ctx = writer();
    let file = id(&data("file.txt"));
    let empty = id(&data("empty.bin"));

    assert!(matches!(
        store
            .repo
            .set_content_stream(&ctx, &file, false, &mut &b"new"[..]),
        Err(ApiError::Constraint(_))
    ));
    store
        .repo
        .set_content_stream(&ctx, &empty, false, &mut &b"first"[..])
        .unwrap();
    store
        .repo
        .append_content_stream(&ctx, &empty, &mut &b"+second"[..])
        .unwrap();
    assert_eq!(fs::read(store.path(&data("empty.bin"))).unwrap(), b"first+second");

    store
        .repo
        .set_content_stream(&ctx, &file, true, &mut &b"new"[..])
        .unwrap();
    assert_eq!(fs::read(store.path(&data("file.txt"))).unwrap(), b"new");

    store.repo.delete_content_stream(&ctx, &file).unwrap();
    assert_eq!(fs::metadata(store.path(&data("file.txt"))).unwrap().len(), 0);
    assert!(matches!(
        store.repo.delete_content_stream(&ctx, &file),
        Err(ApiError::Constraint(_))
    ));
    assert!(matches!(
        store
            .repo
            .append_content_stream(&ctx, &id(&data("sub")), &mut &b"x"[..]),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn bulk_update_collects_failures() {
    let store = store();
    let ctx = writer();
    let mut bag = PropertyBag::new();
    bag.insert(ids::DESCRIPTION, PropertyValue::String("checked".to_string()));
    let targets = vec![
        id(&data("file.txt")),
        id("/U2/representations/rep1/data/secret.txt"),
        id(&data("sub")),
    ];
    let result = store.repo.bulk_update_properties(&ctx, &targets, &bag).unwrap();
    assert_eq!(result.updated.len(), 2);
    assert_eq!(result.updated[0], (targets[0].clone(), targets[0].clone()));
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].0, targets[1]);
    assert!(result.failed[0].1.is_not_found());

    assert!(matches!(
        store.repo.bulk_update_properties(&reader(), &targets, &bag),
        Err(ApiError::PermissionDenied(_))
    ));
}
