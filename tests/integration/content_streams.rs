use crate::integration::support::{data, id, reader, store};
use aip_bridge::ApiError;
use std::io::Read;

#[test]
fn whole_document() {
    let store = store();
    let stream = store
        .repo
        .get_content_stream(&reader(), &id(&data("file.txt")), None, None)
        .unwrap();
    assert_eq!(stream.file_name, "file.txt");
    assert_eq!(stream.mime_type, "text/plain");
    assert_eq!(stream.total_length, 10);
    assert_eq!(stream.length, 10);
    assert!(!stream.partial);
    assert_eq!(stream.read_to_vec().unwrap(), b"0123456789");
}

#[test]
fn byte_ranges_are_bounded() {
    let store = store();
    let file = id(&data("file.txt"));

    let mut stream = store
        .repo
        .get_content_stream(&reader(), &file, Some(3), Some(4))
        .unwrap();
    assert!(stream.partial);
    let mut buf = String::new();
    stream.read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "3456");

    let stream = store
        .repo
        .get_content_stream(&reader(), &file, Some(8), Some(100))
        .unwrap();
    assert_eq!(stream.length, 2);
    assert_eq!(stream.read_to_vec().unwrap(), b"89");

    assert!(matches!(
        store.repo.get_content_stream(&reader(), &file, Some(10), None),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn empty_documents_and_folders_have_no_content() {
    let store = store();
    assert!(matches!(
        store
            .repo
            .get_content_stream(&reader(), &id(&data("empty.bin")), None, None),
        Err(ApiError::Constraint(_))
    ));
    assert!(matches!(
        store
            .repo
            .get_content_stream(&reader(), &id(&data("sub")), None, None),
        Err(ApiError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.repo.get_content_stream(
            &reader(),
            &id("/U2/representations/rep1/data/secret.txt"),
            None,
            None
        ),
        Err(ApiError::NotFound(_))
    ));
}
