use crate::integration::support::{data, reader, store, writer, id};
use aip_bridge::{ObjectId, ObjectRequest};
use proptest::prelude::*;
use std::sync::OnceLock;

/// A store with a dozen first-level documents, shared across cases.
fn shared() -> &'static crate::integration::support::Store {
    static STORE: OnceLock<crate::integration::support::Store> = OnceLock::new();
    STORE.get_or_init(|| {
        let store = store();
        for i in 0..9 {
            std::fs::write(store.path(&data(&format!("doc{}.txt", i))), b"x").unwrap();
        }
        store
    })
}

fn listing_ids(skip: i64, max: i64) -> (Vec<ObjectId>, bool, usize) {
    let page = shared()
        .repo
        .get_children(&reader(), &ObjectId::root(), &ObjectRequest::default(), skip, max)
        .unwrap();
    (
        page.items.into_iter().map(|i| i.object.id).collect(),
        page.has_more,
        page.total_count,
    )
}

proptest! {
    #[test]
    fn children_pages_are_windows_of_the_full_listing(skip in 0i64..15, max in -1i64..15) {
        let (all, _, total) = listing_ids(0, -1);
        prop_assert_eq!(all.len(), 12);
        prop_assert_eq!(total, 12);

        let (page, has_more, total) = listing_ids(skip, max);
        let start = (skip as usize).min(all.len());
        let end = if max < 0 { all.len() } else { (start + max as usize).min(all.len()) };
        prop_assert_eq!(&page[..], &all[start..end]);
        prop_assert_eq!(has_more, end < all.len());
        prop_assert_eq!(total, 12);
    }
}

#[test]
fn query_pages_match_listing_counts() {
    let store = store();
    let ctx = writer();
    for i in 0..4 {
        store
            .repo
            .create_document(&ctx, &id(&data("sub")), &format!("n{}.txt", i), None, None)
            .unwrap();
    }
    let page = store
        .repo
        .query(
            &reader(),
            "SELECT * FROM cmis:document",
            &ObjectRequest::default(),
            2,
            3,
        )
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total_count, 7);
    assert!(page.has_more);

    let page = store
        .repo
        .query(&reader(), "SELECT * FROM cmis:document", &ObjectRequest::default(), 6, 3)
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(!page.has_more);
}
