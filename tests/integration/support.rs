//! Shared store fixture.

use aip_bridge::acl::UserRegistry;
use aip_bridge::codec::PathIdentifierCodec;
use aip_bridge::query::StrategyKind;
use aip_bridge::unit::{DescriptiveRecord, MetadataBundle, MetadataExtractor};
use aip_bridge::{CallContext, ObjectId, Repository};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const READABLE: &str = r#"{"permissions":{"groups":{"READ":["cmis"]}}}"#;
pub const U1_DATA: &str = "/U1/representations/rep1/data";
pub const U2_DATA: &str = "/U2/representations/rep1/data";

/// Gives every unit a Dublin Core title and date derived from its id.
pub struct TitleExtractor;

impl MetadataExtractor for TitleExtractor {
    fn extract(&self, descriptor: &Path) -> anyhow::Result<MetadataBundle> {
        let unit = descriptor
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("descriptor has no unit"))?;
        Ok(MetadataBundle {
            simple: DescriptiveRecord::new()
                .with("metadata:dublinCore:title", format!("Title of {}", unit))
                .with("metadata:dublinCore:initialDate", "2001-02-03"),
            archival: DescriptiveRecord::new().with("metadata:ead:unitTitle", unit),
            ..Default::default()
        })
    }
}

pub struct Store {
    pub temp: TempDir,
    pub repo: Repository,
}

impl Store {
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn path(&self, repo_path: &str) -> PathBuf {
        self.root().join(repo_path.trim_start_matches('/'))
    }
}

pub fn id(repo_path: &str) -> ObjectId {
    PathIdentifierCodec::encode_repo_path(repo_path)
}

pub fn data(name: &str) -> String {
    format!("{}/{}", U1_DATA, name)
}

pub fn writer() -> CallContext {
    CallContext::new("alice")
}

pub fn reader() -> CallContext {
    CallContext::new("reader")
}

/// U1 is readable with content; U2 is unreadable; a stray file sits at the
/// root.
pub fn build_tree(root: &Path) {
    let u1 = root.join(U1_DATA.trim_start_matches('/'));
    fs::create_dir_all(u1.join("sub")).unwrap();
    fs::write(u1.join("file.txt"), b"0123456789").unwrap();
    fs::write(u1.join("empty.bin"), b"").unwrap();
    fs::write(u1.join("sub/inner.txt"), b"inner").unwrap();
    fs::write(u1.join(".hidden"), b"x").unwrap();
    fs::create_dir_all(root.join("U1/metadata/descriptive/dc")).unwrap();
    fs::write(root.join("U1/metadata/descriptive/dc/dc.xml"), b"<dc/>").unwrap();
    fs::write(root.join("U1/aip.json"), READABLE).unwrap();

    let u2 = root.join(U2_DATA.trim_start_matches('/'));
    fs::create_dir_all(&u2).unwrap();
    fs::write(u2.join("secret.txt"), b"secret").unwrap();
    fs::write(root.join("U2/aip.json"), "{}").unwrap();

    fs::write(root.join("stray.txt"), b"stray").unwrap();
}

pub fn users() -> Arc<UserRegistry> {
    let users = UserRegistry::new();
    users.set_read_write("alice").unwrap();
    users.set_read_only("reader").unwrap();
    Arc::new(users)
}

pub fn store() -> Store {
    store_with(StrategyKind::Indexed)
}

pub fn store_with(strategy: StrategyKind) -> Store {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());
    let repo = Repository::builder(temp.path())
        .extractor(Arc::new(TitleExtractor))
        .users(users())
        .strategy(strategy)
        .build()
        .unwrap();
    Store { temp, repo }
}

pub fn names<'a>(objects: impl IntoIterator<Item = &'a aip_bridge::object::ObjectData>) -> BTreeSet<String> {
    objects
        .into_iter()
        .filter_map(|o| o.properties.string("cmis:name").map(str::to_string))
        .collect()
}

pub fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}
