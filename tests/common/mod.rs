// tests/common/mod.rs

//! Shared in-memory archive fixture for integration tests.

use muster::{
    ArchiveCandidate, Component, ComponentVersion, ContainedArchiveId, EmbeddedEntry, Error,
    ExtractionCache, Resolver, Result, VersionRange,
};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

/// In-memory [`ArchiveCandidate`] with scriptable embedded archives.
///
/// Embedded bytes are synthesized from the child's identity and version so
/// distinct children land in distinct extraction-cache entries.
#[derive(Debug, Clone)]
pub struct MemoryArchive {
    identity: String,
    version: ComponentVersion,
    components: Vec<Component>,
    entries: Vec<EmbeddedEntry>,
    resources: BTreeMap<String, Vec<u8>>,
    children: BTreeMap<String, MemoryArchive>,
}

impl MemoryArchive {
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Add a component whose id is `id` at the archive's own version.
    pub fn providing(self, id: &str) -> Self {
        let version = self.version.clone();
        self.with_component(Component::new(id, version))
    }

    /// Declare an embedded archive requested at `range` and embed `child`.
    pub fn embedding(mut self, group: &str, name: &str, range: &str, child: MemoryArchive) -> Self {
        let path = format!("META-INF/jars/{}-{}.jar", name, child.version);
        self.entries.push(EmbeddedEntry::new(
            ContainedArchiveId::new(group, name),
            VersionRange::parse(range).unwrap(),
            path.clone(),
        ));
        self.resources.insert(
            path.clone(),
            format!("{}:{}", child.identity, child.version).into_bytes(),
        );
        self.children.insert(path, child);
        self
    }
}

impl ArchiveCandidate for MemoryArchive {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn version(&self) -> &ComponentVersion {
        &self.version
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn read_resource(&self, path: &str) -> Result<Vec<u8>> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound {
                archive: self.identity.clone(),
                path: path.to_string(),
            })
    }

    fn embedded_entries(&self) -> Result<Vec<EmbeddedEntry>> {
        Ok(self.entries.clone())
    }

    fn produce_child(&self, entry: &EmbeddedEntry, extracted_path: &Path) -> Result<Self> {
        assert!(
            extracted_path.exists(),
            "child must be extracted before materialization"
        );
        self.children
            .get(&entry.path)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound {
                archive: self.identity.clone(),
                path: entry.path.clone(),
            })
    }
}

/// Build an archive carrying no components yet.
pub fn archive(identity: &str, version: &str) -> MemoryArchive {
    MemoryArchive {
        identity: identity.to_string(),
        version: ver(version),
        components: Vec::new(),
        entries: Vec::new(),
        resources: BTreeMap::new(),
        children: BTreeMap::new(),
    }
}

pub fn ver(s: &str) -> ComponentVersion {
    ComponentVersion::parse(s).unwrap()
}

pub fn range(s: &str) -> VersionRange {
    VersionRange::parse(s).unwrap()
}

/// A resolver over a fresh extraction cache.
///
/// Returns (TempDir, resolver) - keep the TempDir alive to prevent cleanup.
pub fn engine() -> (TempDir, Resolver) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cache = ExtractionCache::new(dir.path().join("extracted")).unwrap();
    (dir, Resolver::new(cache))
}

/// Install a log subscriber honoring RUST_LOG, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
