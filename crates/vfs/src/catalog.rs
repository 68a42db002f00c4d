//! The fixed set of remote objects exposed by a mount.
//!
//! A `Catalog` is built once from an already-resolved `name -> metadata`
//! mapping and never changes afterwards. It has no mutation API, so any
//! number of concurrent readers can share it through an `Arc` without
//! locking.
//!
//! Inodes are handed out in input order starting at `BASE_FILE_INODE`.
//! Input order is whatever the caller's map yields, so the name/inode
//! pairing may differ between mounts, but it never changes within one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dxfs_common::BASE_FILE_INODE;
use serde::Deserialize;
use tracing::{info, warn};

/// Metadata for one remote object, as supplied by the catalog resolver.
///
/// Deserializes from describe-style JSON:
/// `{"id": "file-xxxx", "project": "project-yyyy", "size": 123,
///   "created": 1600000000000, "modified": 1600000000000}`
/// with timestamps in milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    /// Remote object identifier.
    #[serde(rename = "id")]
    pub object_id: String,
    /// Container (project) the object is read through.
    #[serde(rename = "project")]
    pub container_id: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, ms since the epoch.
    #[serde(rename = "created")]
    pub created_ms: u64,
    /// Modification time, ms since the epoch.
    #[serde(rename = "modified")]
    pub modified_ms: u64,
}

impl ObjectMeta {
    /// Create metadata for an immutable object.
    ///
    /// Creation and modification time are both set to `timestamp_ms`.
    ///
    /// # Arguments
    /// * `object_id` - Remote object identifier
    /// * `container_id` - Container identifier
    /// * `size` - Size in bytes
    /// * `timestamp_ms` - Creation time, ms since the epoch
    pub fn new(
        object_id: impl Into<String>,
        container_id: impl Into<String>,
        size: u64,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            container_id: container_id.into(),
            size,
            created_ms: timestamp_ms,
            modified_ms: timestamp_ms,
        }
    }

    /// Override the modification time.
    ///
    /// # Arguments
    /// * `modified_ms` - Modification time, ms since the epoch
    pub fn with_modified(mut self, modified_ms: u64) -> Self {
        self.modified_ms = modified_ms;
        self
    }
}

fn from_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

/// One file of the mount. Immutable after catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// File name inside the root directory.
    pub name: String,
    /// Remote object identifier.
    pub object_id: String,
    /// Container (project) identifier.
    pub container_id: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time.
    pub created_at: SystemTime,
    /// Modification time.
    pub modified_at: SystemTime,
    /// Inode, stable for the life of the mount.
    pub inode: u64,
}

impl CatalogEntry {
    fn new(name: String, meta: ObjectMeta, inode: u64) -> Self {
        Self {
            name,
            object_id: meta.object_id,
            container_id: meta.container_id,
            size: meta.size,
            created_at: from_millis(meta.created_ms),
            modified_at: from_millis(meta.modified_ms),
            inode,
        }
    }
}

/// Check whether a name can appear as an entry of a flat directory.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\0')
}

/// Immutable mapping from file name to catalog entry.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Entries keyed by name; iteration order is the listing order.
    by_name: BTreeMap<String, Arc<CatalogEntry>>,
    /// Reverse index for inode-addressed hosts.
    by_inode: HashMap<u64, Arc<CatalogEntry>>,
}

impl Catalog {
    /// Build the catalog, assigning inodes from `BASE_FILE_INODE` upward.
    ///
    /// Names that cannot be directory entries are skipped, as are repeated
    /// names after their first occurrence. Skipped names do not consume an
    /// inode.
    ///
    /// # Arguments
    /// * `objects` - `(name, metadata)` pairs, typically a map
    pub fn build<I>(objects: I) -> Self
    where
        I: IntoIterator<Item = (String, ObjectMeta)>,
    {
        let mut by_name: BTreeMap<String, Arc<CatalogEntry>> = BTreeMap::new();
        let mut by_inode: HashMap<u64, Arc<CatalogEntry>> = HashMap::new();
        let mut next_inode: u64 = BASE_FILE_INODE;

        for (name, meta) in objects {
            if !is_valid_name(&name) {
                warn!(name = %name, object_id = %meta.object_id, "Skipping invalid file name");
                continue;
            }
            if by_name.contains_key(&name) {
                warn!(name = %name, object_id = %meta.object_id, "Skipping duplicate file name");
                continue;
            }

            let entry: Arc<CatalogEntry> =
                Arc::new(CatalogEntry::new(name.clone(), meta, next_inode));
            by_inode.insert(next_inode, entry.clone());
            by_name.insert(name, entry);
            next_inode += 1;
        }

        info!(files = by_name.len(), "Catalog built");
        Self { by_name, by_inode }
    }

    /// Look up an entry by name.
    ///
    /// # Arguments
    /// * `name` - File name
    pub fn lookup(&self, name: &str) -> Option<Arc<CatalogEntry>> {
        self.by_name.get(name).cloned()
    }

    /// Look up an entry by inode.
    ///
    /// # Arguments
    /// * `inode` - Inode assigned at build time
    pub fn get(&self, inode: u64) -> Option<Arc<CatalogEntry>> {
        self.by_inode.get(&inode).cloned()
    }

    /// All entries, sorted by name.
    pub fn list(&self) -> Vec<Arc<CatalogEntry>> {
        self.by_name.values().cloned().collect()
    }

    /// Check if a name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check if the catalog has no files.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Sum of all file sizes.
    pub fn total_size(&self) -> u64 {
        self.by_name
            .values()
            .fold(0u64, |acc, e| acc.saturating_add(e.size))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sample_objects() -> HashMap<String, ObjectMeta> {
        let mut objects: HashMap<String, ObjectMeta> = HashMap::new();
        let meta = |id: &str, size: u64, ts: u64| ObjectMeta::new(id, "project-1", size, ts);
        objects.insert("reads_2.fastq".into(), meta("file-B", 2048, 1_000));
        objects.insert("README".into(), meta("file-C", 10, 2_000));
        objects.insert("reads_1.fastq".into(), meta("file-A", 1024, 3_000));
        objects.insert("genome.fa".into(), meta("file-D", 0, 4_000));
        objects
    }

    #[test]
    fn test_inodes_distinct_and_above_base() {
        let catalog: Catalog = Catalog::build(sample_objects());
        let inodes: HashSet<u64> = catalog.list().iter().map(|e| e.inode).collect();
        assert_eq!(inodes.len(), 4);
        assert!(inodes.iter().all(|&ino| ino >= BASE_FILE_INODE));
        // Dense allocation from the base.
        assert_eq!(inodes.iter().copied().max(), Some(BASE_FILE_INODE + 3));
    }

    #[test]
    fn test_inodes_stable_across_listings() {
        let catalog: Catalog = Catalog::build(sample_objects());
        let snapshot = |c: &Catalog| -> Vec<(String, u64)> {
            c.list().iter().map(|e| (e.name.clone(), e.inode)).collect()
        };
        let first: Vec<(String, u64)> = snapshot(&catalog);
        let second: Vec<(String, u64)> = snapshot(&catalog);
        assert_eq!(first, second);

        for (name, inode) in &first {
            assert_eq!(catalog.lookup(name).unwrap().inode, *inode);
            assert_eq!(&catalog.get(*inode).unwrap().name, name);
        }
    }

    #[test]
    fn test_list_sorted_by_name() {
        let catalog: Catalog = Catalog::build(sample_objects());
        let names: Vec<String> = catalog.list().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["README", "genome.fa", "reads_1.fastq", "reads_2.fastq"]);
    }

    #[test]
    fn test_inodes_follow_input_order() {
        let objects: Vec<(String, ObjectMeta)> = vec![
            ("zeta".into(), ObjectMeta::new("file-1", "project-1", 1, 0)),
            ("alpha".into(), ObjectMeta::new("file-2", "project-1", 1, 0)),
        ];
        let catalog: Catalog = Catalog::build(objects);
        assert_eq!(catalog.lookup("zeta").unwrap().inode, BASE_FILE_INODE);
        assert_eq!(catalog.lookup("alpha").unwrap().inode, BASE_FILE_INODE + 1);
    }

    #[test]
    fn test_entry_fields() {
        let catalog: Catalog = Catalog::build(vec![(
            "a.txt".to_string(),
            ObjectMeta::new("file-1", "project-9", 77, 1_500).with_modified(2_500),
        )]);
        let entry: Arc<CatalogEntry> = catalog.lookup("a.txt").unwrap();
        assert_eq!(entry.object_id, "file-1");
        assert_eq!(entry.container_id, "project-9");
        assert_eq!(entry.size, 77);
        assert_eq!(entry.created_at, UNIX_EPOCH + Duration::from_millis(1_500));
        assert_eq!(entry.modified_at, UNIX_EPOCH + Duration::from_millis(2_500));
    }

    #[test]
    fn test_lookup_missing() {
        let catalog: Catalog = Catalog::build(sample_objects());
        assert!(catalog.lookup("nope").is_none());
        assert!(catalog.get(1).is_none());
        assert!(catalog.get(BASE_FILE_INODE + 100).is_none());
        assert!(!catalog.contains("nope"));
        assert!(catalog.contains("README"));
    }

    #[test]
    fn test_duplicate_and_invalid_names_skipped() {
        let objects: Vec<(String, ObjectMeta)> = vec![
            ("a".into(), ObjectMeta::new("file-1", "project-1", 1, 0)),
            ("a".into(), ObjectMeta::new("file-2", "project-1", 2, 0)),
            ("".into(), ObjectMeta::new("file-3", "project-1", 3, 0)),
            ("..".into(), ObjectMeta::new("file-4", "project-1", 4, 0)),
            ("dir/b".into(), ObjectMeta::new("file-5", "project-1", 5, 0)),
            ("b".into(), ObjectMeta::new("file-6", "project-1", 6, 0)),
        ];
        let catalog: Catalog = Catalog::build(objects);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("a").unwrap().object_id, "file-1");
        // Skipped names did not burn inodes.
        assert_eq!(catalog.lookup("b").unwrap().inode, BASE_FILE_INODE + 1);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog: Catalog = Catalog::build(Vec::<(String, ObjectMeta)>::new());
        assert!(catalog.is_empty());
        assert!(catalog.list().is_empty());
        assert_eq!(catalog.total_size(), 0);
    }

    #[test]
    fn test_total_size() {
        let catalog: Catalog = Catalog::build(sample_objects());
        assert_eq!(catalog.total_size(), 2048 + 10 + 1024);
    }

    #[test]
    fn test_object_meta_from_json() {
        let json: &str = r#"{
            "reads.bam": {"id": "file-X", "project": "project-Y", "size": 5, "created": 10, "modified": 20}
        }"#;
        let objects: HashMap<String, ObjectMeta> = serde_json::from_str(json).unwrap();
        let catalog: Catalog = Catalog::build(objects);
        let entry: Arc<CatalogEntry> = catalog.lookup("reads.bam").unwrap();
        assert_eq!(entry.object_id, "file-X");
        assert_eq!(entry.container_id, "project-Y");
        assert_eq!(entry.modified_at, UNIX_EPOCH + Duration::from_millis(20));
    }
}
