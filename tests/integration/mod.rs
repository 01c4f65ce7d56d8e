//! Integration tests for dirdigest
//!
//! Build, persist, mutate and re-check real directory trees.

use ::dirdigest::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// A scratch tree plus a separate directory for index files
pub struct SnapshotHarness {
    pub tree: TempDir,
    pub index_dir: TempDir,
}

impl SnapshotHarness {
    /// Create an empty harness
    pub fn new() -> Self {
        Self {
            tree: TempDir::new().unwrap(),
            index_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tree.path()
    }

    /// Write a file relative to the tree root, creating parents
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root().join(relative)).unwrap();
    }

    pub fn rename(&self, from: &str, to: &str) {
        fs::rename(self.root().join(from), self.root().join(to)).unwrap();
    }

    /// Build with the given options and save under `name`
    pub fn snapshot(&self, name: &str, options: IndexOptions) -> (DirectoryIndex, PathBuf) {
        let index = build_index(self.root(), options).unwrap();
        let path = self.index_dir.path().join(format!("{}.json", name));
        index.save(&path).unwrap();
        (index, path)
    }

    /// Populate a random nested tree; returns the relative paths written
    pub fn generate_tree(&self, seed: u64, files: usize) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut written = Vec::with_capacity(files);

        for i in 0..files {
            let depth = rng.random_range(0..4);
            let mut relative = String::new();
            for _ in 0..depth {
                relative.push_str(&format!("dir{}/", rng.random_range(0..3)));
            }
            relative.push_str(&format!("file{}.dat", i));

            let size = rng.random_range(0..4096);
            let content: Vec<u8> = (0..size).map(|_| rng.random()).collect();
            self.write(&relative, content);
            written.push(relative);
        }

        info!("Generated {} files", written.len());
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_drift_cycle() {
        let harness = SnapshotHarness::new();
        harness.write("index.html", "<h1>home</h1>");
        harness.write("css/site.css", "body {}");
        harness.write("js/app.js", "console.log(1)");

        let (_, saved_path) = harness.snapshot("before", IndexOptions::default());

        harness.write("index.html", "<h1>defaced</h1>");
        harness.remove("js/app.js");
        harness.write(".well-known/security.txt", "Contact: ops@example.com");

        let diff = reevaluate_file(&saved_path, &IndexOptions::default()).unwrap();

        assert_eq!(diff.added.keys().collect::<Vec<_>>(), vec![".well-known/security.txt"]);
        assert_eq!(diff.removed.keys().collect::<Vec<_>>(), vec!["js/app.js"]);
        assert_eq!(diff.modified.keys().collect::<Vec<_>>(), vec!["index.html"]);
        assert_eq!(
            diff.modified["index.html"].new,
            hash_bytes(DigestWidth::Sha256, b"<h1>defaced</h1>")
        );
    }

    #[test]
    #[traced_test]
    fn test_unchanged_tree_short_circuits() {
        let harness = SnapshotHarness::new();
        harness.generate_tree(7, 50);

        let (_, saved_path) = harness.snapshot("baseline", IndexOptions::default());
        let diff = reevaluate_file(&saved_path, &IndexOptions::default()).unwrap();

        assert!(diff.is_empty());
        assert!(diff.aggregates_match);
    }

    #[test]
    fn test_copied_tree_compares_equal() {
        let original = SnapshotHarness::new();
        let paths = original.generate_tree(11, 30);

        let copy = SnapshotHarness::new();
        for relative in &paths {
            copy.write(relative, fs::read(original.root().join(relative)).unwrap());
        }

        let (_, left) = original.snapshot("left", IndexOptions::default());
        let (_, right) = copy.snapshot("right", IndexOptions::default());

        let left = DirectoryIndex::load(&left).unwrap();
        let right = DirectoryIndex::load(&right).unwrap();
        assert_ne!(left.root(), right.root());
        assert_eq!(left.file_digests(), right.file_digests());
        assert!(compare(&left, &right).is_empty());
    }

    #[test]
    fn test_rename_reported_as_remove_and_add() {
        let harness = SnapshotHarness::new();
        harness.write("report-draft.pdf", vec![0x25u8; 2048]);
        harness.write("notes.txt", "v1");

        let (before, _) = harness.snapshot("before", IndexOptions::default());

        harness.rename("report-draft.pdf", "report-final.pdf");
        harness.write("notes.txt", "v2");

        let after = build_index(harness.root(), IndexOptions::default()).unwrap();
        let diff = compare(&before, &after);

        assert_eq!(diff.removed["report-draft.pdf"], diff.added["report-final.pdf"]);
        assert_eq!(diff.modified.keys().collect::<Vec<_>>(), vec!["notes.txt"]);
    }

    #[test]
    fn test_every_width_combination_round_trips() {
        let harness = SnapshotHarness::new();
        harness.generate_tree(3, 10);

        for file_digest in DigestWidth::ALL {
            for aggregate in DigestWidth::ALL {
                let options = IndexOptions {
                    file_digest,
                    aggregate_digest: aggregate,
                    ..IndexOptions::default()
                };
                let name = format!("{}-{}", file_digest.bits(), aggregate.bits());
                let (index, path) = harness.snapshot(&name, options);

                assert_eq!(index.aggregate_digest().len(), aggregate.hex_len());
                assert!(index.file_digests().values().all(|d| d.len() == file_digest.hex_len()));

                // Widths are recovered from the saved file alone
                let diff = reevaluate_file(&path, &IndexOptions::default()).unwrap();
                assert!(diff.is_empty(), "drift reported for {}", name);
            }
        }
    }

    #[test]
    fn test_large_file_spans_chunks() {
        let harness = SnapshotHarness::new();
        let content: Vec<u8> = (0..(3 * DEFAULT_CHUNK_SIZE + 17)).map(|i| (i % 253) as u8).collect();
        harness.write("disk.img", &content);

        let index = IndexBuilder::new(harness.root())
            .with_file_digest(DigestWidth::Sha512)
            .build()
            .unwrap();

        assert_eq!(index.get("disk.img"), Some(hash_bytes(DigestWidth::Sha512, &content).as_str()));
    }

    #[test]
    fn test_parallel_and_serial_builds_agree() {
        let harness = SnapshotHarness::new();
        harness.generate_tree(42, 200);

        let serial = IndexBuilder::new(harness.root()).with_parallel_workers(1).build().unwrap();
        let parallel = IndexBuilder::new(harness.root()).with_parallel_workers(16).build().unwrap();

        assert_eq!(serial.len(), 200);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_write_failure_keeps_index_usable() {
        let harness = SnapshotHarness::new();
        harness.write("a.txt", "hello");

        let index = build_index(harness.root(), IndexOptions::default()).unwrap();
        let bad_target = harness.index_dir.path().join("missing-dir").join("out.json");

        match index.save(&bad_target) {
            Err(DigestError::WriteFailure { path, .. }) => assert_eq!(path, bad_target),
            other => panic!("expected WriteFailure, got {:?}", other),
        }

        let good_target = harness.index_dir.path().join("out.json");
        index.save(&good_target).unwrap();
        assert_eq!(DirectoryIndex::load(&good_target).unwrap(), index);
    }
}
