//! Main test module for dirdigest
//!
//! This module includes all test suites:
//! - Integration tests for build / save / reevaluate / compare flows
//! - Property-based tests for comparator and aggregation invariants

pub mod integration;

#[cfg(test)]
mod edge_cases {
    use ::dirdigest::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_special_filenames() {
        let temp_dir = TempDir::new().unwrap();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "file[with]brackets.txt",
            "-leading-dash",
            ".leading-dot",
            "..double-dot",
        ];

        let mut created = Vec::new();
        for name in &special_names {
            if fs::write(temp_dir.path().join(name), format!("Content of {}", name)).is_ok() {
                created.push(*name);
            }
        }

        let index = IndexBuilder::new(temp_dir.path()).build().unwrap();
        assert_eq!(index.len(), created.len());
        for name in created {
            assert_eq!(
                index.get(name),
                Some(hash_bytes(DigestWidth::Sha256, format!("Content of {}", name).as_bytes()).as_str()),
                "missing {}",
                name
            );
        }
    }

    #[test]
    fn test_unicode_filenames() {
        let temp_dir = TempDir::new().unwrap();

        let unicode_names = vec!["файл.txt", "文件.txt", "ファイル.txt", "αρχείο.txt", "🚀🌟💾.txt"];

        let mut created = Vec::new();
        for name in &unicode_names {
            if fs::write(temp_dir.path().join(name), name.as_bytes()).is_ok() {
                created.push(*name);
            }
        }
        if created.is_empty() {
            return;
        }

        let index = IndexBuilder::new(temp_dir.path()).build().unwrap();
        let json = index.to_json().unwrap();
        let reloaded = DirectoryIndex::from_json(&json).unwrap();

        for name in created {
            assert!(reloaded.get(name).is_some(), "lost {} in round trip", name);
        }
        assert_eq!(reloaded, index);
    }

    #[test]
    fn test_identical_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.lock"), b"").unwrap();
        fs::write(temp_dir.path().join("two.lock"), b"").unwrap();

        let index = IndexBuilder::new(temp_dir.path()).build().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("one.lock"), index.get("two.lock"));
    }

    #[test]
    fn test_deep_nesting() {
        let temp_dir = TempDir::new().unwrap();
        let mut dir = temp_dir.path().to_path_buf();
        let mut key = String::new();
        for level in 0..30 {
            let name = format!("l{}", level);
            dir = dir.join(&name);
            key.push_str(&name);
            key.push('/');
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leaf.txt"), "bottom").unwrap();
        key.push_str("leaf.txt");

        let index = IndexBuilder::new(temp_dir.path()).build().unwrap();
        assert_eq!(index.file_digests().keys().collect::<Vec<_>>(), vec![&key]);
    }

    #[test]
    fn test_directory_only_tree_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a").join("b")).unwrap();
        fs::create_dir_all(temp_dir.path().join(".c")).unwrap();

        let index = IndexBuilder::new(temp_dir.path()).build().unwrap();
        assert!(index.is_empty());

        let other = TempDir::new().unwrap();
        let empty = IndexBuilder::new(other.path()).build().unwrap();
        assert_eq!(index.aggregate_digest(), empty.aggregate_digest());
    }
}
