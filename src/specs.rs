//! Blueprint discovery and loading.
//!
//! Recursively scans a directory for `.yml` blueprints. A path that already
//! names a `.yml` file is treated as a filename pattern: every file with that
//! name anywhere under its parent directory matches, which is what the
//! watcher passes after a single-file change.

use std::path::{Path, PathBuf};

use tokio::fs;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};
use crate::spec::SpecFile;

/// List blueprint files under `root`, skipping `node_modules`.
pub fn read_specs(root: &str) -> Vec<PathBuf> {
    let (base, file_name): (PathBuf, Option<String>) = if root.ends_with(".yml") {
        let path = Path::new(root);
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        (parent.to_path_buf(), name)
    } else {
        let base = if root.is_empty() { "." } else { root };
        (PathBuf::from(base), None)
    };

    let mut specs: Vec<PathBuf> = WalkDir::new(&base)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "yml"))
        .filter(|e| match &file_name {
            Some(name) => e.file_name().to_string_lossy() == name.as_str(),
            None => true,
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    specs.sort();
    specs
}

/// Load one blueprint file into its specification form.
pub async fn spec_to_ir(path: &Path) -> Result<SpecFile> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::io(path, e))?;
    serde_yaml::from_str(&raw).map_err(|source| BuildError::SpecParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    #[test]
    fn test_read_specs_recurses_and_skips_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("modules/auth");
        std_fs::create_dir_all(&nested).unwrap();
        std_fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std_fs::write(nested.join("login.yml"), "component:\n").unwrap();
        std_fs::write(dir.path().join("home.yml"), "component:\n").unwrap();
        std_fs::write(dir.path().join("node_modules/pkg/x.yml"), "component:\n").unwrap();

        let specs = read_specs(dir.path().to_str().unwrap());
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|p| !p.to_string_lossy().contains("node_modules")));
    }

    #[test]
    fn test_read_specs_single_file_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep");
        std_fs::create_dir_all(&nested).unwrap();
        std_fs::write(nested.join("login.yml"), "component:\n").unwrap();
        std_fs::write(nested.join("other.yml"), "component:\n").unwrap();

        let pattern = dir.path().join("login.yml");
        let specs = read_specs(pattern.to_str().unwrap());
        assert_eq!(specs.len(), 1);
        assert!(specs[0].ends_with("deep/login.yml"));
    }

    #[tokio::test]
    async fn test_spec_to_ir_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.yml");
        std_fs::write(&bad, "component: [unclosed").unwrap();
        let err = spec_to_ir(&bad).await.unwrap_err();
        assert!(matches!(err, BuildError::SpecParse { .. }));
    }
}
