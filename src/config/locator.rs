//! Configuration discovery.
//!
//! An explicit path is used verbatim. Otherwise the working directory and then
//! each ancestor up to the filesystem root is checked for a kgentik.yaml; the
//! nearest directory wins.

use std::path::{Path, PathBuf};

use crate::error::{KgentikError, Result};

/// File names recognized as the tool configuration, in preference order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["kgentik.yaml", "kgentik.yml"];

/// Locate the configuration starting from the current working directory.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    locate_from(&cwd, explicit)
}

/// Locate the configuration starting from `start`.
pub fn locate_from(start: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            log::debug!("Using explicit config path {}", path.display());
            return Ok(path.to_path_buf());
        }
        return Err(KgentikError::ConfigNotFound {
            path: path.to_path_buf(),
            explicit: true,
        });
    }

    for dir in start.ancestors() {
        if let Some(found) = find_in_dir(dir) {
            log::info!("Found config at {}", found.display());
            return Ok(found);
        }
    }

    Err(KgentikError::ConfigNotFound {
        path: start.to_path_buf(),
        explicit: false,
    })
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_locate_in_start_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(dir.path(), None).unwrap();
        assert_eq!(found, dir.path().join("kgentik.yaml"));
    }

    #[test]
    fn test_locate_walks_up_to_ancestor() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A");
        let c = a.join("B").join("C");
        fs::create_dir_all(&c).unwrap();
        fs::write(a.join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(&c, None).unwrap();
        assert_eq!(found, a.join("kgentik.yaml"));
    }

    #[test]
    fn test_locate_nearest_wins() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A");
        let b = a.join("B");
        let c = b.join("C");
        fs::create_dir_all(&c).unwrap();
        fs::write(a.join("kgentik.yaml"), "tools: []\n").unwrap();
        fs::write(b.join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(&c, None).unwrap();
        assert_eq!(found, b.join("kgentik.yaml"));
    }

    #[test]
    fn test_locate_prefers_yaml_over_yml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kgentik.yml"), "tools: []\n").unwrap();
        fs::write(dir.path().join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(dir.path(), None).unwrap();
        assert_eq!(found, dir.path().join("kgentik.yaml"));
    }

    #[test]
    fn test_locate_accepts_yml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kgentik.yml"), "tools: []\n").unwrap();

        let found = locate_from(dir.path(), None).unwrap();
        assert_eq!(found, dir.path().join("kgentik.yml"));
    }

    #[test]
    fn test_locate_ignores_directory_named_like_config() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(nested.join("kgentik.yaml")).unwrap();
        fs::write(dir.path().join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(&nested, None).unwrap();
        assert_eq!(found, dir.path().join("kgentik.yaml"));
    }

    #[test]
    fn test_explicit_path_used_verbatim() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom-tools.yaml");
        fs::write(&custom, "tools: []\n").unwrap();
        // A discoverable config in the start dir must not win over the explicit one
        fs::write(dir.path().join("kgentik.yaml"), "tools: []\n").unwrap();

        let found = locate_from(dir.path(), Some(&custom)).unwrap();
        assert_eq!(found, custom);
    }

    #[test]
    fn test_explicit_path_missing_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        fs::write(dir.path().join("kgentik.yaml"), "tools: []\n").unwrap();

        let err = locate_from(dir.path(), Some(&missing)).unwrap_err();
        match err {
            KgentikError::ConfigNotFound { path, explicit } => {
                assert_eq!(path, missing);
                assert!(explicit);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
