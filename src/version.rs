use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Serialize, Deserialize)]
struct VersionFile {
    version: String,
}

/// Report version bookkeeping with an explicit read-increment-write cycle.
/// Writes go through a temp file and a rename so a crash never leaves a
/// half-written version file.
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        VersionStore { path: path.into() }
    }

    pub fn current(&self) -> String {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<VersionFile>(&content).ok())
            .map(|f| f.version)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string())
    }

    pub fn increment(&self) -> Result<String, AppError> {
        let next = bump_patch(&self.current());
        let json = serde_json::to_string_pretty(&VersionFile {
            version: next.clone(),
        })
        .map_err(|e| AppError::Json(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(next)
    }
}

fn bump_patch(current: &str) -> String {
    let parts: Vec<&str> = current.split('.').collect();
    if parts.len() == 3 {
        match parts[2].parse::<u64>() {
            Ok(patch) => format!("{}.{}.{}", parts[0], parts[1], patch + 1),
            Err(_) => current.to_string(),
        }
    } else {
        format!("{current}.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> VersionStore {
        let dir = std::env::temp_dir().join(format!(
            "lol_report_version_{}_{name}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        VersionStore::new(dir.join("version.json"))
    }

    #[test]
    fn missing_file_defaults_to_initial_version() {
        let store = temp_store("default");
        assert_eq!(store.current(), "1.0.0");
    }

    #[test]
    fn increment_bumps_patch_and_persists() {
        let store = temp_store("bump");
        assert_eq!(store.increment().unwrap(), "1.0.1");
        assert_eq!(store.current(), "1.0.1");
        assert_eq!(store.increment().unwrap(), "1.0.2");
    }

    #[test]
    fn bump_patch_edge_cases() {
        assert_eq!(bump_patch("2.3.9"), "2.3.10");
        assert_eq!(bump_patch("1.2"), "1.2.1");
        assert_eq!(bump_patch("2.b.c"), "2.b.c");
    }
}
