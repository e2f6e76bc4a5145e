//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan. A leading `~` is expanded at scan time.
    pub root: PathBuf,

    /// Number of scan worker threads.
    #[builder(default = "4")]
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum depth to descend below the root (None = unlimited). Depth 0
    /// reads only the root directory itself.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_workers() -> usize {
    4
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.root {
            Some(root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path with defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: 4,
            max_depth: None,
        }
    }

    /// Effective worker count (never zero).
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .workers(8usize)
            .max_depth(Some(3))
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_depth, Some(3));
    }

    #[test]
    fn test_config_simple() {
        let config = ScanConfig::new("/home/user");
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_config_rejects_empty_root() {
        assert!(ScanConfig::builder().root("").build().is_err());
        assert!(ScanConfig::builder().build().is_err());
    }

    #[test]
    fn test_effective_workers_floor() {
        let mut config = ScanConfig::new("/");
        config.workers = 0;
        assert_eq!(config.effective_workers(), 1);
    }
}
