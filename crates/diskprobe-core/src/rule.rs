//! Pattern rule types for insight classification.

use serde::{Deserialize, Serialize};

/// Classification assigned to a matched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    /// Temporary files: logs, editor swaps, OS metadata.
    Temp,
    /// Tool and package-manager caches.
    Cache,
    /// Regenerable build outputs: `node_modules`, `target`, virtualenvs.
    BuildArtifact,
}

impl InsightCategory {
    /// All categories, in display order.
    pub const ALL: [InsightCategory; 3] = [
        InsightCategory::Temp,
        InsightCategory::Cache,
        InsightCategory::BuildArtifact,
    ];

    /// Stable string form, matching the configuration format.
    pub fn as_str(self) -> &'static str {
        match self {
            InsightCategory::Temp => "temp",
            InsightCategory::Cache => "cache",
            InsightCategory::BuildArtifact => "build_artifact",
        }
    }

    /// Dense index for per-category arrays and bitmasks.
    pub fn index(self) -> usize {
        match self {
            InsightCategory::Temp => 0,
            InsightCategory::Cache => 1,
            InsightCategory::BuildArtifact => 2,
        }
    }
}

/// Which node kinds a rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyTo {
    /// Files only.
    File,
    /// Directories only.
    Dir,
    /// Both files and directories.
    #[default]
    Both,
}

impl ApplyTo {
    /// Parse a configuration value, case-insensitively. Unknown values fall
    /// back to `Both`, matching the original configuration loader.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "file" => ApplyTo::File,
            "dir" => ApplyTo::Dir,
            _ => ApplyTo::Both,
        }
    }

    /// Does this rule apply to file nodes?
    pub fn includes_files(self) -> bool {
        matches!(self, ApplyTo::File | ApplyTo::Both)
    }

    /// Does this rule apply to directory nodes?
    pub fn includes_dirs(self) -> bool {
        matches!(self, ApplyTo::Dir | ApplyTo::Both)
    }
}

/// One classification rule, as ingested from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRule {
    /// Display label, e.g. "npm Cache".
    pub name: String,

    /// Glob pattern. The fast matchers require the documented `**/` forms;
    /// anything else falls back to the residual glob tier.
    pub pattern: String,

    /// Category assigned on match.
    pub category: InsightCategory,

    /// Node kinds the rule applies to.
    #[serde(default)]
    pub apply_to: ApplyTo,

    /// When true, the insight generator does not descend into a matched
    /// directory.
    #[serde(default)]
    pub stop_recursion: bool,
}

impl PatternRule {
    /// Create a rule applying to both files and directories.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        category: InsightCategory,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            category,
            apply_to: ApplyTo::Both,
            stop_recursion: false,
        }
    }

    /// Restrict the rule to one node kind.
    pub fn apply_to(mut self, apply_to: ApplyTo) -> Self {
        self.apply_to = apply_to;
        self
    }

    /// Prevent descent into matched directories.
    pub fn stop_recursion(mut self) -> Self {
        self.stop_recursion = true;
        self
    }
}
