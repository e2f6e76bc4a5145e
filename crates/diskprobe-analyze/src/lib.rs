//! Classification engine for diskprobe.
//!
//! Takes a finalized scan tree and a set of glob rules and produces ranked
//! *insights*: paths identified as temporary files, tool caches, or
//! regenerable build artifacts.
//!
//! The rule compiler decomposes ~60 globs into constant-time matchers — an
//! exact-basename map, one Aho-Corasick automaton shared by every
//! substring and suffix pattern, a basename prefix trie, and a residual
//! glob list — so classifying a node costs a handful of hash probes and
//! one automaton pass regardless of how many rules are configured.
//!
//! ```rust
//! use diskprobe_core::{finalize, ScanNode};
//! use diskprobe_analyze::{default_rules, InsightGenerator};
//!
//! let mut root = ScanNode::new_directory("/r", "r");
//! root.children.push(ScanNode::new_file("/r/.DS_Store", ".DS_Store", 6148, 8192));
//! finalize(&mut root);
//!
//! let generator = InsightGenerator::new();
//! let ruleset = generator.compile(&default_rules());
//! let bundle = generator.generate(&root, &ruleset);
//! assert_eq!(bundle.insights.len(), 1);
//! ```

mod automaton;
mod defaults;
mod insights;
mod patterns;
mod trie;

pub use automaton::AhoCorasick;
pub use defaults::default_rules;
pub use insights::{
    format_bytes, CategoryStats, Insight, InsightBundle, InsightConfig, InsightConfigBuilder,
    InsightGenerator,
};
pub use patterns::{compile_ruleset, CompiledRuleSet};
pub use trie::PrefixTrie;

// Re-export core types for convenience
pub use diskprobe_core::{ApplyTo, InsightCategory, PatternRule};
