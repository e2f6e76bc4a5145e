//! Core types for diskprobe.
//!
//! This crate provides the data model shared across the diskprobe
//! workspace: scan nodes and snapshots, bottom-up tree finalization,
//! classification rules, configuration, and error types.

mod config;
mod error;
mod node;
mod rule;
mod tree;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::ScanError;
pub use node::{NodeKind, ScanNode};
pub use rule::{ApplyTo, InsightCategory, PatternRule};
pub use tree::{finalize, iter_nodes, top_nodes, NodeIter, ScanSnapshot, ScanStats};
