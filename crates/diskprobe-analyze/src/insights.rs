//! Insight generation: classify the scanned tree and rank what it finds.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet};

use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use diskprobe_core::{ApplyTo, InsightCategory, NodeKind, PatternRule, ScanNode};

use crate::patterns::{compile_ruleset, CompiledRuleSet};

/// A classified path recorded for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Absolute path.
    pub path: String,
    /// Basename.
    pub name: CompactString,
    /// Logical size (aggregate for directories).
    pub size_bytes: u64,
    /// Allocated size — the space actually reclaimable.
    pub disk_usage: u64,
    /// Whether the path is a file or a directory.
    pub kind: NodeKind,
    /// Assigned category.
    pub category: InsightCategory,
    /// Display label of the matching rule.
    pub summary: String,
}

/// Aggregates over every match in a category, including matches that did
/// not survive the top-K cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Distinct matched paths.
    pub count: u64,
    /// Sum of logical sizes.
    pub size_bytes: u64,
    /// Sum of allocated sizes.
    pub disk_usage: u64,
}

/// The ranked result of insight generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightBundle {
    /// Surviving insights, globally sorted by `disk_usage` descending.
    pub insights: Vec<Insight>,
    /// Per-category aggregates.
    pub by_category: HashMap<InsightCategory, CategoryStats>,
}

impl InsightBundle {
    /// Insights belonging to any of the given categories, in ranked order.
    pub fn filter(&self, categories: &[InsightCategory]) -> Vec<&Insight> {
        self.insights
            .iter()
            .filter(|insight| categories.contains(&insight.category))
            .collect()
    }

    /// Aggregates for one category (zeroed when nothing matched).
    pub fn stats(&self, category: InsightCategory) -> CategoryStats {
        self.by_category.get(&category).copied().unwrap_or_default()
    }
}

/// Configuration for insight generation.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct InsightConfig {
    /// Bound on surviving insights per category.
    #[builder(default = "1000")]
    pub max_insights_per_category: usize,

    /// Extra absolute paths to classify as temporary.
    #[builder(default)]
    pub additional_temp_paths: Vec<String>,

    /// Extra absolute paths to classify as cache.
    #[builder(default)]
    pub additional_cache_paths: Vec<String>,
}

impl InsightConfig {
    /// Create a new config builder.
    pub fn builder() -> InsightConfigBuilder {
        InsightConfigBuilder::default()
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            max_insights_per_category: 1000,
            additional_temp_paths: Vec::new(),
            additional_cache_paths: Vec::new(),
        }
    }
}

/// Classifies a finalized tree against a compiled rule set.
pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    /// Create a generator with default limits.
    pub fn new() -> Self {
        Self {
            config: InsightConfig::default(),
        }
    }

    /// Create a generator with custom config.
    pub fn with_config(config: InsightConfig) -> Self {
        Self { config }
    }

    /// Compile `rules` together with this generator's additional paths.
    pub fn compile(&self, rules: &[PatternRule]) -> CompiledRuleSet {
        compile_ruleset(rules, &self.additional_path_rules())
    }

    /// Synthetic `(base, rule)` pairs for the configured extra locations.
    pub fn additional_path_rules(&self) -> Vec<(String, PatternRule)> {
        let mut pairs = Vec::new();
        for (category, sources) in [
            (InsightCategory::Temp, &self.config.additional_temp_paths),
            (InsightCategory::Cache, &self.config.additional_cache_paths),
        ] {
            for raw in sources {
                let base = expand_user(raw).trim_end_matches('/').to_string();
                let rule = PatternRule {
                    name: format!("Additional {} path", category.as_str()),
                    pattern: base.clone(),
                    category,
                    apply_to: ApplyTo::Both,
                    stop_recursion: false,
                };
                pairs.push((base, rule));
            }
        }
        pairs
    }

    /// Walk the finalized tree and produce the ranked insight bundle.
    pub fn generate(&self, root: &ScanNode, ruleset: &CompiledRuleSet) -> InsightBundle {
        let limit = self.config.max_insights_per_category;

        let mut heaps: [BoundedMinHeap; 3] =
            [BoundedMinHeap::new(limit), BoundedMinHeap::new(limit), BoundedMinHeap::new(limit)];
        // Lazy dedup: best disk usage seen per path, per category. Stale
        // heap entries are filtered during extraction.
        let mut best: [HashMap<String, u64>; 3] = Default::default();
        let mut totals = [CategoryStats::default(); 3];

        let mut stack: Vec<(&ScanNode, bool)> = vec![(root, false)];
        while let Some((node, in_temp_or_cache)) = stack.pop() {
            // Descendants of a matched temp/cache directory need no
            // classification: the parent's aggregate already covers them.
            if in_temp_or_cache {
                continue;
            }

            // Fold once per node; the matchers are all pre-lowercased.
            let lpath = node.path.to_lowercase();
            let lbase = node.name.to_lowercase();
            let matched = ruleset.match_all(&lpath, &lbase, node.is_dir());

            let mut prune_children = false;
            let mut stop = false;
            for rule in &matched {
                record(node, rule, &mut heaps, &mut best, &mut totals);
                if matches!(rule.category, InsightCategory::Temp | InsightCategory::Cache) {
                    prune_children = true;
                }
                if rule.stop_recursion {
                    stop = true;
                }
            }

            if node.is_dir() && !stop {
                for child in node.children.iter().rev() {
                    stack.push((child, prune_children));
                }
            }
        }

        // Drain the heaps, dropping entries superseded by a larger
        // observation of the same path.
        let mut insights: Vec<Insight> = Vec::new();
        for (index, heap) in heaps.into_iter().enumerate() {
            let mut kept: HashSet<String> = HashSet::new();
            for insight in heap.into_sorted_desc() {
                let stale = best[index]
                    .get(&insight.path)
                    .is_some_and(|&top| insight.disk_usage < top);
                if stale || !kept.insert(insight.path.clone()) {
                    continue;
                }
                insights.push(insight);
            }
        }
        insights.sort_by(|a, b| b.disk_usage.cmp(&a.disk_usage));

        let by_category = InsightCategory::ALL
            .iter()
            .map(|&category| (category, totals[category.index()]))
            .collect();

        debug!(insights = insights.len(), "insight generation complete");
        InsightBundle {
            insights,
            by_category,
        }
    }
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn record(
    node: &ScanNode,
    rule: &PatternRule,
    heaps: &mut [BoundedMinHeap; 3],
    best: &mut [HashMap<String, u64>; 3],
    totals: &mut [CategoryStats; 3],
) {
    let index = rule.category.index();

    let stats = &mut totals[index];
    stats.count += 1;
    stats.size_bytes += node.size_bytes;
    stats.disk_usage += node.disk_usage;

    match best[index].entry(node.path.clone()) {
        Entry::Occupied(mut entry) => {
            if node.disk_usage <= *entry.get() {
                return;
            }
            entry.insert(node.disk_usage);
        }
        Entry::Vacant(entry) => {
            entry.insert(node.disk_usage);
        }
    }

    heaps[index].push(Insight {
        path: node.path.clone(),
        name: node.name.clone(),
        size_bytes: node.size_bytes,
        disk_usage: node.disk_usage,
        kind: node.kind,
        category: rule.category,
        summary: rule.name.clone(),
    });
}

/// Min-heap bounded at `cap` entries, keyed by disk usage.
struct BoundedMinHeap {
    heap: BinaryHeap<MinEntry>,
    cap: usize,
}

impl BoundedMinHeap {
    fn new(cap: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(cap.min(1024) + 1),
            cap,
        }
    }

    fn push(&mut self, insight: Insight) {
        if self.cap == 0 {
            return;
        }
        if self.heap.len() < self.cap {
            self.heap.push(MinEntry(insight));
            return;
        }
        if let Some(MinEntry(min)) = self.heap.peek() {
            if insight.disk_usage > min.disk_usage {
                self.heap.pop();
                self.heap.push(MinEntry(insight));
            }
        }
    }

    /// Contents, largest disk usage first.
    fn into_sorted_desc(self) -> Vec<Insight> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|MinEntry(insight)| insight)
            .collect()
    }
}

/// Inverted ordering so the smallest disk usage sits at the heap top.
struct MinEntry(Insight);

impl PartialEq for MinEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinEntry {}

impl PartialOrd for MinEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .disk_usage
            .cmp(&self.0.disk_usage)
            .then_with(|| other.0.path.cmp(&self.0.path))
    }
}

fn expand_user(path: &str) -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let home = home.to_string_lossy().into_owned();
        if path == "~" {
            return home;
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return format!("{home}/{rest}");
        }
    }
    path.to_string()
}

/// Format a byte count for display: `1.5 MB`, `312 B`.
pub fn format_bytes(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if size == 0 {
        return "0 B".to_string();
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
