//! Rule compilation: globs decomposed into fast matchers.
//!
//! Each rule pattern is brace-expanded, then classified into the cheapest
//! matcher that decides it:
//!
//! - `**/NAME`       → exact basename hash lookup
//! - `**/SEG/**`     → substring keys `/seg/` (anywhere) and `/seg` (at end)
//! - `**/*.EXT`      → substring key `.ext`, end of path only
//! - `**/PREFIX*`    → basename prefix trie
//! - anything else   → residual glob (fnmatch semantics)
//!
//! All substring keys across every rule share a single Aho-Corasick pass
//! per path; the `end_only` flag carried on each automaton value turns the
//! suffix cases into a trivial post-filter. Rules are bucketed per node
//! kind and all keys are lowercased at compile time, so the hot loop never
//! checks `apply_to` and folds each path exactly once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glob::Pattern;
use tracing::{debug, warn};

use diskprobe_core::PatternRule;

use crate::automaton::AhoCorasick;
use crate::trie::PrefixTrie;

/// Fast-matcher classification of one expanded pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Matcher {
    /// Basename equals the key.
    Exact(String),
    /// Path contains `any`, or ends with `end`.
    Contains { any: String, end: String },
    /// Basename (and therefore path) ends with the key.
    EndsWith(String),
    /// Basename starts with the key.
    StartsWith(String),
    /// Residual glob, matched with fnmatch semantics.
    Glob(String),
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Classify one expanded pattern. Values are lowercased here so the hot
/// path can match pre-folded text.
pub(crate) fn classify(pattern: &str) -> Matcher {
    let Some(rest) = pattern.strip_prefix("**/") else {
        return Matcher::Glob(pattern.to_lowercase());
    };

    // **/segment/** or **/path/to/thing/** — contains check on the path.
    if let Some(middle) = rest.strip_suffix("/**") {
        if !has_glob_chars(middle) {
            let mid = middle.to_lowercase();
            return Matcher::Contains {
                any: format!("/{mid}/"),
                end: format!("/{mid}"),
            };
        }
        return Matcher::Glob(pattern.to_lowercase());
    }

    // **/*.ext — endswith check on the basename.
    if let Some(suffix) = rest.strip_prefix('*') {
        if !has_glob_chars(suffix) {
            return Matcher::EndsWith(suffix.to_lowercase());
        }
    }

    // **/prefix* — startswith check on the basename.
    if let Some(prefix) = rest.strip_suffix('*') {
        if !has_glob_chars(prefix) {
            return Matcher::StartsWith(prefix.to_lowercase());
        }
    }

    // **/exact — exact basename match.
    if !has_glob_chars(rest) {
        return Matcher::Exact(rest.to_lowercase());
    }

    Matcher::Glob(pattern.to_lowercase())
}

/// Expand the first `{a,b,c}` group recursively. The first `{` pairs with
/// the first `}` — alternatives do not nest.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(start) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[start + 1..].find('}') else {
        return vec![pattern.to_string()];
    };
    let end = start + 1 + close;

    let prefix = &pattern[..start];
    let suffix = &pattern[end + 1..];
    let mut expanded = Vec::new();
    for choice in pattern[start + 1..end].split(',') {
        expanded.extend(expand_braces(&format!("{prefix}{choice}{suffix}")));
    }
    expanded
}

/// A residual glob with its pre-compiled patterns.
struct GlobRule {
    pattern: Option<Pattern>,
    /// For `…/**` patterns, the variant without the suffix so the directory
    /// itself matches.
    dir_pattern: Option<Pattern>,
    rule: Arc<PatternRule>,
}

impl GlobRule {
    fn new(lowered: String, rule: Arc<PatternRule>) -> Self {
        let dir_pattern = lowered
            .strip_suffix("/**")
            .and_then(|base| Pattern::new(base).ok());
        let pattern = match Pattern::new(&lowered) {
            Ok(p) => Some(p),
            Err(err) => {
                warn!(pattern = %lowered, %err, "unparseable glob pattern never matches");
                None
            }
        };
        Self {
            pattern,
            dir_pattern,
            rule,
        }
    }

    fn matches(&self, lpath: &str, lbase: &str) -> bool {
        if let Some(dir) = &self.dir_pattern {
            if dir.matches(lpath) {
                return true;
            }
        }
        match &self.pattern {
            Some(p) => p.matches(lpath) || p.matches(lbase),
            None => false,
        }
    }
}

/// Automaton payload: rules sharing one substring key, each with its
/// end-of-path-only flag.
type AcEntry = Vec<(Arc<PatternRule>, bool)>;

/// Matchers for one node kind.
struct RuleBucket {
    exact: HashMap<String, Vec<Arc<PatternRule>>>,
    automaton: Option<AhoCorasick<AcEntry>>,
    prefix: Option<PrefixTrie<Vec<Arc<PatternRule>>>>,
    glob: Vec<GlobRule>,
    additional: Vec<(String, Arc<PatternRule>)>,
}

#[derive(Default)]
struct BucketBuilder {
    exact: HashMap<String, Vec<Arc<PatternRule>>>,
    // BTreeMaps keep automaton and trie construction order deterministic.
    contains: BTreeMap<String, AcEntry>,
    prefix: BTreeMap<String, Vec<Arc<PatternRule>>>,
    glob: Vec<GlobRule>,
    additional: Vec<(String, Arc<PatternRule>)>,
}

impl BucketBuilder {
    fn add(&mut self, matcher: &Matcher, rule: &Arc<PatternRule>) {
        match matcher {
            Matcher::Exact(name) => {
                self.exact.entry(name.clone()).or_default().push(rule.clone());
            }
            Matcher::Contains { any, end } => {
                self.contains
                    .entry(any.clone())
                    .or_default()
                    .push((rule.clone(), false));
                self.contains
                    .entry(end.clone())
                    .or_default()
                    .push((rule.clone(), true));
            }
            Matcher::EndsWith(suffix) => {
                self.contains
                    .entry(suffix.clone())
                    .or_default()
                    .push((rule.clone(), true));
            }
            Matcher::StartsWith(prefix) => {
                self.prefix.entry(prefix.clone()).or_default().push(rule.clone());
            }
            Matcher::Glob(pattern) => {
                self.glob.push(GlobRule::new(pattern.clone(), rule.clone()));
            }
        }
    }

    fn freeze(self) -> RuleBucket {
        let automaton = if self.contains.is_empty() {
            None
        } else {
            let mut ac = AhoCorasick::new();
            for (key, entries) in self.contains {
                ac.add_key(key.as_bytes(), entries);
            }
            ac.finalize();
            Some(ac)
        };

        let prefix = if self.prefix.is_empty() {
            None
        } else {
            let mut trie = PrefixTrie::new();
            for (key, rules) in self.prefix {
                trie.add_key(key.as_bytes(), rules);
            }
            trie.finalize();
            Some(trie)
        };

        RuleBucket {
            exact: self.exact,
            automaton,
            prefix,
            glob: self.glob,
            additional: self.additional,
        }
    }
}

/// All rules from all categories, compiled and split by node kind.
pub struct CompiledRuleSet {
    for_file: RuleBucket,
    for_dir: RuleBucket,
}

/// Compile every rule into the dispatch structure used per node.
///
/// `additional_paths` are `(absolute_base, rule)` pairs for user-configured
/// extra locations; bases are lowercased and stripped of trailing slashes
/// here.
pub fn compile_ruleset(
    rules: &[PatternRule],
    additional_paths: &[(String, PatternRule)],
) -> CompiledRuleSet {
    let mut file = BucketBuilder::default();
    let mut dir = BucketBuilder::default();

    for rule in rules {
        let shared = Arc::new(rule.clone());
        for expanded in expand_braces(&rule.pattern) {
            let matcher = classify(&expanded);
            if rule.apply_to.includes_files() {
                file.add(&matcher, &shared);
            }
            if rule.apply_to.includes_dirs() {
                dir.add(&matcher, &shared);
            }
        }
    }

    for (base, rule) in additional_paths {
        let normalized = base.to_lowercase().trim_end_matches('/').to_string();
        let shared = Arc::new(rule.clone());
        if rule.apply_to.includes_files() {
            file.additional.push((normalized.clone(), shared.clone()));
        }
        if rule.apply_to.includes_dirs() {
            dir.additional.push((normalized, shared));
        }
    }

    debug!(
        rules = rules.len(),
        additional = additional_paths.len(),
        "compiled rule set"
    );

    CompiledRuleSet {
        for_file: file.freeze(),
        for_dir: dir.freeze(),
    }
}

fn admit<'a>(rule: &'a PatternRule, seen: &mut u8, matched: &mut Vec<&'a PatternRule>) {
    let bit = 1u8 << rule.category.index();
    if *seen & bit == 0 {
        *seen |= bit;
        matched.push(rule);
    }
}

impl CompiledRuleSet {
    /// Return the matching rules for one node: at most one per category,
    /// earliest tier wins. `lpath` and `lbase` must be pre-lowercased.
    pub fn match_all<'a>(
        &'a self,
        lpath: &str,
        lbase: &str,
        is_dir: bool,
    ) -> Vec<&'a PatternRule> {
        let bucket = if is_dir { &self.for_dir } else { &self.for_file };
        let mut matched: Vec<&PatternRule> = Vec::new();
        let mut seen: u8 = 0;

        // Exact basename.
        if let Some(rules) = bucket.exact.get(lbase) {
            for rule in rules {
                admit(rule, &mut seen, &mut matched);
            }
        }

        // Substring automaton, with the end-only post-filter.
        if let Some(ac) = &bucket.automaton {
            let last = lpath.len().saturating_sub(1);
            for (end_idx, entries) in ac.find(lpath.as_bytes()) {
                for (rule, end_only) in entries {
                    if *end_only && end_idx != last {
                        continue;
                    }
                    admit(rule, &mut seen, &mut matched);
                }
            }
        }

        // Basename prefixes.
        if let Some(trie) = &bucket.prefix {
            for rules in trie.find(lbase.as_bytes()) {
                for rule in rules {
                    admit(rule, &mut seen, &mut matched);
                }
            }
        }

        // Residual globs.
        for glob_rule in &bucket.glob {
            if glob_rule.matches(lpath, lbase) {
                admit(&glob_rule.rule, &mut seen, &mut matched);
            }
        }

        // User-configured extra locations, boundary-aware.
        for (base, rule) in &bucket.additional {
            let within = lpath == base
                || lpath
                    .strip_prefix(base.as_str())
                    .is_some_and(|rest| rest.starts_with('/'));
            if within {
                admit(rule, &mut seen, &mut matched);
            }
        }

        matched
    }
}
