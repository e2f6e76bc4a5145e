//! Aho-Corasick automaton for multi-pattern substring search.
//!
//! Stores a set of byte-string keys and reports, in one linear pass over an
//! input, every stored key occurring as a substring. Nodes carry a fixed
//! 256-entry child table, so UTF-8 input needs no decoding.
//!
//! Two-phase lifecycle: [`add_key`](AhoCorasick::add_key) while building,
//! one [`finalize`](AhoCorasick::finalize) to compute failure and
//! dictionary-suffix links, then read-only [`find`](AhoCorasick::find)
//! which is safe to call from any number of threads.

const ALPHABET: usize = 256;

/// Index sentinel for "no node" / "no value".
const NONE: i32 = -1;

struct AcNode {
    /// Child node index per byte, or -1.
    children: [i32; ALPHABET],
    /// Longest proper suffix of this node's string that is also a prefix of
    /// some key.
    fail: i32,
    /// Index into the values array, or -1.
    output: i32,
    /// Nearest fail-chain ancestor carrying an output, or -1.
    dict_suffix: i32,
}

impl AcNode {
    fn new() -> Self {
        Self {
            children: [NONE; ALPHABET],
            fail: 0,
            output: NONE,
            dict_suffix: NONE,
        }
    }
}

/// A multi-pattern matcher over raw bytes.
pub struct AhoCorasick<V> {
    nodes: Vec<AcNode>,
    values: Vec<V>,
    built: bool,
}

impl<V> AhoCorasick<V> {
    /// Create an empty automaton (root only).
    pub fn new() -> Self {
        Self {
            nodes: vec![AcNode::new()],
            values: Vec::new(),
            built: false,
        }
    }

    /// Insert a key with its value. Re-adding an identical key replaces the
    /// previous value (last write wins); callers wanting multiple payloads
    /// per key store a collection as the value.
    ///
    /// # Panics
    ///
    /// Panics if the automaton has been finalized — it is build-locked.
    pub fn add_key(&mut self, key: &[u8], value: V) {
        assert!(!self.built, "add_key called on a finalized automaton");

        let mut cur = 0usize;
        for &byte in key {
            let slot = byte as usize;
            let next = self.nodes[cur].children[slot];
            cur = if next >= 0 {
                next as usize
            } else {
                let id = self.nodes.len();
                self.nodes.push(AcNode::new());
                self.nodes[cur].children[slot] = id as i32;
                id
            };
        }

        let vid = self.values.len() as i32;
        self.values.push(value);
        self.nodes[cur].output = vid;
    }

    /// Compute failure and dictionary-suffix links breadth-first and lock
    /// the automaton for queries.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn finalize(&mut self) {
        assert!(!self.built, "automaton already finalized");

        let mut queue: Vec<usize> = Vec::with_capacity(self.nodes.len());

        // Depth-1 nodes fail to the root.
        for slot in 0..ALPHABET {
            let child = self.nodes[0].children[slot];
            if child > 0 {
                let child = child as usize;
                self.nodes[child].fail = 0;
                self.nodes[child].dict_suffix = NONE;
                queue.push(child);
            }
        }

        let mut head = 0;
        while head < queue.len() {
            let u = queue[head];
            head += 1;

            for slot in 0..ALPHABET {
                let v = self.nodes[u].children[slot];
                if v < 0 {
                    continue;
                }
                let v = v as usize;

                let mut f = self.nodes[u].fail as usize;
                while f > 0 && self.nodes[f].children[slot] < 0 {
                    f = self.nodes[f].fail as usize;
                }
                let via = self.nodes[f].children[slot];
                if via >= 0 && via as usize != v {
                    f = via as usize;
                }
                self.nodes[v].fail = f as i32;

                self.nodes[v].dict_suffix = if self.nodes[f].output >= 0 {
                    f as i32
                } else {
                    self.nodes[f].dict_suffix
                };

                queue.push(v);
            }
        }

        self.built = true;
    }

    /// Report every stored key occurring in `text` as `(end_index, value)`
    /// pairs. Amortized O(len + matches), independent of the key count.
    ///
    /// # Panics
    ///
    /// Panics if the automaton has not been finalized yet.
    pub fn find<'a>(&'a self, text: &[u8]) -> Vec<(usize, &'a V)> {
        assert!(self.built, "find called before finalize");

        let mut out = Vec::new();
        let mut state = 0usize;

        for (i, &byte) in text.iter().enumerate() {
            let slot = byte as usize;

            while state > 0 && self.nodes[state].children[slot] < 0 {
                state = self.nodes[state].fail as usize;
            }
            let next = self.nodes[state].children[slot];
            if next >= 0 {
                state = next as usize;
            }

            let mut t = state as i32;
            while t > 0 {
                let node = &self.nodes[t as usize];
                if node.output >= 0 {
                    out.push((i, &self.values[node.output as usize]));
                }
                t = node.dict_suffix;
            }
        }
        out
    }

    /// Whether [`finalize`](Self::finalize) has run.
    pub fn is_finalized(&self) -> bool {
        self.built
    }

    /// Number of stored values (including overwritten ones).
    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

impl<V> Default for AhoCorasick<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn build(keys: &[&str]) -> AhoCorasick<String> {
        let mut ac = AhoCorasick::new();
        for key in keys {
            ac.add_key(key.as_bytes(), key.to_string());
        }
        ac.finalize();
        ac
    }

    fn hits(ac: &AhoCorasick<String>, text: &str) -> Vec<(usize, String)> {
        let mut found: Vec<(usize, String)> = ac
            .find(text.as_bytes())
            .into_iter()
            .map(|(i, v)| (i, v.clone()))
            .collect();
        found.sort();
        found
    }

    fn naive(keys: &[&str], text: &str) -> Vec<(usize, String)> {
        let bytes = text.as_bytes();
        let mut found = Vec::new();
        for key in keys {
            let k = key.as_bytes();
            if k.is_empty() {
                continue;
            }
            for end in 0..bytes.len() {
                if end + 1 >= k.len() && &bytes[end + 1 - k.len()..=end] == k {
                    found.push((end, key.to_string()));
                }
            }
        }
        found.sort();
        found
    }

    #[test]
    fn test_single_key_multiple_occurrences() {
        let ac = build(&["ab"]);
        assert_eq!(
            hits(&ac, "abxab"),
            vec![(1, "ab".to_string()), (4, "ab".to_string())]
        );
    }

    #[test]
    fn test_overlapping_keys_via_dict_suffix() {
        let ac = build(&["he", "she", "hers"]);
        assert_eq!(
            hits(&ac, "ushers"),
            vec![
                (3, "he".to_string()),
                (3, "she".to_string()),
                (5, "hers".to_string()),
            ]
        );
    }

    #[test]
    fn test_key_inside_longer_key_is_reported() {
        let ac = build(&["/tmp/", "/tmp"]);
        assert_eq!(
            hits(&ac, "/r/tmp/tmpx"),
            vec![
                (5, "/tmp".to_string()),
                (6, "/tmp/".to_string()),
                (9, "/tmp".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let mut ac = AhoCorasick::new();
        ac.add_key(b"x", "first");
        ac.add_key(b"x", "second");
        ac.finalize();

        let found = ac.find(b"x");
        assert_eq!(found.len(), 1);
        assert_eq!(*found[0].1, "second");
    }

    #[test]
    fn test_no_keys_no_matches() {
        let mut ac: AhoCorasick<u32> = AhoCorasick::new();
        ac.finalize();
        assert!(ac.find(b"anything").is_empty());
    }

    #[test]
    #[should_panic(expected = "finalized automaton")]
    fn test_add_key_after_finalize_panics() {
        let mut ac: AhoCorasick<u32> = AhoCorasick::new();
        ac.finalize();
        ac.add_key(b"late", 1);
    }

    #[test]
    #[should_panic(expected = "before finalize")]
    fn test_find_before_finalize_panics() {
        let ac: AhoCorasick<u32> = AhoCorasick::new();
        ac.find(b"text");
    }

    proptest! {
        // The automaton must agree with a naive check-every-key reference
        // for any key set, any text, and any insertion order.
        #[test]
        fn prop_find_matches_naive_reference(
            raw_keys in prop::collection::vec("[abc]{1,4}", 1..8),
            text in "[abc]{0,48}",
        ) {
            let distinct: BTreeSet<String> = raw_keys.into_iter().collect();
            let keys: Vec<&str> = distinct.iter().map(|s| s.as_str()).collect();
            let expected = naive(&keys, &text);

            let forward = build(&keys);
            prop_assert_eq!(hits(&forward, &text), expected.clone());

            let reversed: Vec<&str> = keys.iter().rev().copied().collect();
            let backward = build(&reversed);
            prop_assert_eq!(hits(&backward, &text), expected);
        }
    }
}
