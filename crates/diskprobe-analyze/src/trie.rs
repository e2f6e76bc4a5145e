//! Prefix trie: which stored keys are prefixes of an input?
//!
//! Same 256-wide node layout as the automaton, minus the failure machinery,
//! and the same two-phase build/freeze lifecycle. Lookup cost is bounded by
//! the shorter of the input and the longest stored key.

const ALPHABET: usize = 256;

const NONE: i32 = -1;

struct TrieNode {
    children: [i32; ALPHABET],
    output: i32,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: [NONE; ALPHABET],
            output: NONE,
        }
    }
}

/// Byte-level prefix trie with per-key values.
pub struct PrefixTrie<V> {
    nodes: Vec<TrieNode>,
    values: Vec<V>,
    built: bool,
}

impl<V> PrefixTrie<V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new()],
            values: Vec::new(),
            built: false,
        }
    }

    /// Insert a key with its value. Last write wins per exact key.
    ///
    /// # Panics
    ///
    /// Panics if the trie has been finalized — it is build-locked.
    pub fn add_key(&mut self, key: &[u8], value: V) {
        assert!(!self.built, "add_key called on a finalized trie");

        let mut cur = 0usize;
        for &byte in key {
            let slot = byte as usize;
            let next = self.nodes[cur].children[slot];
            cur = if next >= 0 {
                next as usize
            } else {
                let id = self.nodes.len();
                self.nodes.push(TrieNode::new());
                self.nodes[cur].children[slot] = id as i32;
                id
            };
        }

        let vid = self.values.len() as i32;
        self.values.push(value);
        self.nodes[cur].output = vid;
    }

    /// Lock the trie for queries.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn finalize(&mut self) {
        assert!(!self.built, "trie already finalized");
        self.built = true;
    }

    /// Return the value of every stored key that is a prefix of `text`,
    /// shortest first. Stops at the first missing edge.
    ///
    /// # Panics
    ///
    /// Panics if the trie has not been finalized yet.
    pub fn find<'a>(&'a self, text: &[u8]) -> Vec<&'a V> {
        assert!(self.built, "find called before finalize");

        let mut out = Vec::new();
        let mut cur = 0usize;
        if self.nodes[cur].output >= 0 {
            out.push(&self.values[self.nodes[cur].output as usize]);
        }
        for &byte in text {
            let next = self.nodes[cur].children[byte as usize];
            if next < 0 {
                break;
            }
            cur = next as usize;
            if self.nodes[cur].output >= 0 {
                out.push(&self.values[self.nodes[cur].output as usize]);
            }
        }
        out
    }

    /// Whether [`finalize`](Self::finalize) has run.
    pub fn is_finalized(&self) -> bool {
        self.built
    }
}

impl<V> Default for PrefixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}
