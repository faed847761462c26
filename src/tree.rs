use crate::types::Shard;

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Shard lineage of a stream, kept as an arena keyed by shard id.
///
/// Snapshots arrive incrementally and a child may be seen before its parent, so children are
/// indexed by parent id whether or not the parent itself is known yet.
#[derive(Debug, Clone, Default)]
pub struct ShardTree {
    shards: BTreeMap<String, Shard>,
    children: BTreeMap<String, BTreeSet<String>>,
    completed: HashSet<String>,
}

impl ShardTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge shards into the tree and return the ids seen for the first time.
    ///
    /// Re-inserting a known shard only refreshes its range, e.g. when an open shard got closed.
    pub fn insert<I: IntoIterator<Item = Shard>>(&mut self, shards: I) -> Vec<String> {
        let mut discovered: Vec<String> = vec![];

        for shard in shards {
            let id = shard.id().to_string();

            if let Some(parent) = shard.parent() {
                self.children
                    .entry(parent.to_string())
                    .or_default()
                    .insert(id.clone());
            }

            if self.shards.insert(id.clone(), shard).is_none() {
                discovered.push(id);
            }
        }

        discovered
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn get(&self, shard_id: &str) -> Option<&Shard> {
        self.shards.get(shard_id)
    }

    pub fn shards(&self) -> impl Iterator<Item = &Shard> {
        self.shards.values()
    }

    /// Shards without a known parent. A parent id that never showed up in any snapshot belongs
    /// to a shard already trimmed out of retention.
    pub fn roots(&self) -> Vec<&str> {
        self.shards
            .values()
            .filter(|s| self.known_parent(s).is_none())
            .map(|s| s.id())
            .collect()
    }

    pub fn children(&self, shard_id: &str) -> Vec<&str> {
        self.children
            .get(shard_id)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The shard followed by its known ancestors, nearest first.
    pub fn lineage(&self, shard_id: &str) -> Vec<&str> {
        let mut lineage: Vec<&str> = vec![];
        let mut current = self.shards.get(shard_id);

        while let Some(shard) = current {
            // Stop on cycles in a malformed snapshot.
            if lineage.contains(&shard.id()) {
                break;
            }
            lineage.push(shard.id());
            current = self.known_parent(shard);
        }

        lineage
    }

    /// Shards that may be read now: not completed, and whose parent is absent or completed.
    pub fn eligible_shards(&self, completed: &HashSet<String>) -> BTreeSet<String> {
        self.shards
            .values()
            .filter(|s| !completed.contains(s.id()))
            .filter(|s| match self.known_parent(s) {
                Some(parent) => completed.contains(parent.id()),
                None => true,
            })
            .map(|s| s.id().to_string())
            .collect()
    }

    /// Eligible shards against the tree's own completion state.
    pub fn eligible(&self) -> BTreeSet<String> {
        self.eligible_shards(&self.completed)
    }

    /// Record that the shard has been drained and fully forwarded. Returns false if it already
    /// was.
    pub fn mark_completed(&mut self, shard_id: &str) -> bool {
        self.completed.insert(shard_id.to_string())
    }

    pub fn is_completed(&self, shard_id: &str) -> bool {
        self.completed.contains(shard_id)
    }

    pub fn completed(&self) -> &HashSet<String> {
        &self.completed
    }

    fn known_parent(&self, shard: &Shard) -> Option<&Shard> {
        shard.parent().and_then(|id| self.shards.get(id))
    }
}
