use tracing::trace;

use crate::comparator::KeyComparator;
use crate::page::PageId;
use crate::tree::Tree;

enum StepDirection {
    Forward,
    Backward,
}

/// A bidirectional enumerator over a [`Tree`]'s current contents.
///
/// A cursor does not borrow its tree between calls; `next`/`prev`
/// take the tree by reference on each call instead, so mutations may
/// freely interleave with enumeration. Structural changes are
/// detected via the tree's version counter and trigger a transparent
/// re-seek from the cursor's last-known key.
pub struct Cursor<K> {
    seek_key: K,
    leaf: Option<PageId>,
    fwd_index: usize,
    hit: bool,
    delivered: bool,
    version: u64,
}

impl<K, V, C> Tree<K, V, C>
where
    K: Clone,
    C: KeyComparator<K>,
{
    /// Seeds a cursor at `key`: `hit` is true if `key` is present, in
    /// which case the cursor sits exactly on that entry; otherwise it
    /// sits at the first key greater than `key`. Usable even on an
    /// empty tree.
    pub fn seek(&self, key: &K) -> (Cursor<K>, bool) {
        match self.locate(key) {
            None => (
                Cursor {
                    seek_key: key.clone(),
                    leaf: None,
                    fwd_index: 0,
                    hit: false,
                    delivered: false,
                    version: self.version,
                },
                false,
            ),
            Some((leaf_id, idx, found)) => (
                Cursor {
                    seek_key: key.clone(),
                    leaf: Some(leaf_id),
                    fwd_index: idx,
                    hit: found,
                    delivered: false,
                    version: self.version,
                },
                found,
            ),
        }
    }

    /// Cursor at the first entry of the leftmost leaf, or `None` on
    /// an empty tree (no cursor is allocated in that case).
    pub fn seek_first(&self) -> Option<Cursor<K>> {
        let key = self.leftmost_key()?;
        Some(self.seek(&key).0)
    }

    /// Cursor at the last entry of the rightmost leaf, or `None` on
    /// an empty tree.
    pub fn seek_last(&self) -> Option<Cursor<K>> {
        let key = self.rightmost_key()?;
        Some(self.seek(&key).0)
    }
}

impl<K: Clone> Cursor<K> {
    /// Returns the current entry and advances forward, crossing into
    /// the next sibling leaf as needed. `None` signals end-of-sequence.
    pub fn next<'a, V, C>(&mut self, tree: &'a Tree<K, V, C>) -> Option<(&'a K, &'a V)>
    where
        C: KeyComparator<K>,
    {
        self.resync(tree, StepDirection::Forward);

        if self.hit {
            self.hit = false;
            let leaf_id = self.leaf?;
            let entry = tree.leaf_entry(leaf_id, self.fwd_index);
            self.fwd_index += 1;
            if let Some((k, _)) = entry {
                self.seek_key = k.clone();
                self.delivered = true;
            }
            return entry;
        }

        loop {
            let leaf_id = self.leaf?;
            let leaf = tree.leaf(leaf_id);
            if self.fwd_index < leaf.keys.len() {
                let k = &leaf.keys[self.fwd_index];
                let v = &leaf.values[self.fwd_index];
                self.seek_key = k.clone();
                self.fwd_index += 1;
                self.delivered = true;
                return Some((k, v));
            } else if let Some(next_leaf) = leaf.next {
                self.leaf = Some(next_leaf);
                self.fwd_index = 0;
            } else {
                return None;
            }
        }
    }

    /// Returns the entry at or before the current position and steps
    /// backward, crossing into the previous sibling leaf as needed.
    /// `None` signals end-of-sequence.
    pub fn prev<'a, V, C>(&mut self, tree: &'a Tree<K, V, C>) -> Option<(&'a K, &'a V)>
    where
        C: KeyComparator<K>,
    {
        self.resync(tree, StepDirection::Backward);

        if self.hit {
            self.hit = false;
            let leaf_id = self.leaf?;
            let entry = tree.leaf_entry(leaf_id, self.fwd_index);
            if let Some((k, _)) = entry {
                self.seek_key = k.clone();
                self.delivered = true;
            }
            return entry;
        }

        loop {
            let leaf_id = self.leaf?;
            if self.fwd_index > 0 {
                self.fwd_index -= 1;
                let leaf = tree.leaf(leaf_id);
                let k = &leaf.keys[self.fwd_index];
                let v = &leaf.values[self.fwd_index];
                self.seek_key = k.clone();
                self.delivered = true;
                return Some((k, v));
            }
            let prev_leaf = tree.leaf(leaf_id).prev;
            match prev_leaf {
                Some(p) => {
                    self.leaf = Some(p);
                    self.fwd_index = tree.leaf(p).keys.len();
                }
                None => return None,
            }
        }
    }

    /// Releases any cursor-local state. Cursors never own tree
    /// memory, so this is a no-op kept for API parity with `seek`.
    pub fn close(self) {}

    fn resync<V, C>(&mut self, tree: &Tree<K, V, C>, direction: StepDirection)
    where
        C: KeyComparator<K>,
    {
        if self.version == tree.version {
            return;
        }
        trace!(cursor_version = self.version, tree_version = tree.version, "cursor resync");

        match tree.locate(&self.seek_key) {
            None => {
                self.leaf = None;
                self.fwd_index = 0;
                self.hit = false;
            }
            Some((leaf_id, idx, found)) => {
                self.leaf = Some(leaf_id);
                if !self.delivered {
                    // Nothing has been returned yet: reproduce the
                    // exact state a fresh `seek` would have produced.
                    self.hit = found;
                    self.fwd_index = idx;
                } else {
                    // Resume past the last delivered key. Forward
                    // continuation skips over it if it still exists;
                    // backward continuation (and the absent-key case,
                    // which is symmetric either way) does not.
                    self.hit = false;
                    self.fwd_index = idx + usize::from(found && matches!(direction, StepDirection::Forward));
                }
            }
        }
        self.version = tree.version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;
    use std::cmp::Ordering;

    fn int_cmp(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn seek_first_then_next_enumerates_ascending() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        for k in [30, 10, 20] {
            tree.set(k, k * 10);
        }
        let mut cursor = tree.seek_first().unwrap();
        let mut seen = Vec::new();
        while let Some((k, v)) = cursor.next(&tree) {
            seen.push((*k, *v));
        }
        assert_eq!(seen, vec![(10, 100), (20, 200), (30, 300)]);
    }

    #[test]
    fn seek_last_then_prev_is_exact_reverse() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        for k in [30, 10, 20] {
            tree.set(k, k * 10);
        }
        let mut cursor = tree.seek_last().unwrap();
        let mut seen = Vec::new();
        while let Some((k, v)) = cursor.prev(&tree) {
            seen.push((*k, *v));
        }
        assert_eq!(seen, vec![(30, 300), (20, 200), (10, 100)]);
    }

    #[test]
    fn seek_on_empty_tree_is_always_end_of_sequence() {
        let tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        let (mut cursor, hit) = tree.seek(&5);
        assert!(!hit);
        assert_eq!(cursor.next(&tree), None);
        assert_eq!(cursor.prev(&tree), None);
    }

    #[test]
    fn seek_miss_bounds_forward_and_backward() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        for k in [10, 20, 30] {
            tree.set(k, k);
        }
        let (mut fwd, hit) = tree.seek(&15);
        assert!(!hit);
        assert_eq!(fwd.next(&tree), Some((&20, &20)));

        let (mut bwd, hit) = tree.seek(&15);
        assert!(!hit);
        assert_eq!(bwd.prev(&tree), Some((&10, &10)));
    }

    #[test]
    fn prev_at_front_is_end_of_sequence() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        for k in [10, 20, 30] {
            tree.set(k, k);
        }
        let (mut cursor, hit) = tree.seek(&5);
        assert!(!hit);
        assert_eq!(cursor.prev(&tree), None);
    }

    #[test]
    fn enumerator_restart_resumes_forward_past_mutation() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        tree.set(10, 100);
        tree.set(20, 200);
        tree.set(30, 300);

        let (mut cursor, hit) = tree.seek(&15);
        assert!(!hit);

        tree.set(20, 200);
        assert_eq!(cursor.next(&tree), Some((&20, &200)));

        tree.set(20, 200);
        assert_eq!(cursor.next(&tree), Some((&30, &300)));

        tree.set(20, 200);
        assert_eq!(cursor.next(&tree), None);
    }

    #[test]
    fn enumerator_restart_resumes_backward_past_mutation() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        tree.set(10, 100);
        tree.set(20, 200);
        tree.set(30, 300);

        let (mut cursor, hit) = tree.seek(&25);
        assert!(!hit);

        tree.set(20, 200);
        assert_eq!(cursor.prev(&tree), Some((&20, &200)));

        tree.set(20, 200);
        assert_eq!(cursor.prev(&tree), Some((&10, &100)));

        tree.set(20, 200);
        assert_eq!(cursor.prev(&tree), None);
    }
}
