use tracing::{debug, trace};

use crate::comparator::KeyComparator;
use crate::error::TreeConfigError;
use crate::page::{IndexPage, LeafPage, PageId, Slot};

/// Default leaf half-capacity.
pub const DEFAULT_KD: usize = 64;
/// Default index half-capacity.
pub const DEFAULT_KX: usize = 128;

/// A generic in-memory B+ tree over key type `K`, value type `V`, and
/// comparator `C`.
///
/// `Tree` owns every page in an arena (`Vec<Slot<K, V>>`); pages are
/// addressed by [`PageId`], an arena index that stays valid across
/// `Vec` growth and is recycled on page release rather than leaked.
pub struct Tree<K, V, C> {
    pub(crate) cmp: C,
    pub(crate) arena: Vec<Slot<K, V>>,
    pub(crate) free: Vec<PageId>,
    pub(crate) root: Option<PageId>,
    pub(crate) len: usize,
    pub(crate) version: u64,
    pub(crate) kd: usize,
    pub(crate) kx: usize,
}

impl<K, V, C> Tree<K, V, C>
where
    C: KeyComparator<K>,
{
    /// Builds an empty tree using the default capacities (kd=64,
    /// kx=128).
    pub fn new(cmp: C) -> Self {
        Self::with_capacities(cmp, DEFAULT_KD, DEFAULT_KX)
            .expect("default capacities are always valid")
    }

    /// Builds an empty tree with explicit leaf/index half-capacities.
    /// Returns [`TreeConfigError`] if either is zero.
    pub fn with_capacities(cmp: C, kd: usize, kx: usize) -> Result<Self, TreeConfigError> {
        if kd == 0 {
            return Err(TreeConfigError::InvalidLeafCapacity(kd));
        }
        if kx == 0 {
            return Err(TreeConfigError::InvalidIndexCapacity(kx));
        }
        Ok(Tree {
            cmp,
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            version: 0,
            kd,
            kx,
        })
    }

    /// Number of (K, V) pairs currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Releases all pages and resets the tree to the empty state.
    /// Subsequent calls behave exactly as on a freshly constructed
    /// empty tree.
    pub fn close(&mut self) {
        debug!(pages = self.arena.len(), "closing tree, releasing pages");
        self.arena.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Point lookup. `None` means the key is absent.
    pub fn get(&self, key: &K) -> Option<&V> {
        let (leaf_id, idx, found) = self.locate(key)?;
        if found {
            Some(&self.leaf(leaf_id).values[idx])
        } else {
            None
        }
    }

    // -- arena plumbing --------------------------------------------------

    pub(crate) fn alloc(&mut self, slot: Slot<K, V>) -> PageId {
        if let Some(id) = self.free.pop() {
            self.arena[id.0 as usize] = slot;
            id
        } else {
            let id = PageId(self.arena.len() as u32);
            self.arena.push(slot);
            id
        }
    }

    pub(crate) fn free(&mut self, id: PageId) {
        self.arena[id.0 as usize] = Slot::Vacant;
        self.free.push(id);
    }

    pub(crate) fn leaf(&self, id: PageId) -> &LeafPage<K, V> {
        self.arena[id.0 as usize].as_leaf()
    }

    pub(crate) fn leaf_mut(&mut self, id: PageId) -> &mut LeafPage<K, V> {
        self.arena[id.0 as usize].as_leaf_mut()
    }

    pub(crate) fn index(&self, id: PageId) -> &IndexPage<K> {
        self.arena[id.0 as usize].as_index()
    }

    pub(crate) fn index_mut(&mut self, id: PageId) -> &mut IndexPage<K> {
        self.arena[id.0 as usize].as_index_mut()
    }

    pub(crate) fn is_leaf(&self, id: PageId) -> bool {
        self.arena[id.0 as usize].is_leaf()
    }

    /// Creates an empty leaf root if the tree currently has none.
    pub(crate) fn ensure_root(&mut self) {
        if self.root.is_none() {
            let id = self.alloc(Slot::Leaf(LeafPage::empty()));
            self.root = Some(id);
        }
    }

    /// Read-only descent: locate the leaf and in-leaf position for
    /// `key`, without recording the path of ancestors (used by `get`
    /// and by cursor resync, neither of which mutate the tree).
    pub(crate) fn locate(&self, key: &K) -> Option<(PageId, usize, bool)> {
        let mut current = self.root?;
        loop {
            match &self.arena[current.0 as usize] {
                Slot::Leaf(leaf) => {
                    let (idx, found) = crate::search::search_leaf(&leaf.keys, key, &self.cmp);
                    return Some((current, idx, found));
                }
                Slot::Index(idx_page) => {
                    let slot = crate::search::search_index(&idx_page.keys, key, &self.cmp);
                    current = idx_page.children[slot];
                }
                Slot::Vacant => unreachable!("descent hit a freed page"),
            }
        }
    }

    /// Mutating descent: same as [`Tree::locate`] but also records
    /// the path of `(ancestor, child_slot)` pairs taken, so callers
    /// can propagate splits/merges back up without re-descending.
    /// Assumes the root already exists.
    pub(crate) fn descend_to_leaf(&self, key: &K) -> (PageId, Vec<(PageId, usize)>) {
        let mut path = Vec::new();
        let mut current = self.root.expect("descend_to_leaf requires an existing root");
        loop {
            match &self.arena[current.0 as usize] {
                Slot::Leaf(_) => return (current, path),
                Slot::Index(idx_page) => {
                    let slot = crate::search::search_index(&idx_page.keys, key, &self.cmp);
                    path.push((current, slot));
                    current = idx_page.children[slot];
                }
                Slot::Vacant => unreachable!("descent hit a freed page"),
            }
        }
    }

    /// Clones the first key of the leftmost leaf reachable from
    /// `id`'s subtree, used to recompute separators after a leaf's
    /// first entry is removed.
    pub(crate) fn first_key_of_subtree(&self, mut id: PageId) -> K
    where
        K: Clone,
    {
        loop {
            match &self.arena[id.0 as usize] {
                Slot::Leaf(leaf) => return leaf.keys[0].clone(),
                Slot::Index(idx) => id = idx.children[0],
                Slot::Vacant => unreachable!("descent hit a freed page"),
            }
        }
    }

    pub(crate) fn leftmost_key(&self) -> Option<K>
    where
        K: Clone,
    {
        let mut id = self.root?;
        loop {
            match &self.arena[id.0 as usize] {
                Slot::Leaf(leaf) => return leaf.keys.first().cloned(),
                Slot::Index(idx) => id = idx.children[0],
                Slot::Vacant => unreachable!("descent hit a freed page"),
            }
        }
    }

    pub(crate) fn rightmost_key(&self) -> Option<K>
    where
        K: Clone,
    {
        let mut id = self.root?;
        loop {
            match &self.arena[id.0 as usize] {
                Slot::Leaf(leaf) => return leaf.keys.last().cloned(),
                Slot::Index(idx) => id = *idx.children.last().expect("index page has no children"),
                Slot::Vacant => unreachable!("descent hit a freed page"),
            }
        }
    }

    pub(crate) fn leaf_entry(&self, id: PageId, idx: usize) -> Option<(&K, &V)> {
        let leaf = self.leaf(id);
        if idx < leaf.keys.len() {
            Some((&leaf.keys[idx], &leaf.values[idx]))
        } else {
            None
        }
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
        trace!(version = self.version, "version bumped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn int_cmp(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn new_tree_is_empty() {
        let tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.get(&42), None);
    }

    #[test]
    fn rejects_zero_capacities() {
        assert_eq!(
            Tree::<i32, i32, _>::with_capacities(int_cmp, 0, 128).unwrap_err(),
            TreeConfigError::InvalidLeafCapacity(0)
        );
        assert_eq!(
            Tree::<i32, i32, _>::with_capacities(int_cmp, 64, 0).unwrap_err(),
            TreeConfigError::InvalidIndexCapacity(0)
        );
    }

    #[test]
    fn close_resets_to_empty_terminal_state() {
        let mut tree: Tree<i32, i32, _> = Tree::new(int_cmp);
        tree.ensure_root();
        tree.leaf_mut(tree.root.unwrap()).keys.push(1);
        tree.close();
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.get(&1), None);
    }
}
