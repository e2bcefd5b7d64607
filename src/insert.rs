use std::cmp::Ordering;

use tracing::debug;

use crate::comparator::KeyComparator;
use crate::page::{IndexPage, LeafPage, PageId, Slot};
use crate::search::search_leaf;
use crate::tree::Tree;

impl<K, V, C> Tree<K, V, C>
where
    K: Clone,
    C: KeyComparator<K>,
{
    /// Insert-or-overwrite.
    pub fn set(&mut self, key: K, value: V) {
        self.ensure_root();
        let (leaf_id, path) = self.descend_to_leaf(&key);
        let (pos, found) = search_leaf(&self.leaf(leaf_id).keys, &key, &self.cmp);
        if found {
            self.leaf_mut(leaf_id).values[pos] = value;
            self.bump_version();
            return;
        }
        self.insert_into_leaf(leaf_id, path, key, value);
    }

    /// Conditional insert/update. `upd` is invoked exactly once with
    /// `(current_value, exists)` and returns `(new_value, write)`.
    /// Returns `(old_value, written)`; when nothing existed, `old_value`
    /// is `V::default()`, not `upd`'s candidate.
    pub fn put<F>(&mut self, key: K, upd: F) -> (V, bool)
    where
        F: FnOnce(Option<&V>, bool) -> (V, bool),
        V: Clone + Default,
    {
        self.ensure_root();
        let (leaf_id, path) = self.descend_to_leaf(&key);
        let (pos, found) = search_leaf(&self.leaf(leaf_id).keys, &key, &self.cmp);
        let existing = found.then(|| self.leaf(leaf_id).values[pos].clone());
        let (new_value, write) = upd(existing.as_ref(), found);

        if !write {
            return (existing.unwrap_or_default(), false);
        }

        if found {
            let old = existing.expect("found implies a prior value");
            self.leaf_mut(leaf_id).values[pos] = new_value;
            self.bump_version();
            return (old, true);
        }

        self.insert_into_leaf(leaf_id, path, key, new_value);
        (V::default(), true)
    }

    /// Inserts a known-absent key into `leaf_id`, splitting first if
    /// the leaf is already full, then propagates any resulting
    /// separator upward along `path`.
    fn insert_into_leaf(&mut self, leaf_id: PageId, mut path: Vec<(PageId, usize)>, key: K, value: V) {
        let full = self.leaf(leaf_id).keys.len() == 2 * self.kd;
        if full {
            let (separator, right_id) = self.split_leaf(leaf_id);
            let target = if self.cmp.compare(&key, &separator) == Ordering::Less {
                leaf_id
            } else {
                right_id
            };
            let (pos, _) = search_leaf(&self.leaf(target).keys, &key, &self.cmp);
            {
                let t = self.leaf_mut(target);
                t.keys.insert(pos, key);
                t.values.insert(pos, value);
            }
            self.insert_into_parent(&mut path, leaf_id, separator, right_id);
        } else {
            let (pos, _) = search_leaf(&self.leaf(leaf_id).keys, &key, &self.cmp);
            let l = self.leaf_mut(leaf_id);
            l.keys.insert(pos, key);
            l.values.insert(pos, value);
        }
        self.len += 1;
        self.bump_version();
    }

    /// Splits a full leaf (c == 2·kd) in half, links the new right
    /// leaf into the sibling chain, and returns `(separator,
    /// right_id)` where `separator == right.keys[0]`.
    fn split_leaf(&mut self, leaf_id: PageId) -> (K, PageId) {
        let kd = self.kd;
        let (right_keys, right_values, old_next) = {
            let leaf = self.leaf_mut(leaf_id);
            let right_keys = leaf.keys.split_off(kd);
            let right_values = leaf.values.split_off(kd);
            (right_keys, right_values, leaf.next)
        };
        let separator = right_keys[0].clone();
        let right_id = self.alloc(Slot::Leaf(LeafPage {
            keys: right_keys,
            values: right_values,
            prev: Some(leaf_id),
            next: old_next,
        }));
        if let Some(n) = old_next {
            self.leaf_mut(n).prev = Some(right_id);
        }
        self.leaf_mut(leaf_id).next = Some(right_id);
        debug!(left = leaf_id.0, right = right_id.0, "split leaf");
        (separator, right_id)
    }

    /// Inserts `(left_child, sep, right_child)` into the parent named
    /// by the last entry of `path` (or grows a new root if `path` is
    /// empty), splitting the parent and recursing upward if it
    /// overflows.
    fn insert_into_parent(&mut self, path: &mut Vec<(PageId, usize)>, left_child: PageId, sep: K, right_child: PageId) {
        match path.pop() {
            None => {
                let mut root = IndexPage::empty();
                root.keys.push(sep);
                root.children.push(left_child);
                root.children.push(right_child);
                let id = self.alloc(Slot::Index(root));
                debug!(new_root = id.0, "grew tree height by one");
                self.root = Some(id);
            }
            Some((parent_id, child_slot)) => {
                {
                    let parent = self.index_mut(parent_id);
                    parent.keys.insert(child_slot, sep);
                    parent.children.insert(child_slot + 1, right_child);
                }
                if self.index(parent_id).children.len() > 2 * self.kx + 1 {
                    let (promoted, right_id) = self.split_index(parent_id);
                    self.insert_into_parent(path, parent_id, promoted, right_id);
                }
            }
        }
    }

    /// Splits an overfull index page (children.len() == 2·kx + 2)
    /// into two pages of kx separators / kx+1 children each,
    /// promoting the middle separator.
    fn split_index(&mut self, idx_id: PageId) -> (K, PageId) {
        let kx = self.kx;
        let (promoted, right_keys, right_children) = {
            let idx = self.index_mut(idx_id);
            let promoted = idx.keys.remove(kx);
            let right_keys = idx.keys.split_off(kx);
            let right_children = idx.children.split_off(kx + 1);
            (promoted, right_keys, right_children)
        };
        let right_id = self.alloc(Slot::Index(IndexPage {
            keys: right_keys,
            children: right_children,
        }));
        debug!(left = idx_id.0, right = right_id.0, "split index page");
        (promoted, right_id)
    }
}
