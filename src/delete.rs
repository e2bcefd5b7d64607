use std::mem;

use tracing::debug;

use crate::comparator::KeyComparator;
use crate::page::PageId;
use crate::search::search_leaf;
use crate::tree::Tree;

impl<K, V, C> Tree<K, V, C>
where
    K: Clone,
    C: KeyComparator<K>,
{
    /// Removes `key` if present, rebalancing the tree on the way back
    /// up when a leaf underflows. Returns whether the key was present.
    pub fn delete(&mut self, key: &K) -> bool {
        if self.root.is_none() {
            return false;
        }
        let (leaf_id, path) = self.descend_to_leaf(key);
        let (pos, found) = search_leaf(&self.leaf(leaf_id).keys, key, &self.cmp);
        if !found {
            return false;
        }

        self.leaf_mut(leaf_id).keys.remove(pos);
        self.leaf_mut(leaf_id).values.remove(pos);
        self.len -= 1;
        self.bump_version();

        if pos == 0 {
            self.fix_separator_after_shrink(&path);
        }

        let is_root = path.is_empty();
        if is_root {
            if self.leaf(leaf_id).keys.is_empty() {
                debug!("leaf root emptied, resetting tree");
                self.free(leaf_id);
                self.root = None;
            }
            return true;
        }

        if self.leaf(leaf_id).keys.len() >= self.kd {
            return true;
        }

        self.rebalance_leaf(leaf_id, path);
        true
    }

    /// When a leaf's first entry was removed, the separator pointing
    /// to it (held by the lowest ancestor where this subtree is not
    /// the leftmost child) is stale and must be refreshed to the
    /// leaf's new first key.
    fn fix_separator_after_shrink(&mut self, path: &[(PageId, usize)]) {
        for &(ancestor_id, slot) in path.iter().rev() {
            if slot > 0 {
                let child = self.index(ancestor_id).children[slot];
                let new_key = self.first_key_of_subtree(child);
                self.index_mut(ancestor_id).keys[slot - 1] = new_key;
                return;
            }
        }
    }

    /// Rebalances an underfull leaf (`leaf_id`, reached via `path`)
    /// against a sibling under the same parent: borrow first, merge
    /// as a last resort.
    fn rebalance_leaf(&mut self, leaf_id: PageId, mut path: Vec<(PageId, usize)>) {
        let (parent_id, slot) = path.pop().expect("non-root leaf always has a parent");
        let left_sib = (slot > 0).then(|| self.index(parent_id).children[slot - 1]);
        let right_sib = (slot + 1 < self.index(parent_id).children.len())
            .then(|| self.index(parent_id).children[slot + 1]);

        if let Some(left_id) = left_sib {
            if self.leaf(left_id).keys.len() > self.kd {
                let (k, v) = {
                    let l = self.leaf_mut(left_id);
                    (l.keys.pop().unwrap(), l.values.pop().unwrap())
                };
                {
                    let cur = self.leaf_mut(leaf_id);
                    cur.keys.insert(0, k.clone());
                    cur.values.insert(0, v);
                }
                self.index_mut(parent_id).keys[slot - 1] = k;
                debug!(from = left_id.0, to = leaf_id.0, "leaf borrow from left sibling");
                return;
            }
        }
        if let Some(right_id) = right_sib {
            if self.leaf(right_id).keys.len() > self.kd {
                let (k, v) = {
                    let r = self.leaf_mut(right_id);
                    (r.keys.remove(0), r.values.remove(0))
                };
                {
                    let cur = self.leaf_mut(leaf_id);
                    cur.keys.push(k);
                    cur.values.push(v);
                }
                let new_first = self.leaf(right_id).keys[0].clone();
                self.index_mut(parent_id).keys[slot] = new_first;
                debug!(from = right_id.0, to = leaf_id.0, "leaf borrow from right sibling");
                return;
            }
        }

        if let Some(left_id) = left_sib {
            let (ck, cv, cnext) = {
                let cur = self.leaf_mut(leaf_id);
                (mem::take(&mut cur.keys), mem::take(&mut cur.values), cur.next)
            };
            {
                let l = self.leaf_mut(left_id);
                l.keys.extend(ck);
                l.values.extend(cv);
                l.next = cnext;
            }
            if let Some(n) = cnext {
                self.leaf_mut(n).prev = Some(left_id);
            }
            self.free(leaf_id);
            debug!(survivor = left_id.0, absorbed = leaf_id.0, "leaf merge into left sibling");
            let parent = self.index_mut(parent_id);
            parent.keys.remove(slot - 1);
            parent.children.remove(slot);
        } else if let Some(right_id) = right_sib {
            let (rk, rv, rnext) = {
                let r = self.leaf_mut(right_id);
                (mem::take(&mut r.keys), mem::take(&mut r.values), r.next)
            };
            {
                let cur = self.leaf_mut(leaf_id);
                cur.keys.extend(rk);
                cur.values.extend(rv);
                cur.next = rnext;
            }
            if let Some(n) = rnext {
                self.leaf_mut(n).prev = Some(leaf_id);
            }
            self.free(right_id);
            debug!(survivor = leaf_id.0, absorbed = right_id.0, "leaf merge from right sibling");
            let parent = self.index_mut(parent_id);
            parent.keys.remove(slot);
            parent.children.remove(slot + 1);
        } else {
            unreachable!("a non-root leaf always has at least one sibling");
        }

        self.maybe_rebalance_index(parent_id, path);
    }

    /// Checks whether `idx_id` (reached via `path`) underflowed after
    /// losing a child, and borrows/merges/collapses as needed,
    /// recursing further up `path` if a merge propagates.
    fn maybe_rebalance_index(&mut self, idx_id: PageId, mut path: Vec<(PageId, usize)>) {
        let is_root = path.is_empty();
        let count = self.index(idx_id).children.len();

        if is_root {
            if count == 1 {
                let only_child = self.index(idx_id).children[0];
                self.free(idx_id);
                self.root = Some(only_child);
                debug!(new_root = only_child.0, "root index collapsed, height shrank by one");
            }
            return;
        }

        if count >= self.kx + 1 {
            return;
        }

        let (parent_id, slot) = path.pop().expect("checked is_root above");
        let left_sib = (slot > 0).then(|| self.index(parent_id).children[slot - 1]);
        let right_sib = (slot + 1 < self.index(parent_id).children.len())
            .then(|| self.index(parent_id).children[slot + 1]);

        if let Some(left_id) = left_sib {
            if self.index(left_id).children.len() > self.kx + 1 {
                let (moved_child, moved_key) = {
                    let l = self.index_mut(left_id);
                    (l.children.pop().unwrap(), l.keys.pop().unwrap())
                };
                let parent_sep = self.index(parent_id).keys[slot - 1].clone();
                {
                    let cur = self.index_mut(idx_id);
                    cur.keys.insert(0, parent_sep);
                    cur.children.insert(0, moved_child);
                }
                self.index_mut(parent_id).keys[slot - 1] = moved_key;
                debug!(from = left_id.0, to = idx_id.0, "index borrow from left sibling");
                return;
            }
        }
        if let Some(right_id) = right_sib {
            if self.index(right_id).children.len() > self.kx + 1 {
                let (moved_child, moved_key) = {
                    let r = self.index_mut(right_id);
                    (r.children.remove(0), r.keys.remove(0))
                };
                let parent_sep = self.index(parent_id).keys[slot].clone();
                {
                    let cur = self.index_mut(idx_id);
                    cur.keys.push(parent_sep);
                    cur.children.push(moved_child);
                }
                self.index_mut(parent_id).keys[slot] = moved_key;
                debug!(from = right_id.0, to = idx_id.0, "index borrow from right sibling");
                return;
            }
        }

        if let Some(left_id) = left_sib {
            let sep = self.index(parent_id).keys[slot - 1].clone();
            let (ck, cchildren) = {
                let cur = self.index_mut(idx_id);
                (mem::take(&mut cur.keys), mem::take(&mut cur.children))
            };
            {
                let l = self.index_mut(left_id);
                l.keys.push(sep);
                l.keys.extend(ck);
                l.children.extend(cchildren);
            }
            self.free(idx_id);
            debug!(survivor = left_id.0, absorbed = idx_id.0, "index merge into left sibling");
            let parent = self.index_mut(parent_id);
            parent.keys.remove(slot - 1);
            parent.children.remove(slot);
        } else if let Some(right_id) = right_sib {
            let sep = self.index(parent_id).keys[slot].clone();
            let (rk, rchildren) = {
                let r = self.index_mut(right_id);
                (mem::take(&mut r.keys), mem::take(&mut r.children))
            };
            {
                let cur = self.index_mut(idx_id);
                cur.keys.push(sep);
                cur.keys.extend(rk);
                cur.children.extend(rchildren);
            }
            self.free(right_id);
            debug!(survivor = idx_id.0, absorbed = right_id.0, "index merge from right sibling");
            let parent = self.index_mut(parent_id);
            parent.keys.remove(slot);
            parent.children.remove(slot + 1);
        } else {
            unreachable!("a non-root index page always has at least one sibling");
        }

        self.maybe_rebalance_index(parent_id, path);
    }
}
