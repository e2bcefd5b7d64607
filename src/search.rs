use std::cmp::Ordering;

use crate::comparator::KeyComparator;

/// Binary search within a leaf's sorted keys. Returns `(index,
/// found)`: on a match, `index` is the matching slot; otherwise
/// `index` is the insertion point (the first slot whose key is
/// greater than `target`).
pub(crate) fn search_leaf<K, C: KeyComparator<K>>(keys: &[K], target: &K, cmp: &C) -> (usize, bool) {
    let mut lo = 0usize;
    let mut hi = keys.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match cmp.compare(&keys[mid], target) {
            Ordering::Less => lo = mid + 1,
            Ordering::Equal => return (mid, true),
            Ordering::Greater => hi = mid,
        }
    }
    (lo, false)
}

/// Binary search within an index page's separators, returning the
/// child slot a descent for `target` should follow. This is the
/// upper bound of `target` among the separators: an exact match on
/// `keys[i]` routes to `children[i + 1]`, and a miss routes to the
/// child just before the first separator greater than `target`.
pub(crate) fn search_index<K, C: KeyComparator<K>>(keys: &[K], target: &K, cmp: &C) -> usize {
    let mut lo = 0usize;
    let mut hi = keys.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match cmp.compare(&keys[mid], target) {
            Ordering::Greater => hi = mid,
            Ordering::Less | Ordering::Equal => lo = mid + 1,
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_cmp(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn search_leaf_finds_exact_match() {
        let keys = vec![10, 20, 30, 40];
        assert_eq!(search_leaf(&keys, &30, &int_cmp), (2, true));
    }

    #[test]
    fn search_leaf_returns_insertion_point_on_miss() {
        let keys = vec![10, 20, 30, 40];
        assert_eq!(search_leaf(&keys, &25, &int_cmp), (2, false));
        assert_eq!(search_leaf(&keys, &5, &int_cmp), (0, false));
        assert_eq!(search_leaf(&keys, &45, &int_cmp), (4, false));
    }

    #[test]
    fn search_index_routes_exact_match_to_right_child() {
        let keys = vec![10, 20, 30];
        // four children: (-inf,10) [10,20) [20,30) [30,+inf)
        assert_eq!(search_index(&keys, &20, &int_cmp), 2);
        assert_eq!(search_index(&keys, &15, &int_cmp), 1);
        assert_eq!(search_index(&keys, &5, &int_cmp), 0);
        assert_eq!(search_index(&keys, &35, &int_cmp), 3);
    }
}
