/// An arena-relative page handle. Stands in for the raw page pointers
/// a disk-backed engine would use; stable across `Vec` growth because
/// freed slots are reused in place rather than compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PageId(pub(crate) u32);

/// A leaf (D-page): sorted (K, V) entries plus sibling links.
pub(crate) struct LeafPage<K, V> {
    pub(crate) keys: Vec<K>,
    pub(crate) values: Vec<V>,
    pub(crate) prev: Option<PageId>,
    pub(crate) next: Option<PageId>,
}

impl<K, V> LeafPage<K, V> {
    pub(crate) fn empty() -> Self {
        LeafPage {
            keys: Vec::new(),
            values: Vec::new(),
            prev: None,
            next: None,
        }
    }
}

/// An index (X-page): separator keys plus child pointers. `children`
/// always has one more entry than `keys` (the rightmost child has no
/// upper-bound separator).
pub(crate) struct IndexPage<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) children: Vec<PageId>,
}

impl<K> IndexPage<K> {
    pub(crate) fn empty() -> Self {
        IndexPage {
            keys: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// One arena slot. `Vacant` marks a freed page available for reuse;
/// it carries no stale key/value data past release.
pub(crate) enum Slot<K, V> {
    Leaf(LeafPage<K, V>),
    Index(IndexPage<K>),
    Vacant,
}

impl<K, V> Slot<K, V> {
    pub(crate) fn as_leaf(&self) -> &LeafPage<K, V> {
        match self {
            Slot::Leaf(leaf) => leaf,
            _ => panic!("arena slot is not a leaf page"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafPage<K, V> {
        match self {
            Slot::Leaf(leaf) => leaf,
            _ => panic!("arena slot is not a leaf page"),
        }
    }

    pub(crate) fn as_index(&self) -> &IndexPage<K> {
        match self {
            Slot::Index(idx) => idx,
            _ => panic!("arena slot is not an index page"),
        }
    }

    pub(crate) fn as_index_mut(&mut self) -> &mut IndexPage<K> {
        match self {
            Slot::Index(idx) => idx,
            _ => panic!("arena slot is not an index page"),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Slot::Leaf(_))
    }
}
