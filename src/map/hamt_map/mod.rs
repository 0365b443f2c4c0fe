/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

mod sparse_array_u32;

#[cfg(feature = "rayon")]
pub mod rayon;

use self::sparse_array_u32::SparseArrayU32;
use crate::map::entry::Entry;
use crate::utils::DefaultBuildHasher;
use crate::utils::vec_utils::VecUtils;
use archery::{ArcK as ArcTK, RcK, SharedPointer, SharedPointerKind};
use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::{BuildHasher, Hash};
use std::iter::Peekable;
use std::ops::Index;
use std::slice;

type HashValue = u32;

// TODO Use impl trait instead of this when available.
pub type Iter<'a, K, V, P> = std::iter::Map<
    IterPtr<'a, K, V, P>,
    fn(&'a SharedPointer<Entry<K, V>, P>) -> (&'a K, &'a V),
>;
pub type IterKeys<'a, K, V, P> = std::iter::Map<Iter<'a, K, V, P>, fn((&'a K, &V)) -> &'a K>;
pub type IterValues<'a, K, V, P> = std::iter::Map<Iter<'a, K, V, P>, fn((&K, &'a V)) -> &'a V>;

/// Creates a [`HamtMap`](crate::HamtMap) containing the given arguments:
///
/// ```
/// # use hamt::*;
/// #
/// let m = HamtMap::new()
///     .insert(1, "one")
///     .insert(2, "two")
///     .insert(3, "three");
///
/// assert_eq!(hamt_map![1 => "one", 2 => "two", 3 => "three"], m);
/// ```
#[macro_export]
macro_rules! hamt_map {
    ($($k:expr => $v:expr),*) => {
        {
            #[allow(unused_mut)]
            let mut m = $crate::HamtMap::new();
            $(
                m.insert_mut($k, $v);
            )*
            m
        }
    };
}

/// Creates a [`HamtMap`](crate::HamtMap) that implements `Sync`, containing
/// the given arguments:
///
/// ```
/// # use hamt::*;
/// #
/// let m = HamtMap::new_sync()
///     .insert(1, "one")
///     .insert(2, "two")
///     .insert(3, "three");
///
/// assert_eq!(hamt_map_sync![1 => "one", 2 => "two", 3 => "three"], m);
/// ```
#[macro_export]
macro_rules! hamt_map_sync {
    ($($k:expr => $v:expr),*) => {
        {
            #[allow(unused_mut)]
            let mut m = $crate::HamtMap::new_sync();
            $(
                m.insert_mut($k, $v);
            )*
            m
        }
    };
}

/// A persistent map with structural sharing.  This implementation uses a
/// [hash array mapped trie](https://en.wikipedia.org/wiki/Hash_array_mapped_trie).
///
/// # Complexity
///
/// Let *n* be the number of elements in the map.
///
/// ## Temporal complexity
///
/// | Operation                  | Average   | Worst case  |
/// |:-------------------------- | ---------:| -----------:|
/// | `new()`                    |      Θ(1) |        Θ(1) |
/// | `insert()`                 |      Θ(1) |        Θ(n) |
/// | `remove()`                 |      Θ(1) |        Θ(n) |
/// | `get()`                    |      Θ(1) |        Θ(n) |
/// | `contains_key()`           |      Θ(1) |        Θ(n) |
/// | `size()`                   |      Θ(1) |        Θ(1) |
/// | `clone()`                  |      Θ(1) |        Θ(1) |
/// | iterator creation          |      Θ(1) |        Θ(1) |
/// | iterator step              |      Θ(1) |        Θ(1) |
/// | iterator full              |      Θ(n) |        Θ(n) |
///
/// # Implementation details
///
/// See the `Node` documentation for details.
#[derive(Debug)]
pub struct HamtMap<K, V, P = RcK, H: BuildHasher = DefaultBuildHasher>
where
    P: SharedPointerKind,
{
    root: SharedPointer<Node<K, V, P>, P>,
    size: usize,
    hasher_builder: H,
}

pub type HamtMapSync<K, V, H = DefaultBuildHasher> = HamtMap<K, V, ArcTK, H>;

/// A node of the trie.  The trie consumes the 32-bit hash of a key five
/// bits at a time: a node at level shift `s` dispatches on hash bits
/// `[s, s + 5)`, for `s ∈ {0, 5, 10, 15, 20, 25, 30}`.
///
/// Consider keys *A*, *B*, and *C* with these hashes:
///
/// | *key*   | *hash(key)*                   |
/// | ------- | -----------------------------:|
/// |   *A*   | `0b_···_00010_00110`          |
/// |   *B*   | `0b_···_00111_00110`          |
/// |   *C*   | `0b_···_00001_01011`          |
///
/// *C* is alone in slot `0b01011` of the root, so it stays a leaf there.
/// *A* and *B* share slot `0b00110`, so that slot holds an inner node that
/// dispatches on the next five bits, where they part ways:
///
/// ```text
///          ···  0b00110  ···  0b01011  ···
///         ├───┼─────────┼───┼─────────┼───┤
///         │ ∅ │    •    │ ∅ │    C    │ ∅ │      shift 0
///         └───┴────│────┴───┴─────────┴───┘
///                  │
///          ···  0b00010  ···  0b00111  ···
///         ├───┼─────────┼───┼─────────┼───┤
///         │ ∅ │    A    │ ∅ │    B    │ ∅ │      shift 5
///         └───┴─────────┴───┴─────────┴───┘
/// ```
///
/// Keys whose full 32-bit hashes are equal can never be told apart by slot
/// dispatch; they live together in a collision node.
///
/// # Invariants
///
/// The tree maintains the following invariants:
///
///   1. A leaf's stored hash is the hash of its key.
///   2. A collision bucket holds at least two entries; all of them share
///      the node's hash and no two of them share a key.
///   3. A bitmapped node has between 1 and 31 children; a full node has
///      exactly 32.
///   4. An empty node never appears as a child of an inner node, and the
///      root of a non-empty map is never empty.
///   5. A bitmapped node whose sole child is a leaf or a collision node is
///      replaced by that child (see `BitmappedNode::removing`).
#[derive(Debug)]
enum Node<K, V, P>
where
    P: SharedPointerKind,
{
    Empty,
    Leaf(EntryWithHash<K, V, P>),
    Collision(CollisionNode<K, V, P>),
    Bitmapped(BitmappedNode<K, V, P>),
    Full(FullNode<K, V, P>),
}

/// Bucket of entries whose full 32-bit hashes are all equal to `hash` but
/// whose keys are pairwise distinct.
#[derive(Debug)]
struct CollisionNode<K, V, P>
where
    P: SharedPointerKind,
{
    hash: HashValue,
    bucket: Vec<EntryWithHash<K, V, P>>,
}

/// Inner node with 1..=31 children, kept in a compressed array.
#[derive(Debug)]
struct BitmappedNode<K, V, P>
where
    P: SharedPointerKind,
{
    shift: u32,
    size: usize,
    children: SparseArrayU32<SharedPointer<Node<K, V, P>, P>>,
}

/// Inner node with all 32 slots occupied, addressed directly.
#[derive(Debug)]
struct FullNode<K, V, P>
where
    P: SharedPointerKind,
{
    shift: u32,
    size: usize,
    children: Vec<SharedPointer<Node<K, V, P>, P>>,
}

#[derive(Debug)]
struct EntryWithHash<K, V, P>
where
    P: SharedPointerKind,
{
    entry: SharedPointer<Entry<K, V>, P>,
    key_hash: HashValue,
}

mod node_utils {
    use super::HashValue;
    use archery::{SharedPointer, SharedPointerKind};
    use std::hash::{BuildHasher, Hash, Hasher};

    pub const BITS_PER_LEVEL: u32 = 5;
    pub const DEGREE: usize = 1 << BITS_PER_LEVEL;

    /// Number of levels needed to consume a 32-bit hash five bits at a time.
    pub const MAX_HEIGHT: usize = 1 + (u32::BITS as usize - 1) / BITS_PER_LEVEL as usize;

    const MASK: HashValue = DEGREE as HashValue - 1;

    /// Returns the child slot for `hash` at the level that consumes hash
    /// bits `[shift, shift + 5)`.  The shift on an unsigned value is
    /// logical, so high hash bits never smear into the slot.
    #[inline]
    pub fn index_from_hash(hash: HashValue, shift: u32) -> usize {
        debug_assert!(shift < u32::BITS);

        ((hash >> shift) & MASK) as usize
    }

    /// The trie dispatches on the low 32 bits of the hasher output.
    pub fn hash<T: ?Sized + Hash, H: BuildHasher>(v: &T, hasher_builder: &H) -> HashValue {
        let mut hasher = hasher_builder.build_hasher();

        v.hash(&mut hasher);

        hasher.finish() as HashValue
    }

    /// Whether two shared handles designate the same node.  This is the
    /// "nothing changed" signal of the update operations, distinct from
    /// value equality.
    #[inline]
    pub fn same_node<T, P: SharedPointerKind>(
        a: &SharedPointer<T, P>,
        b: &SharedPointer<T, P>,
    ) -> bool {
        std::ptr::eq::<T>(&**a, &**b)
    }
}

impl<K, V, P> Node<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    /// Total number of entries stored beneath this node.  Inner nodes carry
    /// their count, so this never recurses.
    fn size(&self) -> usize {
        match self {
            Node::Empty => 0,
            Node::Leaf(_) => 1,
            Node::Collision(collision) => collision.bucket.len(),
            Node::Bitmapped(bitmapped) => bitmapped.size,
            Node::Full(full) => full.size,
        }
    }

    fn get<Q: ?Sized>(&self, key: &Q, key_hash: HashValue) -> Option<&EntryWithHash<K, V, P>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        match self {
            Node::Empty => None,
            Node::Leaf(entry) => {
                if entry.matches(key, key_hash) {
                    Some(entry)
                } else {
                    None
                }
            }
            Node::Collision(collision) => collision.get(key, key_hash),
            Node::Bitmapped(bitmapped) => {
                let index = node_utils::index_from_hash(key_hash, bitmapped.shift);

                bitmapped.children.get(index).and_then(|child| child.get(key, key_hash))
            }
            Node::Full(full) => {
                let index = node_utils::index_from_hash(key_hash, full.shift);

                full.children[index].get(key, key_hash)
            }
        }
    }

    /// Inserts `entry` in the subtree rooted at `node`, which consumes hash
    /// bits starting at `shift`.  Returns the root of the rebuilt subtree;
    /// everything not on the path to the entry is shared with `node`.
    fn insert(
        node: &SharedPointer<Node<K, V, P>, P>,
        shift: u32,
        entry: EntryWithHash<K, V, P>,
    ) -> SharedPointer<Node<K, V, P>, P> {
        match &**node {
            Node::Empty => SharedPointer::new(Node::Leaf(entry)),
            Node::Leaf(existing) => {
                if existing.matches(entry.key(), entry.key_hash) {
                    SharedPointer::new(Node::Leaf(entry))
                } else if existing.key_hash == entry.key_hash {
                    SharedPointer::new(Node::Collision(CollisionNode {
                        hash: entry.key_hash,
                        bucket: vec![entry, existing.clone()],
                    }))
                } else {
                    let existing_hash = existing.key_hash;

                    SharedPointer::new(Node::join(node.clone(), existing_hash, shift, entry))
                }
            }
            Node::Collision(collision) => {
                if entry.key_hash == collision.hash {
                    SharedPointer::new(Node::Collision(collision.with_entry(entry)))
                } else {
                    let existing_hash = collision.hash;

                    SharedPointer::new(Node::join(node.clone(), existing_hash, shift, entry))
                }
            }
            Node::Bitmapped(bitmapped) => SharedPointer::new(bitmapped.inserting(shift, entry)),
            Node::Full(full) => SharedPointer::new(Node::Full(full.inserting(shift, entry))),
        }
    }

    /// Builds the inner node that discriminates, at `shift`, between an
    /// existing leaf or collision node and a new entry whose hash differs
    /// from the node's stored hash.  When both hashes fall into the same
    /// slot at this level the discrimination happens one level down; the
    /// recursion is bounded because differing hashes diverge before the 32
    /// bits run out.
    fn join(
        existing: SharedPointer<Node<K, V, P>, P>,
        existing_hash: HashValue,
        shift: u32,
        entry: EntryWithHash<K, V, P>,
    ) -> Node<K, V, P> {
        debug_assert!(entry.key_hash != existing_hash);
        debug_assert!(matches!(&*existing, Node::Leaf(_) | Node::Collision(_)));

        let existing_index = node_utils::index_from_hash(existing_hash, shift);
        let entry_index = node_utils::index_from_hash(entry.key_hash, shift);
        let existing_size = existing.size();

        if existing_index == entry_index {
            let child = Node::insert(&existing, shift + node_utils::BITS_PER_LEVEL, entry);
            let size = child.size();

            Node::Bitmapped(BitmappedNode {
                shift,
                size,
                children: SparseArrayU32::new().set(existing_index, child),
            })
        } else {
            let leaf = SharedPointer::new(Node::Leaf(entry));

            Node::Bitmapped(BitmappedNode {
                shift,
                size: existing_size + 1,
                children: SparseArrayU32::new()
                    .set(existing_index, existing)
                    .set(entry_index, leaf),
            })
        }
    }

    /// Removes `key` from the subtree rooted at `node`.  Returns `node`'s
    /// own handle when the key is absent, so callers can cheaply detect
    /// that nothing changed.
    fn remove<Q: ?Sized>(
        node: &SharedPointer<Node<K, V, P>, P>,
        key: &Q,
        key_hash: HashValue,
    ) -> SharedPointer<Node<K, V, P>, P>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        match &**node {
            Node::Empty => node.clone(),
            Node::Leaf(entry) => {
                if entry.matches(key, key_hash) {
                    SharedPointer::new(Node::Empty)
                } else {
                    node.clone()
                }
            }
            Node::Collision(collision) => match collision.without(key, key_hash) {
                Some(new_node) => SharedPointer::new(new_node),
                None => node.clone(),
            },
            Node::Bitmapped(bitmapped) => bitmapped.removing(node, key, key_hash),
            Node::Full(full) => full.removing(node, key, key_hash),
        }
    }
}

impl<K, V, P> CollisionNode<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn get<Q: ?Sized>(&self, key: &Q, key_hash: HashValue) -> Option<&EntryWithHash<K, V, P>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.bucket.iter().find(|entry| entry.matches(key, key_hash))
    }

    /// Rebuilds the bucket with `entry` at the front, dropping any previous
    /// binding of the same key.  Front placement favors keys with high
    /// temporal locality, since lookups scan the bucket in order.
    fn with_entry(&self, entry: EntryWithHash<K, V, P>) -> CollisionNode<K, V, P> {
        debug_assert_eq!(entry.key_hash, self.hash);

        let mut bucket: Vec<EntryWithHash<K, V, P>> = Vec::with_capacity(self.bucket.len() + 1);

        bucket.extend(self.bucket.iter().filter(|e| e.key() != entry.key()).cloned());
        bucket.insert(0, entry);

        CollisionNode { hash: self.hash, bucket }
    }

    /// Returns the node that replaces this one once `key` is dropped from
    /// the bucket, or `None` when the key is not in it.  A bucket shrunk to
    /// a single entry becomes a leaf.
    fn without<Q: ?Sized>(&self, key: &Q, key_hash: HashValue) -> Option<Node<K, V, P>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let mut new_bucket: Vec<EntryWithHash<K, V, P>> =
            self.bucket.iter().filter(|e| !e.matches(key, key_hash)).cloned().collect();

        if new_bucket.len() == self.bucket.len() {
            return None;
        }

        match new_bucket.len() {
            0 => unreachable!("a collision bucket holds at least two entries"),
            1 => Some(Node::Leaf(new_bucket.swap_remove(0))),
            _ => Some(Node::Collision(CollisionNode { hash: self.hash, bucket: new_bucket })),
        }
    }
}

impl<K, V, P> BitmappedNode<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    /// Rebuilds this node with `entry` added.  Populating the last vacant
    /// slot promotes the node to a full one.
    fn inserting(&self, shift: u32, entry: EntryWithHash<K, V, P>) -> Node<K, V, P> {
        debug_assert_eq!(self.shift, shift);

        let index = node_utils::index_from_hash(entry.key_hash, self.shift);

        match self.children.get(index) {
            Some(child) => {
                let new_child = Node::insert(child, self.shift + node_utils::BITS_PER_LEVEL, entry);
                let size = self.size - child.size() + new_child.size();

                Node::Bitmapped(BitmappedNode {
                    shift: self.shift,
                    size,
                    children: self.children.set(index, new_child),
                })
            }
            None => {
                let leaf = SharedPointer::new(Node::Leaf(entry));
                let children = self.children.set(index, leaf);
                let size = self.size + 1;

                if children.is_full() {
                    Node::Full(FullNode { shift: self.shift, size, children: children.into_vec() })
                } else {
                    Node::Bitmapped(BitmappedNode { shift: self.shift, size, children })
                }
            }
        }
    }

    /// Removes `key` beneath this node.  `node` is the handle of this very
    /// node, returned unchanged when the key is absent.
    fn removing<Q: ?Sized>(
        &self,
        node: &SharedPointer<Node<K, V, P>, P>,
        key: &Q,
        key_hash: HashValue,
    ) -> SharedPointer<Node<K, V, P>, P>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let index = node_utils::index_from_hash(key_hash, self.shift);
        let child = match self.children.get(index) {
            Some(child) => child,
            None => return node.clone(),
        };

        let new_child = Node::remove(child, key, key_hash);

        if node_utils::same_node(&new_child, child) {
            return node.clone();
        }

        if let Node::Empty = &*new_child {
            let children = self.children.remove(index);

            match children.size() {
                0 => SharedPointer::new(Node::Empty),
                1 => {
                    let survivor =
                        children.first().expect("a nonzero bitmap maps to a nonempty array");

                    // A leaf or collision node carries its full hash, so it
                    // can sit anywhere on the path; an inner node is bound
                    // to its level and must stay wrapped.
                    match &**survivor {
                        Node::Leaf(_) | Node::Collision(_) => survivor.clone(),
                        Node::Bitmapped(_) | Node::Full(_) => {
                            SharedPointer::new(Node::Bitmapped(BitmappedNode {
                                shift: self.shift,
                                size: self.size - 1,
                                children,
                            }))
                        }
                        Node::Empty => unreachable!("inner nodes have no empty children"),
                    }
                }
                _ => SharedPointer::new(Node::Bitmapped(BitmappedNode {
                    shift: self.shift,
                    size: self.size - 1,
                    children,
                })),
            }
        } else {
            SharedPointer::new(Node::Bitmapped(BitmappedNode {
                shift: self.shift,
                size: self.size - 1,
                children: self.children.set(index, new_child),
            }))
        }
    }
}

impl<K, V, P> FullNode<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn inserting(&self, shift: u32, entry: EntryWithHash<K, V, P>) -> FullNode<K, V, P> {
        debug_assert_eq!(self.shift, shift);

        let index = node_utils::index_from_hash(entry.key_hash, self.shift);
        let child = &self.children[index];
        let new_child = Node::insert(child, self.shift + node_utils::BITS_PER_LEVEL, entry);

        FullNode {
            shift: self.shift,
            size: self.size - child.size() + new_child.size(),
            children: self.children.cloned_set(index, new_child),
        }
    }

    /// Removes `key` beneath this node.  Emptying a slot demotes the node
    /// back to a bitmapped one with 31 children.
    fn removing<Q: ?Sized>(
        &self,
        node: &SharedPointer<Node<K, V, P>, P>,
        key: &Q,
        key_hash: HashValue,
    ) -> SharedPointer<Node<K, V, P>, P>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let index = node_utils::index_from_hash(key_hash, self.shift);
        let child = &self.children[index];
        let new_child = Node::remove(child, key, key_hash);

        if node_utils::same_node(&new_child, child) {
            return node.clone();
        }

        if let Node::Empty = &*new_child {
            let bitmap = u32::MAX ^ (1u32 << index);

            SharedPointer::new(Node::Bitmapped(BitmappedNode {
                shift: self.shift,
                size: self.size - 1,
                children: SparseArrayU32::from_parts(bitmap, self.children.cloned_remove(index)),
            }))
        } else {
            SharedPointer::new(Node::Full(FullNode {
                shift: self.shift,
                size: self.size - 1,
                children: self.children.cloned_set(index, new_child),
            }))
        }
    }
}

impl<K, V, P> EntryWithHash<K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn new<H: BuildHasher>(key: K, value: V, hasher_builder: &H) -> EntryWithHash<K, V, P> {
        let key_hash = node_utils::hash(&key, hasher_builder);

        EntryWithHash { entry: SharedPointer::new(Entry::new(key, value)), key_hash }
    }

    fn key(&self) -> &K {
        &self.entry.key
    }

    fn value(&self) -> &V {
        &self.entry.value
    }

    #[inline]
    fn matches<Q: ?Sized>(&self, key: &Q, key_hash: HashValue) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.key_hash == key_hash && self.key().borrow() == key
    }
}

impl<K, V, P> Clone for EntryWithHash<K, V, P>
where
    P: SharedPointerKind,
{
    fn clone(&self) -> EntryWithHash<K, V, P> {
        EntryWithHash {
            entry: SharedPointer::clone(&self.entry),
            key_hash: self.key_hash,
        }
    }
}

impl<K, V> HamtMap<K, V, RcK, DefaultBuildHasher>
where
    K: Eq + Hash,
{
    #[must_use]
    pub fn new() -> HamtMap<K, V> {
        HamtMap::new_with_hasher_and_ptr_kind(DefaultBuildHasher::default())
    }
}

impl<K, V> HamtMapSync<K, V>
where
    K: Eq + Hash,
{
    #[must_use]
    pub fn new_sync() -> HamtMapSync<K, V> {
        HamtMap::new_with_hasher_and_ptr_kind(DefaultBuildHasher::default())
    }
}

impl<K, V, H: BuildHasher> HamtMap<K, V, RcK, H>
where
    K: Eq + Hash,
    H: Clone,
{
    #[must_use]
    pub fn new_with_hasher(hasher_builder: H) -> HamtMap<K, V, RcK, H> {
        HamtMap::new_with_hasher_and_ptr_kind(hasher_builder)
    }
}

impl<K, V, P, H: BuildHasher> HamtMap<K, V, P, H>
where
    K: Eq + Hash,
    H: Clone,
    P: SharedPointerKind,
{
    #[must_use]
    pub fn new_with_hasher_and_ptr_kind(hasher_builder: H) -> HamtMap<K, V, P, H> {
        HamtMap {
            root: SharedPointer::new(Node::Empty),
            size: 0,
            hasher_builder,
        }
    }

    #[must_use]
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let key_hash = node_utils::hash(key, &self.hasher_builder);

        self.root.get(key, key_hash).map(|entry| entry.value())
    }

    #[must_use]
    pub fn get_key_value<Q: ?Sized>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let key_hash = node_utils::hash(key, &self.hasher_builder);

        self.root.get(key, key_hash).map(|entry| (entry.key(), entry.value()))
    }

    #[must_use]
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn insert(&self, key: K, value: V) -> HamtMap<K, V, P, H> {
        let entry = EntryWithHash::new(key, value, &self.hasher_builder);
        let new_root = Node::insert(&self.root, 0, entry);
        let size = new_root.size();

        HamtMap { root: new_root, size, hasher_builder: self.hasher_builder.clone() }
    }

    pub fn insert_mut(&mut self, key: K, value: V) {
        let entry = EntryWithHash::new(key, value, &self.hasher_builder);
        let new_root = Node::insert(&self.root, 0, entry);

        self.size = new_root.size();
        self.root = new_root;
    }

    #[must_use]
    pub fn remove<Q: ?Sized>(&self, key: &Q) -> HamtMap<K, V, P, H>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let key_hash = node_utils::hash(key, &self.hasher_builder);
        let new_root = Node::remove(&self.root, key, key_hash);

        if node_utils::same_node(&new_root, &self.root) {
            self.clone()
        } else {
            let size = new_root.size();

            HamtMap { root: new_root, size, hasher_builder: self.hasher_builder.clone() }
        }
    }

    /// Returns `true` if the key was present.
    pub fn remove_mut<Q: ?Sized>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        let key_hash = node_utils::hash(key, &self.hasher_builder);
        let new_root = Node::remove(&self.root, key, key_hash);

        if node_utils::same_node(&new_root, &self.root) {
            false
        } else {
            self.size = new_root.size();
            self.root = new_root;
            true
        }
    }

    /// Test whether the two maps refer to the same content in memory.
    ///
    /// This would return true if you’re comparing a map to itself, or if
    /// you’re comparing a map to a fresh clone of itself.
    pub(crate) fn ptr_eq<HO: BuildHasher + Clone>(&self, other: &HamtMap<K, V, P, HO>) -> bool {
        node_utils::same_node(&self.root, &other.root)
    }

    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn iter(&self) -> Iter<'_, K, V, P> {
        self.iter_ptr().map(|e| (&e.key, &e.value))
    }

    fn iter_ptr(&self) -> IterPtr<'_, K, V, P> {
        IterPtr::new(self)
    }

    pub fn keys(&self) -> IterKeys<'_, K, V, P> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> IterValues<'_, K, V, P> {
        self.iter().map(|(_, v)| v)
    }
}

impl<'a, K, Q: ?Sized, V, P, H: BuildHasher> Index<&'a Q> for HamtMap<K, V, P, H>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq,
    P: SharedPointerKind,
    H: Clone,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, P, H: BuildHasher> Clone for HamtMap<K, V, P, H>
where
    K: Eq + Hash,
    H: Clone,
    P: SharedPointerKind,
{
    fn clone(&self) -> HamtMap<K, V, P, H> {
        HamtMap {
            root: SharedPointer::clone(&self.root),
            size: self.size,
            hasher_builder: self.hasher_builder.clone(),
        }
    }
}

impl<K, V, P, H: BuildHasher> Default for HamtMap<K, V, P, H>
where
    K: Eq + Hash,
    H: Default + Clone,
    P: SharedPointerKind,
{
    fn default() -> HamtMap<K, V, P, H> {
        HamtMap::new_with_hasher_and_ptr_kind(H::default())
    }
}

impl<K: Eq, V: PartialEq, P, PO, H: BuildHasher> PartialEq<HamtMap<K, V, PO, H>>
    for HamtMap<K, V, P, H>
where
    K: Hash,
    H: Clone,
    P: SharedPointerKind,
    PO: SharedPointerKind,
{
    fn eq(&self, other: &HamtMap<K, V, PO, H>) -> bool {
        self.size() == other.size()
            && self.iter().all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K: Eq, V: Eq, P, H: BuildHasher> Eq for HamtMap<K, V, P, H>
where
    K: Hash,
    H: Clone,
    P: SharedPointerKind,
{
}

impl<K, V, P, H: BuildHasher> Display for HamtMap<K, V, P, H>
where
    K: Eq + Hash + Display,
    V: Display,
    H: Clone,
    P: SharedPointerKind,
{
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        fmt.write_str("{")?;

        for (k, v) in self.iter() {
            if !first {
                fmt.write_str(", ")?;
            }
            k.fmt(fmt)?;
            fmt.write_str(": ")?;
            v.fmt(fmt)?;
            first = false;
        }

        fmt.write_str("}")
    }
}

impl<'a, K, V, P, H: BuildHasher> IntoIterator for &'a HamtMap<K, V, P, H>
where
    K: Eq + Hash,
    H: Clone,
    P: SharedPointerKind,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}

impl<K, V, P, H> FromIterator<(K, V)> for HamtMap<K, V, P, H>
where
    K: Eq + Hash,
    H: BuildHasher + Clone + Default,
    P: SharedPointerKind,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(into_iter: I) -> HamtMap<K, V, P, H> {
        let mut map = HamtMap::new_with_hasher_and_ptr_kind(Default::default());

        for (k, v) in into_iter {
            map.insert_mut(k, v);
        }

        map
    }
}

#[derive(Debug)]
pub struct IterPtr<'a, K, V, P>
where
    P: SharedPointerKind,
{
    stack: Vec<IterStackElement<'a, K, V, P>>,
    size: usize,
}

#[derive(Debug)]
enum IterStackElement<'a, K, V, P>
where
    P: SharedPointerKind,
{
    Branch(Peekable<slice::Iter<'a, SharedPointer<Node<K, V, P>, P>>>),
    Leaf(&'a EntryWithHash<K, V, P>),
    Collision(Peekable<slice::Iter<'a, EntryWithHash<K, V, P>>>),
}

impl<'a, K, V, P> IterStackElement<'a, K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn new(node: &'a Node<K, V, P>) -> IterStackElement<'a, K, V, P> {
        match node {
            Node::Empty => unreachable!("an empty node is never pushed on the iteration stack"),
            Node::Leaf(entry) => IterStackElement::Leaf(entry),
            Node::Collision(collision) => {
                IterStackElement::Collision(collision.bucket.iter().peekable())
            }
            Node::Bitmapped(bitmapped) => {
                IterStackElement::Branch(bitmapped.children.iter().peekable())
            }
            Node::Full(full) => IterStackElement::Branch(full.children.iter().peekable()),
        }
    }

    fn current_entry(&mut self) -> &'a SharedPointer<Entry<K, V>, P> {
        match self {
            IterStackElement::Branch(_) => panic!("called current entry of a branch"),
            IterStackElement::Leaf(entry) => &entry.entry,
            IterStackElement::Collision(iter) => {
                &iter.peek().expect("collision iterator out of entries").entry
            }
        }
    }

    /// Advance and returns `true` if finished.
    #[inline]
    fn advance(&mut self) -> bool {
        match self {
            IterStackElement::Branch(iter) => {
                iter.next();
                iter.peek().is_none()
            }
            IterStackElement::Leaf(_) => true,
            IterStackElement::Collision(iter) => {
                iter.next();
                iter.peek().is_none()
            }
        }
    }
}

impl<'a, K, V, P> IterPtr<'a, K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    fn new<H: BuildHasher + Clone>(map: &'a HamtMap<K, V, P, H>) -> IterPtr<'a, K, V, P> {
        // One stack slot per level plus one for the leaf or collision node.
        let mut stack: Vec<IterStackElement<'a, K, V, P>> =
            Vec::with_capacity(node_utils::MAX_HEIGHT + 1);

        if map.size() > 0 {
            stack.push(IterStackElement::new(&*map.root));
        }

        let mut iter = IterPtr { stack, size: map.size() };

        iter.dig();

        iter
    }

    fn dig(&mut self) {
        let next_stack_elem: Option<IterStackElement<'a, K, V, P>> =
            self.stack.last_mut().and_then(|stack_top| match stack_top {
                IterStackElement::Branch(iter) => {
                    iter.peek().map(|node| IterStackElement::new(node))
                }
                _ => None,
            });

        if let Some(e) = next_stack_elem {
            self.stack.push(e);
            self.dig();
        }
    }

    fn advance(&mut self) {
        if let Some(mut stack_element) = self.stack.pop() {
            let finished = stack_element.advance();

            if finished {
                self.advance();
            } else {
                self.stack.push(stack_element);

                self.dig();
            }
        }
    }

    fn current(&mut self) -> Option<&'a SharedPointer<Entry<K, V>, P>> {
        self.stack.last_mut().map(IterStackElement::current_entry)
    }
}

impl<'a, K, V, P> Iterator for IterPtr<'a, K, V, P>
where
    K: Eq + Hash,
    P: SharedPointerKind,
{
    type Item = &'a SharedPointer<Entry<K, V>, P>;

    fn next(&mut self) -> Option<&'a SharedPointer<Entry<K, V>, P>> {
        let current = self.current();

        self.advance();

        if current.is_some() {
            self.size -= 1;
        }

        current
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}

impl<'a, K: Eq + Hash, V, P: SharedPointerKind> ExactSizeIterator for IterPtr<'a, K, V, P> {}

#[cfg(feature = "serde")]
pub mod serde {
    use super::*;
    use ::serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use ::serde::ser::{Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    impl<K, V, P, H> Serialize for HamtMap<K, V, P, H>
    where
        K: Eq + Hash + Serialize,
        V: Serialize,
        P: SharedPointerKind,
        H: BuildHasher + Clone,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self)
        }
    }

    impl<'de, K, V, P, H> Deserialize<'de> for HamtMap<K, V, P, H>
    where
        K: Eq + Hash + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<HamtMap<K, V, P, H>, D::Error> {
            deserializer.deserialize_map(HamtMapVisitor {
                _phantom_entry: PhantomData,
                _phantom_p: PhantomData,
                _phantom_h: PhantomData,
            })
        }
    }

    struct HamtMapVisitor<K, V, P, H> {
        _phantom_entry: PhantomData<(K, V)>,
        _phantom_p: PhantomData<P>,
        _phantom_h: PhantomData<H>,
    }

    impl<'de, K, V, P, H> Visitor<'de> for HamtMapVisitor<K, V, P, H>
    where
        K: Eq + Hash + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        type Value = HamtMap<K, V, P, H>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map")
        }

        fn visit_map<A>(self, mut map: A) -> Result<HamtMap<K, V, P, H>, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut hamt_map = HamtMap::new_with_hasher_and_ptr_kind(Default::default());

            while let Some((k, v)) = map.next_entry()? {
                hamt_map.insert_mut(k, v);
            }

            Ok(hamt_map)
        }
    }
}
