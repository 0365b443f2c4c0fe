/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Rayon parallel iterator support for `HamtMapSync`.

use super::{EntryWithHash, HamtMapSync, Node};
use archery::{ArcK as ArcTK, SharedPointer};
use rayon::iter::plumbing::{Folder, UnindexedConsumer, UnindexedProducer, bridge_unindexed};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::hash::{BuildHasher, Hash};

/// Parallel iterator over the entries of a `HamtMapSync`.
pub struct ParallelIter<'a, K, V, H = crate::utils::DefaultBuildHasher>
where
    K: Eq + Hash,
    H: BuildHasher + Clone,
{
    map: &'a HamtMapSync<K, V, H>,
}

impl<'a, K, V, H> ParallelIter<'a, K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher + Clone,
{
    fn new(map: &'a HamtMapSync<K, V, H>) -> Self {
        ParallelIter { map }
    }
}

impl<'a, K, V, H> IntoParallelIterator for &'a HamtMapSync<K, V, H>
where
    K: Eq + Hash + Sync + Send,
    V: Sync + Send,
    H: BuildHasher + Clone + Sync + Send,
{
    type Item = (&'a K, &'a V);
    type Iter = ParallelIter<'a, K, V, H>;

    fn into_par_iter(self) -> Self::Iter {
        ParallelIter::new(self)
    }
}

impl<'a, K, V, H> ParallelIterator for ParallelIter<'a, K, V, H>
where
    K: Eq + Hash + Sync + Send,
    V: Sync + Send,
    H: BuildHasher + Clone + Sync + Send,
{
    type Item = (&'a K, &'a V);

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        let producer = HamtMapProducer::new(self.map);
        bridge_unindexed(producer, consumer)
    }
}

/// Producer for parallel iteration over `HamtMapSync` entries.
struct HamtMapProducer<'a, K, V>
where
    K: Eq + Hash,
{
    node: ProducerNode<'a, K, V>,
}

enum ProducerNode<'a, K, V> {
    Branch(&'a [SharedPointer<Node<K, V, ArcTK>, ArcTK>]),
    Leaf(&'a EntryWithHash<K, V, ArcTK>),
    Collision(&'a [EntryWithHash<K, V, ArcTK>]),
}

impl<'a, K, V> HamtMapProducer<'a, K, V>
where
    K: Eq + Hash,
{
    fn new<H: BuildHasher + Clone>(map: &'a HamtMapSync<K, V, H>) -> Self {
        Self::from_node(&map.root)
    }

    fn from_nodes(nodes: &'a [SharedPointer<Node<K, V, ArcTK>, ArcTK>]) -> Self {
        if nodes.len() == 1 {
            Self::from_node(&nodes[0])
        } else {
            HamtMapProducer { node: ProducerNode::Branch(nodes) }
        }
    }

    fn from_node(node: &'a Node<K, V, ArcTK>) -> Self {
        let node = match node {
            Node::Empty => ProducerNode::Branch(&[]),
            Node::Leaf(entry) => ProducerNode::Leaf(entry),
            Node::Collision(collision) => ProducerNode::Collision(&collision.bucket),
            Node::Bitmapped(bitmapped) => return Self::from_nodes(bitmapped.children.as_slice()),
            Node::Full(full) => return Self::from_nodes(&full.children),
        };

        HamtMapProducer { node }
    }

    fn fold_node_entries<F>(&self, node: &ProducerNode<'a, K, V>, mut folder: F) -> F
    where
        F: Folder<(&'a K, &'a V)>,
    {
        match node {
            ProducerNode::Branch(children) => {
                for child in children.iter() {
                    folder = self.fold_all_entries(child, folder);
                    if folder.full() {
                        break;
                    }
                }
                folder
            }
            ProducerNode::Leaf(entry) => folder.consume((&entry.entry.key, &entry.entry.value)),
            ProducerNode::Collision(collision_entries) => {
                for entry in collision_entries.iter() {
                    folder = folder.consume((&entry.entry.key, &entry.entry.value));
                    if folder.full() {
                        break;
                    }
                }
                folder
            }
        }
    }

    fn fold_all_entries<F>(
        &self,
        node: &'a SharedPointer<Node<K, V, ArcTK>, ArcTK>,
        mut folder: F,
    ) -> F
    where
        F: Folder<(&'a K, &'a V)>,
    {
        match &**node {
            Node::Empty => folder,
            Node::Leaf(entry) => folder.consume((&entry.entry.key, &entry.entry.value)),
            Node::Collision(collision) => {
                for entry in collision.bucket.iter() {
                    folder = folder.consume((&entry.entry.key, &entry.entry.value));
                    if folder.full() {
                        break;
                    }
                }
                folder
            }
            Node::Bitmapped(bitmapped) => {
                for child in bitmapped.children.iter() {
                    folder = self.fold_all_entries(child, folder);
                    if folder.full() {
                        break;
                    }
                }
                folder
            }
            Node::Full(full) => {
                for child in full.children.iter() {
                    folder = self.fold_all_entries(child, folder);
                    if folder.full() {
                        break;
                    }
                }
                folder
            }
        }
    }
}

impl<'a, K, V> UnindexedProducer for HamtMapProducer<'a, K, V>
where
    K: Eq + Hash + Sync + Send,
    V: Sync + Send,
{
    type Item = (&'a K, &'a V);

    fn split(self) -> (Self, Option<Self>) {
        match self.node {
            ProducerNode::Branch(nodes) if nodes.len() > 1 => {
                let (self_nodes, other_nodes) = nodes.split_at(nodes.len() / 2);
                (Self::from_nodes(self_nodes), Some(Self::from_nodes(other_nodes)))
            }
            _ => (self, None),
        }
    }

    fn fold_with<F>(self, folder: F) -> F
    where
        F: Folder<Self::Item>,
    {
        self.fold_node_entries(&self.node, folder)
    }
}

#[cfg(test)]
mod tests {
    use crate::HamtMapSync;
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    #[test]
    fn test_parallel_iterator_basic() {
        let map = HamtMapSync::new_sync()
            .insert(1, "one")
            .insert(2, "two")
            .insert(3, "three")
            .insert(4, "four")
            .insert(5, "five");

        let mut collected: Vec<_> = (&map).into_par_iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(collected.len(), 5);

        collected.sort();
        assert_eq!(
            collected,
            vec![(1, "one"), (2, "two"), (3, "three"), (4, "four"), (5, "five")]
        );
    }

    #[test]
    fn test_parallel_iterator_empty() {
        let map: HamtMapSync<i32, &str> = HamtMapSync::new_sync();
        let collected: Vec<_> = (&map).into_par_iter().collect();
        assert_eq!(collected.len(), 0);
    }

    #[test]
    fn test_parallel_iterator_single_element() {
        let map = HamtMapSync::new_sync().insert(42, "answer");
        let collected: Vec<_> = (&map).into_par_iter().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0], (&42, &"answer"));
    }

    #[test]
    fn test_parallel_iterator_large_dataset() {
        let mut map = HamtMapSync::new_sync();
        for i in 0..10_000 {
            map.insert_mut(i, i * 2);
        }

        let collected: Vec<_> = (&map).into_par_iter().collect();
        assert_eq!(collected.len(), 10_000);

        for (k, v) in collected {
            assert_eq!(*v, *k * 2);
        }
    }

    #[test]
    fn test_parallel_filter() {
        let mut map = HamtMapSync::new_sync();
        for i in 1..=100 {
            map.insert_mut(i, i * 2);
        }

        let even_keys_count = (&map).into_par_iter().filter(|(k, _)| *k % 2 == 0).count();

        assert_eq!(even_keys_count, 50);
    }

    #[test]
    fn test_parallel_reduce() {
        let mut map = HamtMapSync::new_sync();
        for i in 1..=10 {
            map.insert_mut(i, i);
        }

        let product = (&map).into_par_iter().map(|(_, v)| *v).reduce(|| 1, |a, b| a * b);

        let expected_product: i32 = (1..=10).product();
        assert_eq!(product, expected_product);
    }

    #[test]
    fn test_parallel_find_any() {
        let mut map = HamtMapSync::new_sync();
        for i in 1..=100 {
            map.insert_mut(i, format!("item_{}", i));
        }

        let found = (&map).into_par_iter().find_any(|(k, _)| **k == 42);

        assert!(found.is_some());
        if let Some((k, v)) = found {
            assert_eq!(*k, 42);
            assert_eq!(*v, "item_42");
        }
    }

    #[test]
    fn test_parallel_any() {
        let mut map = HamtMapSync::new_sync();
        for i in 1..=100 {
            map.insert_mut(i, i);
        }

        let has_fifty = (&map).into_par_iter().any(|(k, _)| *k == 50);

        assert!(has_fifty);
    }
}
