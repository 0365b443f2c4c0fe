/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

use super::*;
use pretty_assertions::assert_eq;
use static_assertions::assert_impl_all;

assert_impl_all!(HamtSetSync<i32>: Send, Sync);

#[allow(dead_code)]
fn compile_time_macro_hamt_set_sync_is_send_and_sync() -> impl Send + Sync {
    hamt_set_sync!(0)
}

#[test]
fn test_insert_get_remove() {
    let mut set = HamtSet::new();

    assert!(set.is_empty());

    for i in 0_u32..100 {
        set.insert_mut(i);
    }

    assert_eq!(set.size(), 100);

    for i in 0_u32..100 {
        assert!(set.contains(&i));
        assert_eq!(set.get(&i), Some(&i));
    }

    assert!(!set.contains(&100));
    assert_eq!(set.get(&100), None);

    for i in 0_u32..100 {
        assert!(set.remove_mut(&i));
    }

    assert!(set.is_empty());
}

#[test]
fn test_insert_is_idempotent() {
    let set = HamtSet::new().insert("a").insert("a");

    assert_eq!(set.size(), 1);
    assert!(set.contains(&"a"));
}

#[test]
fn test_remove_absent_value() {
    let set = hamt_set![1, 2, 3];
    let removed = set.remove(&4);

    assert_eq!(removed, set);
    assert_eq!(removed.size(), 3);
}

#[test]
fn test_persistence_across_versions() {
    let set = hamt_set!["a", "b"];
    let with_c = set.insert("c");
    let without_a = set.remove(&"a");

    assert_eq!(set.size(), 2);
    assert!(!set.contains(&"c"));

    assert_eq!(with_c.size(), 3);
    assert!(with_c.contains(&"c"));

    assert_eq!(without_a.size(), 1);
    assert!(!without_a.contains(&"a"));
    assert!(without_a.contains(&"b"));
}

#[test]
fn test_is_disjoint() {
    let set_a = hamt_set![1, 2, 3];
    let set_b = hamt_set![4, 5];
    let set_c = hamt_set![3, 4];

    assert!(set_a.is_disjoint(&set_b));
    assert!(set_b.is_disjoint(&set_a));
    assert!(!set_a.is_disjoint(&set_c));
    assert!(!set_c.is_disjoint(&set_a));
}

#[test]
fn test_is_subset() {
    let set_a = hamt_set![1, 2];
    let set_b = hamt_set![1, 2, 3];
    let empty: HamtSet<i32> = HamtSet::new();

    assert!(set_a.is_subset(&set_b));
    assert!(!set_b.is_subset(&set_a));
    assert!(set_a.is_subset(&set_a.clone()));
    assert!(empty.is_subset(&set_a));
}

#[test]
fn test_is_superset() {
    let set_a = hamt_set![1, 2, 3];
    let set_b = hamt_set![1, 2];

    assert!(set_a.is_superset(&set_b));
    assert!(!set_b.is_superset(&set_a));
}

#[test]
fn test_eq_is_insertion_order_independent() {
    let set_a = hamt_set!["a", "b", "c"];
    let set_b = hamt_set!["c", "a", "b"];
    let set_c = hamt_set!["a", "b"];

    assert_eq!(set_a, set_b);
    assert_ne!(set_a, set_c);
}

#[test]
fn test_eq_across_pointer_kinds() {
    let set = hamt_set![1, 2, 3];
    let set_sync = hamt_set_sync![1, 2, 3];

    assert_eq!(set, set_sync);
}

#[test]
fn test_iter_every_value_once() {
    let set = hamt_set![1_u32, 2, 3, 4, 5];
    let mut collected: Vec<u32> = set.iter().copied().collect();

    collected.sort_unstable();

    assert_eq!(collected, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_into_iterator_for_reference() {
    let set = hamt_set![1_u32, 2, 3];
    let mut collected: Vec<u32> = (&set).into_iter().copied().collect();

    collected.sort_unstable();

    assert_eq!(collected, vec![1, 2, 3]);
}

#[test]
fn test_from_iterator() {
    let set: HamtSet<u32> = (0..10).collect();

    assert_eq!(set.size(), 10);

    for i in 0..10 {
        assert!(set.contains(&i));
    }
}

#[test]
fn test_default() {
    let set: HamtSet<u32> = HamtSet::default();

    assert!(set.is_empty());
}

#[test]
fn test_display() {
    let empty_set: HamtSet<u32> = HamtSet::new();
    let set = hamt_set![7];

    assert_eq!(format!("{}", empty_set), "{}");
    assert_eq!(format!("{}", set), "{7}");
}

#[cfg(feature = "serde")]
mod serde {
    use super::*;
    use bincode::{deserialize, serialize};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serde() {
        let set: HamtSet<i32> = hamt_set![5, 6, 7, 8];
        let encoded = serialize(&set).unwrap();
        let decoded: HamtSet<i32> = deserialize(&encoded).unwrap();

        assert_eq!(set, decoded);
    }
}
