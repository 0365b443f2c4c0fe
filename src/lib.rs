/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

#![cfg_attr(feature = "fatal-warnings", deny(warnings))]

// Note: Keep this in sync with `README.md`.
//! # hamt
//!
//! This crate provides a [fully persistent](https://en.wikipedia.org/wiki/Persistent_data_structure)
//! map and set with structural sharing, implemented as a
//! [hash array mapped trie](https://en.wikipedia.org/wiki/Hash_array_mapped_trie).
//! Every update returns a new collection that shares almost all of its
//! structure with its predecessor, so old versions remain fully usable, and
//! any number of threads can read them without coordination.
//!
//! # Data Structures
//!
//! This crate implements the following data structures:
//!
//!   1. [`HamtMap`](#hamtmap)
//!   2. [`HamtSet`](#hamtset)
//!
//! ## `HamtMap`
//!
//! A map implemented with a hash array mapped trie.  See
//! [Ideal Hash Trees](https://infoscience.epfl.ch/record/64398/files/idealhashtrees.pdf) for
//! details.
//!
//! ### Example
//!
//! ```rust
//! use hamt::HamtMap;
//!
//! let map_en = HamtMap::new()
//!     .insert(0, "zero")
//!     .insert(1, "one");
//!
//! assert_eq!(map_en.get(&1), Some(&"one"));
//!
//! let map_pt = map_en
//!     .insert(1, "um")
//!     .insert(2, "dois");
//!
//! assert_eq!(map_pt.get(&2), Some(&"dois"));
//!
//! let map_pt_binary = map_pt.remove(&2);
//!
//! assert_eq!(map_pt_binary.get(&2), None);
//! assert_eq!(map_en.get(&1), Some(&"one"));
//! ```
//!
//! ## `HamtSet`
//!
//! A set implemented with a [`HamtMap`](#hamtmap).
//!
//! ### Example
//!
//! ```rust
//! use hamt::HamtSet;
//!
//! let set = HamtSet::new()
//!     .insert("zero")
//!     .insert("one");
//!
//! assert!(set.contains(&"one"));
//!
//! let set_extended = set.insert("two");
//!
//! assert!(set_extended.contains(&"two"));
//!
//! let set_positive = set_extended.remove(&"zero");
//!
//! assert!(!set_positive.contains(&"zero"));
//! ```
//!
//! # Thread safety
//!
//! The collections are parameterized by the pointer kind used for internal
//! links, so the reference-counting flavor is a choice, not a tax: `HamtMap`
//! and `HamtSet` use `Rc` internally, while [`HamtMapSync`](crate::HamtMapSync)
//! and [`HamtSetSync`](crate::HamtSetSync) use an atomic reference count and
//! implement `Send + Sync`.

mod utils;

pub mod map;
pub mod set;

pub use crate::map::hamt_map::HamtMap;
pub use crate::map::hamt_map::HamtMapSync;
pub use crate::set::hamt_set::HamtSet;
pub use crate::set::hamt_set::HamtSetSync;
