/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

use crate::utils::vec_utils::VecUtils;
use std::slice;

/// Sparse array of 32 virtual slots storing only the populated ones.  A
/// `u32` bitmap records which slots are occupied; the backing vector keeps
/// the occupants ordered by virtual index, so the occupant of slot `i`
/// lives at position `popcount(bitmap & ((1 << i) - 1))`.
///
/// `set` and `remove` are persistent: they return a fresh array and leave
/// the receiver untouched.
#[derive(Debug, PartialEq, Eq)]
pub struct SparseArrayU32<T: Clone> {
    bitmap: u32,
    array: Vec<T>,
}

mod sparse_array_u32_utils {
    #[inline]
    pub fn map_index(bitmap: u32, virtual_index: usize) -> Option<usize> {
        if bitmap & (1u32 << virtual_index) == 0 {
            None
        } else {
            let mask = (1u32 << virtual_index) - 1;

            Some((bitmap & mask).count_ones() as usize)
        }
    }
}

impl<T: Clone> SparseArrayU32<T> {
    pub fn new() -> SparseArrayU32<T> {
        SparseArrayU32 { bitmap: 0, array: Vec::new() }
    }

    pub fn from_parts(bitmap: u32, array: Vec<T>) -> SparseArrayU32<T> {
        debug_assert_eq!(bitmap.count_ones() as usize, array.len());

        SparseArrayU32 { bitmap, array }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        debug_assert!(index < u32::BITS as usize);

        sparse_array_u32_utils::map_index(self.bitmap, index).map(|i| &self.array[i])
    }

    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.array.first()
    }

    #[must_use]
    pub fn set(&self, index: usize, value: T) -> SparseArrayU32<T> {
        debug_assert!(index < u32::BITS as usize);

        match sparse_array_u32_utils::map_index(self.bitmap, index) {
            Some(i) => SparseArrayU32 {
                bitmap: self.bitmap,
                array: self.array.cloned_set(i, value),
            },
            None => {
                let new_bitmap = self.bitmap | (1u32 << index);
                let i = sparse_array_u32_utils::map_index(new_bitmap, index)
                    .expect("slot must be occupied after setting its bit");

                SparseArrayU32 {
                    bitmap: new_bitmap,
                    array: self.array.cloned_insert(i, value),
                }
            }
        }
    }

    #[must_use]
    pub fn remove(&self, index: usize) -> SparseArrayU32<T> {
        debug_assert!(index < u32::BITS as usize);

        match sparse_array_u32_utils::map_index(self.bitmap, index) {
            Some(i) => SparseArrayU32 {
                bitmap: self.bitmap ^ (1u32 << index),
                array: self.array.cloned_remove(i),
            },
            None => self.clone(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bitmap.count_ones() as usize
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.bitmap == u32::MAX
    }

    /// Consumes the array and returns the backing vector.  When every slot
    /// is populated the vector is dense and ordered by virtual index, which
    /// is exactly the layout a full node wants.
    pub fn into_vec(self) -> Vec<T> {
        self.array
    }

    pub fn as_slice(&self) -> &[T] {
        &self.array
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.array.iter()
    }
}

impl<T: Clone> Clone for SparseArrayU32<T> {
    fn clone(&self) -> SparseArrayU32<T> {
        SparseArrayU32 {
            bitmap: self.bitmap,
            array: Vec::clone(&self.array),
        }
    }
}
