/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

pub mod vec_utils;

/// The hasher builder the maps and sets default to.
pub type DefaultBuildHasher = std::collections::hash_map::RandomState;
