/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

pub mod hamt_set;

pub use self::hamt_set::HamtSet;
pub use self::hamt_set::HamtSetSync;
