/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

#[macro_use]
extern crate bencher;

mod utils;

use bencher::{Bencher, black_box};
use hamt::HamtMap;
use utils::BencherNoDrop;
use utils::iterations;

fn hamt_map_insert(bench: &mut Bencher) {
    let limit = iterations(100_000);

    bench.iter_no_drop(|| {
        let mut map = HamtMap::new();

        for i in 0..limit {
            map = map.insert(i, -(i as isize));
        }

        map
    });
}

fn hamt_map_insert_mut(bench: &mut Bencher) {
    let limit = iterations(100_000);

    bench.iter_no_drop(|| {
        let mut map = HamtMap::new();

        for i in 0..limit {
            map.insert_mut(i, -(i as isize));
        }

        map
    });
}

fn hamt_map_remove(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut full_map = HamtMap::new();

    for i in 0..limit {
        full_map.insert_mut(i, -(i as isize));
    }

    bench.iter_no_drop(|| {
        let mut map = full_map.clone();

        for i in 0..limit {
            map = map.remove(&i);
        }

        map
    });
}

fn hamt_map_get(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut map = HamtMap::new();

    for i in 0..limit {
        map.insert_mut(i, -(i as isize));
    }

    bench.iter(|| {
        for i in 0..limit {
            black_box(map.get(&i));
        }
    });
}

fn hamt_map_iterate(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut map = HamtMap::new();

    for i in 0..limit {
        map.insert_mut(i, -(i as isize));
    }

    bench.iter(|| {
        for kv in map.iter() {
            black_box(kv);
        }
    });
}

benchmark_group!(
    benches,
    hamt_map_insert,
    hamt_map_insert_mut,
    hamt_map_remove,
    hamt_map_get,
    hamt_map_iterate
);
benchmark_main!(benches);
