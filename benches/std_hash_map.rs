/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

#[macro_use]
extern crate bencher;

mod utils;

use bencher::{Bencher, black_box};
use std::collections::HashMap;
use utils::BencherNoDrop;
use utils::iterations;

fn std_hash_map_insert(bench: &mut Bencher) {
    let limit = iterations(100_000);

    bench.iter_no_drop(|| {
        let mut map = HashMap::new();

        for i in 0..limit {
            map.insert(i, -(i as isize));
        }

        map
    });
}

fn std_hash_map_remove(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut full_map = HashMap::new();

    for i in 0..limit {
        full_map.insert(i, -(i as isize));
    }

    bench.iter_no_drop(|| {
        let mut map = full_map.clone();

        for i in 0..limit {
            map.remove(&i);
        }

        map
    });
}

fn std_hash_map_get(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut map = HashMap::new();

    for i in 0..limit {
        map.insert(i, -(i as isize));
    }

    bench.iter(|| {
        for i in 0..limit {
            black_box(map.get(&i));
        }
    });
}

fn std_hash_map_iterate(bench: &mut Bencher) {
    let limit = iterations(100_000);
    let mut map = HashMap::new();

    for i in 0..limit {
        map.insert(i, -(i as isize));
    }

    bench.iter(|| {
        for kv in map.iter() {
            black_box(kv);
        }
    });
}

benchmark_group!(
    benches,
    std_hash_map_insert,
    std_hash_map_remove,
    std_hash_map_get,
    std_hash_map_iterate
);
benchmark_main!(benches);
