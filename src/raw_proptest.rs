#![cfg(test)]

// Property tests for ProbeTable kept inside the crate so they can reach the
// table's test-only invariant check.

use crate::raw::ProbeTable;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Few distinct hashes so that chains, displacement and tombstones interact.
fn hash_of(key: u8) -> u64 {
    ((key % 11) as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32),
    Remove(u8),
    Find(u8),
    Mutate(u8, i32),
    Resize(usize),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u8..40;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Find),
        1 => (key, any::<i32>()).prop_map(|(k, v)| Op::Mutate(k, v)),
        1 => (1usize..200).prop_map(Op::Resize),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

fn locate(t: &ProbeTable<(u8, i32)>, key: u8) -> Option<usize> {
    t.find(hash_of(key), |(k, _)| *k == key)
}

// Property: state-machine equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - Every live item is reachable from its home slot; `find` agrees with the
//   model for present and absent keys.
// - The probe invariant (slot == home + dist, no empty gap) holds after
//   every insert, removal and resize.
// - Growing before a full insert keeps `len` below the load limit.
// - `iter` yields each live item exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_probe_table_matches_model(ops in arb_ops()) {
        let mut sut: ProbeTable<(u8, i32)> = ProbeTable::new(13, 0.8).unwrap();
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    if locate(&sut, k).is_some() {
                        prop_assert!(model.contains_key(&k));
                        continue;
                    }
                    if sut.is_full() {
                        let grown = sut.grow(|_, _| {}).unwrap();
                        prop_assert!(grown);
                        prop_assert!(!sut.is_full());
                    }
                    let idx = sut.insert_unique(hash_of(k), (k, v), |_, _| {});
                    prop_assert_eq!(sut.get(idx), Some(&(k, v)));
                    prop_assert!(model.insert(k, v).is_none());
                }
                Op::Remove(k) => {
                    let got = locate(&sut, k).and_then(|i| sut.take(i));
                    prop_assert_eq!(got.map(|(_, v)| v), model.remove(&k));
                }
                Op::Find(k) => {
                    let got = locate(&sut, k).and_then(|i| sut.get(i)).map(|(_, v)| *v);
                    prop_assert_eq!(got, model.get(&k).copied());
                }
                Op::Mutate(k, v) => {
                    if let Some(i) = locate(&sut, k) {
                        sut.get_mut(i).unwrap().1 = v;
                        model.insert(k, v);
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                Op::Resize(n) => {
                    let before = sut.capacity();
                    match sut.resize(n, |_, _| {}) {
                        Ok(true) => prop_assert!(sut.capacity() >= before),
                        Ok(false) => prop_assert_eq!(sut.capacity(), before),
                        Err(e) => prop_assert!(false, "resize failed: {:?}", e),
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            sut.assert_probe_invariant();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.len() as f64 <= sut.capacity() as f64 * sut.load() + 1.0);
        }

        let mut seen: Vec<(u8, i32)> = sut.iter().map(|(_, item)| *item).collect();
        seen.sort_unstable();
        let expected: Vec<(u8, i32)> = model.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }
}

// Property: every placement, including Robin Hood displacement and resize
// moves, is reported through `on_place`, so an external index of slot
// positions stays exact.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_on_place_tracks_every_move(keys in proptest::collection::btree_set(0u8..=255, 1..150)) {
        let mut sut: ProbeTable<u8> = ProbeTable::new(7, 0.75).unwrap();
        let mut positions: BTreeMap<u8, usize> = BTreeMap::new();
        for k in keys {
            if sut.is_full() {
                sut.grow(|item, pos| { positions.insert(*item, pos); }).unwrap();
            }
            sut.insert_unique(hash_of(k), k, |item, pos| { positions.insert(*item, pos); });
        }
        for (idx, item) in sut.iter() {
            prop_assert_eq!(positions.get(item), Some(&idx));
        }
        prop_assert_eq!(positions.len(), sut.len());
    }
}
