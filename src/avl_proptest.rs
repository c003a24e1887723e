#![cfg(test)]

// Property tests for AvlTree kept inside the crate so they can use the
// tree's test-only structural validation.

use crate::avl::AvlTree;
use crate::error::Error;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    Remove(i16),
    Get(i16),
    Mutate(i16, u32),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = -64i16..64;
    let op = prop_oneof![
        5 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => (key, any::<u32>()).prop_map(|(k, v)| Op::Mutate(k, v)),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..200)
}

// Property: state-machine equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - Parent links, stored heights and the AVL balance hold after every op.
// - Height stays within the AVL bound of about 1.44 * log2(n + 2).
// - Duplicate inserts are rejected and leave the stored value untouched.
// - In-order iteration (both directions) equals the model's ordering.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl_matches_model(ops in arb_ops()) {
        let mut sut: AvlTree<i16, u32> = AvlTree::new();
        let mut model: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => match sut.insert(k, v) {
                    Ok(()) => prop_assert!(model.insert(k, v).is_none()),
                    Err(e) => {
                        prop_assert_eq!(e, Error::Duplicate);
                        prop_assert!(model.contains_key(&k));
                    }
                },
                Op::Remove(k) => match sut.remove(&k) {
                    Ok(pair) => prop_assert_eq!(Some(pair.1), model.remove(&k)),
                    Err(Error::Empty) => prop_assert!(model.is_empty()),
                    Err(e) => {
                        prop_assert_eq!(e, Error::NotFound);
                        prop_assert!(!model.contains_key(&k));
                    }
                },
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k).map(|(_, v)| *v), model.get(&k).copied());
                }
                Op::Mutate(k, v) => {
                    if let Some(slot) = sut.get_mut(&k) {
                        *slot = v;
                        model.insert(k, v);
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.validate(), model.len());
            let bound = 1.45 * ((model.len() + 2) as f64).log2();
            prop_assert!(sut.root_height() as f64 <= bound, "height {} over bound {}", sut.root_height(), bound);
        }

        let forward: Vec<(i16, u32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i16, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&forward, &expected);
        let backward: Vec<i16> = sut.iter().rev().map(|(k, _)| *k).collect();
        let expected_back: Vec<i16> = model.keys().rev().copied().collect();
        prop_assert_eq!(backward, expected_back);
    }
}

// Property: a cursor can reach every rank with `go_to` and steps back to
// the start with `rewind`, agreeing with the sorted key list.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_cursor_ranks(keys in proptest::collection::btree_set(any::<i16>(), 1..80), probe in any::<prop::sample::Index>()) {
        let mut sut: AvlTree<i16, ()> = AvlTree::new();
        for k in &keys {
            sut.insert(*k, ()).unwrap();
        }
        let sorted: Vec<i16> = keys.iter().copied().collect();
        let target = probe.index(sorted.len());

        let mut c = sut.cursor_front();
        prop_assert!(c.go_to(target));
        prop_assert_eq!(c.index(), target);
        prop_assert_eq!(c.key(), Some(&sorted[target]));
        if target > 0 {
            prop_assert!(c.rewind(target));
        } else {
            prop_assert!(!c.rewind(1));
        }
        prop_assert_eq!(c.key(), Some(&sorted[0]));
        prop_assert!(!c.go_to(sorted.len()));
    }
}
