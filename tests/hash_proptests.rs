// Property tests for the hash collections (public API only).
//
// Property 1: HashMap behaves like std::collections::HashMap.
//  - Operations: insert, update, remove, get, resize, clear.
//  - Invariant: len and membership match the model after each op; iteration
//    yields exactly the model's entries.
//
// Property 2: HashBidiMap stays a bijection.
//  - Operations: insert, update_key, update_val, remove_by_key,
//    remove_by_val over a small key/value pool so collisions are frequent.
//  - Invariant: for every live pair, get_key(get_val(k)) == k and
//    get_val(get_key(v)) == v; no key or value appears twice.
//
// Property 3: HashMultiset multiplicities match a BTreeMap of counts.
use probing_collections::{Error, HashBidiMap, HashMap, HashMultiset};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
enum MapOp {
    Insert(u16, i64),
    Update(u16, i64),
    Remove(u16),
    Get(u16),
    Resize(usize),
    Clear,
}

fn arb_map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    let key = 0u16..300;
    let op = prop_oneof![
        6 => (key.clone(), any::<i64>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        2 => (key.clone(), any::<i64>()).prop_map(|(k, v)| MapOp::Update(k, v)),
        3 => key.clone().prop_map(MapOp::Remove),
        2 => key.prop_map(MapOp::Get),
        1 => (0usize..600).prop_map(MapOp::Resize),
        1 => Just(MapOp::Clear),
    ];
    proptest::collection::vec(op, 1..250)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_map_matches_std(ops in arb_map_ops()) {
        let mut sut: HashMap<u16, i64> = HashMap::new();
        let mut model: std::collections::HashMap<u16, i64> = std::collections::HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => match sut.insert(k, v) {
                    Ok(()) => prop_assert!(model.insert(k, v).is_none()),
                    Err(e) => {
                        prop_assert_eq!(e, Error::Duplicate);
                        prop_assert!(model.contains_key(&k));
                    }
                },
                MapOp::Update(k, v) => match sut.update(&k, v) {
                    Ok(old) => prop_assert_eq!(Some(old), model.insert(k, v)),
                    Err(Error::Empty) => prop_assert!(model.is_empty()),
                    Err(e) => {
                        prop_assert_eq!(e, Error::NotFound);
                        prop_assert!(!model.contains_key(&k));
                    }
                },
                MapOp::Remove(k) => match sut.remove(&k) {
                    Ok((rk, rv)) => {
                        prop_assert_eq!(rk, k);
                        prop_assert_eq!(Some(rv), model.remove(&k));
                    }
                    Err(_) => prop_assert!(!model.contains_key(&k)),
                },
                MapOp::Get(k) => {
                    prop_assert_eq!(sut.get(&k).ok(), model.get(&k));
                }
                MapOp::Resize(n) => {
                    let before = sut.capacity();
                    match sut.resize(n) {
                        Ok(()) => prop_assert!(sut.capacity() >= before),
                        Err(e) => prop_assert!(false, "resize({}) failed: {:?}", n, e),
                    }
                }
                MapOp::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }

        let mut got: Vec<(u16, i64)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        let mut want: Vec<(u16, i64)> = model.into_iter().collect();
        got.sort_unstable();
        want.sort_unstable();
        prop_assert_eq!(got, want);
    }
}

#[derive(Clone, Debug)]
enum BidiOp {
    Insert(u8, u8),
    UpdateKey(u8, u8),
    UpdateVal(u8, u8),
    RemoveByKey(u8),
    RemoveByVal(u8),
}

fn arb_bidi_ops() -> impl Strategy<Value = Vec<BidiOp>> {
    let side = 0u8..48;
    let op = prop_oneof![
        5 => (side.clone(), side.clone()).prop_map(|(k, v)| BidiOp::Insert(k, v)),
        2 => (side.clone(), side.clone()).prop_map(|(v, k)| BidiOp::UpdateKey(v, k)),
        2 => (side.clone(), side.clone()).prop_map(|(k, v)| BidiOp::UpdateVal(k, v)),
        1 => side.clone().prop_map(BidiOp::RemoveByKey),
        1 => side.prop_map(BidiOp::RemoveByVal),
    ];
    proptest::collection::vec(op, 1..200)
}

fn assert_bijection(m: &HashBidiMap<u8, u8>, model: &BTreeMap<u8, u8>) -> Result<(), TestCaseError> {
    prop_assert_eq!(m.len(), model.len());
    let mut keys = BTreeSet::new();
    let mut vals = BTreeSet::new();
    for (k, v) in m.iter() {
        prop_assert!(keys.insert(*k), "key {} appears twice", k);
        prop_assert!(vals.insert(*v), "value {} appears twice", v);
        prop_assert_eq!(m.get_key(v), Ok(k));
        prop_assert_eq!(m.get_val(k), Ok(v));
        prop_assert_eq!(model.get(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bidimap_is_bijection(ops in arb_bidi_ops()) {
        let mut sut: HashBidiMap<u8, u8> = HashBidiMap::new();
        // key -> value; the reverse direction is derived.
        let mut model: BTreeMap<u8, u8> = BTreeMap::new();
        let key_of = |model: &BTreeMap<u8, u8>, v: u8| {
            model.iter().find(|(_, mv)| **mv == v).map(|(k, _)| *k)
        };

        for op in ops {
            match op {
                BidiOp::Insert(k, v) => {
                    let clash = model.contains_key(&k) || key_of(&model, v).is_some();
                    match sut.insert(k, v) {
                        Ok(()) => {
                            prop_assert!(!clash);
                            model.insert(k, v);
                        }
                        Err(e) => {
                            prop_assert_eq!(e, Error::Duplicate);
                            prop_assert!(clash);
                        }
                    }
                }
                BidiOp::UpdateKey(v, new_key) => {
                    let owner = key_of(&model, v);
                    match sut.update_key(&v, new_key) {
                        Ok(old) => {
                            prop_assert_eq!(Some(old), owner);
                            if old != new_key {
                                model.remove(&old);
                                model.insert(new_key, v);
                            }
                        }
                        Err(Error::Duplicate) => {
                            prop_assert!(owner.is_some() && model.contains_key(&new_key));
                        }
                        Err(_) => prop_assert!(owner.is_none()),
                    }
                }
                BidiOp::UpdateVal(k, new_val) => {
                    let current = model.get(&k).copied();
                    match sut.update_val(&k, new_val) {
                        Ok(old) => {
                            prop_assert_eq!(Some(old), current);
                            model.insert(k, new_val);
                        }
                        Err(Error::Duplicate) => {
                            prop_assert!(current.is_some() && key_of(&model, new_val).is_some());
                        }
                        Err(_) => prop_assert!(current.is_none()),
                    }
                }
                BidiOp::RemoveByKey(k) => match sut.remove_by_key(&k) {
                    Ok((rk, rv)) => {
                        prop_assert_eq!(rk, k);
                        prop_assert_eq!(model.remove(&k), Some(rv));
                    }
                    Err(_) => prop_assert!(!model.contains_key(&k)),
                },
                BidiOp::RemoveByVal(v) => match sut.remove_by_val(&v) {
                    Ok((rk, rv)) => {
                        prop_assert_eq!(rv, v);
                        prop_assert_eq!(model.remove(&rk), Some(v));
                    }
                    Err(_) => prop_assert!(key_of(&model, v).is_none()),
                },
            }
            assert_bijection(&sut, &model)?;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multiset_counts(ops in proptest::collection::vec((0u8..3, 0u8..20, 0usize..4), 1..150)) {
        let mut sut: HashMultiset<u8> = HashMultiset::new();
        let mut model: BTreeMap<u8, usize> = BTreeMap::new();
        for (op, v, n) in ops {
            match op {
                0 => {
                    sut.insert_many(v, n).unwrap();
                    if n > 0 {
                        *model.entry(v).or_insert(0) += n;
                    }
                }
                1 => {
                    let had = model.get(&v).copied().unwrap_or(0);
                    match sut.remove(&v) {
                        Ok(()) => {
                            prop_assert!(had > 0);
                            if had == 1 {
                                model.remove(&v);
                            } else {
                                model.insert(v, had - 1);
                            }
                        }
                        Err(_) => prop_assert_eq!(had, 0),
                    }
                }
                _ => {
                    let old = sut.update(v, n).unwrap();
                    prop_assert_eq!(old, model.get(&v).copied().unwrap_or(0));
                    if n == 0 {
                        model.remove(&v);
                    } else {
                        model.insert(v, n);
                    }
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.cardinality(), model.values().sum::<usize>());
            for (val, count) in &model {
                prop_assert_eq!(sut.multiplicity_of(val), *count);
            }
        }
    }
}
