#![cfg(test)]

// Property tests for TreeMap kept inside the crate so the structural
// checker is reachable without feature gates.

use crate::error::{CursorOp, MapError};
use crate::map::AssociativeMap;
use crate::tree_map::TreeMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32),
    GetOrInsert(u8),
    Remove(u8),
    RemoveViaCursor(u8),
    Lookup(u8),
    Mutate(u8, i32),
    Iterate,
    WalkBackward,
    CloneAndCompare,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // A small key space forces repeated hits, removals of present keys and
    // removals that cascade through the fixup cases.
    let key = 0u8..48;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key.clone().prop_map(Op::GetOrInsert),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::RemoveViaCursor),
        2 => key.clone().prop_map(Op::Lookup),
        1 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Iterate),
        1 => Just(Op::WalkBackward),
        1 => Just(Op::CloneAndCompare),
    ];
    proptest::collection::vec(op, 1..200)
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// Invariants exercised across random operation sequences:
// - red-black shape (root black, no red-red edge, equal black-height),
//   parent/child link agreement and the cached minimum, after every op;
// - lookups agree with the model; absent keys fail with KeyNotFound;
// - forward traversal is strictly increasing and equals the model;
// - backward cursor walk from the end yields the reverse sequence and is
//   refused exactly at the first entry;
// - removal through a cursor lands on the model's successor.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: TreeMap<u8, i32> = TreeMap::new();
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
                }
                Op::GetOrInsert(k) => {
                    let got = *sut.get_or_insert(k);
                    let expected = *model.entry(k).or_default();
                    prop_assert_eq!(got, expected);
                }
                Op::Remove(k) => {
                    match model.remove(&k) {
                        Some(v) => prop_assert_eq!(sut.remove(&k), Ok(v)),
                        None => prop_assert_eq!(sut.remove(&k), Err(MapError::KeyNotFound)),
                    }
                }
                Op::RemoveViaCursor(k) => {
                    let expected_next = model.range(k.saturating_add(1)..).next().map(|(k, _)| *k);
                    let present = model.remove(&k);
                    let mut c = sut.find_mut(&k);
                    match present {
                        Some(v) => {
                            prop_assert_eq!(c.remove_current(), Ok((k, v)));
                            prop_assert_eq!(c.key().ok().copied(), expected_next);
                            prop_assert_eq!(c.is_end(), expected_next.is_none());
                        }
                        None => {
                            prop_assert!(c.is_end());
                            prop_assert_eq!(
                                c.remove_current(),
                                Err(MapError::InvalidCursorOperation(CursorOp::Remove))
                            );
                        }
                    }
                }
                Op::Lookup(k) => {
                    prop_assert_eq!(sut.lookup(&k).ok(), model.get(&k));
                    prop_assert_eq!(sut.find(&k).is_end(), !model.contains_key(&k));
                }
                Op::Mutate(k, d) => {
                    if let Ok(v) = sut.lookup_mut(&k) {
                        *v = v.wrapping_add(d);
                        let mv = model.get_mut(&k).expect("model has key");
                        *mv = mv.wrapping_add(d);
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                Op::Iterate => {
                    let s: Vec<_> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                    let m: Vec<_> = model.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(s, m);
                }
                Op::WalkBackward => {
                    let mut c = sut.cursor_end();
                    let mut seen = Vec::new();
                    while c.move_prev().is_ok() {
                        seen.push(*c.key().expect("positioned on an entry"));
                    }
                    let m: Vec<_> = model.keys().rev().copied().collect();
                    prop_assert_eq!(seen, m);
                    prop_assert_eq!(
                        c.move_prev(),
                        Err(MapError::InvalidCursorOperation(CursorOp::Prev))
                    );
                }
                Op::CloneAndCompare => {
                    let mut copy = sut.clone();
                    prop_assert!(copy == sut);
                    if let Some((&k, _)) = model.iter().next() {
                        copy.remove(&k).expect("copy has key");
                        prop_assert!(copy != sut);
                        prop_assert!(sut.contains_key(&k));
                    }
                }
            }

            if let Err(why) = sut.check_invariants() {
                prop_assert!(false, "invariant violated: {}", why);
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}

// Property: rebuilding a map from its own traversal yields an equal map.
proptest! {
    #[test]
    fn prop_round_trip_through_traversal(pairs in proptest::collection::vec((any::<i16>(), any::<i32>()), 0..100)) {
        let original: TreeMap<i16, i32> = pairs.iter().copied().collect();
        let rebuilt: TreeMap<i16, i32> = original.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert!(rebuilt == original);
        prop_assert!(rebuilt.check_invariants().is_ok());

        let distinct: std::collections::BTreeSet<_> = pairs.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(original.len(), distinct.len());
    }
}
