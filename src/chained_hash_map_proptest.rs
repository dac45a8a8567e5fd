#![cfg(test)]

// Property tests for ChainedHashMap. A handful of buckets keeps chains long
// and leaves plenty of empty buckets for the cursor to skip.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::{CursorOp, MapError};
use crate::map::AssociativeMap;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrInsert(usize),
    Remove(usize),
    RemoveViaCursor(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    WalkBothWays,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::GetOrInsert),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::RemoveViaCursor),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            2 => Just(OpI::WalkBothWays),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            OpI::GetOrInsert(i) => {
                let k = key_from(&pool, i);
                let got = *sut.get_or_insert(k.clone());
                prop_assert_eq!(got, *model.entry(k).or_default());
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                match model.remove(&k) {
                    Some(v) => prop_assert_eq!(sut.remove(&k), Ok(v)),
                    None => prop_assert_eq!(sut.remove(&k), Err(MapError::KeyNotFound)),
                }
            }
            OpI::RemoveViaCursor(i) => {
                let k = key_from(&pool, i);
                let present = model.remove(&k);
                let mut c = sut.find_mut(&k);
                match present {
                    Some(v) => {
                        prop_assert_eq!(c.remove_current(), Ok((k, v)));
                        // Whatever the cursor landed on must still be live.
                        if let Ok((nk, nv)) = c.key_value() {
                            prop_assert_eq!(model.get(nk), Some(nv));
                        }
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
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(!c.is_end(), model.contains_key(&k));
                prop_assert_eq!(c.value().ok(), model.get(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(vr) = sut.get_mut(&k) {
                    *vr = vr.saturating_add(d);
                    let mv = model.get_mut(&k).expect("model has key");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::WalkBothWays => {
                let mut forward = Vec::new();
                let mut c = sut.cursor_front();
                while !c.is_end() {
                    forward.push(c.key().expect("positioned on an entry").clone());
                    prop_assert!(c.move_next().is_ok());
                }
                prop_assert_eq!(
                    c.move_next(),
                    Err(MapError::InvalidCursorOperation(CursorOp::Next))
                );
                let mut backward = Vec::new();
                while c.move_prev().is_ok() {
                    backward.push(c.key().expect("positioned on an entry").clone());
                }
                backward.reverse();
                prop_assert_eq!(&forward, &backward);
                prop_assert!(c == sut.cursor_front());
                let iterated: Vec<_> = sut.keys().cloned().collect();
                prop_assert_eq!(forward, iterated);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.iter().len(), model.len());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap,
// with forward and backward cursor walks agreeing with iteration order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_capacity(13), pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants when every key lands in one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_capacity_and_hasher(5, ConstBuildHasher), pool, ops)?;
    }
}

// Property: equality depends on contents only, not on bucket count.
proptest! {
    #[test]
    fn prop_equality_ignores_capacity(
        pairs in proptest::collection::vec((any::<u16>(), any::<i8>()), 0..64),
        a_buckets in 1usize..40,
        b_buckets in 1usize..40,
    ) {
        let mut a: ChainedHashMap<u16, i8> = ChainedHashMap::with_capacity(a_buckets);
        let mut b: ChainedHashMap<u16, i8> = ChainedHashMap::with_capacity(b_buckets);
        a.extend(pairs.iter().copied());
        b.extend(pairs.iter().rev().copied());
        let model: HashMap<u16, i8> = pairs.iter().copied().collect();
        let reversed: HashMap<u16, i8> = pairs.iter().rev().copied().collect();
        prop_assert_eq!(a == b, model == reversed);

        let rebuilt: ChainedHashMap<u16, i8> = a.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert!(rebuilt == a);
    }
}
