// ChainedHashMap scenarios through the public API.
//
// Invariants exercised:
// - Lookups follow inserts and removals; absence is KeyNotFound.
// - Cursor traversal visits every entry once, skipping empty buckets,
//   and keeps working after the lowest occupied bucket is emptied.
// - Equality is by contents, independent of bucket count.
use assoc_maps::{AssociativeMap, ChainedHashMap, MapError, DEFAULT_CAPACITY};
use std::collections::HashSet;

// Test: the two-key scenario.
#[test]
fn two_keys_remove_one() {
    let mut m: ChainedHashMap<i32, &str> = ChainedHashMap::new();
    m.insert(1, "a");
    m.insert(2, "b");
    assert_eq!(m.len(), 2);
    m.remove(&1).unwrap();
    assert_eq!(m.lookup(&1), Err(MapError::KeyNotFound));
    assert_eq!(m.lookup(&2), Ok(&"b"));
    assert_eq!(m.capacity(), DEFAULT_CAPACITY);
}

// Test: removing entries in traversal order.
// Assumes: removal can empty the lowest occupied bucket at any step.
// Verifies: the front cursor always lands on a live entry and the rest of
// the map is still reachable both ways.
#[test]
fn front_stays_valid_while_removing_in_order() {
    let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::with_capacity(17);
    for k in 0..60 {
        m.insert(k, k);
    }
    loop {
        let front = m.cursor_front().key().ok().copied();
        let Some(k) = front else { break };
        m.remove(&k).unwrap();
        let forward: HashSet<u32> = m.keys().copied().collect();
        assert_eq!(forward.len(), m.len());
        let mut c = m.cursor_end();
        let mut back = 0;
        while c.move_prev().is_ok() {
            back += 1;
        }
        assert_eq!(back, m.len());
    }
    assert!(m.is_empty());
}

// Test: content equality across different bucket counts.
#[test]
fn equality_across_capacities() {
    let mut a: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity(3);
    let mut b: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity(101);
    for (i, w) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        a.insert((*w).to_string(), i as i32);
    }
    for (i, w) in ["alpha", "beta", "gamma", "delta"].iter().enumerate().rev() {
        b.insert((*w).to_string(), i as i32);
    }
    assert_eq!(a, b);
    *b.get_or_insert("alpha".to_string()) = 99;
    assert_ne!(a, b);
    assert_eq!(a["alpha"], 0);
}

// Test: iteration through `&map` and `&mut map`.
#[test]
fn into_iterator_impls() {
    let mut m: ChainedHashMap<u8, u32> = (0..20).map(|k| (k, 1)).collect();
    for (_, v) in &mut m {
        *v *= 3;
    }
    let sum: u32 = (&m).into_iter().map(|(_, v)| *v).sum();
    assert_eq!(sum, 60);
    assert_eq!(m.values().count(), 20);
}
