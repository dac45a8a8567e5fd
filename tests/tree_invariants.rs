// Red-black shape checks from outside the crate (needs `bench_internal`).
use assoc_maps::TreeMap;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_invariants_hold_after_mixed_ops(
        inserts in proptest::collection::vec(any::<u16>(), 0..300),
        removals in proptest::collection::vec(any::<u16>(), 0..300),
    ) {
        let mut m: TreeMap<u16, ()> = TreeMap::new();
        for k in &inserts {
            m.insert(*k, ());
            prop_assert!(m.check_invariants().is_ok());
        }
        for k in &removals {
            let _ = m.remove(k);
            if let Err(why) = m.check_invariants() {
                prop_assert!(false, "after removing {}: {}", k, why);
            }
        }
        let keys: Vec<_> = m.keys().copied().collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
