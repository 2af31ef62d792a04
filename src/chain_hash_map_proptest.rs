#![cfg(test)]

// Property tests for ChainHashMap kept inside the crate so they can check
// internal state (the begin cache) alongside the public behavior.

use crate::{ChainHashMap, NotFound};
use core::hash::{BuildHasher, Hasher};
use hashbrown::{HashMap, HashSet};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i32),
    Remove(u32),
    Find(u32),
    At(u32),
    GetOrDefault(u32),
    Mutate(u32, i32),
    Iterate,
    Clear,
}

// Keys are drawn from a range wide enough to cross the first growth
// threshold, with occasional clears.
fn arb_ops(max_key: u32) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..max_key;
    let op = prop_oneof![
        8 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Find),
        2 => key.clone().prop_map(Op::At),
        2 => key.clone().prop_map(Op::GetOrDefault),
        2 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..700)
}

fn run_against_model<S: BuildHasher>(
    mut sut: ChainHashMap<u32, i32, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u32, i32> = HashMap::new();

    for op in ops {
        let buckets_before = sut.bucket_count();
        let is_clear = matches!(op, Op::Clear);
        match op {
            Op::Insert(k, v) => {
                let inserted = sut.insert(k, v);
                prop_assert_eq!(inserted, !model.contains_key(&k));
                // A present key keeps its first value.
                model.entry(k).or_insert(v);
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::Find(k) => {
                let c = sut.find(&k);
                prop_assert_eq!(c == sut.end(), !model.contains_key(&k));
                prop_assert_eq!(c.value(&sut), model.get(&k));
            }
            Op::At(k) => match model.get(&k) {
                Some(v) => prop_assert_eq!(sut.at(&k), Ok(v)),
                None => prop_assert_eq!(sut.at(&k), Err(NotFound)),
            },
            Op::GetOrDefault(k) => {
                let got = *sut.get_or_default(k);
                prop_assert_eq!(got, *model.entry(k).or_default());
            }
            Op::Mutate(k, d) => {
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let mut seen: HashMap<u32, i32> = HashMap::new();
                for (k, v) in sut.iter() {
                    prop_assert!(seen.insert(*k, *v).is_none(), "key visited twice");
                }
                prop_assert_eq!(&seen, &model);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), 128);
            }
        }

        // Size parity and emptiness.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if sut.is_empty() {
            prop_assert_eq!(sut.begin(), sut.end());
        }

        // Table shape: power of two, never below the minimum, and a
        // rebuild lands exactly on 4 × len.
        let buckets = sut.bucket_count();
        prop_assert!(buckets.is_power_of_two());
        prop_assert!(buckets >= 128);
        if buckets != buckets_before && !is_clear {
            prop_assert_eq!(buckets, 4 * sut.len());
        }
        prop_assert!(sut.len() < 128 || sut.load_factor() < 0.5);

        // Begin cache is a lower bound on the first occupied bucket.
        let first = sut.table.first_occupied(0);
        if let Some(first) = first {
            prop_assert!(sut.maybe_begin <= first);
        }

        // The cursor walk visits len distinct keys and ends on end().
        let mut walked = HashSet::new();
        let mut c = sut.begin();
        while c != sut.end() {
            let k = *c.key(&sut).expect("live cursor resolves");
            prop_assert!(walked.insert(k));
            c = c.advance(&sut);
        }
        prop_assert_eq!(walked.len(), sut.len());
    }
    Ok(())
}

// Property: state-machine equivalence against a hashbrown map that models
// the no-update insert contract.
// Invariants exercised across random operation sequences:
// - `insert` reports whether the key was new and never overwrites.
// - `remove`, `find`, `at` and `get_or_default` agree with the model.
// - Iteration and cursor walks visit each live key exactly once.
// - Growth only ever lands on `4 × len`, the table stays a power of two,
//   and the begin cache never overshoots the first occupied bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops(600)) {
        run_against_model(ChainHashMap::new(), ops)?;
    }
}

// Collision variant using a constant hasher: every record shares bucket 0.
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

// Property: same invariants as above under worst-case collisions. Chains get
// long, which stresses linear scans and unlinking in the middle of a chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 24, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops(300)) {
        run_against_model(ChainHashMap::with_hasher(ConstBuildHasher), ops)?;
    }
}

// Property: building from a sequence with repeats keeps the first value of
// every key, matching a model that only records first occurrences.
proptest! {
    #[test]
    fn prop_from_iter_first_occurrence_wins(
        pairs in proptest::collection::vec((0u16..200, any::<i32>()), 0..500)
    ) {
        let sut: ChainHashMap<u16, i32> = pairs.iter().copied().collect();
        let mut model: HashMap<u16, i32> = HashMap::new();
        for (k, v) in pairs {
            model.entry(k).or_insert(v);
        }
        prop_assert_eq!(sut.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }
    }
}
