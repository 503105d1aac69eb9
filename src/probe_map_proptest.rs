#![cfg(test)]

// Property tests for ProbeMap kept inside the crate so they can check the
// bucket index alongside the public surface.

use crate::{MapError, ProbeMap};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::fmt;

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
    IndexDefault(usize, i32),
    Remove(usize),
    Find(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::IndexDefault(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            2 => idx.clone().prop_map(OpI::At),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Insertion-ordered model: a Vec of live pairs, oldest first.
fn model_get<'a>(model: &'a [(Key, i32)], k: &Key) -> Option<&'a i32> {
    model.iter().find(|(mk, _)| mk == k).map(|(_, v)| v)
}

fn model_pos(model: &[(Key, i32)], k: &Key) -> Option<usize> {
    model.iter().position(|(mk, _)| mk == k)
}

// Drives one scenario against `sut` and checks, after every op:
// - `len`/`is_empty` parity with the model;
// - occupied slot count equals `len`;
// - `len * 2 <= capacity` and, after removals, `len * 4 > capacity` above the floor;
// - iteration order equals the model's insertion order.
fn run_scenario<S: BuildHasher>(
    mut sut: ProbeMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(Key, i32)> = Vec::new();

    for op in ops {
        let mut removed = false;
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model_get(&model, &k).is_some();
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert result must reflect absence");
                if inserted {
                    model.push((k, v));
                }
            }
            OpI::IndexDefault(i, v) => {
                let k = key_from(pool, i);
                let slot = sut.get_or_insert_default(k.clone());
                match model_pos(&model, &k) {
                    Some(p) => prop_assert_eq!(*slot, model[p].1),
                    None => {
                        prop_assert_eq!(*slot, 0);
                        model.push((k.clone(), 0));
                    }
                }
                *slot = v;
                let p = model_pos(&model, &k).expect("just ensured");
                model[p].1 = v;
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let got = sut.remove_entry(&k);
                match model_pos(&model, &k) {
                    Some(p) => {
                        let (mk, mv) = model.remove(p);
                        prop_assert_eq!(got, Some((mk, mv)));
                        removed = true;
                    }
                    None => prop_assert!(got.is_none(), "removing absent key is a no-op"),
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k).map(|(fk, fv)| (fk.clone(), *fv));
                let expected = model_get(&model, &k).map(|v| (k.clone(), *v));
                prop_assert_eq!(found, expected);
            }
            OpI::At(i) => {
                let k = key_from(pool, i);
                let len_before = sut.len();
                match model_get(&model, &k) {
                    Some(v) => prop_assert_eq!(sut.at(&k), Ok(v)),
                    None => prop_assert_eq!(sut.at(&k), Err(MapError::NotFound)),
                }
                prop_assert_eq!(sut.len(), len_before);
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.iter().any(|(k, _)| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model_pos(&model, &k)) {
                    (Some(vr), Some(p)) => {
                        *vr = vr.saturating_add(d);
                        model[p].1 = model[p].1.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Iterate => {
                let seen: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &model);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), 2);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.occupied_slots(), sut.len());
        prop_assert!(sut.len() * 2 <= sut.capacity());
        if removed && sut.capacity() > 2 {
            prop_assert!(sut.len() * 4 > sut.capacity());
        }
        let order: Vec<&Key> = sut.keys().collect();
        let model_order: Vec<&Key> = model.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(order, model_order);
    }
    Ok(())
}

// Property: state-machine equivalence against an insertion-ordered model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ProbeMap::new(), &pool, ops)?;
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

// Property: the same invariants under worst-case collisions, where every
// probe walks one long run of occupied slots and tombstones.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ProbeMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: a clone taken mid-sequence is unaffected by later mutation of
// the source, and vice versa.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_clone_is_independent(
        keys in proptest::collection::vec(0u16..64, 0..80),
        drop_keys in proptest::collection::vec(0u16..64, 0..40),
    ) {
        let mut src: ProbeMap<u16, u16> = ProbeMap::new();
        for &k in &keys {
            src.insert(k, k);
        }
        let snapshot: Vec<(u16, u16)> = src.iter().map(|(k, v)| (*k, *v)).collect();
        let mut copy = src.clone();
        for k in &drop_keys {
            src.remove(k);
        }
        src.insert(1000, 1);
        let copy_now: Vec<(u16, u16)> = copy.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&copy_now, &snapshot);

        copy.clear();
        prop_assert!(src.contains_key(&1000));
    }
}
