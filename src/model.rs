//! Randomized equivalence checking against `BTreeMap`.
//!
//! Shared by the unit tests (through `proptest`) and the `fuzz/` targets
//! (through `arbitrary`).
use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{Error, Redwood};

/// Key selector. `Index` picks an existing key so removals and overwrites hit often.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Set(ItemValue, u64),
    Get(ItemValue),
    Update(ItemValue, u64),
    Contains(ItemValue),
    Remove(ItemValue),
    Take(ItemValue),
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_key(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Set(item, value) => FinalOp::Set(get_key(sorted, item), value),
            Op::Get(item) => FinalOp::Get(get_key(sorted, item)),
            Op::Update(item, value) => FinalOp::Update(get_key(sorted, item), value),
            Op::Contains(item) => FinalOp::Contains(get_key(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_key(sorted, item)),
            Op::Take(item) => FinalOp::Take(get_key(sorted, item)),
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Set(u32, u64),
    Get(u32),
    Update(u32, u64),
    Contains(u32),
    Remove(u32),
    Take(u32),
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        10 => (value_strategy(), proptest::num::u64::ANY).prop_map(|(k, v)| Op::Set(k, v)),
        4 => value_strategy().prop_map(Op::Get),
        2 => (value_strategy(), proptest::num::u64::ANY).prop_map(|(k, v)| Op::Update(k, v)),
        2 => value_strategy().prop_map(Op::Contains),
        6 => value_strategy().prop_map(Op::Remove),
        2 => value_strategy().prop_map(Op::Take),
        1 => Just(Op::Clear),
    ]
}

/// Applies `ops` to both a `Redwood` and a `BTreeMap`, asserting after every step
/// that the answers, the contents and the red-black invariants agree.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree = BTreeMap::new();
    let mut redwood: Redwood<u32, u64> = Redwood::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let sorted_keys: Vec<u32> = btree.keys().copied().collect();
        let final_op = op.finalize(&sorted_keys);

        match final_op {
            FinalOp::Set(key, value) => {
                btree.insert(key, value);
                redwood.set(key, value);
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key).ok_or(Error::NotFound);
                let from_redwood = redwood.get(&key);

                assert_eq!(from_btree, from_redwood, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Update(key, value) => {
                let from_btree = btree
                    .get_mut(&key)
                    .map(|v| *v = value)
                    .ok_or(Error::NotFound);
                let from_redwood = redwood.get_mut(&key).map(|v| *v = value);

                assert_eq!(from_btree, from_redwood, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Contains(key) => {
                assert_eq!(
                    btree.contains_key(&key),
                    redwood.contains(&key),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Remove(key) => {
                btree.remove(&key);
                redwood.remove(&key);

                assert!(!redwood.contains(&key), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Take(key) => {
                let from_btree = btree.remove(&key);
                let from_redwood = redwood.take(&key);

                assert_eq!(from_btree, from_redwood, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                btree.clear();
                redwood.clear();
            }
        }

        redwood.assert_invariants();
        assert_eq!(btree.len(), redwood.len());
        assert!(
            btree.iter().eq(redwood.iter()),
            "FinalOp #{op_id}: {final_op:?} left different contents"
        );
        assert!(height_within_bound(&redwood), "FinalOp #{op_id}: tree too tall");
    }
}

/// Whether the tree height is at most `2 * log2(len + 1)`.
pub fn height_within_bound<K, V>(tree: &Redwood<K, V>) -> bool {
    // height <= 2 * log2(n + 1)  <=>  2^height <= (n + 1)^2
    let n = tree.len() as u128 + 1;
    let height = tree.height() as u32;

    height < 128 && 1u128 << height <= n * n
}
