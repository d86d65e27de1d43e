#![no_main]
use libfuzzer_sys::fuzz_target;

use redwood::model::{Op, run_btree_equivalence};

fuzz_target!(|ops: Vec<Op>| { run_btree_equivalence(ops) });
