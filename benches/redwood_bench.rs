use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::prelude::*;
use rbtree::RBTree;
use redwood::Redwood;
use std::collections::BTreeMap;
use std::ops::Range;

fn bench_baseline_multi_insertions(data: Vec<usize>) {
    let mut tree = BTreeMap::new();

    for i in data {
        tree.insert(i, i);
    }
}

fn bench_rbtree_multi_insertions(data: Vec<usize>) {
    let mut tree = RBTree::new();

    for i in data {
        tree.insert(i, i);
    }
}

fn bench_multi_insertions(data: Vec<usize>) {
    let mut tree = Redwood::new();

    for i in data {
        tree.set(i, i);
    }
}

fn bench_multi_insertions_hint(data: Vec<usize>) {
    let mut tree = Redwood::with_capacity(data.len());

    for i in data {
        tree.set(i, i);
    }
}

fn init_large_btree() -> BTreeMap<usize, usize> {
    let mut tree = BTreeMap::new();

    for i in random_insertion_order() {
        tree.insert(i, i);
    }

    tree
}

fn init_large_redwood_tree() -> Redwood<usize, usize> {
    let mut tree = Redwood::new();

    for i in random_insertion_order() {
        tree.set(i, i);
    }

    tree
}

fn random_insertion_order() -> Vec<usize> {
    let mut rng = rand::thread_rng();
    let mut indices: Vec<usize> = (0..100000).collect();

    indices.shuffle(&mut rng);

    indices
}

fn init_random_data(count: usize, range_opt: Option<Range<usize>>) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    let range = range_opt.unwrap_or(0..100000);
    let range = rand::distributions::Uniform::new(range.start, range.end);

    let indices: Vec<usize> = (0..count).map(|_| rng.sample(range)).collect();

    indices
}

fn bench_baseline_random_deletions(mut tree: BTreeMap<usize, usize>, indices: Vec<usize>) {
    for idx in indices {
        tree.remove(&idx);
    }
}

fn bench_random_deletions(mut tree: Redwood<usize, usize>, indices: Vec<usize>) {
    for idx in indices {
        tree.remove(&idx);
    }
}

fn bench_baseline_random_lookups(tree: BTreeMap<usize, usize>, indices: Vec<usize>) {
    for idx in indices {
        assert!(tree.contains_key(&idx));
    }
}

fn bench_random_lookups(tree: Redwood<usize, usize>, indices: Vec<usize>) {
    for idx in indices {
        assert_eq!(tree.get(&idx), Ok(&idx));
    }
}

fn inorder_iteration_btree(tree: BTreeMap<usize, usize>) {
    for (i, (&key, _)) in tree.iter().enumerate() {
        assert_eq!(i, key);
    }
}

fn inorder_iteration(tree: Redwood<usize, usize>) {
    for (i, (&key, _)) in tree.iter().enumerate() {
        assert_eq!(i, key);
    }
}

mod insert_delete {
    use super::*;

    pub fn bench_insert_delete(
        mut tree: Redwood<usize, usize>,
        insertions: &[usize],
        deletions: &[usize],
    ) {
        for key in deletions {
            tree.remove(key);
        }
        for &key in insertions {
            tree.set(key, key);
        }
    }

    pub fn bench_baseline_insert_delete(
        mut tree: BTreeMap<usize, usize>,
        insertions: &[usize],
        deletions: &[usize],
    ) {
        for key in deletions {
            tree.remove(key);
        }
        for &key in insertions {
            tree.insert(key, key);
        }
    }
}

fn redwood_tree_benchmark(c: &mut Criterion) {
    c.bench_function("baseline tree insert delete", |b| {
        b.iter_batched(
            || {
                (
                    init_large_btree(),
                    init_random_data(2000, Some(100000..300000)),
                    init_random_data(2000, Some(0..100000)),
                )
            },
            |(tree, to_insert, to_delete)| {
                insert_delete::bench_baseline_insert_delete(tree, &to_insert, &to_delete)
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree insert delete", |b| {
        b.iter_batched(
            || {
                (
                    init_large_redwood_tree(),
                    init_random_data(2000, Some(100000..300000)),
                    init_random_data(2000, Some(0..100000)),
                )
            },
            |(tree, to_insert, to_delete)| {
                insert_delete::bench_insert_delete(tree, &to_insert, &to_delete)
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_baseline_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("rbtree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_rbtree_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree 100K insertions with size hint", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_multi_insertions_hint,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree random lookups", |b| {
        b.iter_batched(
            || (init_large_btree(), init_random_data(5000, None)),
            |(tree, indices)| bench_baseline_random_lookups(tree, indices),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree random lookups", |b| {
        b.iter_batched(
            || (init_large_redwood_tree(), init_random_data(5000, None)),
            |(tree, indices)| bench_random_lookups(tree, indices),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree random deletions", |b| {
        b.iter_batched(
            || (init_large_btree(), init_random_data(5000, None)),
            |(tree, indices)| bench_baseline_random_deletions(tree, indices),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree random deletions", |b| {
        b.iter_batched(
            || (init_large_redwood_tree(), init_random_data(5000, None)),
            |(tree, indices)| bench_random_deletions(tree, indices),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree inorder iteration", |b| {
        b.iter_batched(
            init_large_redwood_tree,
            inorder_iteration,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree inorder iteration", |b| {
        b.iter_batched(
            init_large_btree,
            inorder_iteration_btree,
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, redwood_tree_benchmark);
criterion_main!(benches);
