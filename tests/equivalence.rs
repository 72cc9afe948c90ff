use contend::{
    run_push_pop, Config, LockKind, LockedQueue, LockedStack, MsQueue, Optimizations, Structure,
    TreiberStack,
};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(i64),
    Remove,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![any::<i64>().prop_map(Op::Insert), Just(Op::Remove)]
}

fn replay<S: Structure>(structure: &S, ops: &[Op]) -> Vec<Option<i64>> {
    let mut handle = structure.handle(0);

    ops.iter()
        .map(|op| match *op {
            Op::Insert(value) => {
                structure.insert(&mut handle, value);
                None
            }
            Op::Remove => structure.remove(&mut handle),
        })
        .collect()
}

fn stack_model(ops: &[Op]) -> Vec<Option<i64>> {
    let mut model = Vec::new();

    ops.iter()
        .map(|op| match *op {
            Op::Insert(value) => {
                model.push(value);
                None
            }
            Op::Remove => model.pop(),
        })
        .collect()
}

fn queue_model(ops: &[Op]) -> Vec<Option<i64>> {
    let mut model = VecDeque::new();

    ops.iter()
        .map(|op| match *op {
            Op::Insert(value) => {
                model.push_back(value);
                None
            }
            Op::Remove => model.pop_front(),
        })
        .collect()
}

fn optimizations() -> impl Strategy<Value = Optimizations> {
    (any::<bool>(), any::<bool>())
        .prop_map(|(combining, elimination)| Optimizations::new(combining, elimination))
}

fn lock() -> impl Strategy<Value = LockKind> {
    prop::sample::select(LockKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn stacks_match_a_sequential_stack(
        ops in prop::collection::vec(op(), 0..200),
        optimizations in optimizations(),
        lock in lock(),
    ) {
        let config = Config::new(1, ops.len())
            .with_lock(lock)
            .with_optimizations(optimizations);
        let expected = stack_model(&ops);

        prop_assert_eq!(replay(&LockedStack::new(&config), &ops), expected.clone());
        prop_assert_eq!(replay(&TreiberStack::new(&config), &ops), expected.clone());
        prop_assert_eq!(replay(&TreiberStack::without_elimination(&config), &ops), expected);
    }

    #[test]
    fn queues_match_a_sequential_queue(
        ops in prop::collection::vec(op(), 0..200),
        optimizations in optimizations(),
        lock in lock(),
    ) {
        let config = Config::new(1, ops.len())
            .with_lock(lock)
            .with_optimizations(optimizations);
        let expected = queue_model(&ops);

        prop_assert_eq!(replay(&LockedQueue::new(&config), &ops), expected.clone());
        prop_assert_eq!(replay(&MsQueue::new(&config), &ops), expected);
    }
}

#[test]
fn optimizations_do_not_change_the_outcome() {
    let base = Config::new(4, 1_500).with_lock(LockKind::Ttas);
    let mut outcomes = Vec::new();

    for optimizations in [
        Optimizations::NONE,
        Optimizations::COMBINING,
        Optimizations::ELIMINATION,
        Optimizations::ALL,
    ] {
        let config = base.clone().with_optimizations(optimizations);

        let stack = LockedStack::new(&config);
        outcomes.push(run_push_pop(&stack, &config).sorted_removed());

        let queue = LockedQueue::new(&config);
        outcomes.push(run_push_pop(&queue, &config).sorted_removed());
    }

    let treiber = TreiberStack::new(&base);
    outcomes.push(run_push_pop(&treiber, &base).sorted_removed());

    let ms = MsQueue::new(&base);
    outcomes.push(run_push_pop(&ms, &base).sorted_removed());

    for outcome in &outcomes[1..] {
        assert_eq!(outcome, &outcomes[0]);
    }

    assert_eq!(outcomes[0].len(), 4 * 1_500);
}
