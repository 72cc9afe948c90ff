use contend::{
    run_push_pop, Config, LockKind, LockedQueue, MsQueue, Optimizations, ReclaimConfig,
    SpinConfig, Structure,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;

fn config(threads: usize, iterations: usize) -> Config {
    Config::new(threads, iterations).with_spin(SpinConfig::eager_yield())
}

fn sanity<Q: Structure>(queue: &Q) {
    let mut handle = queue.handle(0);

    queue.insert(&mut handle, 1);
    queue.insert(&mut handle, 2);

    assert_eq!(queue.remove(&mut handle), Some(1));
    assert_eq!(queue.remove(&mut handle), Some(2));
    assert_eq!(queue.remove(&mut handle), None);
}

#[test]
fn single_thread_sanity() {
    let config = config(1, 2);

    sanity(&MsQueue::new(&config));

    for lock in LockKind::ALL {
        for optimizations in [Optimizations::NONE, Optimizations::COMBINING] {
            let config = config
                .clone()
                .with_lock(lock)
                .with_optimizations(optimizations);
            sanity(&LockedQueue::new(&config));
        }
    }
}

#[test]
fn ms_queue_conserves_values() {
    let reclaim = ReclaimConfig::default()
        .with_reclaim_interval(32)
        .with_advance_interval(16);
    let config = config(8, 2_000).with_reclaim(reclaim);
    let queue = MsQueue::new(&config);

    for _ in 0..3 {
        let report = run_push_pop(&queue, &config);
        assert!(report.is_conserved());
        assert!(queue.is_empty());
    }

    assert!(queue.collector().arena().allocated() <= 3 * 8 * 2_000);
}

#[test]
fn locked_queue_conserves_values_for_every_variant() {
    for lock in LockKind::ALL {
        for optimizations in [Optimizations::NONE, Optimizations::COMBINING] {
            let config = config(6, 1_000)
                .with_lock(lock)
                .with_optimizations(optimizations);
            let queue = LockedQueue::new(&config);
            let report = run_push_pop(&queue, &config);

            assert!(report.is_conserved(), "{} {:?}", lock, optimizations);
            assert!(queue.is_empty());
        }
    }
}

/// Values from one producer leave the queue in the order they went in, whichever
/// consumer takes them.
#[test]
fn per_producer_order_is_kept() {
    const PRODUCERS: usize = 3;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: i64 = 3_000;

    let config = config(PRODUCERS + CONSUMERS, PER_PRODUCER as usize);
    let queue = MsQueue::new(&config);
    let seen = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for producer in 0..PRODUCERS {
            let queue = &queue;

            scope.spawn(move || {
                let mut handle = queue.handle(producer);

                for i in 0..PER_PRODUCER {
                    queue.enqueue(&mut handle, producer as i64 * PER_PRODUCER + i);
                }
            });
        }

        for consumer in 0..CONSUMERS {
            let (queue, seen) = (&queue, &seen);

            scope.spawn(move || {
                let mut handle = queue.handle(PRODUCERS + consumer);
                let mut last: HashMap<i64, i64> = HashMap::new();
                let mut taken = Vec::new();
                let mut misses = 0;

                while misses < 10_000 {
                    match queue.dequeue(&mut handle) {
                        Some(value) => {
                            let producer = value / PER_PRODUCER;
                            let previous = last.insert(producer, value);
                            assert!(previous.map_or(true, |previous| previous < value));
                            taken.push(value);
                            misses = 0;
                        }
                        None => {
                            misses += 1;
                            thread::yield_now();
                        }
                    }
                }

                seen.lock().unwrap().extend(taken);
            });
        }
    });

    let mut handle = queue.handle(0);
    let mut all = seen.into_inner().unwrap();

    while let Some(value) = queue.dequeue(&mut handle) {
        all.push(value);
    }

    all.sort_unstable();
    let expected: Vec<i64> = (0..PRODUCERS as i64 * PER_PRODUCER).collect();
    assert_eq!(all, expected);
}
