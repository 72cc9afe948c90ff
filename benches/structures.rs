use contend::{
    run_push_pop, Config, LockKind, LockedQueue, LockedStack, MsQueue, Optimizations,
    TreiberStack,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const ITERATIONS: usize = 1 << 12;

fn config() -> Config {
    Config::new(num_cpus::get(), ITERATIONS)
}

fn lock_free(c: &mut Criterion) {
    let config = config();
    let mut group = c.benchmark_group("lock-free");

    group.bench_function("treiber", |b| {
        let stack = TreiberStack::without_elimination(&config);
        b.iter(|| run_push_pop(&stack, &config))
    });

    group.bench_function("treiber-elimination", |b| {
        let stack = TreiberStack::new(&config);
        b.iter(|| run_push_pop(&stack, &config))
    });

    group.bench_function("michael-scott", |b| {
        let queue = MsQueue::new(&config);
        b.iter(|| run_push_pop(&queue, &config))
    });

    group.finish();
}

fn locked(c: &mut Criterion) {
    let mut group = c.benchmark_group("locked");
    let variants = [
        ("baseline", Optimizations::NONE),
        ("combining", Optimizations::COMBINING),
        ("elimination", Optimizations::ELIMINATION),
        ("combining+elimination", Optimizations::ALL),
    ];

    for lock in LockKind::ALL {
        for (label, optimizations) in variants {
            let config = config().with_lock(lock).with_optimizations(optimizations);

            group.bench_with_input(
                BenchmarkId::new(format!("stack/{}", label), lock),
                &config,
                |b, config| {
                    let stack = LockedStack::new(config);
                    b.iter(|| run_push_pop(&stack, config))
                },
            );

            if !optimizations.elimination {
                group.bench_with_input(
                    BenchmarkId::new(format!("queue/{}", label), lock),
                    &config,
                    |b, config| {
                        let queue = LockedQueue::new(config);
                        b.iter(|| run_push_pop(&queue, config))
                    },
                );
            }
        }
    }

    group.finish();
}

criterion_group!(benches, lock_free, locked);
criterion_main!(benches);
