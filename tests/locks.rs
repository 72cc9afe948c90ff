use contend::{Lock, LockKind, Mutex, RawLock, SpinConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const THREADS: usize = 8;
const INCREMENTS: usize = 2_000;

#[test]
fn every_lock_serializes_increments() {
    for kind in LockKind::ALL {
        let counter = Mutex::with_lock(
            Lock::with_spin(kind, SpinConfig::eager_yield()),
            0_usize,
        );

        thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..INCREMENTS {
                        *counter.lock() += 1;
                    }
                });
            }
        });

        assert_eq!(counter.into_inner(), THREADS * INCREMENTS, "{}", kind);
    }
}

#[test]
fn no_two_threads_inside_at_once() {
    for kind in LockKind::ALL {
        let lock = Lock::with_spin(kind, SpinConfig::eager_yield());
        let inside = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        lock.acquire();
                        assert!(!inside.swap(true, Ordering::Relaxed), "{}", kind);
                        inside.store(false, Ordering::Relaxed);
                        unsafe { lock.release() };
                    }
                });
            }
        });
    }
}

#[test]
fn try_lock_mixes_with_blocking_lock() {
    for kind in LockKind::ALL {
        let counter = Mutex::new(kind, 0_usize);

        thread::scope(|scope| {
            for id in 0..4 {
                let counter = &counter;

                scope.spawn(move || {
                    let mut done = 0;

                    while done < 1_000 {
                        let guard = if id % 2 == 0 {
                            counter.try_lock()
                        } else {
                            Some(counter.lock())
                        };

                        if let Some(mut guard) = guard {
                            *guard += 1;
                            done += 1;
                        } else {
                            thread::yield_now();
                        }
                    }
                });
            }
        });

        assert_eq!(counter.into_inner(), 4_000, "{}", kind);
    }
}

#[test]
fn unknown_names_do_not_parse() {
    assert!("mcs".parse::<LockKind>().is_err());
    assert_eq!("pthread".parse::<LockKind>(), Ok(LockKind::Os));
    assert_eq!(Lock::from_name("ttas").kind(), LockKind::Ttas);
}
