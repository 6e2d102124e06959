//! Benchmarks: `PipelinedQueue` vs `Mutex<BinaryHeap>`.
//!
//! A single global lock is the obvious alternative to a level-locked heap, so
//! every workload runs against both. The interesting numbers are the
//! multi-threaded ones; single-threaded runs show the cost of the per-level
//! locking.
//!
//! Run with: `cargo bench --bench queue`
//! With mimalloc: `cargo bench --bench queue --features mimalloc`

#![expect(clippy::unwrap_used)]


use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::thread;

use divan::{Bencher, black_box};
use pipeheap::PipelinedQueue;

use bench_utils::{ascending, descending, priorities, share};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    divan::main();
}

// =============================================================================
// 01: SINGLE-THREADED INSERT
// =============================================================================

#[divan::bench_group(name = "01_insert")]
mod insert {
    use super::{Bencher, BinaryHeap, Mutex, PipelinedQueue, ascending, black_box, descending, priorities};

    const N: usize = 10_000;

    fn run_pipelined(bencher: Bencher, values: &[u64]) {
        bencher.bench_local(|| {
            let queue: PipelinedQueue<u64> = PipelinedQueue::new();
            for &value in values {
                queue.insert(value).unwrap();
            }
            black_box(queue.len())
        });
    }

    fn run_mutex(bencher: Bencher, values: &[u64]) {
        bencher.bench_local(|| {
            let heap: Mutex<BinaryHeap<u64>> = Mutex::new(BinaryHeap::new());
            for &value in values {
                heap.lock().unwrap().push(value);
            }
            black_box(heap.lock().unwrap().len())
        });
    }

    #[divan::bench]
    fn pipelined_random(bencher: Bencher) {
        run_pipelined(bencher, &priorities(N, 42));
    }

    #[divan::bench]
    fn mutex_random(bencher: Bencher) {
        run_mutex(bencher, &priorities(N, 42));
    }

    #[divan::bench]
    fn pipelined_ascending(bencher: Bencher) {
        run_pipelined(bencher, &ascending(N));
    }

    #[divan::bench]
    fn mutex_ascending(bencher: Bencher) {
        run_mutex(bencher, &ascending(N));
    }

    #[divan::bench]
    fn pipelined_descending(bencher: Bencher) {
        run_pipelined(bencher, &descending(N));
    }
}

// =============================================================================
// 02: SINGLE-THREADED EXTRACT
// =============================================================================

#[divan::bench_group(name = "02_extract")]
mod extract {
    use super::{Bencher, BinaryHeap, Mutex, PipelinedQueue, black_box, priorities};

    const N: usize = 10_000;

    #[divan::bench]
    fn pipelined(bencher: Bencher) {
        let values = priorities(N, 7);
        bencher
            .with_inputs(|| values.iter().copied().collect::<PipelinedQueue<u64>>())
            .bench_local_values(|queue| {
                let mut sum = 0_u64;
                while let Some(value) = queue.try_extract_max() {
                    sum = sum.wrapping_add(value);
                }
                black_box(sum)
            });
    }

    #[divan::bench]
    fn mutex(bencher: Bencher) {
        let values = priorities(N, 7);
        bencher
            .with_inputs(|| Mutex::new(values.iter().copied().collect::<BinaryHeap<u64>>()))
            .bench_local_values(|heap| {
                let mut sum = 0_u64;
                while let Some(value) = heap.lock().unwrap().pop() {
                    sum = sum.wrapping_add(value);
                }
                black_box(sum)
            });
    }
}

// =============================================================================
// 03: CONCURRENT INSERT
// =============================================================================

#[divan::bench_group(name = "03_concurrent_insert")]
mod concurrent_insert {
    use super::{Arc, Bencher, BinaryHeap, Mutex, PipelinedQueue, black_box, priorities, share, thread};

    const N: usize = 40_000;

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn pipelined(bencher: Bencher, threads: usize) {
        let values = Arc::new(priorities(N, 42));

        bencher.bench_local(|| {
            let queue: Arc<PipelinedQueue<u64>> = Arc::new(PipelinedQueue::new());
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let queue = Arc::clone(&queue);
                    let values = Arc::clone(&values);
                    thread::spawn(move || {
                        for &value in share(&values, t, threads) {
                            queue.insert(value).unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
            black_box(queue.len())
        });
    }

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn mutex(bencher: Bencher, threads: usize) {
        let values = Arc::new(priorities(N, 42));

        bencher.bench_local(|| {
            let heap: Arc<Mutex<BinaryHeap<u64>>> = Arc::new(Mutex::new(BinaryHeap::new()));
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let heap = Arc::clone(&heap);
                    let values = Arc::clone(&values);
                    thread::spawn(move || {
                        for &value in share(&values, t, threads) {
                            heap.lock().unwrap().push(value);
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
            black_box(heap.lock().unwrap().len())
        });
    }
}

// =============================================================================
// 04: MIXED PRODUCERS / CONSUMERS
// =============================================================================

#[divan::bench_group(name = "04_mixed")]
mod mixed {
    use super::{Arc, Bencher, BinaryHeap, Mutex, PipelinedQueue, black_box, priorities, share, thread};

    const N: usize = 40_000;

    /// Half the threads insert their share, the other half extract the same
    /// number of times (retrying on empty).
    #[divan::bench(args = [2, 4, 8, 16])]
    fn pipelined(bencher: Bencher, threads: usize) {
        let values = Arc::new(priorities(N, 99));
        let producers = threads / 2;

        bencher.bench_local(|| {
            let queue: Arc<PipelinedQueue<u64>> = Arc::new(PipelinedQueue::new());
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let queue = Arc::clone(&queue);
                    let values = Arc::clone(&values);
                    thread::spawn(move || {
                        let mine = share(&values, t % producers, producers);
                        if t < producers {
                            for &value in mine {
                                queue.insert(value).unwrap();
                            }
                        } else {
                            let mut taken = 0;
                            while taken < mine.len() {
                                if queue.try_extract_max().is_some() {
                                    taken += 1;
                                } else {
                                    thread::yield_now();
                                }
                            }
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
            black_box(queue.len())
        });
    }

    #[divan::bench(args = [2, 4, 8, 16])]
    fn mutex(bencher: Bencher, threads: usize) {
        let values = Arc::new(priorities(N, 99));
        let producers = threads / 2;

        bencher.bench_local(|| {
            let heap: Arc<Mutex<BinaryHeap<u64>>> = Arc::new(Mutex::new(BinaryHeap::new()));
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let heap = Arc::clone(&heap);
                    let values = Arc::clone(&values);
                    thread::spawn(move || {
                        let mine = share(&values, t % producers, producers);
                        if t < producers {
                            for &value in mine {
                                heap.lock().unwrap().push(value);
                            }
                        } else {
                            let mut taken = 0;
                            while taken < mine.len() {
                                if heap.lock().unwrap().pop().is_some() {
                                    taken += 1;
                                } else {
                                    thread::yield_now();
                                }
                            }
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
            black_box(heap.lock().unwrap().len())
        });
    }
}
