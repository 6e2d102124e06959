//! Pipeline Contention Profiling Binary
//!
//! Runs producers and consumers against one `PipelinedQueue` and reports
//! throughput, insert/extract latency outliers and growth activity. Slow
//! operations are logged as they happen; with the `tracing` feature they go
//! to a JSON log together with the queue's own growth events.
//!
//! Run with:
//! ```bash
//! # Without tracing (fast, just stats)
//! cargo run --release --features mimalloc --bin pipeline_contention
//!
//! # With tracing (writes to logs/pipeline_contention.json)
//! RUST_LOG=pipeheap=info,pipeline_contention=warn cargo run --release --features "mimalloc,tracing" --bin pipeline_contention
//!
//! # View slow operations and growth steps:
//! rg "SLOW_OP|heap enlarged" logs/pipeline_contention.json
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pipeheap::{NaturalOrder, PipelinedQueue, QueueConfig};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(feature = "tracing")]
type TracingGuard = tracing_appender::non_blocking::WorkerGuard;

#[cfg(not(feature = "tracing"))]
type TracingGuard = ();

/// Operations slower than this are reported individually.
const SLOW_OP_NS: u64 = 10_000_000;

// =============================================================================
// Tracing Initialization (JSON to file)
// =============================================================================

#[cfg(feature = "tracing")]
fn init_json_tracing() -> TracingGuard {
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = "logs";
    let filter_str = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pipeheap=info,pipeline_contention=warn".to_string());

    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::never(log_dir, "pipeline_contention.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_thread_ids(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .json()
        .with_filter(EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("warn")));

    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    println!("Tracing enabled: logs/pipeline_contention.json (filter: {filter_str})");

    guard
}

#[cfg(not(feature = "tracing"))]
fn init_json_tracing() -> TracingGuard {
    println!("Tracing disabled (compile with --features tracing)");
}

// =============================================================================
// Operation Stats
// =============================================================================

/// Per-thread latency statistics for one kind of operation.
#[derive(Default, Clone, Copy)]
struct OpStats {
    count: u64,
    total_ns: u64,
    max_ns: u64,
    slow: u64,
}

impl OpStats {
    const fn record(&mut self, op_ns: u64) {
        self.count += 1;
        self.total_ns += op_ns;
        if op_ns > self.max_ns {
            self.max_ns = op_ns;
        }
        if op_ns > SLOW_OP_NS {
            self.slow += 1;
        }
    }

    const fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.total_ns += other.total_ns;
        if other.max_ns > self.max_ns {
            self.max_ns = other.max_ns;
        }
        self.slow += other.slow;
    }

    fn mean_us(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ns as f64 / self.count as f64 / 1_000.0
        }
    }
}

fn report_slow(role: &str, thread: usize, index: usize, op_ns: u64) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        role,
        thread,
        op_index = index,
        elapsed_ms = op_ns as f64 / 1_000_000.0,
        "SLOW_OP"
    );

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[{role} {thread:02}] SLOW_OP: i={index} took {:.2}ms",
        op_ns as f64 / 1_000_000.0
    );
}

// =============================================================================
// Runner
// =============================================================================

struct RunConfig {
    producers: usize,
    consumers: usize,
    ops_per_producer: usize,
    initial_capacity: usize,
}

struct RunResult {
    elapsed: Duration,
    inserts: OpStats,
    extracts: OpStats,
    growths: usize,
    final_capacity: usize,
    final_height: usize,
}

fn run(config: &RunConfig) -> RunResult {
    let queue_config = QueueConfig::default().initial_capacity(config.initial_capacity);
    let queue: Arc<PipelinedQueue<u64>> =
        Arc::new(PipelinedQueue::with_config(queue_config, NaturalOrder).unwrap());

    let total = config.producers * config.ops_per_producer;
    let per_consumer = total / config.consumers;
    let start = Instant::now();

    let producers: Vec<_> = (0..config.producers)
        .map(|t| {
            let queue = Arc::clone(&queue);
            let ops = config.ops_per_producer;

            thread::spawn(move || {
                let mut stats = OpStats::default();
                let base = (t * ops) as u64;

                for i in 0..ops {
                    // Scatter priorities so inserts do not all sink the same path.
                    let priority = (base + i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);

                    let op_start = Instant::now();
                    queue.insert(priority).unwrap();
                    let op_ns = op_start.elapsed().as_nanos() as u64;

                    stats.record(op_ns);
                    if op_ns > SLOW_OP_NS {
                        report_slow("producer", t, i, op_ns);
                    }
                }

                stats
            })
        })
        .collect();

    let consumers: Vec<_> = (0..config.consumers)
        .map(|t| {
            let queue = Arc::clone(&queue);
            let quota = if t + 1 == config.consumers {
                total - per_consumer * (config.consumers - 1)
            } else {
                per_consumer
            };

            thread::spawn(move || {
                let mut stats = OpStats::default();

                for i in 0..quota {
                    let op_start = Instant::now();
                    let _ = queue.take();
                    let op_ns = op_start.elapsed().as_nanos() as u64;

                    stats.record(op_ns);
                    if op_ns > SLOW_OP_NS {
                        report_slow("consumer", t, i, op_ns);
                    }
                }

                stats
            })
        })
        .collect();

    let mut inserts = OpStats::default();
    for h in producers {
        inserts.merge(&h.join().unwrap());
    }

    let mut extracts = OpStats::default();
    for h in consumers {
        extracts.merge(&h.join().unwrap());
    }

    let elapsed = start.elapsed();
    if let Err(violation) = queue.validate() {
        eprintln!("!!! queue invariant broken after run: {violation}");
    }

    RunResult {
        elapsed,
        inserts,
        extracts,
        growths: queue.growth_count(),
        final_capacity: queue.capacity(),
        final_height: queue.height(),
    }
}

fn print_stats(config: &RunConfig, result: &RunResult) {
    let total_ops = result.inserts.count + result.extracts.count;
    let ops_per_sec = total_ops as f64 / result.elapsed.as_secs_f64();

    println!("\n{}", "=".repeat(80));
    println!(
        "RESULTS: {} producers x {} inserts, {} consumers",
        config.producers, config.ops_per_producer, config.consumers
    );
    println!("{}", "=".repeat(80));

    println!("\n--- Timing ---");
    println!("Elapsed:     {:?}", result.elapsed);
    println!("Throughput:  {ops_per_sec:.0} ops/sec");

    for (name, stats) in [("Insert", &result.inserts), ("Take", &result.extracts)] {
        println!("\n--- {name} Latency ---");
        println!("Ops:         {}", stats.count);
        println!("Mean:        {:.2} us", stats.mean_us());
        println!("Max:         {:.2} ms", stats.max_ns as f64 / 1_000_000.0);
        println!("Slow >10ms:  {}", stats.slow);
    }

    println!("\n--- Growth ---");
    println!("Steps:       {}", result.growths);
    println!("Capacity:    {}", result.final_capacity);
    println!("Height:      {}", result.final_height);
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    let _guard = init_json_tracing();

    println!("Pipeline Contention Profiling");
    println!("=============================\n");

    let configs = vec![
        RunConfig {
            producers: 4,
            consumers: 4,
            ops_per_producer: 100_000,
            initial_capacity: 15,
        },
        RunConfig {
            producers: 16,
            consumers: 4,
            ops_per_producer: 25_000,
            initial_capacity: 1,
        },
    ];

    for config in &configs {
        println!(
            "\nRunning: {} producers, {} consumers, {} inserts each...",
            config.producers, config.consumers, config.ops_per_producer
        );

        let mut results: Vec<RunResult> = Vec::new();
        for run_index in 1..=5 {
            print!("  Run {run_index}/5... ");
            std::io::Write::flush(&mut std::io::stdout()).unwrap();

            let result = run(config);
            println!("{:?}", result.elapsed);
            results.push(result);
        }

        let slowest = results
            .iter()
            .max_by_key(|result| result.elapsed.as_nanos())
            .unwrap();
        let fastest = results
            .iter()
            .min_by_key(|result| result.elapsed.as_nanos())
            .unwrap();

        print_stats(config, slowest);
        println!(
            "\nFastest run: {:?} (slowest/fastest: {:.1}x)",
            fastest.elapsed,
            slowest.elapsed.as_secs_f64() / fastest.elapsed.as_secs_f64()
        );
    }
}
