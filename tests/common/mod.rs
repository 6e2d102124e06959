//! Shared test setup: tracing to the console and to an NDJSON file.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... test code; the queue logs through `tracing` with `--features tracing`
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Filter directives (e.g., `pipeheap=debug,pipeheap::queue::grow=trace`)
//! - `PIPEHEAP_LOG_DIR`: Log directory (default: `logs/`)
//! - `PIPEHEAP_LOG_CONSOLE`: Set to "0" to disable console output
//!
//! # Log Files
//!
//! Logs are appended to `logs/pipeheap.jsonl`, one JSON object per line:
//!
//! ```bash
//! # Every growth step
//! jq 'select(.fields.message == "grow: heap enlarged")' logs/pipeheap.jsonl
//!
//! # Only errors
//! jq 'select(.level == "ERROR")' logs/pipeheap.jsonl
//! ```

#![allow(dead_code)]

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

use pipeheap::PipelinedQueue;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

/// Install the subscriber. Only the first call in a process does anything.
pub fn init_tracing() {
    INIT.call_once(setup_tracing);
}

/// Where and how loudly to log.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Log file name.
    pub log_file: String,
    /// Mirror events to stderr.
    pub console_enabled: bool,
    /// Level used when `RUST_LOG` is unset.
    pub default_level: Level,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file: "pipeheap.jsonl".to_string(),
            console_enabled: true,
            default_level: Level::INFO,
        }
    }
}

impl TracingConfig {
    /// Defaults overridden by `PIPEHEAP_LOG_DIR` and `PIPEHEAP_LOG_CONSOLE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("PIPEHEAP_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if env::var("PIPEHEAP_LOG_CONSOLE").is_ok_and(|v| v == "0") {
            config.console_enabled = false;
        }

        config
    }
}

fn make_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{default_level}")))
}

#[expect(clippy::expect_used)]
fn setup_tracing() {
    let config = TracingConfig::from_env();

    std::fs::create_dir_all(&config.log_dir).expect("Failed to create log directory");
    let log_path = config.log_dir.join(&config.log_file);

    // Append: nextest runs every test in its own process.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let console_layer = config.console_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .with_filter(make_filter(config.default_level))
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(make_filter(config.default_level));

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

// ============================================================================
//  Queue Helpers
// ============================================================================

/// Drain everything, largest first.
pub fn drain_all<E>(queue: &PipelinedQueue<E>) -> Vec<E>
where
    E: Ord,
{
    queue.drain_up_to(usize::MAX)
}

/// Panic with the violation if the queue is not structurally sound.
pub fn assert_valid<E: Ord>(queue: &PipelinedQueue<E>, context: &str) {
    if let Err(violation) = queue.validate() {
        panic!("{context}: {violation}");
    }
}

/// `true` if `values` never increases.
pub fn is_descending<E: Ord>(values: &[E]) -> bool {
    values.windows(2).all(|pair| pair[0] >= pair[1])
}
