//! Work subcommand - consume batches until SIGINT/SIGTERM

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crawline_core::metrics::{FetchMetrics, WorkerMetrics};
use crawline_core::shutdown::shutdown_flag;
use crawline_core::{HttpRangeFetcher, SharedProgress};
use crawline_queue::DirQueue;
use crawline_store::{DocumentStore, FsObjectStore};
use crawline_worker::{
    ChunkingConfig, ChunkingTokenizer, HtmlTextExtractor, WordHashEncoder, WorkerConfig, run_worker,
};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct WorkArgs {
    /// Milliseconds to sleep between polls of an empty queue
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

/// First signal: set graceful shutdown flag.
/// Second signal: force exit (default SIGINT behavior restored).
/// SAFETY: AtomicBool::swap and process::exit are async-signal-safe.
fn register_signal_handlers() -> Result<()> {
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .context("failed to register SIGTERM handler")?;
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .context("failed to register SIGINT handler")?;
    }
    Ok(())
}

pub fn run(args: WorkArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    register_signal_handlers()?;

    let worker_config = WorkerConfig {
        poll_interval: Duration::from_millis(
            args.poll_interval_ms.unwrap_or(config.worker.poll_interval_ms),
        ),
    };
    let chunking = ChunkingConfig::new(config.worker.max_length, config.worker.stride)
        .context("invalid worker tokenization settings")?;

    log::info!("Worker starting");
    log::info!("  Queue: {}", config.queue.dir);
    log::info!("  Documents: {}", config.store.documents_dir);
    log::info!(
        "  Windows: max_length {}, stride {}",
        config.worker.max_length,
        config.worker.stride
    );

    let fetcher = HttpRangeFetcher::new(
        config.crawl.base_url.clone(),
        Arc::new(FetchMetrics::default()),
    );
    let tokenizer = ChunkingTokenizer::new(WordHashEncoder::new(config.worker.vocab_size), chunking);
    let documents = DocumentStore::new(
        FsObjectStore::new(&config.store.documents_dir).with_context(|| {
            format!(
                "failed to open document store at {}",
                config.store.documents_dir
            )
        })?,
    );
    let mut consumer = DirQueue::open(&config.queue.dir)
        .with_context(|| format!("failed to open queue at {}", config.queue.dir))?;
    let metrics = WorkerMetrics::default();

    let pb = progress.stage_line("work");
    pb.set_message("waiting for batches (Ctrl-C to stop)");
    let result = run_worker(
        &mut consumer,
        &fetcher,
        &HtmlTextExtractor,
        &tokenizer,
        &documents,
        &worker_config,
        &metrics,
    );
    pb.finish();

    metrics.log_summary();
    result
}
