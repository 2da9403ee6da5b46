//! Batch subcommand - traverse a cluster index and publish batches

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crawline_batcher::{BatcherConfig, ClusterIndexReader, process_index};
use crawline_core::metrics::{BatcherMetrics, FetchMetrics};
use crawline_core::{HttpRangeFetcher, SharedProgress, fmt_num};
use crawline_queue::DirQueue;
use crawline_store::{FsObjectStore, MarkerStore};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Path to the local cluster index file (cluster.idx)
    #[arg(short, long)]
    pub index: PathBuf,

    /// Maximum number of index rows to traverse
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Documents per published batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

pub fn run(args: BatchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let batcher_config = BatcherConfig {
        batch_size: args.batch_size.unwrap_or(config.batcher.batch_size),
        max_rows: args.limit,
    };

    log::info!("Batching from {}", args.index.display());
    log::info!("  Collection: {}", config.crawl.collection);
    log::info!("  Queue: {}", config.queue.dir);
    log::info!("  Batch size: {}", batcher_config.batch_size);

    let rows = ClusterIndexReader::open(&args.index)
        .with_context(|| format!("failed to open cluster index {}", args.index.display()))?;

    let fetch_metrics = Arc::new(FetchMetrics::default());
    let fetcher = HttpRangeFetcher::new(config.crawl.index_base_url(), fetch_metrics.clone());
    let queue = DirQueue::open(&config.queue.dir)
        .with_context(|| format!("failed to open queue at {}", config.queue.dir))?;
    let tracker = MarkerStore::new(
        FsObjectStore::new(&config.store.markers_dir)
            .with_context(|| format!("failed to open marker store at {}", config.store.markers_dir))?,
    );
    let metrics = BatcherMetrics::default();

    let pb = progress.stage_line("batch");
    let summary = process_index(
        rows,
        &fetcher,
        &queue,
        &tracker,
        &batcher_config,
        &metrics,
        &pb,
    )?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Batcher").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table.add_row(vec![
        "Index rows".to_string(),
        format!(
            "{}/{} ({} failed)",
            fmt_num(summary.rows_processed - summary.rows_failed),
            fmt_num(summary.rows_processed),
            fmt_num(summary.rows_failed)
        ),
    ]);
    table.add_row(vec![
        "Lines scanned".to_string(),
        fmt_num(summary.lines_scanned),
    ]);
    table.add_row(vec![
        "Documents accepted".to_string(),
        fmt_num(summary.documents_accepted),
    ]);
    table.add_row(vec![
        "Batches published".to_string(),
        fmt_num(summary.batches_published),
    ]);
    table.add_row(vec![
        "Fetch retries".to_string(),
        fmt_num(fetch_metrics.retries() as usize),
    ]);
    table.add_row(vec![
        "Time".to_string(),
        format!("{:.1}s", summary.elapsed.as_secs_f64()),
    ]);
    eprintln!("\n{table}");

    Ok(())
}
