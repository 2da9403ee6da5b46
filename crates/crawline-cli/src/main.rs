//! crawline - Two-stage web-crawl ingestion pipeline
//!
//! Walks Common Crawl index shards into bounded batches of English
//! captures, then tokenizes the captured pages into fixed-length chunks
//! for model training.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "crawline")]
#[command(about = "Two-stage web-crawl ingestion pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./crawline.toml or ~/.config/crawline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Read timeout in seconds for stall detection
    #[arg(long, global = true)]
    read_timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Traverse a cluster index and publish candidate batches
    Batch(cmd::batch::BatchArgs),
    /// Consume batches: extract, tokenize, and store documents
    Work(cmd::work::WorkArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(crawline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    crawline_core::init_logging(quiet, cli.debug, multi);

    // Load configuration
    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // Apply HTTP settings (config file defaults, CLI overrides)
    let http_config = crawline_core::HttpConfig {
        read_timeout: std::time::Duration::from_secs(
            cli.read_timeout.unwrap_or(config.http.read_timeout),
        ),
        max_retries: cli.max_retries.unwrap_or(config.http.max_retries),
    };
    crawline_core::set_http_config(http_config);

    match cli.command {
        Command::Batch(args) => cmd::batch::run(args, &config, &progress),
        Command::Work(args) => cmd::work::run(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["Base URL", &config.crawl.base_url]);
            table.add_row(vec!["Collection", &config.crawl.collection]);
            table.add_row(vec!["Index base URL", &config.crawl.index_base_url()]);
            table.add_row(vec!["Queue directory", &config.queue.dir]);
            table.add_row(vec!["Marker store", &config.store.markers_dir]);
            table.add_row(vec!["Document store", &config.store.documents_dir]);
            table.add_row(vec!["Batch size", &config.batcher.batch_size.to_string()]);
            table.add_row(vec![
                "Token windows",
                &format!(
                    "max_length {}, stride {}",
                    config.worker.max_length, config.worker.stride
                ),
            ]);
            table.add_row(vec!["Vocab size", &config.worker.vocab_size.to_string()]);
            table.add_row(vec![
                "Poll interval",
                &format!("{}ms", config.worker.poll_interval_ms),
            ]);
            table.add_row(vec![
                "Read timeout",
                &format!("{}s", config.http.read_timeout),
            ]);
            table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
