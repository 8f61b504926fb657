//! Corpus Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Args, Parser, Subcommand};
use corpus_crawler::{
    error::Result,
    models::{Config, Seed},
    pipeline,
};

/// corpus-crawler - Scoped site crawler and corpus builder
#[derive(Parser, Debug)]
#[command(
    name = "corpus-crawler",
    version,
    about = "Crawl documentation sites into a deduplicated text corpus"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed file, one URL per line (default: paths.seeds_file)
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// Artifact directory (default: output.output_directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Stop after this many fetched pages
    #[arg(long)]
    max_pages: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl seed URLs into per-page artifacts
    Crawl(CrawlArgs),

    /// Merge artifacts into one sorted corpus of unique lines
    Dedup {
        /// Artifact directory (default: dedup.input_directory)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Corpus file (default: dedup.output_file)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Run full pipeline: Crawl → Dedup
    Pipeline {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Corpus file (default: dedup.output_file)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Validate configuration and seed files
    Validate {
        /// Seed file (default: paths.seeds_file)
        #[arg(long)]
        seeds: Option<PathBuf>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply crawl overrides and return the seed file path.
fn apply_crawl_args(config: &mut Config, args: CrawlArgs) -> PathBuf {
    if let Some(output) = args.output {
        config.output.output_directory = output;
    }
    if let Some(depth) = args.max_depth {
        config.crawler.max_depth = depth;
    }
    if args.max_pages.is_some() {
        config.crawler.max_pages = args.max_pages;
    }
    args.seeds.unwrap_or_else(|| config.paths.seeds_file.clone())
}

/// Flag flipped by Ctrl-C; the crawl stops before its next fetch.
fn install_shutdown_handler() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received; finishing the current page and stopping");
            handle.store(true, Ordering::SeqCst);
        }
    });
    flag
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("corpus-crawler starting...");

    let mut config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Crawl(args) => {
            let seeds_path = apply_crawl_args(&mut config, args);
            config.validate()?;
            let seeds = Seed::load(&seeds_path)?;

            let report =
                pipeline::run_crawler(Arc::new(config), &seeds, install_shutdown_handler())
                    .await?;
            log::info!(
                "Crawl complete! {} pages persisted, {} fetch failures",
                report.pages_persisted,
                report.fetch_failures
            );
        }

        Command::Dedup { input, corpus } => {
            config.validate()?;
            let input = input.unwrap_or_else(|| config.dedup_input_dir());
            let corpus = corpus.unwrap_or_else(|| config.dedup.output_file.clone());
            pipeline::run_dedup(&config, &input, &corpus).await?;
        }

        Command::Pipeline { crawl, corpus } => {
            let seeds_path = apply_crawl_args(&mut config, crawl);
            config.validate()?;
            let seeds = Seed::load(&seeds_path)?;
            let corpus = corpus.unwrap_or_else(|| config.dedup.output_file.clone());

            pipeline::run_pipeline(Arc::new(config), &seeds, install_shutdown_handler(), &corpus)
                .await?;
        }

        Command::Validate { seeds } => {
            log::info!("Validating configuration...");
            let seeds_path = seeds.unwrap_or_else(|| config.paths.seeds_file.clone());

            if let Err(e) = pipeline::run_validate(&config, &seeds_path) {
                log::error!("Validation failed: {}", e);
                return Err(e);
            }
            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
