//! Ring5 CLI - ingestion driver for gem5-style simulator statistics output.
//!
//! Wraps the `ring5_ingest` core engine behind two subcommands: `scan`
//! (variable discovery) and `ingest` (regex expansion + parse + CSV
//! finalization), mirroring the `submit_scan_async`/`submit_parse_async`/
//! `finalize_parsing` public API in `ring5_ingest::core::api`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ring5_ingest::core::api::{Engine, ParserApi};
use ring5_ingest::core::config::IngestConfig;
use ring5_ingest::core::model::StatRequest;
use ring5_ingest::core::parsing::expand_requests;
use ring5_ingest::core::strategy::ConfigAwareStrategy;

#[derive(Parser)]
#[command(name = "ring5", about = "Parallel ingestion engine for gem5-style simulator statistics")]
struct Cli {
    /// Emit debug-level logs.
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to a YAML engine configuration file, overriding defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a run tree and print the discovered, pattern-aggregated
    /// variable catalog as JSON.
    Scan {
        /// Root directory to walk.
        root: PathBuf,
        /// Glob pattern identifying statistics files (default: stats.txt).
        #[arg(long, default_value = "stats.txt")]
        glob: String,
    },
    /// Expand, parse, and finalize a batch of variable requests into
    /// `results.csv`.
    Ingest {
        /// Root directory to walk.
        root: PathBuf,
        /// Path to a YAML/JSON file containing a list of `StatRequest`.
        #[arg(long)]
        vars: PathBuf,
        /// Output directory for `results.csv`.
        #[arg(long, default_value = "output")]
        out: PathBuf,
        /// Glob pattern identifying statistics files.
        #[arg(long, default_value = "stats.txt")]
        glob: String,
        /// Scan the tree first and expand regex-marked requests against
        /// the discovered catalog before parsing.
        #[arg(long)]
        expand: bool,
        /// Enrich each result with its sibling `config.ini` sidecar.
        #[arg(long)]
        config_aware: bool,
    },
}

fn load_requests(path: &PathBuf) -> anyhow::Result<Vec<StatRequest>> {
    let raw = std::fs::read_to_string(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        Ok(serde_json::from_str(&raw)?)
    } else {
        Ok(serde_yaml::from_str(&raw)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    let config = match &cli.config {
        Some(path) => IngestConfig::from_yaml_file(path)?,
        None => IngestConfig::default(),
    };

    match cli.command {
        Commands::Scan { root, glob } => {
            let engine = Engine::new(config)?;
            let per_file = engine.submit_scan_async(&root, &glob).await?;
            let ok: Vec<_> = per_file
                .into_iter()
                .filter_map(|r| match r {
                    Ok(vars) => Some(vars),
                    Err(e) => {
                        tracing::warn!(error = %e, "scan failed for a file, skipping");
                        None
                    }
                })
                .collect();
            let aggregated = engine.aggregate_scan_results(ok);
            println!("{}", serde_json::to_string_pretty(&aggregated)?);
        }
        Commands::Ingest {
            root,
            vars,
            out,
            glob,
            expand,
            config_aware,
        } => {
            let requests = load_requests(&vars)?;
            let engine = if config_aware {
                Engine::with_strategy(config, Box::new(ConfigAwareStrategy::default()))?
            } else {
                Engine::new(config)?
            };

            let requests = if expand {
                let per_file = engine.submit_scan_async(&root, &glob).await?;
                let ok: Vec<_> = per_file.into_iter().filter_map(Result::ok).collect();
                let catalog = engine.aggregate_scan_results(ok);
                expand_requests(&requests, &catalog)
            } else {
                requests
            };

            let batch = engine.submit_parse_async(&root, &glob, &requests).await?;
            let mut results = Vec::with_capacity(batch.futures.len());
            for handle in batch.futures {
                match handle.await {
                    Ok(Ok(result)) => results.push(result),
                    Ok(Err(e)) => tracing::warn!(error = %e, "parse work failed, row omitted"),
                    Err(join_err) => tracing::warn!(error = %join_err, "parse work panicked, row omitted"),
                }
            }
            let results = engine.post_process(results).await?;

            let output_path = engine.finalize_parsing(&out, &results, Some(&batch.var_names))?;
            println!("{}", output_path.display());
        }
    }

    Ok(())
}
