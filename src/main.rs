use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use kalman_pairs::config::Config;
use kalman_pairs::pipeline::{run_pairs, PairOutcome, PairSettings};
use kalman_pairs::price_store;
use kalman_pairs::report::{summarize, write_reports};
use kalman_pairs::screening::StationarityScreen;

const USAGE: &str = "usage:
  kalman-pairs [run] [CONFIG]
  kalman-pairs import SYMBOL CLOSES_JSON [CONFIG]

CLOSES_JSON is an array of {\"ts_ms\": <u64>, \"close\": <f64>} objects.";

#[derive(Debug, Deserialize)]
struct CloseRow {
    ts_ms: u64,
    close: f64,
}

fn load_config(path: Option<&String>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from_path(Path::new(p)),
        None => Config::load(),
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    // stdout is reserved for the summary table.
    let log_file = std::fs::File::create("kalman-pairs.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();
    Ok(())
}

fn import(config: &Config, symbol: &str, file: &Path) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let rows: Vec<CloseRow> = serde_json::from_str(&payload)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    let closes: Vec<(u64, f64)> = rows.iter().map(|r| (r.ts_ms, r.close)).collect();
    let n = price_store::persist_closes(&config.data.db_path, symbol, &closes)?;
    tracing::info!(symbol, rows = n, "Imported closes");
    println!("imported {} closes for {}", n, symbol.to_ascii_uppercase());
    Ok(())
}

async fn run(config: &Config) -> Result<()> {
    let table = Arc::new(
        price_store::load_price_table(&config.data.db_path)
            .context("failed to load price table")?,
    );
    let reference = config.data.reference_symbol.trim().to_ascii_uppercase();
    if !table.contains(&reference) {
        bail!(
            "reference symbol {} has no prices in {}",
            reference,
            config.data.db_path.display()
        );
    }
    let symbols = config.data.pair_symbols();
    let settings = PairSettings::from_config(config);
    let screen = config
        .screening
        .enabled
        .then(|| StationarityScreen::new(config.screening.p_value_cutoff));

    tracing::info!(
        reference = %reference,
        pairs = symbols.len(),
        delta = settings.kalman.delta,
        observation_var = settings.kalman.observation_var,
        threshold_multiplier = settings.threshold_multiplier,
        notional = settings.notional,
        "Starting pair runs"
    );

    let outcomes = run_pairs(Arc::clone(&table), &reference, &symbols, settings, screen).await;
    let written = write_reports(&config.data.output_dir, &outcomes)?;

    println!("kalman-pairs results");
    println!("====================");
    for outcome in &outcomes {
        match outcome {
            PairOutcome::Completed { run, .. } => {
                let s = summarize(run);
                println!(
                    "- {:<12} OK       hedge={:>8.4} long={:<3} short={:<3} pnl={:>12.2} mdd={:>10.2}",
                    outcome.label(),
                    s.final_hedge,
                    s.long_entries,
                    s.short_entries,
                    s.total_pnl,
                    s.max_drawdown
                );
            }
            PairOutcome::Rejected { screening, .. } => {
                println!(
                    "- {:<12} SKIPPED  p={:.4} >= {:.2}",
                    outcome.label(),
                    screening.p_value,
                    config.screening.p_value_cutoff
                );
            }
            PairOutcome::Failed { error, .. } => {
                println!("- {:<12} FAILED   {}", outcome.label(), error);
            }
        }
    }
    println!("wrote {} report(s) to {}", written.len(), config.data.output_dir.display());

    tracing::info!(reports = written.len(), "Run complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some("import") => {
            let (Some(symbol), Some(file)) = (args.get(1), args.get(2)) else {
                bail!("{}", USAGE);
            };
            let config = load_config(args.get(3))?;
            init_tracing(&config)?;
            import(&config, symbol, &PathBuf::from(file))
        }
        Some("run") => {
            let config = load_config(args.get(1))?;
            init_tracing(&config)?;
            run(&config).await
        }
        other => {
            let config = load_config(other.map(|_| &args[0]))?;
            init_tracing(&config)?;
            run(&config).await
        }
    }
}
