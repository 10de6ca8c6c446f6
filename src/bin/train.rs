//! Offline training run for Cardiolens.
//!
//! Compares the candidate classifiers on the Cleveland dataset, tunes a
//! random forest and writes the serving artifact plus reports.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin train -- --data processed.cleveland.data --model-dir models
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cardiolens::adapters::{FileModelStore, FileReporter};
use cardiolens::application::{ModelSelector, SelectorConfig};

#[derive(Debug, Parser)]
#[command(name = "train", about = "Train and persist the heart-disease model")]
struct Args {
    /// Cleveland data file (comma separated, `?` for missing values)
    #[arg(long, default_value = "processed.cleveland.data")]
    data: PathBuf,

    /// Directory that receives model.json and manifest.json
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// Directory for the comparison table and chart data
    #[arg(long, default_value = "reports")]
    report_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Skip the exploratory statistics
    #[arg(long)]
    skip_exploration: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = cardiolens::telemetry::init(Path::new("logs/train.log"))?;

    let mut config = SelectorConfig::new(args.seed);
    config.explore = !args.skip_exploration;

    let selector = ModelSelector::new(
        config,
        Arc::new(FileReporter::new(&args.report_dir)),
        Arc::new(FileModelStore::new(&args.model_dir)),
    );

    let outcome = selector
        .run(&args.data)
        .with_context(|| format!("Training from {} failed", args.data.display()))?;

    println!(
        "{:<22} {:>9} {:>10} {:>8} {:>9}",
        "Model", "Accuracy", "Precision", "Recall", "F1 Score"
    );
    for candidate in &outcome.candidates {
        println!(
            "{:<22} {:>9.4} {:>10.4} {:>8.4} {:>9.4}",
            candidate.name,
            candidate.scores.accuracy,
            candidate.scores.precision,
            candidate.scores.recall,
            candidate.scores.f1
        );
    }
    for failure in &outcome.failures {
        println!("{:<22} failed: {}", failure.name, failure.reason);
    }
    println!();
    println!(
        "Best base model:  {} ({:.4})",
        outcome.base_best.name, outcome.base_best.scores.accuracy
    );
    println!(
        "Tuned forest:     {:?} cv {:.4}, held-out {:.4}",
        outcome.tuning.best.params, outcome.tuning.best.mean_accuracy, outcome.tuned_accuracy
    );
    println!("Final model:      {}", outcome.final_name);
    println!(
        "Served model:     {} ({:.4}) -> {}",
        outcome.served_name,
        outcome.served_accuracy,
        args.model_dir.display()
    );
    Ok(())
}
