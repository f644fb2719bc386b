use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use quickchart::data::loader::load_file;
use quickchart::{
    ClassifierConfig, NO_CHARTS_NOTICE, SpecChartBuilder, classify, find_charts_json,
};

#[derive(Parser)]
#[command(name = "quickchart")]
#[command(about = "Suggest charts for a tabular dataset")]
#[command(version)]
struct Cli {
    /// Input dataset (.csv, .json or .parquet)
    input: PathBuf,

    /// Max charts generated per chart family (unbounded if omitted)
    #[arg(short = 'k', long)]
    max_instances: Option<usize>,

    /// Max distinct values for a categorical column to be used as a facet
    #[arg(long)]
    categorical_threshold: Option<usize>,

    /// Classifier configuration (JSON). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset name used in chart titles. Defaults to the file stem.
    #[arg(long)]
    name: Option<String>,

    /// Print the column classification instead of chart sections
    #[arg(long)]
    classify: bool,

    /// Output file (pretty JSON). Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClassifierConfig::default(),
    };
    if let Some(threshold) = cli.categorical_threshold {
        config.categorical_size_threshold = threshold;
    }

    let dataset = load_file(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    info!(
        "loaded {} rows × {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        cli.input.display()
    );

    let output = if cli.classify {
        serde_json::to_value(classify(&dataset, &config))?
    } else {
        let name = cli.name.clone().unwrap_or_else(|| file_stem(&cli.input));
        let mut namespace = HashMap::new();
        namespace.insert(name.clone(), Arc::new(dataset));
        let sections = find_charts_json(
            &name,
            &namespace,
            &SpecChartBuilder::default(),
            &config,
            cli.max_instances,
        )?;
        if sections.as_array().is_some_and(|s| s.is_empty()) {
            eprintln!("{NO_CHARTS_NOTICE}");
        }
        sections
    };

    let text = serde_json::to_string_pretty(&output)?;
    match &cli.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ClassifierConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).context("parsing classifier config")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("df")
        .to_string()
}
