//! atlas CLI - cluster a scenario dataset and score it against its feature files
//!
//! Reads the JSON emitted by the scenario parser, runs every configured
//! (attribute, metric) branch and prints the metrics per branch.

// Exclude from coverage - CLI binary tested via integration tests
#![cfg_attr(tarpaulin, ignore)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scenario_atlas::{
    AnalysisConfig, AnalysisReport, Dataset, Embedding, Metric, Pipeline, ScoringMode,
    StepAttribute,
};

/// Recover latent groupings in a behavioural test suite.
#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(version = scenario_atlas::VERSION)]
#[command(about = "Cluster BDD scenarios and score the clusters against their feature files")]
#[command(after_help = "EXAMPLES:
  # Full sweep: 3 attributes x 4 metrics
  atlas scenarios.json

  # Only step names, compression distance, JSON report
  atlas scenarios.json --attribute step-name --metric ncd --format json -o report.json

  # Settings from a config file, with cluster listings
  atlas scenarios.json -c atlas.json --list-clusters
")]
struct Cli {
    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT / OUTPUT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Scenario dataset (JSON array of test cases)
    #[arg(value_name = "DATASET", help_heading = "INPUT / OUTPUT")]
    dataset: PathBuf,

    /// Config file path
    #[arg(short = 'c', long = "config", value_name = "FILE", help_heading = "INPUT / OUTPUT")]
    config: Option<PathBuf>,

    /// Output format [text, json]
    #[arg(long = "format", value_enum, default_value = "text", help_heading = "INPUT / OUTPUT")]
    format: OutputFormatArg,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "INPUT / OUTPUT")]
    output: Option<PathBuf>,

    /// List the members of every predicted cluster (text output)
    #[arg(long = "list-clusters", help_heading = "INPUT / OUTPUT")]
    list_clusters: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // ANALYSIS (overrides the config file)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Attribute to analyse; repeatable
    #[arg(long = "attribute", value_enum, help_heading = "ANALYSIS")]
    attributes: Vec<AttributeArg>,

    /// Metric to compute; repeatable
    #[arg(long = "metric", value_enum, help_heading = "ANALYSIS")]
    metrics: Vec<MetricArg>,

    /// Scoring mode; repeatable
    #[arg(long = "mode", value_enum, help_heading = "ANALYSIS")]
    modes: Vec<ModeArg>,

    /// How matrices are fed to k-means
    #[arg(long = "embedding", value_enum, help_heading = "ANALYSIS")]
    embedding: Option<EmbeddingArg>,

    /// Number of clusters (default: number of feature files)
    #[arg(short = 'k', long = "clusters", value_name = "K", help_heading = "ANALYSIS")]
    clusters: Option<usize>,

    /// k-means seed
    #[arg(long = "seed", value_name = "SEED", help_heading = "ANALYSIS")]
    seed: Option<u64>,

    // ═══════════════════════════════════════════════════════════════════════════
    // DIAGNOSTICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// More logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "DIAGNOSTICS")]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AttributeArg {
    #[value(alias = "name")]
    StepName,
    #[value(alias = "cleaned")]
    CleanedStepName,
    #[value(name = "step-body", alias = "step-definition")]
    StepBody,
    #[value(alias = "title")]
    ScenarioTitle,
}

impl From<AttributeArg> for StepAttribute {
    fn from(arg: AttributeArg) -> Self {
        match arg {
            AttributeArg::StepName => StepAttribute::StepName,
            AttributeArg::CleanedStepName => StepAttribute::CleanedStepName,
            AttributeArg::StepBody => StepAttribute::StepBody,
            AttributeArg::ScenarioTitle => StepAttribute::ScenarioTitle,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Ncd,
    Cosine,
    Euclidean,
    Manhattan,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Ncd => Metric::Ncd,
            MetricArg::Cosine => Metric::Cosine,
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Manhattan => Metric::Manhattan,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Ranking,
    Classification,
}

impl From<ModeArg> for ScoringMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Ranking => ScoringMode::Ranking,
            ModeArg::Classification => ScoringMode::Classification,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmbeddingArg {
    Rows,
    PairValues,
}

impl From<EmbeddingArg> for Embedding {
    fn from(arg: EmbeddingArg) -> Self {
        match arg {
            EmbeddingArg::Rows => Embedding::Rows,
            EmbeddingArg::PairValues => Embedding::PairValues,
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if !cli.attributes.is_empty() {
        config.attributes = cli.attributes.iter().map(|&a| a.into()).collect();
    }
    if !cli.metrics.is_empty() {
        config.metrics = cli.metrics.iter().map(|&m| m.into()).collect();
    }
    if !cli.modes.is_empty() {
        config.scoring_modes = cli.modes.iter().map(|&m| m.into()).collect();
    }
    if let Some(embedding) = cli.embedding {
        config.embedding = embedding.into();
    }
    if cli.clusters.is_some() {
        config.clusters = cli.clusters;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn render(report: &AnalysisReport, dataset: &Dataset, cli: &Cli) -> Result<String> {
    match cli.format {
        OutputFormatArg::Json => Ok(report.to_json()?),
        OutputFormatArg::Text => {
            let mut out = report.render_text();
            if cli.list_clusters {
                let titles = dataset.titles();
                for branch in report.completed() {
                    if let Some(outcome) = branch.outcome() {
                        out.push('\n');
                        out.push_str(&format!("{} Clusters:\n", branch.name));
                        out.push_str(&outcome.clustering.partition.describe(&titles));
                    }
                }
            }
            Ok(out)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    let content = std::fs::read_to_string(&cli.dataset)
        .with_context(|| format!("failed to read dataset '{}'", cli.dataset.display()))?;
    let dataset = Dataset::from_json(&content)
        .with_context(|| format!("invalid dataset '{}'", cli.dataset.display()))?;

    let report = Pipeline::new(config).run(&dataset)?;
    let output = render(&report, &dataset, cli)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "scenario_atlas=warn",
        1 => "scenario_atlas=info",
        _ => "scenario_atlas=debug",
    };
    scenario_atlas::init_logging_with(filter);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
