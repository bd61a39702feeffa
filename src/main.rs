//! Span Eval CLI
//!
//! Scores retrieved or generated passages against gold reference spans.
//!
//! Usage:
//!   span-eval sample                              # Built-in sample dataset
//!   span-eval run <path>                          # Dataset JSON (listed or keyed layout)
//!   span-eval score --gold <span>... --candidate <text>
//!   span-eval split <text>                        # Show sentence units

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use span_eval::{
    Backend, Config, Dataset, Evaluation, EvaluationConfig, EvaluationReport, Scorer,
    create_provider, create_sample_dataset, load_dataset, split_sentences,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Span Eval - semantic scoring of candidate text against gold spans
#[derive(Parser)]
#[command(name = "span-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Embedding backend: hashing or model
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Hugging Face model id for the model backend
    #[arg(long, global = true)]
    model: Option<String>,

    /// Vector dimension for the hashing backend
    #[arg(long, global = true)]
    dimension: Option<usize>,

    /// Cache embeddings of repeated texts
    #[arg(long, global = true)]
    cache: bool,

    /// Maximum number of items to evaluate
    #[arg(long, global = true)]
    max_items: Option<usize>,

    /// Print the report as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the built-in sample dataset
    Sample,

    /// Evaluate a dataset JSON file
    Run {
        /// Path to the dataset file
        path: PathBuf,
    },

    /// Score one candidate text against gold spans
    Score {
        /// Gold reference span (repeat for several)
        #[arg(short, long = "gold", required = true)]
        gold: Vec<String>,

        /// Candidate text to score
        #[arg(short, long)]
        candidate: String,
    },

    /// Print the sentence units of a text, one per line
    Split {
        /// Text to split
        text: String,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "span_eval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Split { text } => {
            cmd_split(text);
            Ok(())
        }
        Commands::Sample => cmd_evaluate(&cli, create_sample_dataset()),
        Commands::Run { path } => {
            let dataset = load_dataset(path)
                .with_context(|| format!("Failed to load dataset from {}", path.display()))?;
            cmd_evaluate(&cli, dataset)
        }
        Commands::Score { gold, candidate } => cmd_score(&cli, gold, candidate),
    }
}

/// Load the configuration and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config =
        Config::load_with(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(backend) = cli.backend {
        config.embedding.backend = backend;
    }
    if let Some(model) = &cli.model {
        config.embedding.model_id = model.clone();
    }
    if let Some(dimension) = cli.dimension {
        config.embedding.dimension = dimension;
    }
    if cli.cache {
        config.embedding.cache = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn cmd_evaluate(cli: &Cli, dataset: Dataset) -> Result<()> {
    let config = load_config(cli)?;
    let provider =
        create_provider(&config.embedding).context("Failed to initialize embedding provider")?;

    let evaluation = Evaluation::new(
        Scorer::new(provider.as_ref()),
        EvaluationConfig {
            max_items: cli.max_items,
        },
    );
    let report = evaluation.run(&dataset).context("Evaluation failed")?;

    print_report(&report, cli.json)
}

fn cmd_score(cli: &Cli, gold: &[String], candidate: &str) -> Result<()> {
    let config = load_config(cli)?;
    let provider =
        create_provider(&config.embedding).context("Failed to initialize embedding provider")?;
    let scorer = Scorer::new(provider.as_ref());

    let coverage = scorer.semantic_coverage(gold, candidate)?;
    let bert_f1 = scorer.bertscore_style(&gold.join(" "), candidate)?;
    let partial = scorer.partial_correctness(gold, candidate)?;

    if cli.json {
        let scores = serde_json::json!({
            "coverage": coverage,
            "bert_f1": bert_f1,
            "partial": partial,
        });
        println!("{}", serde_json::to_string_pretty(&scores)?);
    } else {
        println!("Coverage: {:.3}", coverage);
        println!("BERT-F1:  {:.3}", bert_f1);
        println!("Partial:  {:.3}", partial);
    }

    Ok(())
}

fn cmd_split(text: &str) {
    for sentence in split_sentences(text) {
        println!("{}", sentence);
    }
}

fn print_report(report: &EvaluationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        report.print_table();
    }
    Ok(())
}
