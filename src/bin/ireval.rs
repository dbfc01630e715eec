//! `ireval` CLI: evaluate lexical search configurations on a judged collection.

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use ireval::config::{EvalPlan, PipelineConfig};
#[cfg(feature = "cli")]
use ireval::corpus::{load_collection, Judgments};
#[cfg(feature = "cli")]
use ireval::curve::{recall_levels, QueryCurves, RankedResults};
#[cfg(feature = "cli")]
use ireval::eval::Evaluator;
#[cfg(feature = "cli")]
use ireval::report::{render, render_query_summary, ReportFormat};
#[cfg(feature = "cli")]
use ireval::search::{LexicalSearch, TextSearch};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about = "Retrieval evaluation CLI", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the configuration × query matrix and report averaged 11-point curves.
    Eval {
        /// JSON document collection.
        #[arg(short, long)]
        collection: PathBuf,

        /// TOML evaluation plan (defaults to the reference run).
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Override the plan's topic (search task number).
        #[arg(long)]
        topic: Option<u32>,

        /// Override the plan's retrieval depth.
        #[arg(long)]
        depth: Option<usize>,

        /// Configuration code, e.g. `211` (repeatable; replaces the plan's list).
        #[arg(short, long = "engine")]
        engines: Vec<PipelineConfig>,

        /// Query string (repeatable; replaces the plan's list).
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Output format: text, json or csv.
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
    },

    /// Run one query under one configuration and print its summary and curves.
    Search {
        /// JSON document collection.
        #[arg(short, long)]
        collection: PathBuf,

        /// Configuration code.
        #[arg(short, long, default_value = "211")]
        engine: PipelineConfig,

        /// Topic (search task number) whose judgments define relevance.
        #[arg(long, default_value_t = 5)]
        topic: u32,

        /// Retrieval depth.
        #[arg(long, default_value_t = 1000)]
        depth: usize,

        /// Top hits to print.
        #[arg(short, long, default_value_t = 25)]
        k: usize,

        /// Query words.
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Compute both 11-point curves for a literal relevance sequence such as `1,0,1,0,0`.
    Curve {
        /// Total relevant documents for the topic.
        #[arg(short, long)]
        relevant: usize,

        /// Relevance flags in rank order (0/1, separated by commas or spaces).
        relevances: String,
    },
}

#[cfg(feature = "cli")]
fn parse_relevances(s: &str) -> Result<Vec<bool>, String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| match t {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(format!("invalid relevance flag {other:?} (expected 0 or 1)")),
        })
        .collect()
}

#[cfg(feature = "cli")]
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ireval=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "cli")]
    {
        init_tracing();
        let args = Args::parse();

        match args.command {
            Commands::Eval {
                collection,
                plan,
                topic,
                depth,
                engines,
                queries,
                format,
            } => {
                let mut plan = match plan {
                    Some(path) => EvalPlan::load(path)?,
                    None => EvalPlan::default(),
                };
                if let Some(topic) = topic {
                    plan.topic = topic;
                }
                if let Some(depth) = depth {
                    plan.depth = depth;
                }
                if !engines.is_empty() {
                    plan.engines = engines;
                }
                if !queries.is_empty() {
                    plan.queries = queries;
                }

                let documents = load_collection(&collection)?;
                let report = Evaluator::new(&LexicalSearch, &documents).run(&plan);
                print!("{}", render(&report, format)?);
            }
            Commands::Search {
                collection,
                engine,
                topic,
                depth,
                k,
                query,
            } => {
                let documents = load_collection(&collection)?;
                let judgments = Judgments::for_topic(&documents, topic);
                let search = LexicalSearch;
                let index = search.build_index(&documents, engine)?;
                let query = query.join(" ");
                let summary = Evaluator::new(&search, &documents)
                    .evaluate_query(&index, &query, &judgments, depth, k)?;
                println!("Engine configuration: {engine} [{}]", engine.code());
                print!("{}", render_query_summary(&query, &summary));
            }
            Commands::Curve {
                relevant,
                relevances,
            } => {
                let flags = parse_relevances(&relevances)?;
                let results = RankedResults::from_relevances(&flags);
                let curves = QueryCurves::compute(&results, relevant)?;
                println!("recall,raw,interpolated");
                for ((level, raw), interpolated) in recall_levels()
                    .iter()
                    .zip(curves.raw.values())
                    .zip(curves.interpolated.values())
                {
                    println!("{level:.1},{raw:.4},{interpolated:.4}");
                }
            }
        }
    }

    #[cfg(not(feature = "cli"))]
    println!("CLI feature is disabled. Build with --features cli to enable.");

    Ok(())
}
