//! taxmatch - batch taxon name matcher
//!
//! Reads queries as JSON lines (`{"scientificName": "Acacia dealbata", ...}`,
//! any observable name as key, string or list of strings as value) and
//! prints one match summary per line. With `--build-parameters` it instead
//! computes every corpus record's parameters and writes the store.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use taxmatch_common::config::{init_logging, load_or_default};
use taxmatch_engine::model::Classification;
use taxmatch_engine::network::{taxonomic_schema, CompiledNetwork, Schema, TaxonTerms};
use taxmatch_engine::parameters::{ParameterBuilder, ParameterStore};
use taxmatch_engine::services::{MemoryIndex, NameAnalyser};
use taxmatch_engine::{ClassificationMatcher, MatcherSettings, TraceLevel};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Command-line arguments for taxmatch
#[derive(Parser, Debug)]
#[command(name = "taxmatch")]
#[command(about = "Match taxon names against a reference corpus")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "TAXMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// JSON corpus of taxon records (overrides [index].corpus)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Persisted parameter store (overrides [index].parameters)
    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Query file, one JSON object per line; stdin when absent
    #[arg(short, long)]
    queries: Option<PathBuf>,

    /// Matches run concurrently
    #[arg(short = 'j', long, default_value = "4")]
    parallelism: usize,

    /// Trace verbosity attached to each match (summary, info, debug, trace)
    #[arg(long)]
    trace: Option<TraceLevel>,

    /// Build parameters for every record and write them here, then exit
    #[arg(long)]
    build_parameters: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialise logging")?;

    info!("Starting taxmatch");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let schema = taxonomic_schema().context("Failed to build taxonomic schema")?;
    let network = Arc::new(CompiledNetwork::compile(schema));

    let Some(corpus) = args.corpus.or(config.index.corpus.clone()) else {
        bail!("No corpus given: pass --corpus or set [index].corpus");
    };
    let parameters_path = args.parameters.or(config.index.parameters.clone());
    let store = match &parameters_path {
        Some(path) if path.exists() && args.build_parameters.is_none() => {
            Some(ParameterStore::load(path).context("Failed to load parameter store")?)
        }
        Some(path) if args.build_parameters.is_none() => {
            warn!("Parameter store {} not found, parameters are built on demand", path.display());
            None
        }
        _ => None,
    };

    let index = Arc::new(
        MemoryIndex::load(network.schema(), &corpus, store.as_ref())
            .with_context(|| format!("Failed to load corpus {}", corpus.display()))?,
    );

    if let Some(output) = args.build_parameters {
        let builder = ParameterBuilder::new(network.clone(), index.clone(), &config.builder);
        let classifiers = index.classifiers();
        let (store, report) = builder.build_all(classifiers.iter())?;
        store
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!(
            built = report.built,
            degraded = report.degraded.len(),
            "Wrote parameter store to {}",
            output.display()
        );
        return Ok(());
    }

    let mut settings = MatcherSettings::from_config(&config.matcher, network.schema())?;
    if args.trace.is_some() {
        settings = settings.with_trace(args.trace);
    }
    let terms = TaxonTerms::resolve(network.schema())?;
    let matcher = Arc::new(ClassificationMatcher::new(
        network.clone(),
        index.clone(),
        Arc::new(NameAnalyser::new(terms)),
        index.clone(),
        settings,
        &config.builder,
    )?);

    let lines: Vec<String> = match &args.queries {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read queries {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => std::io::stdin().lock().lines().collect::<Result<_, _>>()?,
    };

    let parallelism = args.parallelism.max(1);
    let mut pending = lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let mut tasks = JoinSet::new();
    let mut results: Vec<(usize, String)> = Vec::new();

    loop {
        while tasks.len() < parallelism {
            let Some((line_no, line)) = pending.next() else {
                break;
            };
            let matcher = matcher.clone();
            tasks.spawn_blocking(move || (line_no, run_query(&matcher, &line)));
        }
        let Some(joined) = tasks.join_next().await else {
            break;
        };
        let (line_no, output) = joined.context("Match task panicked")?;
        results.push((line_no, output));
    }

    results.sort_by_key(|(line_no, _)| *line_no);
    let mut stdout = std::io::stdout().lock();
    for (_, output) in &results {
        writeln!(stdout, "{}", output)?;
    }
    info!(queries = results.len(), "Batch complete");
    Ok(())
}

/// Match one JSON line; failures become `{"line": n, "error": "..."}`
fn run_query(matcher: &ClassificationMatcher, line: &str) -> String {
    let outcome = parse_query(matcher.schema(), line)
        .and_then(|query| Ok(matcher.find_match(query)?))
        .and_then(|found| Ok(serde_json::to_string(&found.summary(matcher.schema()))?));
    match outcome {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Query failed");
            serde_json::json!({ "error": e.to_string(), "query": line }).to_string()
        }
    }
}

fn parse_query(schema: &Schema, line: &str) -> Result<Classification> {
    let value: Value = serde_json::from_str(line).context("Query is not valid JSON")?;
    let Value::Object(fields) = value else {
        bail!("Query must be a JSON object");
    };
    let mut query = Classification::new();
    for (name, value) in fields {
        let Some(id) = schema.find(&name) else {
            warn!(field = %name, "Ignoring unknown query field");
            continue;
        };
        match value {
            Value::String(s) => query.add(id, &s),
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        query.add(id, &s);
                    }
                }
            }
            Value::Null => {}
            other => query.add(id, &other.to_string()),
        }
    }
    Ok(query)
}
