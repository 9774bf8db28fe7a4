//! `axiom` — a fixture-driven front end over the constraint engine.
//!
//! Reads entity-revision snapshots and a "universe" fixture standing in for
//! the Wikibase client (property pages and any other entities the
//! evaluated predicates need to resolve, plus a flat property-datatype
//! table), then dispatches to [`axiom_eval::ConstraintEvaluator`] and
//! prints the result.
//!
//! This binary is not part of the engine's core (spec §1 scopes CLI/
//! orchestration out of the core); it exists only so the workspace ships
//! something runnable over the library, per `SPEC_FULL.md`'s CLI section.

mod fixtures;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axiom_constraints::ConstraintsStore;
use axiom_core::{EngineConfig, Revision};
use axiom_eval::ConstraintEvaluator;
use clap::{Parser, Subcommand, ValueEnum};

use fixtures::{DatatypeFixture, InMemoryEntityStore, OfflineHttp, OfflineSparql};

#[derive(Parser, Debug)]
#[command(name = "axiom", about = "Score a Wikibase-style entity edit against its declared constraints")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Optional TOML file deserialized into `EngineConfig` (cache
    /// capacities, redirect-hop limit); falls back to `EngineConfig::default()`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON fixture standing in for property pages and any other entity the
    /// evaluated predicates need to resolve. Shape:
    /// `{"revisions": [Revision, ...], "redirects": {"Q1": "Q2"}, "datatypes": {"P31": "item"}}`.
    #[arg(long, global = true)]
    universe: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Logging filter passed through to `AXIOM_LOG` if that env var is unset.
    #[arg(long, default_value = "info", global = true)]
    log: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a single edit between two revisions (`evaluate_change`).
    Evaluate {
        /// Path to the "before" revision snapshot (JSON-serialized `Revision`).
        #[arg(long)]
        old: PathBuf,
        /// Path to the "after" revision snapshot (JSON-serialized `Revision`).
        #[arg(long)]
        new: PathBuf,
        /// Optional present-day snapshot, used to suppress already-reverted
        /// or already-undone atoms (spec §4.4 step 1).
        #[arg(long)]
        current: Option<PathBuf>,
    },
    /// Run a whole-entity check (`evaluate_entity`) against one snapshot.
    CheckEntity {
        /// Path to the revision snapshot to check (JSON-serialized `Revision`).
        #[arg(long)]
        entity: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Default, serde::Deserialize)]
struct Universe {
    #[serde(default)]
    revisions: Vec<Revision>,
    #[serde(default)]
    redirects: HashMap<String, String>,
    #[serde(default)]
    datatypes: DatatypeFixture,
}

fn load_revision(path: &Path) -> Result<Revision> {
    let text = fs::read_to_string(path).with_context(|| format!("reading revision snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing revision snapshot {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn load_universe(path: Option<&Path>) -> Result<Universe> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading universe fixture {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing universe fixture {}", path.display()))
        }
        None => Ok(Universe::default()),
    }
}

fn build_evaluator(universe: Universe, config: EngineConfig, extra_revisions: Vec<Revision>) -> ConstraintEvaluator {
    let mut revisions = universe.revisions;
    revisions.extend(extra_revisions);

    let entity_store = Arc::new(InMemoryEntityStore::new(revisions, universe.redirects));
    let sparql = Arc::new(OfflineSparql);
    let http = Arc::new(OfflineHttp);
    let datatypes = Arc::new(universe.datatypes);

    let store = ConstraintsStore::new(entity_store, sparql, http, config);
    ConstraintEvaluator::new(store, datatypes)
}

fn main() -> Result<()> {
    let args = Args::parse();
    axiom_core::logging::init_tracing(&args.log);

    let config = load_config(args.config.as_deref())?;
    let universe = load_universe(args.universe.as_deref())?;

    match args.command {
        Command::Evaluate { old, new, current } => {
            let old_rev = load_revision(&old)?;
            let new_rev = load_revision(&new)?;
            let current_rev = current.as_deref().map(load_revision).transpose()?;

            let mut extra = vec![old_rev.clone(), new_rev.clone()];
            extra.extend(current_rev.clone());
            let evaluator = build_evaluator(universe, config, extra);

            let result = evaluator
                .evaluate_change(&old_rev, &new_rev, current_rev.as_ref())
                .context("evaluating change")?;
            print_report(&args.format, result.score(), &result.evaluated);
        }
        Command::CheckEntity { entity } => {
            let rev = load_revision(&entity)?;
            let evaluator = build_evaluator(universe, config, vec![rev.clone()]);
            let evaluated = evaluator.evaluate_entity(&rev).context("checking entity")?;
            let score: i64 = evaluated.iter().map(|r| r.score).sum();
            print_report(&args.format, score, &evaluated);
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct ReportRow<'a> {
    property: &'a str,
    predicate: String,
    scope: String,
    status: String,
    score: i64,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    score: i64,
    evaluated: Vec<ReportRow<'a>>,
}

fn rows(evaluated: &[axiom_eval::CheckResult]) -> Vec<ReportRow<'_>> {
    evaluated
        .iter()
        .map(|r| ReportRow {
            property: r.property.as_str(),
            predicate: format!("{:?}", r.predicate),
            scope: format!("{:?}", r.scope),
            status: format!("{:?}", r.status),
            score: r.score,
        })
        .collect()
}

fn print_report(format: &OutputFormat, score: i64, evaluated: &[axiom_eval::CheckResult]) {
    match format {
        OutputFormat::Json => {
            let report = Report { score, evaluated: rows(evaluated) };
            match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{text}"),
                Err(err) => eprintln!("failed to render report as json: {err}"),
            }
        }
        OutputFormat::Table => {
            println!("score: {score}");
            println!("{:<10} {:<28} {:<10} {:<10} {:>6}", "property", "predicate", "scope", "status", "score");
            for row in rows(evaluated) {
                println!("{:<10} {:<28} {:<10} {:<10} {:>6}", row.property, row.predicate, row.scope, row.status, row.score);
            }
            let violated = evaluated.iter().filter(|r| r.is_violation()).count();
            let fixed = evaluated.iter().filter(|r| r.is_fix()).count();
            println!("{violated} violated, {fixed} fixed");
        }
    }
}
