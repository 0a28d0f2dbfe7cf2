//! Incident Analysis -- synthetic security incidents, SQL aggregation, text report.
//!
//! The pipeline is linear: open the store, seed it once, run the fixed query set,
//! and write the report.

pub mod analysis;
pub mod config;
pub mod model;
pub mod report;
pub mod seed;
pub mod storage;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, SubsecRound};
use rand::Rng;

use crate::analysis::AnalysisResult;
use crate::config::AppConfig;
use crate::seed::{SeedOutcome, Seeder};

/// What a pipeline run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub seed: SeedOutcome,
    pub result: AnalysisResult,
}

/// Run the full pipeline with the system clock and thread-local RNG.
pub fn run(config: &AppConfig, rows: usize) -> Result<RunSummary> {
    let now = Local::now().naive_local().trunc_subsecs(0);
    run_with(config, rows, now, &mut rand::thread_rng())
}

/// Run the full pipeline with an injected clock and random source.
pub fn run_with<R: Rng + ?Sized>(
    config: &AppConfig,
    rows: usize,
    now: NaiveDateTime,
    rng: &mut R,
) -> Result<RunSummary> {
    // 1. Initialize Storage
    tracing::info!(db_path = %config.db_path.display(), "Initializing database");
    let pool = storage::open_pool(&config.db_path).context("storage initialization failed")?;

    // 2. Seed
    let seeder = Seeder::new(pool.clone(), config.vocabulary.clone());
    let seed = seeder.seed(rows, now, rng).context("seeding failed")?;

    // 3. Analyze
    let result = analysis::analyze(&pool).context("analysis failed")?;

    // 4. Report
    let text = report::render(&result, &now);
    report::write_report(&config.report_path, &text)?;

    Ok(RunSummary { seed, result })
}
