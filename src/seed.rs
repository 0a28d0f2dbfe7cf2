//! Synthetic incident generation and one-time seeding of an empty store.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, SubsecRound};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Vocabulary;
use crate::model::{IncidentType, NewIncident, Severity};
use crate::storage::{self, Pool};

/// Oldest detection time generated, in minutes before "now" (10 days).
pub const MAX_AGE_MINUTES: i64 = 60 * 24 * 10;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("vocabulary for {0} is empty")]
    EmptyVocabulary(&'static str),

    #[error("invalid severity weights: {0}")]
    Weights(#[from] WeightedError),
}

/// What a call to [`Seeder::seed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store was empty and `rows` incidents were committed.
    Seeded { rows: usize },
    /// The store already held `existing` rows; nothing was written.
    AlreadySeeded { existing: i64 },
}

/// Pick a severity using `weights`, positional over [`Severity::ALL`].
pub fn pick_severity<R: Rng + ?Sized>(
    weights: [u32; 4],
    rng: &mut R,
) -> Result<Severity, SeedError> {
    let dist = WeightedIndex::new(weights)?;
    Ok(Severity::ALL[dist.sample(rng)])
}

/// Generate one incident detected up to [`MAX_AGE_MINUTES`] before `now`.
pub fn generate_incident<R: Rng + ?Sized>(
    vocabulary: &Vocabulary,
    now: NaiveDateTime,
    rng: &mut R,
) -> Result<NewIncident, SeedError> {
    let minutes_ago = rng.gen_range(1..=MAX_AGE_MINUTES);
    let timestamp = (now - Duration::minutes(minutes_ago)).trunc_subsecs(0);

    let source_ip = vocabulary
        .source_ips
        .choose(rng)
        .ok_or(SeedError::EmptyVocabulary("source_ips"))?;
    let username = vocabulary
        .usernames
        .choose(rng)
        .ok_or(SeedError::EmptyVocabulary("usernames"))?;
    let incident_type = *IncidentType::ALL
        .choose(rng)
        .ok_or(SeedError::EmptyVocabulary("incident_types"))?;
    let severity = pick_severity(incident_type.severity_weights(), rng)?;

    Ok(NewIncident::new(
        timestamp,
        source_ip.as_str(),
        username.as_str(),
        incident_type,
        severity,
    ))
}

pub fn generate_batch<R: Rng + ?Sized>(
    vocabulary: &Vocabulary,
    rows: usize,
    now: NaiveDateTime,
    rng: &mut R,
) -> Result<Vec<NewIncident>, SeedError> {
    (0..rows)
        .map(|_| generate_incident(vocabulary, now, rng))
        .collect()
}

/// Fills an empty incidents table with synthetic data.
pub struct Seeder {
    pool: Pool,
    vocabulary: Vocabulary,
}

impl Seeder {
    pub fn new(pool: Pool, vocabulary: Vocabulary) -> Self {
        Self { pool, vocabulary }
    }

    /// Seed `rows` incidents if and only if the table is empty.
    ///
    /// The emptiness check and the insert run in one transaction, so a failure leaves
    /// the table empty and a later run seeds again.
    pub fn seed<R: Rng + ?Sized>(
        &self,
        rows: usize,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Result<SeedOutcome> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let existing = storage::count_incidents(&tx)?;
        if existing > 0 {
            debug!(existing, "Store already seeded, skipping");
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }

        let batch = generate_batch(&self.vocabulary, rows, now, rng)?;
        let inserted = storage::insert_incidents(&tx, &batch)?;
        tx.commit().context("failed to commit seed batch")?;

        info!(rows = inserted, "Seeded synthetic incidents");
        Ok(SeedOutcome::Seeded { rows: inserted })
    }
}
