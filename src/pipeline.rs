//! End-to-end resolution run.
//!
//! [`AffiliationEngine`] chains extraction, dominant-affiliation resolution,
//! imputation, authority matching and aggregation. Each stage takes the
//! previous stage's output and returns a fresh value; nothing is kept
//! between runs, so running twice on the same input gives the same output.
//!
//! ## Configuration
//!
//! ```rust
//! use affilstat::pipeline::{AffiliationEngine, EngineConfig};
//! use affilstat::DuplicatePolicy;
//!
//! let config = EngineConfig {
//!     stable_share_threshold: 0.95,
//!     duplicate_policy: DuplicatePolicy::FirstSeenWins,
//!     run_in_parallel: true,
//! };
//!
//! let engine = AffiliationEngine::new().with_config(config);
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::authority::match_authority;
use crate::extract::extract_rows;
use crate::impute::{STABLE_SHARE_THRESHOLD, StableAuthors, impute};
use crate::resolve::Resolver;
use crate::{
    AffiliationError, AffiliationRecord, AuthorityEntry, AuthorityTable, DominantAffiliation,
    DuplicatePolicy, ResolutionSummary, ResolvedAffiliation, Result, WorkRecord, YearlyStats,
};

/// Receives the rows left without an affiliation, for manual review.
///
/// [`AffiliationEngine::run`] calls [`submit`](ReviewSink::submit) exactly
/// once per run, with an empty slice when everything resolved.
pub trait ReviewSink {
    /// # Errors
    ///
    /// A sink error aborts the run.
    fn submit(&mut self, unresolved: &[ResolvedAffiliation]) -> Result<()>;
}

impl ReviewSink for Vec<ResolvedAffiliation> {
    fn submit(&mut self, unresolved: &[ResolvedAffiliation]) -> Result<()> {
        self.extend_from_slice(unresolved);
        Ok(())
    }
}

/// Tuning for a resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum dominant share for imputation. Never below 0.9.
    pub stable_share_threshold: f64,
    /// How [`AuthorityTable::from_entries`] treats repeated institutions
    /// when the engine builds the table.
    pub duplicate_policy: DuplicatePolicy,
    /// Resolve dominant affiliations across threads (feature `parallel`).
    pub run_in_parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stable_share_threshold: STABLE_SHARE_THRESHOLD,
            duplicate_policy: DuplicatePolicy::Reject,
            run_in_parallel: false,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`AffiliationError::InvalidConfig`] unless the threshold lies
    /// in `[0.9, 1.0]`.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.stable_share_threshold;
        if !(STABLE_SHARE_THRESHOLD..=1.0).contains(&threshold) {
            return Err(AffiliationError::InvalidConfig(format!(
                "stable_share_threshold must be between {STABLE_SHARE_THRESHOLD} and 1.0, got {threshold}"
            )));
        }
        Ok(())
    }
}

/// Everything a run produces besides the review rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// One dominant affiliation per observed author, sorted by name
    pub dominant: Vec<DominantAffiliation>,
    /// One record per extracted row, in input order
    pub records: Vec<AffiliationRecord>,
    pub stats: YearlyStats,
    pub summary: ResolutionSummary,
}

/// Runs the full resolution pipeline.
#[derive(Debug, Default, Clone)]
pub struct AffiliationEngine {
    config: EngineConfig,
}

impl AffiliationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds an authority table with the configured duplicate policy.
    ///
    /// # Errors
    ///
    /// See [`AuthorityTable::from_entries`].
    pub fn authority_table<I>(&self, entries: I) -> Result<AuthorityTable>
    where
        I: IntoIterator<Item = AuthorityEntry>,
    {
        AuthorityTable::from_entries(entries, self.config.duplicate_policy)
    }

    /// Resolves, classifies and aggregates `works`.
    ///
    /// Unresolved rows are handed to `review` before the output is returned;
    /// they also stay in [`EngineOutput::records`] with no institution.
    ///
    /// # Errors
    ///
    /// - [`AffiliationError::InvalidConfig`] for a bad configuration
    /// - [`AffiliationError::MalformedInput`] for a work missing its id or year
    /// - any error returned by `review`
    pub fn run<S>(
        &self,
        works: &[WorkRecord],
        authority: &AuthorityTable,
        review: &mut S,
    ) -> Result<EngineOutput>
    where
        S: ReviewSink + ?Sized,
    {
        self.config.validate()?;

        let rows = extract_rows(works)?;
        let dominant = Resolver::new()
            .with_parallelism(self.config.run_in_parallel)
            .resolve(&rows);
        let stable = StableAuthors::from_dominant(&dominant, self.config.stable_share_threshold);

        let imputation = impute(&rows, &stable);
        let summary = imputation.summary();
        review.submit(&imputation.unresolved())?;

        let records = match_authority(imputation.into_rows(), authority);
        let stats = YearlyStats::compute(works, &records)?;

        info!(
            works = works.len(),
            rows = records.len(),
            authors = dominant.len(),
            stable_authors = stable.len(),
            imputed = summary.imputed,
            unresolved = summary.unresolved,
            "affiliation resolution finished"
        );

        Ok(EngineOutput {
            dominant,
            records,
            stats,
            summary,
        })
    }
}
