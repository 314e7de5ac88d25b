//! Imputation of missing affiliations.
//!
//! A row with no institution borrows its author's dominant institution when
//! that author is *stable*: the dominant institution accounts for at least
//! [`STABLE_SHARE_THRESHOLD`] of the author's observed affiliations. Every
//! other missing institution stays missing and is marked
//! [`Provenance::Unresolved`] for manual review.
//!
//! Authors are looked up by exact display name. Author identifiers are not
//! consulted, so homonyms share one dominant affiliation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::{AffiliationRow, DominantAffiliation, Provenance};

/// Minimum dominant share for an author to be imputed from.
pub const STABLE_SHARE_THRESHOLD: f64 = 0.9;

/// An affiliation row after imputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAffiliation {
    pub work_id: String,
    pub publication_year: i32,
    pub author_name: String,
    pub author_id: Option<String>,
    /// Observed or imputed institution; `None` only when unresolved
    pub institution: Option<String>,
    pub provenance: Provenance,
}

/// Authors whose dominant share meets the stability threshold.
#[derive(Debug, Clone, Default)]
pub struct StableAuthors {
    institutions: HashMap<String, String>,
}

impl StableAuthors {
    /// Keeps the authors of `dominant` whose share is at least `threshold`.
    pub fn from_dominant(dominant: &[DominantAffiliation], threshold: f64) -> Self {
        let institutions = dominant
            .iter()
            .filter(|d| d.is_stable(threshold))
            .map(|d| (d.author_name.clone(), d.institution.clone()))
            .collect();
        Self { institutions }
    }

    /// The stable institution for `author_name`, if the author is stable.
    pub fn institution_for(&self, author_name: &str) -> Option<&str> {
        self.institutions.get(author_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }
}

/// Row counts per provenance for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub observed: usize,
    pub imputed: usize,
    pub unresolved: usize,
}

impl ResolutionSummary {
    pub fn total(&self) -> usize {
        self.observed + self.imputed + self.unresolved
    }
}

/// Output of [`impute`]: exactly one resolved row per input row, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Imputation {
    pub rows: Vec<ResolvedAffiliation>,
}

impl Imputation {
    /// Rows that still have no institution. These go to manual review.
    pub fn unresolved(&self) -> Vec<ResolvedAffiliation> {
        self.rows
            .iter()
            .filter(|row| row.provenance == Provenance::Unresolved)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> ResolutionSummary {
        self.rows
            .iter()
            .fold(ResolutionSummary::default(), |mut summary, row| {
                match row.provenance {
                    Provenance::Observed => summary.observed += 1,
                    Provenance::ImputedStableAuthor => summary.imputed += 1,
                    Provenance::Unresolved => summary.unresolved += 1,
                }
                summary
            })
    }

    pub fn into_rows(self) -> Vec<ResolvedAffiliation> {
        self.rows
    }
}

/// Resolves the final institution and provenance of every row.
pub fn impute(rows: &[AffiliationRow], stable: &StableAuthors) -> Imputation {
    let rows: Vec<ResolvedAffiliation> = rows
        .iter()
        .map(|row| {
            let (institution, provenance) = match &row.institution {
                Some(observed) => (Some(observed.clone()), Provenance::Observed),
                None => match stable.institution_for(&row.author_name) {
                    Some(imputed) => (Some(imputed.to_string()), Provenance::ImputedStableAuthor),
                    None => (None, Provenance::Unresolved),
                },
            };
            ResolvedAffiliation {
                work_id: row.work_id.clone(),
                publication_year: row.publication_year,
                author_name: row.author_name.clone(),
                author_id: row.author_id.clone(),
                institution,
                provenance,
            }
        })
        .collect();

    let imputation = Imputation { rows };
    let summary = imputation.summary();
    debug!(
        stable_authors = stable.len(),
        observed = summary.observed,
        imputed = summary.imputed,
        unresolved = summary.unresolved,
        "imputed missing affiliations"
    );
    imputation
}
