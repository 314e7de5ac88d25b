//! Affiliation resolution for a journal's published works.
//!
//! `affilstat` takes bibliographic metadata (works with their authors and
//! the institutions listed for them), infers a canonical affiliation for
//! every author-work pair, flags affiliations that belong to university
//! presses using an external authority list, and aggregates the result into
//! per-year publication and authorship statistics.
//!
//! # Pipeline
//!
//! 1. [`extract`] flattens works into one row per author per institution.
//! 2. [`resolve`] finds each author's dominant (most frequent) institution.
//! 3. [`impute`] fills missing institutions for stable authors (share ≥ 0.9).
//! 4. [`authority`] joins the result with an authority table.
//! 5. [`aggregate`] counts works and distinct authors per year.
//!
//! [`pipeline::AffiliationEngine`] runs all five stages in one call.
//!
//! # Basic Usage
//!
//! ```rust
//! use affilstat::authority::{AuthorityEntry, AuthorityTable, DuplicatePolicy};
//! use affilstat::pipeline::AffiliationEngine;
//! use affilstat::{AuthorAffiliation, ResolvedAffiliation, WorkRecord};
//!
//! let works = vec![WorkRecord {
//!     id: "W1".to_string(),
//!     publication_year: Some(2021),
//!     is_open: true,
//!     authorships: vec![AuthorAffiliation {
//!         author_name: "B. Lee".to_string(),
//!         author_id: None,
//!         institution: Some("Yale University Press".to_string()),
//!     }],
//! }];
//!
//! let authority = AuthorityTable::from_entries(
//!     vec![AuthorityEntry::new("Yale University Press", true, None)],
//!     DuplicatePolicy::Reject,
//! )
//! .unwrap();
//!
//! let mut review: Vec<ResolvedAffiliation> = Vec::new();
//! let output = AffiliationEngine::new()
//!     .run(&works, &authority, &mut review)
//!     .unwrap();
//!
//! assert!(output.records[0].university_press);
//! assert!(review.is_empty());
//! ```
//!
//! # Error Handling
//!
//! Input validation failures abort the run with an [`AffiliationError`].
//! Missing affiliations, ties and low-confidence authors are not errors:
//! they are resolved deterministically and reported as data.
//!
//! # Author Identity
//!
//! Authors are matched by exact display-name equality. The optional author
//! identifier is carried through but never used as a key, so two people
//! sharing a display name are treated as one author.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod aggregate;
pub mod authority;
pub mod extract;
pub mod impute;
pub mod pipeline;
mod regex;
pub mod resolve;
mod utils;

// Reexports
pub use aggregate::{Category, YearlyCount, YearlyStats};
pub use authority::{AffiliationRecord, AuthorityEntry, AuthorityTable, DuplicatePolicy};
pub use extract::AffiliationRow;
pub use impute::{Imputation, ResolutionSummary, ResolvedAffiliation, StableAuthors};
pub use pipeline::{AffiliationEngine, EngineConfig, EngineOutput, ReviewSink};
pub use resolve::DominantAffiliation;
pub use utils::squish;

/// A specialized Result type for affiliation resolution.
pub type Result<T> = std::result::Result<T, AffiliationError>;

/// Errors that abort a resolution run.
#[derive(Error, Debug)]
pub enum AffiliationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed work record at index {work_index}: {message}")]
    MalformedInput { work_index: usize, message: String },

    #[error(
        "Duplicate authority entry for '{institution}' (rows {first_row} and {duplicate_row})"
    )]
    DuplicateAuthorityEntry {
        institution: String,
        first_row: usize,
        duplicate_row: usize,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value: {field} - {message} at line {line}")]
    InvalidFieldValue {
        field: String,
        message: String,
        line: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

#[cfg(feature = "csv")]
impl From<csv::Error> for AffiliationError {
    fn from(err: csv::Error) -> Self {
        AffiliationError::Csv(err.to_string())
    }
}

/// One author listed on a work, with at most one institution.
///
/// An author listed with several institutions on the same work appears as
/// several consecutive entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorAffiliation {
    /// Display name, used as the author's identity
    pub author_name: String,
    /// Optional external author identifier, carried but never matched on
    pub author_id: Option<String>,
    /// Institution as delivered by the metadata source
    pub institution: Option<String>,
}

/// A published work as delivered by the upstream metadata collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Work identifier; must not be blank
    pub id: String,
    /// Publication year; required
    pub publication_year: Option<i32>,
    /// Whether the work is open access
    pub is_open: bool,
    /// Authors in listed order
    pub authorships: Vec<AuthorAffiliation>,
}

impl WorkRecord {
    /// Checks the required fields, returning the publication year.
    ///
    /// # Errors
    ///
    /// Returns [`AffiliationError::MalformedInput`] carrying `work_index` when
    /// the id is blank or the year is missing.
    pub fn validate(&self, work_index: usize) -> Result<i32> {
        if self.id.trim().is_empty() {
            return Err(AffiliationError::MalformedInput {
                work_index,
                message: "missing work id".to_string(),
            });
        }
        self.publication_year
            .ok_or_else(|| AffiliationError::MalformedInput {
                work_index,
                message: format!("work '{}' has no publication year", self.id),
            })
    }
}

/// Where a final affiliation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Listed on the work itself
    Observed,
    /// Filled from the author's dominant affiliation
    ImputedStableAuthor,
    /// Still missing; routed to manual review
    Unresolved,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Observed => "observed",
            Provenance::ImputedStableAuthor => "imputed_stable_author",
            Provenance::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: &str, year: Option<i32>) -> WorkRecord {
        WorkRecord {
            id: id.to_string(),
            publication_year: year,
            ..Default::default()
        }
    }

    #[test]
    fn test_error_display() {
        let error = AffiliationError::DuplicateAuthorityEntry {
            institution: "MIT Press".to_string(),
            first_row: 1,
            duplicate_row: 4,
        };
        assert_eq!(
            error.to_string(),
            "Duplicate authority entry for 'MIT Press' (rows 1 and 4)"
        );
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        assert_eq!(work("W1", Some(2020)).validate(0).unwrap(), 2020);
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let result = work("  ", Some(2020)).validate(3);
        assert!(matches!(
            result,
            Err(AffiliationError::MalformedInput { work_index: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_year() {
        let err = work("W9", None).validate(7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed work record at index 7: work 'W9' has no publication year"
        );
    }

    #[test]
    fn test_provenance_labels() {
        assert_eq!(Provenance::Observed.to_string(), "observed");
        assert_eq!(
            Provenance::ImputedStableAuthor.to_string(),
            "imputed_stable_author"
        );
        assert_eq!(Provenance::Unresolved.as_str(), "unresolved");
    }
}
