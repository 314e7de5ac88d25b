//! Authority table and university-press classification.
//!
//! The authority table maps a normalized institution name to a
//! university-press flag and an optional reference URL. Resolved
//! affiliations are left-joined against it: unmatched and missing
//! institutions are classified as not a university press.
//!
//! # Example
//!
//! ```
//! use affilstat::authority::{AuthorityEntry, AuthorityTable, DuplicatePolicy};
//!
//! let table = AuthorityTable::from_entries(
//!     vec![
//!         AuthorityEntry::new("Yale University Press", true, Some("https://yalebooks.yale.edu")),
//!         AuthorityEntry::new("MIT", false, None),
//!     ],
//!     DuplicatePolicy::Reject,
//! )
//! .unwrap();
//!
//! assert!(table.lookup("Yale  University Press").unwrap().university_press);
//! assert!(table.lookup("Unknown U").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

use crate::utils::squish;
use crate::{AffiliationError, Provenance, ResolvedAffiliation, Result};

#[cfg(feature = "csv")]
pub mod load;

/// One institution in the authority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityEntry {
    /// Institution name, whitespace-squished once in a table
    pub institution_name: String,
    pub university_press: bool,
    pub url: Option<String>,
}

impl AuthorityEntry {
    pub fn new(institution_name: &str, university_press: bool, url: Option<&str>) -> Self {
        Self {
            institution_name: institution_name.to_string(),
            university_press,
            url: url.map(String::from),
        }
    }
}

/// How repeated institution names in an authority list are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`AffiliationError::DuplicateAuthorityEntry`]
    #[default]
    Reject,
    /// Keep the first entry, drop later ones with a warning
    FirstSeenWins,
}

/// Authority entries keyed by normalized institution name.
///
/// Holds at most one entry per normalized name, so joining against it never
/// duplicates rows.
#[derive(Debug, Clone, Default)]
pub struct AuthorityTable {
    entries: HashMap<String, AuthorityEntry>,
}

impl AuthorityTable {
    /// Builds a table, squishing every institution name.
    ///
    /// Rows are numbered from 1 in error messages.
    ///
    /// # Errors
    ///
    /// - [`AffiliationError::MissingField`] for an entry with a blank name
    /// - [`AffiliationError::DuplicateAuthorityEntry`] when two entries share a
    ///   normalized name and `policy` is [`DuplicatePolicy::Reject`]
    pub fn from_entries<I>(entries: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = AuthorityEntry>,
    {
        let mut table: HashMap<String, AuthorityEntry> = HashMap::new();
        let mut first_rows: HashMap<String, usize> = HashMap::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let row = index + 1;
            let name = squish(&entry.institution_name);
            if name.is_empty() {
                return Err(AffiliationError::MissingField(format!(
                    "institution_name (authority row {row})"
                )));
            }

            match table.entry(name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(AuthorityEntry {
                        institution_name: name.clone(),
                        ..entry
                    });
                    first_rows.insert(name, row);
                }
                Entry::Occupied(_) => {
                    let first_row = first_rows.get(&name).copied().unwrap_or_default();
                    match policy {
                        DuplicatePolicy::Reject => {
                            return Err(AffiliationError::DuplicateAuthorityEntry {
                                institution: name,
                                first_row,
                                duplicate_row: row,
                            });
                        }
                        DuplicatePolicy::FirstSeenWins => {
                            warn!(
                                institution = %name,
                                first_row,
                                duplicate_row = row,
                                "dropping duplicate authority entry"
                            );
                        }
                    }
                }
            }
        }

        debug!(entries = table.len(), "built authority table");
        Ok(Self { entries: table })
    }

    /// Finds the entry for `institution` after whitespace normalization.
    pub fn lookup(&self, institution: &str) -> Option<&AuthorityEntry> {
        self.entries.get(&squish(institution))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final per-author-per-work record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationRecord {
    pub work_id: String,
    pub publication_year: i32,
    pub author_name: String,
    pub author_id: Option<String>,
    pub institution: Option<String>,
    pub provenance: Provenance,
    /// `false` whenever the institution has no authority entry
    pub university_press: bool,
    pub url: Option<String>,
}

/// Left-joins resolved rows with `table`. Output order and length match the
/// input.
pub fn match_authority(
    rows: Vec<ResolvedAffiliation>,
    table: &AuthorityTable,
) -> Vec<AffiliationRecord> {
    let records: Vec<AffiliationRecord> = rows
        .into_iter()
        .map(|row| {
            let entry = row
                .institution
                .as_deref()
                .and_then(|institution| table.lookup(institution));
            AffiliationRecord {
                university_press: entry.is_some_and(|e| e.university_press),
                url: entry.and_then(|e| e.url.clone()),
                work_id: row.work_id,
                publication_year: row.publication_year,
                author_name: row.author_name,
                author_id: row.author_id,
                institution: row.institution,
                provenance: row.provenance,
            }
        })
        .collect();

    debug!(
        records = records.len(),
        university_press = records.iter().filter(|r| r.university_press).count(),
        "matched affiliations against authority table"
    );
    records
}
