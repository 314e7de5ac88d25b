//! Dominant-affiliation resolution.
//!
//! For every author observed with at least one institution, picks the
//! institution they are listed with most often and records its share of all
//! their observed affiliations.
//!
//! ## Tie-break
//!
//! When several institutions share the maximum count for one author, the
//! alphabetically first institution name (byte-wise string order on the
//! squished name) is chosen. The result never depends on input order or on
//! hash iteration order.
//!
//! ## Usage
//!
//! ```rust
//! use affilstat::AffiliationRow;
//! use affilstat::resolve::resolve_dominant;
//!
//! let row = |work: &str, institution: &str| AffiliationRow {
//!     work_id: work.to_string(),
//!     publication_year: 2020,
//!     author_name: "A. Smith".to_string(),
//!     author_id: None,
//!     institution: Some(institution.to_string()),
//! };
//! let rows = vec![row("W1", "MIT"), row("W2", "MIT"), row("W3", "MIT"), row("W4", "Unknown U")];
//!
//! let dominant = resolve_dominant(&rows);
//! assert_eq!(dominant[0].institution, "MIT");
//! assert_eq!(dominant[0].share, 0.75);
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::AffiliationRow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An author's most frequent institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantAffiliation {
    pub author_name: String,
    pub institution: String,
    /// Rows observed at `institution`
    pub count: usize,
    /// `count` divided by all of the author's observed rows, in (0, 1]
    pub share: f64,
}

impl DominantAffiliation {
    /// Whether this author is stable enough for imputation at `threshold`.
    pub fn is_stable(&self, threshold: f64) -> bool {
        self.share >= threshold
    }
}

/// Observed institution counts for one author, keyed in name order.
type InstitutionCounts<'a> = BTreeMap<&'a str, usize>;

/// Computes dominant affiliations, optionally across threads.
///
/// Sequential and parallel runs return identical output.
#[derive(Debug, Default, Clone)]
pub struct Resolver {
    run_in_parallel: bool,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables per-author parallelism. Has no effect without the `parallel`
    /// feature.
    #[must_use]
    pub fn with_parallelism(mut self, run_in_parallel: bool) -> Self {
        self.run_in_parallel = run_in_parallel;
        self
    }

    /// Resolves one dominant affiliation per author, sorted by author name.
    ///
    /// Rows without an institution are ignored; authors never observed with
    /// an institution do not appear in the output.
    pub fn resolve(&self, rows: &[AffiliationRow]) -> Vec<DominantAffiliation> {
        let groups: Vec<(&str, InstitutionCounts<'_>)> = Self::group_by_author(rows)
            .into_iter()
            .collect();

        let dominant: Vec<DominantAffiliation> = if self.run_in_parallel {
            Self::select_all_parallel(&groups)
        } else {
            groups
                .iter()
                .filter_map(|(author, counts)| Self::select_dominant(author, counts))
                .collect()
        };

        debug!(
            authors = dominant.len(),
            parallel = self.run_in_parallel,
            "resolved dominant affiliations"
        );
        dominant
    }

    #[cfg(feature = "parallel")]
    fn select_all_parallel(groups: &[(&str, InstitutionCounts<'_>)]) -> Vec<DominantAffiliation> {
        groups
            .par_iter()
            .filter_map(|(author, counts)| Self::select_dominant(author, counts))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn select_all_parallel(groups: &[(&str, InstitutionCounts<'_>)]) -> Vec<DominantAffiliation> {
        groups
            .iter()
            .filter_map(|(author, counts)| Self::select_dominant(author, counts))
            .collect()
    }

    /// Counts (author, institution) pairs over rows with an institution.
    fn group_by_author(rows: &[AffiliationRow]) -> BTreeMap<&str, InstitutionCounts<'_>> {
        let pair_counts = rows
            .iter()
            .filter_map(|row| {
                row.institution
                    .as_deref()
                    .map(|institution| (row.author_name.as_str(), institution))
            })
            .counts();

        let mut grouped: BTreeMap<&str, InstitutionCounts<'_>> = BTreeMap::new();
        for ((author, institution), count) in pair_counts {
            grouped.entry(author).or_default().insert(institution, count);
        }
        grouped
    }

    /// Picks the highest count; among equal counts the smallest name wins.
    fn select_dominant(author: &str, counts: &InstitutionCounts<'_>) -> Option<DominantAffiliation> {
        let total: usize = counts.values().sum();
        counts
            .iter()
            .max_by(|(name_a, count_a), (name_b, count_b)| {
                count_a.cmp(count_b).then_with(|| name_b.cmp(name_a))
            })
            .map(|(institution, &count)| DominantAffiliation {
                author_name: author.to_string(),
                institution: institution.to_string(),
                count,
                share: count as f64 / total as f64,
            })
    }
}

/// Resolves dominant affiliations sequentially.
pub fn resolve_dominant(rows: &[AffiliationRow]) -> Vec<DominantAffiliation> {
    Resolver::new().resolve(rows)
}
