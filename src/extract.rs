//! Affiliation extraction.
//!
//! Flattens works into a flat row stream: one [`AffiliationRow`] per author
//! per institution per work. This is a reshape only; no row is filtered.

use either::{Left, Right};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::squish_institution;
use crate::{AffiliationError, Result, WorkRecord};

/// A single author-work-institution observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationRow {
    pub work_id: String,
    pub publication_year: i32,
    pub author_name: String,
    pub author_id: Option<String>,
    /// Whitespace-squished institution, `None` when the source had none
    pub institution: Option<String>,
}

/// Flattens `works` into affiliation rows, preserving work and author order.
///
/// # Errors
///
/// Every work is validated before any row is produced. The first malformed
/// work (blank id or missing year) aborts extraction with
/// [`AffiliationError::MalformedInput`].
pub fn extract_rows(works: &[WorkRecord]) -> Result<Vec<AffiliationRow>> {
    let (mut malformed, years): (Vec<AffiliationError>, Vec<i32>) = works
        .iter()
        .enumerate()
        .partition_map(|(index, work)| match work.validate(index) {
            Ok(year) => Right(year),
            Err(err) => Left(err),
        });

    if !malformed.is_empty() {
        warn!(malformed = malformed.len(), "rejecting input with malformed works");
        return Err(malformed.swap_remove(0));
    }

    let rows: Vec<AffiliationRow> = works
        .iter()
        .zip(years)
        .flat_map(|(work, year)| {
            work.authorships.iter().map(move |authorship| AffiliationRow {
                work_id: work.id.clone(),
                publication_year: year,
                author_name: authorship.author_name.clone(),
                author_id: authorship.author_id.clone(),
                institution: squish_institution(authorship.institution.as_deref()),
            })
        })
        .collect();

    debug!(works = works.len(), rows = rows.len(), "extracted affiliation rows");
    Ok(rows)
}
