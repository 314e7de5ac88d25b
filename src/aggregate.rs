//! Per-year statistics.
//!
//! Two tables, both shaped `(year, category, count)` for a charting
//! collaborator:
//!
//! - works per year, split by openness (`open` / `closed`)
//! - distinct authors per year, overall and restricted to university-press
//!   affiliations (`all_authors` / `university_press_authors`)
//!
//! Distinct authors are counted by display name.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use crate::{AffiliationRecord, Result, WorkRecord};

/// Category label of a [`YearlyCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Open,
    Closed,
    AllAuthors,
    UniversityPressAuthors,
}

impl Category {
    /// Openness rendered as a two-valued category.
    pub fn from_openness(is_open: bool) -> Self {
        if is_open {
            Category::Open
        } else {
            Category::Closed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Open => "open",
            Category::Closed => "closed",
            Category::AllAuthors => "all_authors",
            Category::UniversityPressAuthors => "university_press_authors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a yearly statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyCount {
    pub year: i32,
    pub category: Category,
    pub count: usize,
}

impl YearlyCount {
    fn new(year: i32, category: Category, count: usize) -> Self {
        Self {
            year,
            category,
            count,
        }
    }
}

/// Both yearly tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyStats {
    pub works: Vec<YearlyCount>,
    pub authors: Vec<YearlyCount>,
}

impl YearlyStats {
    /// Builds both tables.
    ///
    /// # Errors
    ///
    /// Fails like [`work_counts`] on a malformed work.
    pub fn compute(works: &[WorkRecord], records: &[AffiliationRecord]) -> Result<Self> {
        Ok(Self {
            works: work_counts(works)?,
            authors: author_counts(records),
        })
    }
}

/// Counts works per `(year, openness)`.
///
/// Only combinations that occur are emitted, ordered by year with `open`
/// before `closed`.
///
/// # Errors
///
/// Returns [`crate::AffiliationError::MalformedInput`] for a work with a
/// blank id or no publication year.
pub fn work_counts(works: &[WorkRecord]) -> Result<Vec<YearlyCount>> {
    let keys: Vec<(i32, Category)> = works
        .iter()
        .enumerate()
        .map(|(index, work)| {
            work.validate(index)
                .map(|year| (year, Category::from_openness(work.is_open)))
        })
        .collect::<Result<_>>()?;

    let table: Vec<YearlyCount> = keys
        .into_iter()
        .counts()
        .into_iter()
        .map(|((year, category), count)| YearlyCount::new(year, category, count))
        .sorted_by_key(|row| (row.year, row.category))
        .collect();

    debug!(works = works.len(), rows = table.len(), "counted works per year");
    Ok(table)
}

/// Counts distinct author names per year, overall and among
/// university-press records.
///
/// Both categories are emitted for every year present, zero included.
pub fn author_counts(records: &[AffiliationRecord]) -> Vec<YearlyCount> {
    let mut by_year: BTreeMap<i32, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for record in records {
        let (all, press) = by_year.entry(record.publication_year).or_default();
        all.insert(record.author_name.as_str());
        if record.university_press {
            press.insert(record.author_name.as_str());
        }
    }

    let table: Vec<YearlyCount> = by_year
        .into_iter()
        .flat_map(|(year, (all, press))| {
            [
                YearlyCount::new(year, Category::AllAuthors, all.len()),
                YearlyCount::new(year, Category::UniversityPressAuthors, press.len()),
            ]
        })
        .collect();

    debug!(records = records.len(), rows = table.len(), "counted authors per year");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AffiliationError, Provenance};
    use pretty_assertions::assert_eq;

    fn work(id: &str, year: i32, is_open: bool) -> WorkRecord {
        WorkRecord {
            id: id.to_string(),
            publication_year: Some(year),
            is_open,
            authorships: Vec::new(),
        }
    }

    fn record(year: i32, author: &str, university_press: bool) -> AffiliationRecord {
        AffiliationRecord {
            work_id: "W1".to_string(),
            publication_year: year,
            author_name: author.to_string(),
            author_id: None,
            institution: None,
            provenance: Provenance::Observed,
            university_press,
            url: None,
        }
    }

    #[test]
    fn test_work_counts_by_year_and_openness() {
        let works = vec![
            work("W1", 2020, true),
            work("W2", 2020, false),
            work("W3", 2021, true),
            work("W4", 2021, true),
        ];

        assert_eq!(
            work_counts(&works).unwrap(),
            vec![
                YearlyCount::new(2020, Category::Open, 1),
                YearlyCount::new(2020, Category::Closed, 1),
                YearlyCount::new(2021, Category::Open, 2),
            ]
        );
    }

    #[test]
    fn test_work_counts_rejects_missing_year() {
        let works = vec![
            work("W1", 2020, true),
            WorkRecord {
                id: "W2".to_string(),
                ..Default::default()
            },
        ];
        assert!(matches!(
            work_counts(&works),
            Err(AffiliationError::MalformedInput { work_index: 1, .. })
        ));
    }

    #[test]
    fn test_author_counts_are_distinct_by_name() {
        let records = vec![
            record(2020, "B. Lee", true),
            record(2020, "B. Lee", true),
            record(2020, "A. Smith", false),
            record(2021, "A. Smith", false),
        ];

        assert_eq!(
            author_counts(&records),
            vec![
                YearlyCount::new(2020, Category::AllAuthors, 2),
                YearlyCount::new(2020, Category::UniversityPressAuthors, 1),
                YearlyCount::new(2021, Category::AllAuthors, 1),
                YearlyCount::new(2021, Category::UniversityPressAuthors, 0),
            ]
        );
    }

    #[test]
    fn test_author_counted_once_when_press_on_any_row() {
        let records = vec![record(2022, "B. Lee", false), record(2022, "B. Lee", true)];

        let counts = author_counts(&records);
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(work_counts(&[]).unwrap().is_empty());
        assert!(author_counts(&[]).is_empty());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_openness(true).to_string(), "open");
        assert_eq!(Category::from_openness(false).to_string(), "closed");
        assert_eq!(
            Category::UniversityPressAuthors.as_str(),
            "university_press_authors"
        );
    }
}
