//! CSV loading for authority lists.
//!
//! Authority lists are usually maintained by hand as spreadsheets, so the
//! flag column often holds `yes`/`no` tokens rather than booleans. The reader
//! normalizes those before building [`AuthorityEntry`] values.
//!
//! # Example
//!
//! ```
//! use affilstat::authority::load::AuthorityCsvReader;
//!
//! let input = "institution_name,university_press,url\n\
//!              Yale University Press,yes,https://yalebooks.yale.edu\n\
//!              MIT,no,";
//!
//! let entries = AuthorityCsvReader::new().read(input).unwrap();
//! assert_eq!(entries.len(), 2);
//! assert!(entries[0].university_press);
//! assert_eq!(entries[1].url, None);
//! ```

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;

use crate::utils::parse_flag;
use crate::{AffiliationError, AuthorityEntry, Result};

/// Default header aliases for the authority columns
const DEFAULT_HEADERS: &[(&str, &[&str])] = &[
    (
        "institution_name",
        &["institution_name", "institution", "name"],
    ),
    (
        "university_press",
        &["university_press", "up", "is_university_press"],
    ),
    ("url", &["url", "link"]),
];

/// Column mapping and dialect for authority CSV files.
///
/// # Examples
///
/// ```
/// use affilstat::authority::load::AuthorityCsvConfig;
///
/// let mut config = AuthorityCsvConfig::new();
/// config
///     .set_header_mapping("university_press", vec!["Press?".to_string()])
///     .set_delimiter(b';');
/// ```
#[derive(Debug, Clone)]
pub struct AuthorityCsvConfig {
    header_map: HashMap<String, Vec<String>>,
    delimiter: u8,
}

impl Default for AuthorityCsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityCsvConfig {
    #[must_use]
    pub fn new() -> Self {
        let header_map = DEFAULT_HEADERS
            .iter()
            .map(|(field, aliases)| {
                (
                    field.to_string(),
                    aliases.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self {
            header_map,
            delimiter: b',',
        }
    }

    /// Replaces the aliases accepted for `field`
    pub fn set_header_mapping(&mut self, field: &str, aliases: Vec<String>) -> &mut Self {
        self.header_map.insert(field.to_string(), aliases);
        self
    }

    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Case-insensitive header lookup
    fn get_field_for_header(&self, header: &str) -> Option<&str> {
        let header_lower = header.trim().to_lowercase();
        self.header_map
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a.to_lowercase() == header_lower))
            .map(|(field, _)| field.as_str())
    }
}

/// Column positions resolved from a header row.
#[derive(Debug, Default)]
struct Columns {
    institution_name: Option<usize>,
    university_press: Option<usize>,
    url: Option<usize>,
}

/// Reads authority entries from CSV text.
#[derive(Debug, Clone, Default)]
pub struct AuthorityCsvReader {
    config: AuthorityCsvConfig,
}

impl AuthorityCsvReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: AuthorityCsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses every data row into an [`AuthorityEntry`].
    ///
    /// Names are kept as written; [`AuthorityTable::from_entries`] normalizes
    /// them and checks for duplicates.
    ///
    /// [`AuthorityTable::from_entries`]: crate::AuthorityTable::from_entries
    ///
    /// # Errors
    ///
    /// - [`AffiliationError::MissingField`] when the name or flag column is absent
    /// - [`AffiliationError::InvalidFieldValue`] for an unrecognized flag token
    /// - [`AffiliationError::Csv`] for malformed CSV
    pub fn read(&self, input: &str) -> Result<Vec<AuthorityEntry>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .from_reader(input.as_bytes());

        let columns = self.resolve_columns(reader.headers()?);
        let name_column = columns
            .institution_name
            .ok_or_else(|| AffiliationError::MissingField("institution_name".to_string()))?;
        let flag_column = columns
            .university_press
            .ok_or_else(|| AffiliationError::MissingField("university_press".to_string()))?;

        let mut entries = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result?;
            // header is line 1
            let line = index + 2;
            entries.push(Self::parse_record(
                &record,
                name_column,
                flag_column,
                columns.url,
                line,
            )?);
        }
        Ok(entries)
    }

    fn resolve_columns(&self, headers: &StringRecord) -> Columns {
        let mut columns = Columns::default();
        for (position, header) in headers.iter().enumerate() {
            match self.config.get_field_for_header(header) {
                Some("institution_name") => columns.institution_name = Some(position),
                Some("university_press") => columns.university_press = Some(position),
                Some("url") => columns.url = Some(position),
                _ => {}
            }
        }
        columns
    }

    fn parse_record(
        record: &StringRecord,
        name_column: usize,
        flag_column: usize,
        url_column: Option<usize>,
        line: usize,
    ) -> Result<AuthorityEntry> {
        let institution_name = record.get(name_column).unwrap_or_default().to_string();

        let token = record.get(flag_column).unwrap_or_default();
        let university_press =
            parse_flag(token).ok_or_else(|| AffiliationError::InvalidFieldValue {
                field: "university_press".to_string(),
                message: format!("expected yes/no, found '{token}'"),
                line,
            })?;

        let url = url_column
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(AuthorityEntry {
            institution_name,
            university_press,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorityTable, DuplicatePolicy};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_authority_csv() {
        let input = "\
institution_name,university_press,url
Yale University Press,yes,https://yalebooks.yale.edu
MIT,No,
Oxford University Press,TRUE,https://global.oup.com";

        let entries = AuthorityCsvReader::new().read(input).unwrap();
        assert_eq!(
            entries,
            vec![
                AuthorityEntry::new(
                    "Yale University Press",
                    true,
                    Some("https://yalebooks.yale.edu")
                ),
                AuthorityEntry::new("MIT", false, None),
                AuthorityEntry::new("Oxford University Press", true, Some("https://global.oup.com")),
            ]
        );
    }

    #[test]
    fn test_header_aliases_and_order() {
        let input = "Link,UP,Institution\n,y,Harvard University Press";

        let entries = AuthorityCsvReader::new().read(input).unwrap();
        assert_eq!(entries[0].institution_name, "Harvard University Press");
        assert!(entries[0].university_press);
        assert_eq!(entries[0].url, None);
    }

    #[test]
    fn test_url_column_optional() {
        let input = "institution_name,university_press\nMIT,no";
        let entries = AuthorityCsvReader::new().read(input).unwrap();
        assert_eq!(entries, vec![AuthorityEntry::new("MIT", false, None)]);
    }

    #[test]
    fn test_custom_config() {
        let input = "Publisher;Press?\nYale University Press;yes";

        let mut config = AuthorityCsvConfig::new();
        config
            .set_header_mapping("institution_name", vec!["Publisher".to_string()])
            .set_header_mapping("university_press", vec!["Press?".to_string()])
            .set_delimiter(b';');

        let entries = AuthorityCsvReader::new()
            .with_config(config)
            .read(input)
            .unwrap();
        assert_eq!(entries[0].institution_name, "Yale University Press");
        assert!(entries[0].university_press);
    }

    #[test]
    fn test_missing_flag_column() {
        let input = "institution_name,url\nMIT,https://mit.edu";
        let result = AuthorityCsvReader::new().read(input);
        assert!(matches!(result, Err(AffiliationError::MissingField(f)) if f == "university_press"));
    }

    #[test]
    fn test_invalid_flag_token_reports_line() {
        let input = "institution_name,university_press\nMIT,no\nYale University Press,perhaps";
        match AuthorityCsvReader::new().read(input) {
            Err(AffiliationError::InvalidFieldValue { field, line, .. }) => {
                assert_eq!(field, "university_press");
                assert_eq!(line, 3);
            }
            other => panic!("expected invalid field value, got {other:?}"),
        }
    }

    #[test]
    fn test_loaded_duplicates_rejected_by_table() {
        let input = "institution_name,university_press\nMIT Press,yes\nMIT  Press,no";
        let entries = AuthorityCsvReader::new().read(input).unwrap();
        let result = AuthorityTable::from_entries(entries, DuplicatePolicy::Reject);
        assert!(matches!(
            result,
            Err(AffiliationError::DuplicateAuthorityEntry { duplicate_row: 2, .. })
        ));
    }
}
