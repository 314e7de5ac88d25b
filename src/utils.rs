use crate::regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapses internal whitespace runs to a single space and trims both ends.
///
/// Every institution name goes through this before it is compared, counted
/// or joined, so "Yale  University\tPress" and "Yale University Press" are
/// the same key.
///
/// # Examples
///
/// ```
/// assert_eq!(affilstat::squish("  Yale \n University  Press "), "Yale University Press");
/// ```
pub fn squish(value: &str) -> String {
    WHITESPACE_RUN.replace_all(value.trim(), " ").into_owned()
}

/// Squishes an optional institution, mapping blank values to `None`.
pub(crate) fn squish_institution(value: Option<&str>) -> Option<String> {
    value.map(squish).filter(|s| !s.is_empty())
}

/// Parses a yes/no style flag from an authority list.
///
/// Accepts `yes`/`no`, `y`/`n`, `true`/`false` and `1`/`0`, ignoring case and
/// surrounding whitespace.
#[cfg_attr(not(feature = "csv"), allow(dead_code))]
pub(crate) fn parse_flag(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MIT", "MIT")]
    #[case("  MIT  ", "MIT")]
    #[case("Yale  University   Press", "Yale University Press")]
    #[case("Yale\tUniversity\nPress", "Yale University Press")]
    #[case("   ", "")]
    #[case("", "")]
    fn test_squish(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(squish(input), expected);
    }

    #[test]
    fn test_squish_institution() {
        assert_eq!(squish_institution(None), None);
        assert_eq!(squish_institution(Some(" \t ")), None);
        assert_eq!(
            squish_institution(Some(" Unknown   U ")),
            Some("Unknown U".to_string())
        );
    }

    #[rstest]
    #[case("yes", Some(true))]
    #[case("YES", Some(true))]
    #[case(" y ", Some(true))]
    #[case("true", Some(true))]
    #[case("1", Some(true))]
    #[case("no", Some(false))]
    #[case("No", Some(false))]
    #[case("false", Some(false))]
    #[case("0", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn test_parse_flag(#[case] token: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_flag(token), expected);
    }
}
