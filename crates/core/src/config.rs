//! Page range configuration: `--range` flags and the ranges TOML file.
//!
//! ```toml
//! [ranges."report_2024.pdf"]
//! start = 3
//! end = 12
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::extract::PageRange;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid range '{0}': expected NAME=START:END")]
    InvalidRange(String),

    #[error("invalid page number '{0}'")]
    InvalidPage(String),

    #[error("failed to parse ranges file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Per-file page ranges loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RangesFile {
    #[serde(default)]
    pub ranges: BTreeMap<String, PageRange>,
}

impl RangesFile {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Parse a page number; an empty string leaves the bound open.
pub fn parse_page(value: &str) -> Result<Option<usize>, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidPage(value.to_string()))
}

/// Parse `NAME=START:END`, where either bound may be empty.
///
/// The name is split at the last `=` so file names containing `=` still
/// work.
pub fn parse_range_flag(flag: &str) -> Result<(String, PageRange), ConfigError> {
    let (name, bounds) = flag
        .rsplit_once('=')
        .ok_or_else(|| ConfigError::InvalidRange(flag.to_string()))?;
    let (start, end) = bounds
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidRange(flag.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidRange(flag.to_string()));
    }

    Ok((
        name.to_string(),
        PageRange::new(parse_page(start)?, parse_page(end)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_flag() {
        let (name, range) = parse_range_flag("a.pdf=3:7").unwrap();
        assert_eq!(name, "a.pdf");
        assert_eq!(range, PageRange::new(Some(3), Some(7)));
    }

    #[test]
    fn test_parse_range_flag_open_bounds() {
        let (_, range) = parse_range_flag("a.pdf=:7").unwrap();
        assert_eq!(range, PageRange::new(None, Some(7)));

        let (_, range) = parse_range_flag("a.pdf=2:").unwrap();
        assert_eq!(range, PageRange::new(Some(2), None));
    }

    #[test]
    fn test_parse_range_flag_name_with_equals() {
        let (name, _) = parse_range_flag("q=1.pdf=1:2").unwrap();
        assert_eq!(name, "q=1.pdf");
    }

    #[test]
    fn test_parse_range_flag_errors() {
        assert!(matches!(
            parse_range_flag("a.pdf"),
            Err(ConfigError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_range_flag("a.pdf=3"),
            Err(ConfigError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_range_flag("=1:2"),
            Err(ConfigError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_range_flag("a.pdf=x:2"),
            Err(ConfigError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_ranges_file() {
        let file = RangesFile::parse(
            r#"
[ranges."a.pdf"]
start = 3
end = 12

[ranges."b.pdf"]
end = 4
"#,
        )
        .unwrap();

        assert_eq!(file.ranges["a.pdf"], PageRange::new(Some(3), Some(12)));
        assert_eq!(file.ranges["b.pdf"], PageRange::new(None, Some(4)));
    }

    #[test]
    fn test_ranges_file_empty() {
        assert_eq!(RangesFile::parse("").unwrap(), RangesFile::default());
    }

    #[test]
    fn test_ranges_file_rejects_bad_types() {
        let err = RangesFile::parse("[ranges.\"a.pdf\"]\nstart = \"three\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
