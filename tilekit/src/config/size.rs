//! Human-readable size parsing (e.g., "256MB", "2GB").

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2GB', '256MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Parse a human-readable size string into bytes.
///
/// Bare numbers are bytes; `K`/`KB`, `M`/`MB` and `G`/`GB` suffixes are
/// binary multiples. Case and surrounding whitespace are ignored.
///
/// # Examples
///
/// ```
/// use tilekit::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("256MB").unwrap(), 256 * 1024 * 1024);
/// assert_eq!(parse_size("2 g").unwrap(), 2 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let error = || SizeParseError {
        input: trimmed.to_string(),
    };

    let upper = trimmed.to_ascii_uppercase();
    let (number, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|n| (n.trim(), *mult)))
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() {
        return Err(error());
    }
    let value: u64 = number.parse().map_err(|_| error())?;
    value.checked_mul(multiplier).ok_or_else(error)
}

/// Format a byte count with the largest suffix that divides it evenly.
///
/// ```
/// use tilekit::config::format_size;
///
/// assert_eq!(format_size(256 * 1024 * 1024), "256MB");
/// assert_eq!(format_size(1000), "1000");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("1k").unwrap(), KB);
        assert_eq!(parse_size("1KB").unwrap(), KB);
        assert_eq!(parse_size("500 mb").unwrap(), 500 * MB);
        assert_eq!(parse_size("  2GB ").unwrap(), 2 * GB);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("2TB").is_err());
        assert!(parse_size("-1GB").is_err());
        assert!(parse_size("1.5GB").is_err());
        assert!(parse_size("99999999999999999999GB").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        for s in ["1KB", "256MB", "2GB", "1000"] {
            assert_eq!(format_size(parse_size(s).unwrap()), s);
        }
    }
}
