//! Configuration access port trait.

use crate::domain::error::AnalysisError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Raw lookup with surrounding whitespace removed and empty values
    /// treated as absent.
    fn get_non_empty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// `None` when the key is absent or blank. A present value that is not
    /// a number is `ConfigInvalid`, never a silent default.
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, AnalysisError> {
        match self.get_non_empty(section, key) {
            None => Ok(None),
            Some(raw) => parse_number(&raw)
                .map(Some)
                .ok_or_else(|| AnalysisError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("'{raw}' is not a number"),
                }),
        }
    }
}

/// Parses a config number. Accepts a trailing `%`, `_` digit separators and
/// `,` thousands separators in the integer part. Each `,` must be followed
/// by exactly three digits, so a decimal comma such as `4,5` is rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let body = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let cleaned: String = body.chars().filter(|&c| c != '_').collect();

    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (cleaned.as_str(), None),
    };
    if frac_part.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = int_part.split(',');
    let mut digits = groups.next().unwrap_or_default().to_string();
    if int_part.contains(',') {
        let unsigned = digits.trim_start_matches(['+', '-']);
        if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }

    let joined = match frac_part {
        Some(frac) => format!("{digits}.{frac}"),
        None => digits,
    };
    joined.parse::<f64>().ok().filter(|v| v.is_finite())
}
