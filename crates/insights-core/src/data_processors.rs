//! Cell-level parsing of the sales CSV files.
//!
//! Every parser returns `None` for a missing-value token or a cell it cannot
//! read; callers decide whether absence drops a row or fails a load.

use chrono::NaiveDate;
use tracing::debug;

// ── Missing values ────────────────────────────────────────────────────────────

/// Cell contents that stand for "no value" in the sales exports.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

/// Returns `true` when a raw cell should be treated as absent.
///
/// Only an exact token match counts; a cell of spaces is a (blank) value.
pub fn is_missing_value(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses the calendar dates found in the `date` column.
pub struct DateParser;

impl DateParser {
    const DATE_FORMATS: &'static [&'static str] = &["%Y-%m-%d", "%Y/%m/%d"];

    const DATETIME_FORMATS: &'static [&'static str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    /// Parse a date cell. Time of day, when present, is discarded.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if is_missing_value(s) {
            return None;
        }

        for fmt in Self::DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(date);
            }
        }
        for fmt in Self::DATETIME_FORMATS {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }

        debug!("DateParser: could not parse date \"{}\"", s);
        None
    }
}

// ── NumberParser ──────────────────────────────────────────────────────────────

/// Parses the numeric sales columns.
pub struct NumberParser;

impl NumberParser {
    /// Parse a unit count: an integer, or a float with no fractional part
    /// (exports that passed through a float column write `10.0`).
    ///
    /// Fractional counts and values outside the `i64` range are absent; they
    /// are never rounded or clamped.
    pub fn parse_units(raw: &str) -> Option<i64> {
        let s = raw.trim();
        if is_missing_value(s) {
            return None;
        }
        if let Ok(n) = s.parse::<i64>() {
            return Some(n);
        }

        let f = Self::parse_amount(s)?;
        // `i64::MAX as f64` rounds up to 2^63, which does not fit.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return Some(f as i64);
        }

        debug!("NumberParser: \"{}\" is not a whole unit count", s);
        None
    }

    /// Parse a finite monetary amount.
    pub fn parse_amount(raw: &str) -> Option<f64> {
        let s = raw.trim();
        if is_missing_value(s) {
            return None;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                debug!("NumberParser: \"{}\" is not a finite number", s);
                None
            }
        }
    }
}

// ── FlagParser ────────────────────────────────────────────────────────────────

/// Parses the 0/1 `promotion_flag` indicator.
pub struct FlagParser;

impl FlagParser {
    pub fn parse(raw: &str) -> Option<bool> {
        let s = raw.trim();
        if is_missing_value(s) {
            return None;
        }
        match s.to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Some(true),
            "0" | "0.0" | "false" => Some(false),
            other => {
                debug!("FlagParser: unrecognised promotion flag \"{}\"", other);
                None
            }
        }
    }
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// Keep a text cell verbatim unless it is a missing-value token.
pub fn parse_text(raw: &str) -> Option<String> {
    if is_missing_value(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
