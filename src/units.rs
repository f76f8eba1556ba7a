//! Size-unit handling for number literals.
//!
//! Numbers may carry a unit suffix (`100GiB`, `500MB`, `2T`); parsing
//! resolves them to a byte count. The multiply runs through `Decimal` so
//! `1.5GiB` comes out exact rather than drifting through binary floats.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

// IEC units (1024-based)
pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;
pub const PIB: u64 = 1024 * TIB;

// SI units (1000-based)
pub const KB: u64 = 1000;
pub const MB: u64 = 1000 * KB;
pub const GB: u64 = 1000 * MB;
pub const TB: u64 = 1000 * GB;
pub const PB: u64 = 1000 * TB;

/// Errors from number/unit parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// Empty input string
    Empty,
    /// The numeric part does not parse as a number
    InvalidNumber(String),
    /// The numeric value does not fit the supported range
    OutOfRange(String),
    /// The suffix is not a known unit
    UnknownUnit(String),
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::Empty => write!(f, "empty number string"),
            UnitError::InvalidNumber(s) => write!(f, "invalid number: {}", s),
            UnitError::OutOfRange(s) => write!(f, "number out of range: {}", s),
            UnitError::UnknownUnit(s) => write!(f, "unknown unit: {}", s),
        }
    }
}

impl std::error::Error for UnitError {}

/// Byte multiplier for a unit suffix, case-insensitive.
///
/// Bare `K`/`M`/`G`/`T`/`P` are treated as their SI equivalents.
fn multiplier(unit: &str) -> Option<u64> {
    match unit.to_uppercase().as_str() {
        "B" => Some(1),
        "KIB" => Some(KIB),
        "MIB" => Some(MIB),
        "GIB" => Some(GIB),
        "TIB" => Some(TIB),
        "PIB" => Some(PIB),
        "KB" | "K" => Some(KB),
        "MB" | "M" => Some(MB),
        "GB" | "G" => Some(GB),
        "TB" | "T" => Some(TB),
        "PB" | "P" => Some(PB),
        _ => None,
    }
}

/// Parse a number string with an optional unit suffix.
///
/// Returns the value in bytes (for size units) and the unit string as
/// written. Without a suffix the value is returned unmodified.
///
/// ```
/// use disksel::units::parse_number_with_unit;
///
/// assert_eq!(parse_number_with_unit("100GiB").unwrap().0, 107374182400.0);
/// assert_eq!(parse_number_with_unit("500MB").unwrap().0, 500000000.0);
/// assert_eq!(parse_number_with_unit("42").unwrap(), (42.0, String::new()));
/// assert!(parse_number_with_unit("100XYZ").is_err());
/// ```
pub fn parse_number_with_unit(s: &str) -> Result<(f64, String), UnitError> {
    if s.is_empty() {
        return Err(UnitError::Empty);
    }

    // Split into numeric part and unit part
    let mut num_end = 0;
    for (i, ch) in s.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' {
            num_end = i + ch.len_utf8();
        } else {
            break;
        }
    }

    if num_end == 0 {
        return Err(UnitError::InvalidNumber(s.to_string()));
    }

    let num_part = &s[..num_end];
    let unit_part = s[num_end..].trim();

    // Pad bare leading/trailing dots (".5", "5.") so the decimal parser
    // accepts everything the lexer does.
    let mut padded = num_part.to_string();
    if padded.chars().any(|c| c.is_ascii_digit()) {
        if padded.ends_with('.') {
            padded.push('0');
        }
        if let Some(dot) = padded.find('.') {
            if padded[..dot].chars().all(|c| c == '-' || c == '+') {
                padded.insert(dot, '0');
            }
        }
    }

    let value =
        Decimal::from_str(&padded).map_err(|_| UnitError::InvalidNumber(num_part.to_string()))?;

    if unit_part.is_empty() {
        let value = value
            .to_f64()
            .ok_or_else(|| UnitError::OutOfRange(s.to_string()))?;
        return Ok((value, String::new()));
    }

    let mult = multiplier(unit_part).ok_or_else(|| UnitError::UnknownUnit(unit_part.to_string()))?;
    let mult = Decimal::from_u64(mult).ok_or_else(|| UnitError::OutOfRange(s.to_string()))?;

    let bytes = value
        .checked_mul(mult)
        .and_then(|d| d.to_f64())
        .ok_or_else(|| UnitError::OutOfRange(s.to_string()))?;

    Ok((bytes, unit_part.to_string()))
}

/// Format a byte count for human display: largest applicable IEC unit,
/// two decimal places. Not an inverse of [`parse_number_with_unit`] and
/// never used by evaluation itself.
pub fn format_bytes(bytes: f64) -> String {
    if bytes >= PIB as f64 {
        return format!("{:.2} PiB", bytes / PIB as f64);
    }
    if bytes >= TIB as f64 {
        return format!("{:.2} TiB", bytes / TIB as f64);
    }
    if bytes >= GIB as f64 {
        return format!("{:.2} GiB", bytes / GIB as f64);
    }
    if bytes >= MIB as f64 {
        return format!("{:.2} MiB", bytes / MIB as f64);
    }
    if bytes >= KIB as f64 {
        return format!("{:.2} KiB", bytes / KIB as f64);
    }
    format!("{:.0} B", bytes)
}

#[test]
fn test_iec_and_si_multipliers() {
    assert_eq!(parse_number_with_unit("1KiB").unwrap(), (1024.0, "KiB".to_string()));
    assert_eq!(parse_number_with_unit("1kb").unwrap(), (1000.0, "kb".to_string()));
    assert_eq!(parse_number_with_unit("1G").unwrap().0, 1_000_000_000.0);
    assert_eq!(parse_number_with_unit("1.5GiB").unwrap().0, 1_610_612_736.0);
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(512.0), "512 B");
    assert_eq!(format_bytes(1024.0), "1.00 KiB");
    assert_eq!(format_bytes(1_610_612_736.0), "1.50 GiB");
}
