//! Block height field extraction for JSON responses.

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a source encodes the block height inside its JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightEncoding {
    /// A JSON number, e.g. `{"height": 19000000}`.
    Number,
    /// A string with a base prefix, e.g. `{"result": "0x121eac0"}`.
    HexString,
    /// A base-10 string, e.g. `{"height": "19000000"}`.
    DecimalString,
}

impl std::fmt::Display for HeightEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeightEncoding::Number => write!(f, "number"),
            HeightEncoding::HexString => write!(f, "hex string"),
            HeightEncoding::DecimalString => write!(f, "decimal string"),
        }
    }
}

/// Looks up `field` in `json` and decodes it. A field starting with `/` is a
/// JSON pointer, anything else a top-level key.
pub fn extract_height(json: &Value, field: &str, encoding: HeightEncoding) -> Result<i64, SourceError> {
    if !json.is_object() {
        return Err(SourceError::NotAnObject);
    }

    let value = if field.starts_with('/') {
        json.pointer(field)
    } else {
        json.get(field)
    }
    .ok_or_else(|| SourceError::MissingField(field.to_string()))?;

    let wrong_type = || SourceError::WrongType {
        field: field.to_string(),
        expected: match encoding {
            HeightEncoding::Number => "number",
            HeightEncoding::HexString | HeightEncoding::DecimalString => "string",
        },
    };

    match encoding {
        HeightEncoding::Number => number_height(value).ok_or_else(wrong_type),
        HeightEncoding::HexString => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            parse_prefixed_int(text)
        }
        HeightEncoding::DecimalString => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            text.trim()
                .parse::<i64>()
                .map_err(|_| SourceError::InvalidNumber { value: text.to_string() })
        }
    }
}

fn number_height(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    // Floats are truncated toward zero.
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f as i64)
}

/// Parses an integer whose base is given by its prefix: `0x` hex, `0o` or a
/// bare leading `0` octal, `0b` binary, plain digits decimal. A leading sign
/// is allowed, and `_` may separate digits or follow a base prefix.
pub fn parse_prefixed_int(text: &str) -> Result<i64, SourceError> {
    let invalid = || SourceError::InvalidNumber { value: text.to_string() };

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits, prefixed) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (16, &unsigned[2..], true),
        Some("0o") | Some("0O") => (8, &unsigned[2..], true),
        Some("0b") | Some("0B") => (2, &unsigned[2..], true),
        _ if unsigned.len() > 1 && unsigned.starts_with('0') => (8, &unsigned[1..], true),
        _ => (10, unsigned, false),
    };

    if !separators_ok(digits, prefixed) {
        return Err(invalid());
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(invalid());
    }

    let magnitude = u64::from_str_radix(&digits, radix).map_err(|_| invalid())?;
    if negative {
        0i64.checked_sub_unsigned(magnitude).ok_or_else(invalid)
    } else {
        i64::try_from(magnitude).map_err(|_| invalid())
    }
}

/// An `_` must follow a digit or the base prefix, and cannot end the number.
fn separators_ok(digits: &str, prefixed: bool) -> bool {
    let mut may_separate = prefixed;
    let mut ends_with_separator = false;
    for c in digits.chars() {
        if c == '_' {
            if !may_separate {
                return false;
            }
            may_separate = false;
            ends_with_separator = true;
        } else {
            may_separate = true;
            ends_with_separator = false;
        }
    }
    !ends_with_separator
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_prefixed_int() {
        assert_eq!(parse_prefixed_int("0x121eac0").unwrap(), 19_000_000);
        assert_eq!(parse_prefixed_int("0X10").unwrap(), 16);
        assert_eq!(parse_prefixed_int("0o17").unwrap(), 15);
        assert_eq!(parse_prefixed_int("0b101").unwrap(), 5);
        assert_eq!(parse_prefixed_int("12345").unwrap(), 12345);
        assert_eq!(parse_prefixed_int("-0x10").unwrap(), -16);
        assert_eq!(parse_prefixed_int("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_leading_zero_octal_and_separators() {
        assert_eq!(parse_prefixed_int("017").unwrap(), 15);
        assert_eq!(parse_prefixed_int("00").unwrap(), 0);
        assert_eq!(parse_prefixed_int("0_17").unwrap(), 15);
        assert_eq!(parse_prefixed_int("0x_10").unwrap(), 16);
        assert_eq!(parse_prefixed_int("0x1_0").unwrap(), 16);
        assert_eq!(parse_prefixed_int("1_000").unwrap(), 1000);

        assert!(parse_prefixed_int("08").is_err());
        assert!(parse_prefixed_int("0x_").is_err());
        assert!(parse_prefixed_int("_10").is_err());
        assert!(parse_prefixed_int("1__0").is_err());
        assert!(parse_prefixed_int("10_").is_err());
    }

    #[test]
    fn test_parse_prefixed_int_rejects_garbage() {
        assert!(parse_prefixed_int("").is_err());
        assert!(parse_prefixed_int("0x").is_err());
        assert!(parse_prefixed_int("0xZZ").is_err());
        assert!(parse_prefixed_int("0x-1").is_err());
        assert!(parse_prefixed_int("Max rate limit reached").is_err());
        assert!(parse_prefixed_int("0xffffffffffffffff").is_err());
    }

    #[test]
    fn test_extract_number_field() {
        let body = json!({"name": "ETH.main", "height": 19000000});
        assert_eq!(extract_height(&body, "height", HeightEncoding::Number).unwrap(), 19_000_000);

        let body = json!({"status": true, "data": 19000001.0});
        assert_eq!(extract_height(&body, "data", HeightEncoding::Number).unwrap(), 19_000_001);
    }

    #[test]
    fn test_extract_hex_field() {
        let body = json!({"jsonrpc": "2.0", "id": 83, "result": "0x121eac0"});
        assert_eq!(extract_height(&body, "result", HeightEncoding::HexString).unwrap(), 19_000_000);
    }

    #[test]
    fn test_extract_decimal_string_with_pointer() {
        let body = json!({"data": {"height": "19000002"}});
        assert_eq!(
            extract_height(&body, "/data/height", HeightEncoding::DecimalString).unwrap(),
            19_000_002
        );
    }

    #[test]
    fn test_extract_errors() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"});

        assert!(matches!(
            extract_height(&body, "height", HeightEncoding::Number),
            Err(SourceError::MissingField(_))
        ));
        assert!(matches!(
            extract_height(&body, "result", HeightEncoding::Number),
            Err(SourceError::WrongType { expected: "number", .. })
        ));
        assert!(matches!(
            extract_height(&body, "result", HeightEncoding::HexString),
            Err(SourceError::InvalidNumber { .. })
        ));
        assert!(matches!(
            extract_height(&json!([1, 2, 3]), "result", HeightEncoding::Number),
            Err(SourceError::NotAnObject)
        ));
    }
}
