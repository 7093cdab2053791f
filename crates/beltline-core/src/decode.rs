//! Tolerant decoding of inbound vehicle-production messages.
//!
//! Producers on the line are inconsistent: payloads arrive padded with
//! whitespace, wrapped in quotes or log prefixes, with field names in any
//! case and numbers sent as strings. [`decode`] accepts all of that and
//! produces a strict [`VehicleEvent`], or a [`DecodeError`] carrying the
//! reason and the raw payload. It never panics on input.
//!
//! # Recognized fields
//!
//! | field          | required | notes                                          |
//! |----------------|----------|------------------------------------------------|
//! | `bodyNo`       | yes      | JSON number or numeric string                  |
//! | `katashiki`    | no       | trimmed                                        |
//! | `colorExtCode` | yes      | trimmed, inner whitespace removed, upper-cased |
//! | `vinNo`        | no       | trimmed                                        |
//! | `carFamily`    | yes      | trimmed                                        |
//! | `loDate`       | no       | trimmed                                        |
//!
//! Unknown fields are ignored.

use serde_json::{Map, Value};

pub const BODY_NO: &str = "bodyNo";
pub const KATASHIKI: &str = "katashiki";
pub const COLOR_EXT_CODE: &str = "colorExtCode";
pub const VIN_NO: &str = "vinNo";
pub const CAR_FAMILY: &str = "carFamily";
pub const LO_DATE: &str = "loDate";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A validated vehicle-production event.
///
/// Only constructed by [`decode`] (or directly in tests); optional fields
/// that were absent are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct VehicleEvent {
    pub body_no: i32,
    pub katashiki: String,
    pub color_ext_code: String,
    pub vin_no: String,
    pub car_family: String,
    pub lo_date: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("empty payload")]
    EmptyPayload,
    #[error("{0}")]
    Json(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("{0} missing")]
    MissingField(&'static str),
    #[error("bodyNo invalid: {0}")]
    InvalidBodyNo(String),
    #[error("{0} is empty")]
    EmptyField(&'static str),
}

/// A rejected payload: the reason plus the raw text, for logging by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} | raw={raw}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode raw message bytes. Invalid UTF-8 sequences are replaced, not rejected.
pub fn decode(raw: impl AsRef<[u8]>) -> Result<VehicleEvent, DecodeError> {
    decode_str(&String::from_utf8_lossy(raw.as_ref()))
}

/// Decode a message that is already text.
pub fn decode_str(raw: &str) -> Result<VehicleEvent, DecodeError> {
    decode_inner(raw).map_err(|kind| DecodeError {
        kind,
        raw: raw.to_string(),
    })
}

fn decode_inner(raw: &str) -> Result<VehicleEvent, DecodeErrorKind> {
    if raw.trim().is_empty() {
        return Err(DecodeErrorKind::EmptyPayload);
    }

    let body = isolate_object(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| DecodeErrorKind::Json(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(DecodeErrorKind::NotAnObject);
    };

    let body_no = parse_body_no(lookup(&fields, BODY_NO))?;

    let color_ext_code: String = text(&fields, COLOR_EXT_CODE)
        .ok_or(DecodeErrorKind::MissingField(COLOR_EXT_CODE))?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if color_ext_code.is_empty() {
        return Err(DecodeErrorKind::EmptyField(COLOR_EXT_CODE));
    }

    let car_family = text(&fields, CAR_FAMILY).ok_or(DecodeErrorKind::MissingField(CAR_FAMILY))?;
    if car_family.is_empty() {
        return Err(DecodeErrorKind::EmptyField(CAR_FAMILY));
    }

    Ok(VehicleEvent {
        body_no,
        katashiki: text(&fields, KATASHIKI).unwrap_or_default(),
        color_ext_code,
        vin_no: text(&fields, VIN_NO).unwrap_or_default(),
        car_family,
        lo_date: text(&fields, LO_DATE).unwrap_or_default(),
    })
}

/// Trim, drop one pair of surrounding quotes, and cut everything outside the
/// outermost braces. Payloads without braces are returned for a direct parse.
fn isolate_object(raw: &str) -> &str {
    let mut s = raw.trim();
    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            s = s[1..s.len() - 1].trim();
            break;
        }
    }
    if let (Some(first), Some(last)) = (s.find('{'), s.rfind('}')) {
        if last > first {
            s = &s[first..=last];
        }
    }
    s
}

/// Case-insensitive field lookup. The first matching key wins.
fn lookup<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields
        .iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Read a string-typed field. Non-string scalars are stringified; `null`
/// counts as absent.
fn text(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match lookup(fields, name)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}

fn parse_body_no(value: Option<&Value>) -> Result<i32, DecodeErrorKind> {
    match value {
        None => Err(DecodeErrorKind::MissingField(BODY_NO)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| DecodeErrorKind::InvalidBodyNo(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| DecodeErrorKind::InvalidBodyNo(s.clone())),
        Some(other) => Err(DecodeErrorKind::InvalidBodyNo(other.to_string())),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
