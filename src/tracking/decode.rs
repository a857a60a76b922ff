//! Upstream response decoding.
//!
//! # Responsibilities
//! - Parse the upstream JSON dialect into [`TrackingResult`]
//! - Collapse country objects to their localized name
//! - Parse event dates from `MM/DD/YYYY hh:mm:ss` (UTC)
//! - Keep the exact upstream bytes next to the parsed value
//!
//! # Design Decisions
//! - Two phases: bytes → generic `serde_json::Value`, then one decode step
//!   per entity that pulls out the modeled keys and applies its own rules
//! - Missing keys and `null` decode to zero values; unknown keys are ignored
//! - Wire keys are read only here; `types.rs` reuses them when serializing

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use hyper::body::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tracking::types::{Country, OrderInfo, TrackingEvent, TrackingResult};

/// chrono format string for event dates.
pub const EVENT_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Human-readable layout used in error messages and for the shape check.
pub const EVENT_DATE_LAYOUT: &str = "MM/DD/YYYY hh:mm:ss";

/// Error decoding an upstream payload. Terminal for the current request.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

impl DecodeError {
    pub fn is_structural(&self) -> bool {
        matches!(self, DecodeError::Structural(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, DecodeError::Format(_))
    }
}

/// The payload is not JSON, or a modeled value has the wrong JSON type.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("invalid upstream JSON: {0}")]
    Json(serde_json::Error),

    #[error("unexpected upstream value at {path}: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A value had the right JSON type but failed domain parsing.
#[derive(Debug, Error)]
#[error("cannot parse {field} {value:?}: expected format {expected}")]
pub struct FormatError {
    pub field: String,
    pub value: String,
    pub expected: &'static str,
}

/// Decode one upstream response body.
///
/// The returned result keeps `raw` itself as its raw body; nothing is
/// re-encoded. The body must hold exactly one JSON value: anything other
/// than whitespace after it is a [`StructuralError`].
pub fn decode(raw: impl Into<Bytes>) -> Result<TrackingResult, DecodeError> {
    let raw = raw.into();
    let root: Value = serde_json::from_slice(&raw).map_err(StructuralError::Json)?;
    let mut fields = Fields::object(root, "$".to_string())?;

    let count = fields.int("count")?;
    let order_code = fields.string("order_code")?;
    let order_info = match fields.take("orderInfo") {
        Some(value) => decode_order_info(value, fields.path_of("orderInfo"))?,
        None => OrderInfo::default(),
    };
    let status = fields.int("track_status")?;
    let event_count = fields.int("tracking_len")?;
    let events = match fields.take("trackingList") {
        Some(value) => decode_events(value, fields.path_of("trackingList"))?,
        None => Vec::new(),
    };

    Ok(TrackingResult {
        count,
        order_code,
        order_info,
        status,
        event_count,
        events,
        raw_body: raw,
    })
}

fn decode_order_info(value: Value, path: String) -> Result<OrderInfo, DecodeError> {
    let mut fields = Fields::object(value, path)?;

    let sender_country = decode_country(fields.take("sender_country"), fields.path_of("sender_country"))?;
    let destination_country = decode_country(fields.take("country"), fields.path_of("country"))?;

    Ok(OrderInfo {
        shipping_code: fields.string("ship_type_code")?,
        tracking_number: fields.string("tracking_number")?,
        tracking_number_alt: fields.string("tracking_number_usps")?,
        quantity: fields.int("numbers")?,
        weight: fields.string("weight")?,
        order_id: fields.string("order_id")?,
        order_code: fields.string("order_code")?,
        customer_order_code: fields.string("customer_order_code")?,
        sender_country,
        destination_country,
    })
}

/// Reduce an upstream country object to its `cn_name`.
///
/// An absent or null object, or an object without `cn_name`, yields an empty
/// country. Anything that is not an object is a structural error.
pub fn decode_country(value: Option<Value>, path: String) -> Result<Country, DecodeError> {
    let Some(value) = value else {
        return Ok(Country::default());
    };
    let mut fields = Fields::object(value, path)?;
    Ok(Country::from(fields.string("cn_name")?))
}

fn decode_events(value: Value, path: String) -> Result<Vec<TrackingEvent>, DecodeError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(StructuralError::Shape {
                path,
                expected: "array",
                found: kind(&other),
            }
            .into())
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| decode_event(item, format!("{}[{}]", path, i)))
        .collect()
}

/// Decode a single `trackingList` element.
pub fn decode_event(value: Value, path: String) -> Result<TrackingEvent, DecodeError> {
    let mut fields = Fields::object(value, path)?;

    let raw_date = fields.string("date")?;
    let location = fields.string("location")?;
    let status = fields.string("statu")?;

    let date = parse_event_date(&raw_date).ok_or_else(|| FormatError {
        field: fields.path_of("date"),
        value: raw_date.clone(),
        expected: EVENT_DATE_LAYOUT,
    })?;

    Ok(TrackingEvent {
        date,
        location,
        status,
    })
}

/// Parse an upstream event timestamp, interpreted as UTC.
///
/// Every field must be zero padded; `8/6/2020 14:45:00` is rejected.
/// A seconds field of `60` is out of range.
pub fn parse_event_date(s: &str) -> Option<DateTime<Utc>> {
    let shape_ok = s.len() == EVENT_DATE_LAYOUT.len()
        && s.bytes().zip(EVENT_DATE_LAYOUT.bytes()).all(|(c, l)| match l {
            b'/' | b' ' | b':' => c == l,
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }

    NaiveDateTime::parse_from_str(s, EVENT_DATE_FORMAT)
        .ok()
        // chrono reads second 60 as a leap second
        .filter(|naive| naive.nanosecond() < 1_000_000_000)
        .map(|naive| naive.and_utc())
}

/// Modeled keys of one JSON object, consumed as they are decoded.
struct Fields {
    map: Map<String, Value>,
    path: String,
}

impl Fields {
    fn object(value: Value, path: String) -> Result<Self, StructuralError> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(StructuralError::Shape {
                path,
                expected: "object",
                found: kind(&other),
            }),
        }
    }

    fn path_of(&self, key: &str) -> String {
        format!("{}.{}", self.path, key)
    }

    /// Remove `key`, treating `null` like absence.
    fn take(&mut self, key: &str) -> Option<Value> {
        match self.map.remove(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, key: &str) -> Result<String, StructuralError> {
        match self.take(key) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(self.mismatch(key, "string", &other)),
        }
    }

    fn int(&mut self, key: &str) -> Result<i64, StructuralError> {
        match self.take(key) {
            None => Ok(0),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(v),
                None => Err(self.mismatch(key, "integer", &Value::Number(n))),
            },
            Some(other) => Err(self.mismatch(key, "integer", &other)),
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &Value) -> StructuralError {
        StructuralError::Shape {
            path: self.path_of(key),
            expected,
            found: kind(found),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
