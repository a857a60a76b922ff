//! Normalized tracking types.
//!
//! These are immutable snapshots built once per upstream call. They serialize
//! with the upstream's own key names so the `data` half of the response
//! envelope reads like the upstream payload, minus the reductions applied by
//! the decoder (country objects collapsed to a name, dates parsed to UTC).

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use serde::Serialize;
use std::fmt;

/// Decoded upstream tracking response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingResult {
    /// Number of tracking events claimed by upstream. Advisory only.
    pub count: i64,

    #[serde(rename = "order_code")]
    pub order_code: String,

    #[serde(rename = "orderInfo")]
    pub order_info: OrderInfo,

    /// Upstream status code, opaque to the relay.
    #[serde(rename = "track_status")]
    pub status: i64,

    /// Upstream-declared length of `trackingList`. Advisory only.
    #[serde(rename = "tracking_len")]
    pub event_count: i64,

    /// Events in upstream array order.
    #[serde(rename = "trackingList")]
    pub events: Vec<TrackingEvent>,

    #[serde(skip)]
    pub(crate) raw_body: Bytes,
}

impl TrackingResult {
    /// The exact bytes upstream returned for this result.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }
}

/// Flat shipment summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderInfo {
    #[serde(rename = "ship_type_code")]
    pub shipping_code: String,

    #[serde(rename = "tracking_number")]
    pub tracking_number: String,

    /// Tracking number assigned by the last-mile carrier.
    #[serde(rename = "tracking_number_usps")]
    pub tracking_number_alt: String,

    #[serde(rename = "numbers")]
    pub quantity: i64,

    /// Kept as sent; upstream mixes numeric-looking strings and "".
    pub weight: String,

    #[serde(rename = "order_id")]
    pub order_id: String,

    #[serde(rename = "order_code")]
    pub order_code: String,

    #[serde(rename = "customer_order_code")]
    pub customer_order_code: String,

    #[serde(rename = "sender_country")]
    pub sender_country: Country,

    #[serde(rename = "country")]
    pub destination_country: Country,
}

/// Localized country name extracted from an upstream country object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Country(String);

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Country {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Country {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One milestone in the shipment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
    pub date: DateTime<Utc>,

    /// Free text. A single space is upstream's "unknown" marker and is kept.
    pub location: String,

    // upstream really spells it "statu"
    #[serde(rename = "statu")]
    pub status: String,
}
