//! Response construction.
//!
//! # Responsibilities
//! - Render the tracking envelope: `{"data": ..., "raw": ...}`, tab indented
//! - Embed the upstream bytes under `raw` verbatim, never re-escaped
//! - Plain-text error bodies and the method-gate responses
//!
//! # Design Decisions
//! - `raw` goes through `RawValue`, so the formatter writes the captured bytes
//!   as they arrived instead of re-encoding the parsed fields

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;

use crate::tracking::TrackingResult;

/// Methods the relay answers.
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

#[derive(Serialize)]
struct Envelope<'a> {
    data: &'a TrackingResult,
    raw: &'a RawValue,
}

/// Serialize a tracking result and its raw upstream bytes into the
/// caller-facing envelope, terminated by a newline.
pub fn render_envelope(result: &TrackingResult) -> Result<Vec<u8>, serde_json::Error> {
    let raw: &RawValue = serde_json::from_slice(result.raw_body())?;

    let mut out = Vec::with_capacity(result.raw_body().len() * 2);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    Envelope { data: result, raw }.serialize(&mut ser)?;
    out.push(b'\n');

    Ok(out)
}

/// 200 with the rendered envelope.
pub fn tracking_response(result: &TrackingResult) -> Response {
    match render_envelope(result) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            Body::from(body),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render tracking envelope");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Plain-text error body, newline terminated.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        format!("{}\n", message),
    )
        .into_response()
}

/// Empty acknowledgement for OPTIONS.
pub fn preflight() -> Response {
    (
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS))],
    )
        .into_response()
}

/// 405 advertising the allowed methods.
pub fn method_not_allowed() -> Response {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::decode;

    const PAYLOAD: &str = "{\"count\": 1, \"order_code\": \"A\\/1\",\n  \"orderInfo\": {\"country\": {\"cn_name\": \"\\u82f1\\u56fd\"}},\n  \"trackingList\": [{\"date\": \"08\\/06\\/2020 14:45:00\", \"location\": \" \", \"statu\": \"Flight has arrived\"}]}";

    #[test]
    fn test_envelope_shape() {
        let result = decode(PAYLOAD.as_bytes().to_vec()).unwrap();
        let body = render_envelope(&result).unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("{\n\t\"data\": {\n\t\t\"count\": 1,"));
        assert!(text.ends_with("}\n"));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["data"]["order_code"], "A/1");
        assert_eq!(value["data"]["orderInfo"]["country"], "英国");
        assert_eq!(value["data"]["orderInfo"]["sender_country"], "");
        assert_eq!(value["data"]["trackingList"][0]["date"], "2020-08-06T14:45:00Z");
        assert_eq!(value["data"]["trackingList"][0]["statu"], "Flight has arrived");
        assert_eq!(value["raw"]["count"], 1);
    }

    #[test]
    fn test_raw_is_embedded_verbatim() {
        let result = decode(PAYLOAD.as_bytes().to_vec()).unwrap();
        let text = String::from_utf8(render_envelope(&result).unwrap()).unwrap();

        assert!(text.contains(&format!("\"raw\": {}", PAYLOAD)));
    }

    #[test]
    fn test_method_not_allowed_headers() {
        let response = method_not_allowed();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], ALLOWED_METHODS);
    }

    #[test]
    fn test_preflight_headers() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
    }
}
