use std::collections::{BTreeMap, HashMap};

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::error::AppError;

pub const ALLOW_HEADERS: &str = "Content-Type, X-User-Id, X-Auth-Token";
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Incoming request as seen by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default, with = "text_body")]
    pub body: Option<Bytes>,
    #[serde(default)]
    pub query_string_parameters: HashMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            http_method: method.into(),
            body: body.map(Bytes::from),
            query_string_parameters: HashMap::new(),
        }
    }

    /// Raw HTTP body; decoding is deferred to `json_body`.
    pub fn with_raw_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query_string_parameters = query;
        self
    }

    pub fn method(&self) -> &str {
        &self.http_method
    }

    /// Parses the body as JSON. A missing or blank body reads as `{}`;
    /// invalid UTF-8 is a malformed body.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let raw: &[u8] = match self.body.as_deref() {
            Some(b) if !b.iter().all(u8::is_ascii_whitespace) => b,
            _ => b"{}",
        };
        Ok(serde_json::from_slice(raw)?)
    }
}

/// Envelope bodies travel as JSON strings on the wire.
mod text_body {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Option<Bytes>, s: S) -> Result<S::Ok, S::Error> {
        match body {
            Some(b) => s.serialize_some(&String::from_utf8_lossy(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Bytes>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(Bytes::from))
    }
}

/// Keeps "present but null" apart from "absent": use with `#[serde(default)]`
/// on an `Option<Option<T>>` field.
pub(crate) fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Outgoing response: status, flat headers, raw body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ResponseEnvelope {
    pub fn json<T: Serialize>(status: StatusCode, payload: &T) -> Result<Self, AppError> {
        Ok(Self {
            status_code: status.as_u16(),
            headers: json_headers(),
            body: serde_json::to_string(payload).map_err(anyhow::Error::from)?,
            is_base64_encoded: false,
        })
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: json_headers(),
            body: serde_json::json!({ "error": message }).to_string(),
            is_base64_encoded: false,
        }
    }

    /// CORS preflight answer, independent of any business state.
    pub fn preflight(allow_methods: &str) -> Self {
        let headers = [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", allow_methods),
            ("Access-Control-Allow-Headers", ALLOW_HEADERS),
            ("Access-Control-Max-Age", PREFLIGHT_MAX_AGE),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            status_code: StatusCode::OK.as_u16(),
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Business errors become envelopes; faults are passed through untouched.
    pub fn from_result(result: Result<Self, AppError>) -> Result<Self, AppError> {
        match result {
            Err(e) => match e.client_status() {
                Some(status) => Ok(Self::error(status, &e.to_string())),
                None => Err(e),
            },
            ok => ok,
        }
    }
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
    ])
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = (status, self.body).into_response();
        let headers = res.headers_mut();
        // the body fallback sets text/plain; envelope headers take over
        headers.remove(axum::http::header::CONTENT_TYPE);
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    headers.insert(n, v);
                }
                _ => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_defaults_to_get() {
        let env: RequestEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(env.method(), "GET");
        assert!(env.body.is_none());
        assert!(env.query_string_parameters.is_empty());
    }

    #[test]
    fn blank_body_reads_as_empty_object() {
        let env = RequestEnvelope::new("POST", Some("  ".into()));
        let v: serde_json::Value = env.json_body().unwrap();
        assert_eq!(v, serde_json::json!({}));
    }

    #[test]
    fn invalid_utf8_body_is_a_fault() {
        let env = RequestEnvelope::new("POST", None)
            .with_raw_body(Bytes::from_static(&[0xff, 0xfe, b'{']));
        let err = env.json_body::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, AppError::MalformedBody(_)));
    }

    #[test]
    fn request_body_round_trips_as_text() {
        let env: RequestEnvelope =
            serde_json::from_str(r#"{"httpMethod":"POST","body":"{\"a\":1}"}"#).unwrap();
        let v: serde_json::Value = env.json_body().unwrap();
        assert_eq!(v["a"], 1);
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(wire["body"], r#"{"a":1}"#);
    }

    #[test]
    fn malformed_body_is_a_fault() {
        let env = RequestEnvelope::new("POST", Some("{not json".into()));
        let err = env.json_body::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, AppError::MalformedBody(_)));
        assert!(err.client_status().is_none());
    }

    #[test]
    fn preflight_has_cors_headers_and_empty_body() {
        let env = ResponseEnvelope::preflight("GET, POST, OPTIONS");
        assert_eq!(env.status_code, 200);
        assert!(env.body.is_empty());
        assert_eq!(env.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(env.headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
        assert_eq!(env.headers["Access-Control-Allow-Headers"], ALLOW_HEADERS);
        assert_eq!(env.headers["Access-Control-Max-Age"], "86400");
    }

    #[test]
    fn error_envelope_serializes_with_wire_names() {
        let env = ResponseEnvelope::error(StatusCode::CONFLICT, "User already exists");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["statusCode"], 409);
        assert_eq!(json["isBase64Encoded"], false);
        assert_eq!(json["headers"]["Content-Type"], "application/json");
        assert_eq!(json["body"], r#"{"error":"User already exists"}"#);
    }

    #[test]
    fn from_result_keeps_faults_as_errors() {
        let client = ResponseEnvelope::from_result(Err(AppError::NotFound("Plant not found")));
        assert_eq!(client.unwrap().status_code, 404);

        let fault = ResponseEnvelope::from_result(Err(AppError::from(anyhow::anyhow!("db down"))));
        assert!(fault.is_err());
    }

    #[test]
    fn into_response_applies_envelope_headers() {
        let res = ResponseEnvelope::error(StatusCode::BAD_REQUEST, "Invalid action").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
        assert_eq!(
            res.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
    }
}
