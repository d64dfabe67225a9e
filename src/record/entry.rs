//! Immutable capture of one request/response exchange

use serde::{Deserialize, Serialize};

use crate::matcher::HttpRequest;

/// HTTP response as seen by the interception layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers in wire order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

/// One recorded request/response exchange.
///
/// Immutable once captured from a real response; identity is structural.
/// The serde schema matches the persisted session format: camelCase field
/// names, bodies base64-encoded so arbitrary bytes round-trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntry {
    /// Request method
    pub method: String,
    /// Request URI
    pub uri: String,
    /// Request headers in wire order
    pub request_headers: Vec<(String, String)>,
    /// Request body bytes
    #[serde(with = "base64_bytes")]
    pub request_body: Vec<u8>,
    /// Response status code
    pub status_code: u16,
    /// Response headers in wire order
    pub response_headers: Vec<(String, String)>,
    /// Response body bytes
    #[serde(with = "base64_bytes")]
    pub response_body: Vec<u8>,
}

impl RecordEntry {
    /// Capture an exchange from a real request/response pair
    #[must_use]
    pub fn capture(request: &HttpRequest, response: &HttpResponse) -> Self {
        Self {
            method: request.method.clone(),
            uri: request.uri.clone(),
            request_headers: request.headers.clone(),
            request_body: request.body.clone(),
            status_code: response.status,
            response_headers: response.headers.clone(),
            response_body: response.body.clone(),
        }
    }

    /// The request half of the exchange, for key recomputation
    #[must_use]
    pub fn request(&self) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.request_headers.clone(),
            body: self.request_body.clone(),
        }
    }

    /// Synthesize the captured response
    #[must_use]
    pub fn response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status_code,
            headers: self.response_headers.clone(),
            body: self.response_body.clone(),
        }
    }
}

mod base64_bytes {
    //! Base64 (de)serialization for body bytes

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
