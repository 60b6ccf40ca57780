//! HTTP response handling.

use crate::FetchError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// An HTTP response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Get the raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// The human-readable error carried by a JSON error body.
    ///
    /// Hosted backends answer failures with `{"error": ".."}` or
    /// `{"message": ".."}`; anything else yields `None`.
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        ["error", "message", "msg", "error_description"]
            .iter()
            .find_map(|field| value.get(field)?.as_str().map(str::to_string))
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self
                .error_message()
                .or_else(|| self.text().ok().filter(|t| !t.is_empty()))
                .unwrap_or_else(|| "Unknown error".to_string());
            Err(FetchError::HttpError {
                status: self.status,
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> Response {
        Response::new(status, HashMap::new(), body.to_vec())
    }

    #[test]
    fn test_response_status_classes() {
        assert!(make_response(201, b"").is_success());
        assert!(!make_response(300, b"").is_success());
        assert!(make_response(404, b"").is_client_error());
        assert!(make_response(503, b"").is_server_error());
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Session {
            url: String,
        }

        let resp = make_response(200, br#"{"url": "https://pay.test/c/1"}"#);
        let session: Session = resp.json().unwrap();
        assert_eq!(session.url, "https://pay.test/c/1");
    }

    #[test]
    fn test_response_json_invalid() {
        let resp = make_response(200, b"not json");
        let result: Result<serde_json::Value, _> = resp.json();
        assert!(matches!(result, Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let resp = Response::new(200, headers, Vec::new());

        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn test_error_message_fields() {
        assert_eq!(
            make_response(400, br#"{"error": "Items are required"}"#).error_message(),
            Some("Items are required".to_string())
        );
        assert_eq!(
            make_response(409, br#"{"message": "duplicate key", "code": "23505"}"#)
                .error_message(),
            Some("duplicate key".to_string())
        );
        assert_eq!(make_response(500, b"boom").error_message(), None);
    }

    #[test]
    fn test_error_for_status_uses_json_message() {
        let err = make_response(400, br#"{"error": "Missing STRIPE key"}"#)
            .error_for_status()
            .unwrap_err();

        match err {
            FetchError::HttpError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing STRIPE key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_plain_text_and_empty() {
        let err = make_response(502, b"Bad Gateway").error_for_status().unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("Bad Gateway"));

        let err = make_response(500, b"").error_for_status().unwrap_err();
        assert!(err.to_string().contains("Unknown error"));
    }

    #[test]
    fn test_error_for_status_success_passes_through() {
        assert!(make_response(204, b"").error_for_status().is_ok());
    }
}
