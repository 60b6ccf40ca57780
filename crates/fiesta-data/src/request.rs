//! HTTP request builder.

use crate::FetchError;
use serde::Serialize;
use std::collections::HashMap;

/// HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A transport-independent description of an HTTP request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request URL, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Look up a header by exact name.
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// The raw body, if any.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter. Values are encoded when the request is sent.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        let json = serde_json::to_vec(value)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json);
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_sets_body_and_content_type() {
        #[derive(Serialize)]
        struct Body {
            total_amount: f64,
        }

        let req = RequestBuilder::new(Method::Post, "https://api.test/rest/v1/orders")
            .json(&Body { total_amount: 25.0 })
            .unwrap();

        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
        assert_eq!(req.body_bytes(), Some(br#"{"total_amount":25.0}"#.as_slice()));
    }

    #[test]
    fn test_bearer_auth() {
        let req = RequestBuilder::new(Method::Get, "https://api.test").bearer_auth("tok");
        assert_eq!(req.header_value("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_query_keeps_order() {
        let req = RequestBuilder::new(Method::Get, "https://api.test/rest/v1/orders")
            .query("select", "*")
            .query("order", "created_at.desc");

        assert_eq!(
            req.query_pairs(),
            &[
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_method_as_str() {
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
