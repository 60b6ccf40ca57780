//! HTTP client utilities for the Fiesta storefront.
//!
//! Every outbound call the storefront makes (catalog reads, order writes,
//! hosted-payment session creation, identity lookups) goes through
//! [`FetchClient`]: a thin builder over `reqwest` with a base URL, default
//! headers, and JSON helpers.
//!
//! # Example
//!
//! ```rust,ignore
//! use fiesta_data::FetchClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Product {
//!     id: String,
//!     name: String,
//!     price: f64,
//! }
//!
//! let client = FetchClient::new()
//!     .with_base_url("https://backend.example.com")
//!     .with_default_header("apikey", "public-anon-key");
//!
//! let products: Vec<Product> = client
//!     .get("/rest/v1/products")
//!     .query("order", "name.asc")
//!     .send()
//!     .await?
//!     .error_for_status()?
//!     .json()?;
//! ```

mod error;
mod request;
mod response;

use std::collections::HashMap;
use std::time::Duration;

pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for making outbound requests.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Duration,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: None,
            default_headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client with a base URL that will be prepended to all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Post, url)
    }

    /// Create a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Patch, url)
    }

    /// Create a DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Delete, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) => {
                if url.starts_with("http://") || url.starts_with("https://") {
                    url
                } else {
                    format!("{}{}", base.trim_end_matches('/'), url)
                }
            }
            None => url,
        };

        let mut builder = RequestBuilder::new(method, full_url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            http: self.http.clone(),
            timeout: self.timeout,
            builder,
        }
    }
}

/// A request builder bound to a client.
#[derive(Debug)]
pub struct ClientRequestBuilder {
    http: reqwest::Client,
    timeout: Duration,
    builder: RequestBuilder,
}

impl ClientRequestBuilder {
    /// The request as built so far.
    pub fn request(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Send the request and read the full response.
    ///
    /// Non-2xx statuses are returned as a normal [`Response`]; use
    /// [`Response::error_for_status`] to turn them into errors.
    pub async fn send(self) -> Result<Response, FetchError> {
        let RequestBuilder {
            method,
            url,
            query,
            headers,
            body,
        } = self.builder;

        tracing::debug!(method = method.as_str(), %url, "sending request");

        let mut request = self
            .http
            .request(method.to_reqwest(), &url)
            .timeout(self.timeout);
        if !query.is_empty() {
            request = request.query(&query);
        }
        for (key, value) in &headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = method.as_str(), %url, error = %e, "request failed");
            FetchError::from(e)
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(method = method.as_str(), %url, status, "received response");
        Ok(Response::new(status, headers, body))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Method, Response};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_prepended() {
        let client = FetchClient::new().with_base_url("https://backend.test/");
        let req = client.get("/rest/v1/products");
        assert_eq!(req.request().url(), "https://backend.test/rest/v1/products");
    }

    #[test]
    fn test_absolute_url_ignores_base() {
        let client = FetchClient::new().with_base_url("https://backend.test");
        let req = client.post("https://pay.test/session");
        assert_eq!(req.request().url(), "https://pay.test/session");
    }

    #[test]
    fn test_default_headers_are_applied() {
        let client = FetchClient::new().with_default_header("apikey", "anon");
        let req = client.delete("https://backend.test/rest/v1/orders");

        assert_eq!(req.request().header_value("apikey"), Some("anon"));
        assert_eq!(req.request().method(), Method::Delete);
    }

    #[test]
    fn test_per_request_header_overrides_default() {
        let client = FetchClient::new().with_default_header("Prefer", "return=minimal");
        let req = client
            .post("https://backend.test/rest/v1/orders")
            .header("Prefer", "return=representation");

        assert_eq!(
            req.request().header_value("Prefer"),
            Some("return=representation")
        );
    }

    #[tokio::test]
    async fn test_send_to_closed_port_is_request_error() {
        let client = FetchClient::new().with_timeout(Duration::from_secs(2));
        let result = client.get("http://127.0.0.1:1/unreachable").send().await;

        assert!(matches!(
            result,
            Err(FetchError::RequestError(_)) | Err(FetchError::Timeout)
        ));
    }
}
