//! Outbound HTTP access to one downstream microservice.
//!
//! A [`ServiceClient`] owns a base URL and a pooled `reqwest::Client`. Every
//! call issues exactly one request and classifies what came back, so the tool
//! layer only has to decide which sentence to write.

use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt;

use crate::chatgate::http_client_pool::{get_or_create_client, DEFAULT_TIMEOUT_SECS};

/// Why a downstream call did not produce a usable body.
#[derive(Debug)]
pub enum ServiceError {
    /// Connection refused, DNS failure, timeout, ...
    Transport(String),
    /// The service answered with a non-2xx status.
    Status { status: u16, url: String },
    /// The body was not the JSON we expected.
    Body(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Transport(msg) => write!(f, "{}", msg),
            ServiceError::Status { status, url } => {
                write!(f, "{} returned HTTP status {}", url, status)
            }
            ServiceError::Body(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

impl Error for ServiceError {}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Result of a single-resource fetch, where 404 is an answer rather than a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(JsonValue),
    NotFound,
}

/// Client bound to one microservice base URL.
#[derive(Clone)]
pub struct ServiceClient {
    base_url: String,
    http: reqwest::Client,
}

impl ServiceClient {
    /// Build a client for `base_url` with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Build a client for `base_url` whose requests give up after `timeout_secs`.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = get_or_create_client(&base_url, timeout_secs);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `path` onto the base URL. An empty path targets the base itself.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the 2xx body as JSON.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<JsonValue, ServiceError> {
        let url = self.url(path);
        let response = self.http.get(&url).query(query).send().await?;
        Self::json_body(url, response).await
    }

    /// GET a single resource; a 404 becomes [`Lookup::NotFound`].
    pub async fn get_resource(&self, path: &str) -> Result<Lookup, ServiceError> {
        let url = self.url(path);
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            log::debug!("GET {} -> 404", url);
            return Ok(Lookup::NotFound);
        }
        Self::json_body(url, response).await.map(Lookup::Found)
    }

    /// POST a JSON payload and parse the 2xx body as JSON.
    pub async fn post_json(
        &self,
        path: &str,
        payload: &JsonValue,
    ) -> Result<JsonValue, ServiceError> {
        let url = self.url(path);
        let response = self.http.post(&url).json(payload).send().await?;
        Self::json_body(url, response).await
    }

    /// POST without a body and return the raw 2xx text, which may be empty.
    pub async fn post_empty(&self, path: &str) -> Result<String, ServiceError> {
        let url = self.url(path);
        let response = self.http.post(&url).send().await?;
        let response = Self::check_status(url, response)?;
        Ok(response.text().await?)
    }

    fn check_status(
        url: String,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        log::debug!("{} -> {}", url, status);
        if status.is_success() {
            Ok(response)
        } else {
            Err(ServiceError::Status {
                status: status.as_u16(),
                url,
            })
        }
    }

    async fn json_body(url: String, response: reqwest::Response) -> Result<JsonValue, ServiceError> {
        let response = Self::check_status(url, response)?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ServiceError::Body("empty body".to_string()));
        }
        serde_json::from_str(&text).map_err(|e| ServiceError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_strips_trailing_slash() {
        let client = ServiceClient::new("http://localhost:9000/api/students/");
        assert_eq!(client.base_url(), "http://localhost:9000/api/students");
        assert_eq!(
            client.url("/1/courses"),
            "http://localhost:9000/api/students/1/courses"
        );
        assert_eq!(client.url(""), "http://localhost:9000/api/students");
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::Status {
            status: 500,
            url: "http://x/y".into(),
        };
        assert_eq!(err.to_string(), "http://x/y returned HTTP status 500");
        assert_eq!(
            ServiceError::Body("eof".into()).to_string(),
            "invalid response body: eof"
        );
    }
}
