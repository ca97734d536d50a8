//! Request execution against the backend.
//!
//! The store never talks to reqwest directly. It builds [`ApiRequest`]s and
//! hands them to a [`Transport`], which lets tests substitute a scripted one.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl Method {
  fn as_reqwest(self) -> reqwest::Method {
    match self {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

/// A request relative to the backend's `/api/` root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  pub path: String,
  pub query: Vec<(String, String)>,
  pub body: Option<Value>,
  pub bearer: Option<String>,
}

impl ApiRequest {
  fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
      bearer: None,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::Get, path)
  }

  pub fn post(path: impl Into<String>, body: Value) -> Self {
    Self::new(Method::Post, path).with_body(body)
  }

  pub fn put(path: impl Into<String>, body: Value) -> Self {
    Self::new(Method::Put, path).with_body(body)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::Delete, path)
  }

  pub fn with_query(mut self, name: &str, value: impl ToString) -> Self {
    self.query.push((name.to_string(), value.to_string()));
    self
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  pub fn with_bearer(mut self, token: Option<String>) -> Self {
    self.bearer = token;
    self
  }
}

/// Any response that made it back from the server, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
  pub status: u16,
  pub body: Value,
}

impl ApiResponse {
  pub fn new(status: u16, body: Value) -> Self {
    Self { status, body }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// The request could not be sent or its response could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for StoreError {
  fn from(err: TransportError) -> Self {
    StoreError::Network(err.0)
  }
}

/// Executes API requests.
pub trait Transport: Send + Sync + 'static {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>>;
}

/// reqwest-backed transport for the real backend.
#[derive(Clone)]
pub struct HttpTransport {
  http: reqwest::Client,
  api_base: Url,
}

impl HttpTransport {
  pub fn new(config: &BackendConfig) -> Result<Self> {
    let mut base = Url::parse(&config.url)
      .map_err(|e| eyre!("Invalid backend URL {}: {}", config.url, e))?;

    // Url::join replaces the last segment unless the path ends with '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    let api_base = base
      .join("api/")
      .map_err(|e| eyre!("Failed to build API URL: {}", e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, api_base })
  }

  pub fn api_base(&self) -> &Url {
    &self.api_base
  }

  fn url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
    let mut url = self
      .api_base
      .join(request.path.trim_start_matches('/'))
      .map_err(|e| TransportError(format!("invalid path {}: {}", request.path, e)))?;

    if !request.query.is_empty() {
      url.query_pairs_mut().extend_pairs(request.query.iter());
    }
    Ok(url)
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
    Box::pin(async move {
      let url = self.url(&request)?;
      debug!(method = ?request.method, %url, "sending request");

      let mut builder = self.http.request(request.method.as_reqwest(), url);
      if let Some(token) = &request.bearer {
        builder = builder.bearer_auth(token);
      }
      if let Some(body) = &request.body {
        builder = builder.json(body);
      }

      let response = builder.send().await.map_err(|e| {
        warn!(path = %request.path, error = %e, "request failed");
        TransportError(e.to_string())
      })?;

      let status = response.status().as_u16();
      let text = response
        .text()
        .await
        .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;

      // Non-JSON bodies (proxy error pages and the like) are kept as text
      let body = if text.trim().is_empty() {
        Value::Null
      } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
      };

      debug!(status, path = %request.path, "received response");
      Ok(ApiResponse { status, body })
    })
  }
}
