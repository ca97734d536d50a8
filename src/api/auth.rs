//! Bearer token sources.
//!
//! The store only asks for a token; where it comes from is up to the
//! [`TokenProvider`] it was built with.

use serde_json::json;
use std::sync::RwLock;
use tracing::{info, warn};

use super::api_types::ApiLoginResponse;
use super::transport::{ApiRequest, Transport};
use crate::error::{StoreError, StoreResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials. Please check your email and password.";

/// Supplies the bearer token for authenticated calls.
pub trait TokenProvider: Send + Sync + 'static {
  fn token(&self) -> Option<String>;
}

/// A fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenProvider for StaticToken {
  fn token(&self) -> Option<String> {
    self.0.clone().filter(|t| !t.is_empty())
  }
}

/// The admin user returned by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
  pub id: String,
  pub email: String,
  pub full_name: Option<String>,
  pub industry: Option<String>,
  pub profession: Option<String>,
  pub token: String,
}

/// Token holder filled by [`Session::login`] or seeded from configuration.
#[derive(Debug, Default)]
pub struct Session {
  user: RwLock<Option<SessionUser>>,
  seeded_token: Option<String>,
}

impl Session {
  pub fn new(seeded_token: Option<String>) -> Self {
    Self {
      user: RwLock::new(None),
      seeded_token: seeded_token.filter(|t| !t.is_empty()),
    }
  }

  pub fn user(&self) -> Option<SessionUser> {
    self.user.read().ok().and_then(|u| u.clone())
  }

  pub fn sign_out(&self) {
    if let Ok(mut user) = self.user.write() {
      *user = None;
    }
  }

  /// Log in against `admin/login` and keep the returned token.
  pub async fn login(
    &self,
    transport: &dyn Transport,
    email: &str,
    password: &str,
  ) -> StoreResult<SessionUser> {
    if email.trim().is_empty() {
      return Err(StoreError::validation("Email is required"));
    }
    if password.is_empty() {
      return Err(StoreError::validation("Password is required"));
    }

    let request = ApiRequest::post(
      "admin/login",
      json!({ "email": email, "password": password }),
    );
    let response = transport
      .send(request)
      .await
      .map_err(|e| StoreError::Network(e.0))?;

    let parsed: Option<ApiLoginResponse> = serde_json::from_value(response.body.clone()).ok();
    let parsed = match parsed {
      Some(body) if response.is_success() && body.status => body,
      Some(body) => {
        warn!(status = response.status, "login rejected");
        let message = if body.message.is_empty() {
          INVALID_CREDENTIALS.to_string()
        } else {
          body.message
        };
        return Err(StoreError::Auth(message));
      }
      None => return Err(StoreError::Auth(INVALID_CREDENTIALS.to_string())),
    };

    let user = match (parsed.user_data, parsed.token) {
      (Some(data), Some(token)) if !data.id.is_empty() && !data.email.is_empty() && !token.is_empty() => {
        SessionUser {
          id: data.id,
          email: data.email,
          full_name: data.full_name,
          industry: data.industry,
          profession: data.profession,
          token,
        }
      }
      _ => return Err(StoreError::Auth("Missing required user data fields".into())),
    };

    info!(email = %user.email, "logged in");
    if let Ok(mut slot) = self.user.write() {
      *slot = Some(user.clone());
    }
    Ok(user)
  }
}

impl TokenProvider for Session {
  fn token(&self) -> Option<String> {
    self
      .user()
      .map(|u| u.token)
      .or_else(|| self.seeded_token.clone())
  }
}
