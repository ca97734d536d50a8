//! Error types surfaced by store operations.
//!
//! Application plumbing (config, storage, terminal) uses `color_eyre::Result`.
//! Store operations return [`StoreError`] so that callers can branch on the
//! failure class: validation and auth errors never reach the network,
//! network and server errors roll back optimistic changes.

use thiserror::Error;

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  Auth,
  NetworkFailure,
  ServerError,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
  /// A local check failed before any request was made.
  #[error("{0}")]
  Validation(String),

  /// No bearer credential was available for an authenticated call.
  #[error("{0}")]
  Auth(String),

  /// The request could not be sent or the response could not be read.
  #[error("network error: {0}")]
  Network(String),

  /// The backend answered with a non-2xx status or a failed envelope.
  #[error("{message}")]
  Server { status: u16, message: String },
}

impl StoreError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::Auth(_) => ErrorKind::Auth,
      Self::Network(_) => ErrorKind::NetworkFailure,
      Self::Server { .. } => ErrorKind::ServerError,
    }
  }

  /// HTTP status for server errors.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Server { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
