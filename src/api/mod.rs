//! Backend API: resources, wire types, transport and auth.

pub mod api_types;
pub mod auth;
#[cfg(test)]
pub mod mock;
pub mod resource;
pub mod transport;
pub mod types;

pub use auth::{Session, StaticToken, TokenProvider};
pub use resource::Resource;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use types::{Page, PageMeta, Record};
