//! # apiwrap: a base library for thin HTTP API client wrappers
//!
//! This crate provides the reusable request/response lifecycle shared by thin
//! API wrappers: build a request from per-endpoint configuration, send it
//! through an HTTP client, capture the response or the transport error, and
//! optionally decode the JSON body into a value object.
//!
//! ## Key pieces
//!
//! - [`Connection`] — credentials, base URL, and API version
//! - [`Endpoint`] — per-operation configuration (method, path, critical
//!   fields, content type, success codes)
//! - [`ApiClient`] — one request/response cycle; transport failures are
//!   captured as inspectable state, never thrown past `send()`
//! - [`ValueObject`] / [`RawVo`] — typed views over a decoded body
//! - [`DataStore`] — the key/value bag backing request data and VO fields
//!
//! ## Basic usage
//!
//! ```no_run
//! use apiwrap::{ApiClient, Connection, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::new("https://api.example.com/v{version}/")
//!         .with_api_key("secret");
//!
//!     let mut client = ApiClient::connected(connection, Endpoint::get("items"));
//!     client.set_request_data_item("page", 1);
//!     client.send().await?;
//!
//!     if client.is_last_request_success() {
//!         println!("{:?}", client.decoded_body());
//!     } else if let Some(err) = client.last_error() {
//!         eprintln!("request failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod connection;
pub mod endpoint;
pub mod store;
pub mod types;
pub mod vo;

// Re-export core components
pub use client::{ApiClient, ApiResponse, RequestBody, RequestMiddleware, RequestParts};
pub use connection::{Connection, DEFAULT_API_VERSION, VERSION_PLACEHOLDER};
pub use endpoint::{Endpoint, DEFAULT_SUCCESS_CODES};
pub use store::DataStore;
pub use types::{ApiResult, ContentType, DataChannel, Error, Method, SecureApiKey};
pub use vo::{RawVo, ValueObject};

pub mod prelude {
    //! Convenient imports for commonly used types
    pub use crate::{
        ApiClient, ApiResult, Connection, ContentType, Endpoint, Error, Method, RawVo,
        RequestMiddleware, ValueObject,
    };
}
