//! Client surface for the platform's REST API
//!
//! Everything outbound goes through [`client::ApiClient::call`], which owns
//! the bearer token and the 401 refresh-then-retry policy. [`transport`]
//! isolates the actual HTTP stack behind a trait so tests can script
//! responses.

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::{ApiClient, FileQuery, OrderQuery, ResultDownload};
pub use error::{ApiError, Result};
pub use models::{
    FileRecord, OrderRecord, OrderStatus, Page, ResultTypeEntry, TokenPair,
    normalize_result_types,
};
pub use session::{Credentials, Session};
pub use transport::{
    ApiRequest, ApiResponse, HttpSettings, HttpTransport, RequestBody, Transport, TransportError,
};
