//! REST API surface: routes, request/response types, structured errors.

pub mod error;
pub mod handlers;
pub mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
pub use rest::router;
