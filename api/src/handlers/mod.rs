//! HTTP error mapping

pub mod error;

pub use error::{json_error_handler, ApiError};
