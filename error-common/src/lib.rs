//! Common error handling utilities for the agent portal
//!
//! Every portal crate keeps its own `thiserror` enum; this crate holds what
//! they share at the edges:
//!
//! - **Error codes**: stable string codes returned to API clients
//! - **Error kinds**: the validation / conflict / not-found / unavailable / internal split
//! - **Error bodies**: the JSON shape written by HTTP handlers
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ErrorBody, ErrorKind};
//!
//! let kind = ErrorKind::Validation;
//! let body = ErrorBody::new("unknown permission code: role.destroy")
//!     .with_code(codes::validation::UNKNOWN_PERMISSION);
//!
//! assert_eq!(kind.http_status(), 400);
//! assert_eq!(body.code.as_deref(), Some("VALIDATION_1002"));
//! ```

pub mod codes;
pub mod types;

pub use types::*;
