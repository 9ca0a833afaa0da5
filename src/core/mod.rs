//! Core types shared across the crate: the error taxonomy and its
//! user-facing presentation layer.

pub mod error;
pub mod error_context;

pub use error::{Result, RulezError};
pub use error_context::{ErrorContext, user_friendly_error};
