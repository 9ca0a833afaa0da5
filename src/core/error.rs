//! Error handling for ai-rulez
//!
//! This module provides the strongly-typed error taxonomy for the
//! configuration resolution and generation pipeline. The design follows two
//! principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **Enough context** (file path, key, reason) for a caller to render a
//!    user-facing message and exit non-zero
//!
//! # Error Categories
//!
//! - **Loading**: [`RulezError::Io`], [`RulezError::Parse`],
//!   [`RulezError::SchemaValidation`]
//! - **Resolution**: [`RulezError::ProfileNotFound`],
//!   [`RulezError::CircularInclude`], [`RulezError::MissingInclude`]
//! - **Rendering**: [`RulezError::TemplateParse`],
//!   [`RulezError::TemplateExecution`]
//! - **Generation**: [`RulezError::OutputWrite`], [`RulezError::NoOutputs`]
//!
//! Any load-time error aborts the entire operation before any file is
//! generated. At generation time, serial mode fails fast while concurrent
//! mode reports the first error observed after all outputs have attempted
//! completion. No error is ever silently swallowed and there is no automatic
//! retry anywhere in this subsystem.

use std::path::Path;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RulezError>;

/// The main error type for ai-rulez operations.
///
/// Each variant carries the specific context of the failure: the file path
/// involved, the key or name that triggered the error, and a reason string
/// where the underlying library reported one.
#[derive(Error, Debug)]
pub enum RulezError {
    /// File missing, unreadable, or otherwise inaccessible.
    #[error("Failed to access {path}")]
    Io {
        /// Path that could not be accessed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML in a configuration document.
    #[error("Invalid YAML in {file}: {reason}")]
    Parse {
        /// Path to the file that failed to parse
        file: String,
        /// Parser-reported reason
        reason: String,
    },

    /// Structural schema violation detected before decoding.
    ///
    /// Carries the full list of violation descriptions so callers can show
    /// every problem in one pass instead of failing one field at a time.
    #[error("Schema validation failed for {file} ({} violation(s))", violations.len())]
    SchemaValidation {
        /// Path to the offending file
        file: String,
        /// Human-readable violation descriptions
        violations: Vec<String>,
    },

    /// A `profile` selector named a profile the repository does not know.
    #[error("Profile '{name}' not found")]
    ProfileNotFound {
        /// The unknown profile name
        name: String,
        /// Names the repository does provide
        available: Vec<String>,
    },

    /// An include path reappeared while still an active ancestor.
    ///
    /// Only a true cycle triggers this: the same file reachable from two
    /// independent include branches (diamond inclusion) is legal.
    #[error("Circular include detected: {path}")]
    CircularInclude {
        /// The path that closed the cycle
        path: String,
        /// The ancestor chain active when the cycle was found
        chain: Vec<String>,
    },

    /// A path named in `includes` does not exist.
    #[error("Include file not found: {path} (resolved to {resolved})")]
    MissingInclude {
        /// The include path as written in the config
        path: String,
        /// The absolute path it resolved to
        resolved: String,
    },

    /// Template text failed to parse.
    #[error("Failed to parse template '{name}': {reason}")]
    TemplateParse {
        /// Template name (built-in name, `file:<path>`, or `inline`)
        name: String,
        /// Parser-reported reason
        reason: String,
    },

    /// A parsed template failed during execution, e.g. a reference to an
    /// undefined field. Scoped to the single output being rendered.
    #[error("Failed to render template '{name}': {reason}")]
    TemplateExecution {
        /// Template name (built-in name, `file:<path>`, or `inline`)
        name: String,
        /// Renderer-reported reason
        reason: String,
    },

    /// An output file could not be written.
    #[error("Failed to write output file {path}: {reason}")]
    OutputWrite {
        /// Path of the output file
        path: String,
        /// Reason for the write failure
        reason: String,
    },

    /// Generation was requested for a configuration with no outputs.
    #[error("No outputs defined in configuration")]
    NoOutputs,

    /// No recognized configuration file was found during discovery.
    #[error("No ai-rulez configuration file found starting from {start}")]
    ConfigNotFound {
        /// Directory the upward search started from
        start: String,
    },
}

impl RulezError {
    /// Wrap an [`std::io::Error`] with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Wrap a [`serde_yaml::Error`] with the file it occurred in.
    pub fn parse(file: &Path, source: &serde_yaml::Error) -> Self {
        Self::Parse {
            file: file.display().to_string(),
            reason: source.to_string(),
        }
    }
}
