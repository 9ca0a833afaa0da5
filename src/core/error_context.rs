//! User-facing error presentation.
//!
//! Wraps a [`RulezError`] with an optional suggestion and details so a CLI
//! caller can show an actionable, colored message and exit non-zero. The
//! library itself only ever returns the typed error; this layer is the bridge
//! to human output.

use colored::Colorize;
use std::fmt;

use super::error::RulezError;

/// A [`RulezError`] paired with user-friendly context.
///
/// Suggestions are actionable steps displayed in green; details explain why
/// the error occurred and are displayed in yellow.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: RulezError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a basic error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: RulezError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining why the error occurred.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert a [`RulezError`] into an [`ErrorContext`] with tailored advice.
///
/// Every variant gets a suggestion that points at the file, key, or name that
/// caused the failure, so callers can print it verbatim.
#[must_use]
pub fn user_friendly_error(error: RulezError) -> ErrorContext {
    match &error {
        RulezError::Io { path, .. } => {
            let details = format!("ai-rulez could not read or write {path}");
            ErrorContext::new(error)
                .with_suggestion("Check that the path exists and you have permission to access it")
                .with_details(details)
        }
        RulezError::Parse { file, .. } => {
            let suggestion = format!("Check the YAML syntax in {file} (indentation, quoting, tabs)");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        RulezError::SchemaValidation { violations, .. } => {
            let details = violations
                .iter()
                .map(|v| format!("- {v}"))
                .collect::<Vec<_>>()
                .join("\n");
            ErrorContext::new(error)
                .with_suggestion("Fix the listed violations and run again")
                .with_details(details)
        }
        RulezError::ProfileNotFound { available, .. } => {
            let suggestion = if available.is_empty() {
                "Remove the 'profile' field or register a profile repository".to_string()
            } else {
                format!("Available profiles: {}", available.join(", "))
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        RulezError::CircularInclude { chain, .. } => {
            let details = format!("Include chain: {}", chain.join(" -> "));
            ErrorContext::new(error)
                .with_suggestion("Break the cycle by removing one of the includes in the chain")
                .with_details(details)
        }
        RulezError::MissingInclude { resolved, .. } => {
            let details = format!("Expected a YAML file at {resolved}");
            ErrorContext::new(error)
                .with_suggestion("Check the include path for typos, it is resolved relative to the including file")
                .with_details(details)
        }
        RulezError::TemplateParse { .. } => ErrorContext::new(error)
            .with_suggestion("Check the template for unbalanced {{ }} or {% %} delimiters"),
        RulezError::TemplateExecution { .. } => ErrorContext::new(error)
            .with_suggestion("Check that every field referenced by the template exists in the template data"),
        RulezError::OutputWrite { path, .. } => {
            let details = format!("Target path: {path}");
            ErrorContext::new(error)
                .with_suggestion("Check directory permissions and available disk space")
                .with_details(details)
        }
        RulezError::NoOutputs => ErrorContext::new(error)
            .with_suggestion("Add at least one entry under 'outputs' in your configuration"),
        RulezError::ConfigNotFound { .. } => ErrorContext::new(error).with_suggestion(
            "Create an '.ai-rulez.yaml' or 'ai-rulez.yaml' file in your project directory",
        ),
    }
}
