//! Error types for the FinOps core library.
//!
//! Every failure that can surface from a cost report is a [`FinopsError`].
//! Billing and budget query failures carry the [`QueryKind`] that failed so the
//! caller can tell which request was rejected. The library never retries and
//! never logs on the failure path; presentation is left to the caller.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E2001-E2099 | Config | Config file, environment and validation errors |
//! | E5001-E5099 | Billing API | Cost Explorer, Budgets and STS request errors |
//! | E7001-E7099 | Cost | Report input and cost calculation errors |
//! | E9001-E9099 | General | IO and serialization errors |

use std::fmt;
use thiserror::Error;

use crate::billing::QueryKind;

/// The main error type for the FinOps core library.
#[derive(Debug, Error)]
pub enum FinopsError {
    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E2004] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2005] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// AWS session could not be established from the profile
    #[error("[E2006] Failed to load AWS session for profile '{profile}': {message}")]
    SessionLoadFailed { profile: String, message: String },

    // ========================================================================
    // Billing API Errors (E5001-E5099)
    // ========================================================================
    /// The request was rejected for a reason not covered below
    #[error("[E5001] {query} request failed: {message}")]
    ApiRequestFailed { query: QueryKind, message: String },

    /// The service answered with a shape we cannot interpret
    #[error("[E5002] Malformed {query} response: {message}")]
    MalformedResponse { query: QueryKind, message: String },

    /// The service throttled the request
    #[error("[E5003] {query} request throttled: {message}")]
    Throttled { query: QueryKind, message: String },

    /// Credentials missing, expired or lacking the billing permissions
    #[error("[E5004] Not authorized for {query}: {message}")]
    AuthorizationFailed { query: QueryKind, message: String },

    /// Network failure, timeout or 5xx from the service
    #[error("[E5005] {query} service unavailable: {message}")]
    ServiceUnavailable { query: QueryKind, message: String },

    // ========================================================================
    // Cost Errors (E7001-E7099)
    // ========================================================================
    /// Lookback window must be a positive number of days
    #[error("[E7001] Invalid time range: {0} days (must be at least 1)")]
    InvalidTimeRange(u32),

    /// Date arithmetic left the representable calendar
    #[error("[E7002] Invalid cost calculation: {0}")]
    InvalidCostCalculation(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// IO error
    #[error("[E9005] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9006] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for FinOps operations.
pub type FinopsResult<T> = Result<T, FinopsError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<serde_json::Error> for FinopsError {
    fn from(err: serde_json::Error) -> Self {
        FinopsError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for FinopsError {
    fn from(err: std::io::Error) -> Self {
        FinopsError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for FinopsError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => FinopsError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => FinopsError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => FinopsError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => FinopsError::ConfigParseError(err.to_string()),
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl FinopsError {
    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,

                | FinopsError::InvalidConfigValue { .. }
                | FinopsError::SessionLoadFailed { .. }
        )
    }

    /// Returns true if this error came back from a billing, budget or identity query.
    pub fn is_billing_error(&self) -> bool {
        self.query_kind().is_some()
    }

    /// The query that failed, for billing API errors.
    pub fn query_kind(&self) -> Option<QueryKind> {
        match self {
            FinopsError::ApiRequestFailed { query, .. }
            | FinopsError::MalformedResponse { query, .. }
            | FinopsError::Throttled { query, .. }
            | FinopsError::AuthorizationFailed { query, .. }
            | FinopsError::ServiceUnavailable { query, .. } => Some(*query),
            _ => None,
        }
    }

    /// Returns true if running the same report later might succeed.
    ///
    /// This is a hint for the caller. Nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FinopsError::Throttled { .. } | FinopsError::ServiceUnavailable { .. }
        )
    }

    /// Returns a suggested wait in seconds before running the report again.
    pub fn suggested_retry_delay(&self) -> Option<u64> {
        match self {
            FinopsError::Throttled { .. } => Some(30),
            FinopsError::ServiceUnavailable { .. } => Some(5),
            _ => None,
        }
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            FinopsError::ConfigParseError(_) => "E2004",
            FinopsError::InvalidConfigValue { .. } => "E2005",
            FinopsError::SessionLoadFailed { .. } => "E2006",
            FinopsError::ApiRequestFailed { .. } => "E5001",
            FinopsError::MalformedResponse { .. } => "E5002",
            FinopsError::Throttled { .. } => "E5003",
            FinopsError::AuthorizationFailed { .. } => "E5004",
            FinopsError::ServiceUnavailable { .. } => "E5005",
            FinopsError::InvalidTimeRange(_) => "E7001",
            FinopsError::InvalidCostCalculation(_) => "E7002",
            FinopsError::IoError(_) => "E9005",
            FinopsError::SerializationError(_) => "E9006",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            FinopsError::SessionLoadFailed { .. } => {
                Some("Check that the profile exists in ~/.aws/config or ~/.aws/credentials")
            }
            FinopsError::AuthorizationFailed { .. } => Some(
                "Check the credentials and grant ce:GetCostAndUsage, budgets:ViewBudget and sts:GetCallerIdentity",
            ),
            FinopsError::Throttled { .. } => {
                Some("Cost Explorer rate limit reached. Wait before running the report again")
            }
            FinopsError::ServiceUnavailable { .. } => {
                Some("Check network connectivity to the AWS endpoints")
            }
            FinopsError::InvalidTimeRange(_) => {
                Some("Pass --time-range with a positive number of days, or omit it for the current month")
            }
            FinopsError::InvalidCostCalculation(_) => Some("Use a shorter --time-range"),
            _ => None,
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a FinopsError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a FinopsError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message (already includes code)
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        if let Some(delay) = self.error.suggested_retry_delay() {
            writeln!(f)?;
            writeln!(
                f,
                "  This error may be temporary. Try again in {} seconds.",
                delay
            )?;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
