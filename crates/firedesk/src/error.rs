//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use firedesk_config::ConfigError;
use firedesk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the database at {target}")]
    #[diagnostic(
        code(firedesk::connection_failed),
        help(
            "Check that the Firebird server is running and the [db] section is right.\n\
             Run: firedesk config show\n\
             Or try the sample data: firedesk --demo objects list"
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Database query '{operation}' timed out after {seconds:.1}s")]
    #[diagnostic(
        code(firedesk::timeout),
        help("The server answered too slowly. Retry, or check the server load.")
    )]
    Timeout { operation: String, seconds: f32 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{entity} '{identifier}' not found")]
    #[diagnostic(
        code(firedesk::not_found),
        help("Run: firedesk objects list to see known objects")
    )]
    NotFound { entity: String, identifier: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(firedesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(firedesk::config),
        help("Create or fix the config with: firedesk config init")
    )]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(firedesk::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Output serialization failed: {0}")]
    #[diagnostic(code(firedesk::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StoreTimeout { operation, timeout } => Self::Timeout {
                operation: operation.into(),
                seconds: timeout.as_secs_f32(),
            },
            CoreError::StoreConnection { reason } => Self::ConnectionFailed {
                target: "configured server".into(),
                reason,
            },
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                entity: entity.into(),
                identifier,
            },
            CoreError::InvalidIdentifier { input, reason } => Self::Validation {
                field: "object number".into(),
                reason: format!("'{input}': {reason}"),
            },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn core_errors_pick_documented_exit_codes() {
        let cases = [
            (
                CoreError::StoreConnection {
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::StoreTimeout {
                    operation: "list_objects",
                    timeout: Duration::from_secs(5),
                },
                exit_code::TIMEOUT,
            ),
            (
                CoreError::NotFound {
                    entity: "object",
                    identifier: "77".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::InvalidIdentifier {
                    input: "abc".into(),
                    reason: "not a number".into(),
                },
                exit_code::USAGE,
            ),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }
}
