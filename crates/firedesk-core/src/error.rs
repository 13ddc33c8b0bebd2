// ── Core error types ──
//
// Errors surfaced to the CLI and TUI. Store-level failures are folded
// into the few kinds a dispatcher can act on; raw driver messages are
// carried as text only.

use std::time::Duration;

use firedesk_store::StoreError;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Store errors ─────────────────────────────────────────────────
    #[error("Database query '{operation}' timed out after {}s", timeout.as_secs_f32())]
    StoreTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Database connection error: {reason}")]
    StoreConnection { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("Invalid identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Failures a later poll may not see again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreTimeout { .. } | Self::StoreConnection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from store errors ─────────────────────────────────────

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout { operation, timeout } => Self::StoreTimeout { operation, timeout },
            StoreError::Connection(reason) => Self::StoreConnection { reason },
            StoreError::Unavailable => Self::StoreConnection {
                reason: "database workers are gone".into(),
            },
            StoreError::NotFound { entity, id } => Self::NotFound {
                entity,
                identifier: id.to_string(),
            },
            StoreError::Query(message) => Self::Internal(format!("query failed: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_dispatcher_kinds() {
        let timeout: CoreError = StoreError::Timeout {
            operation: "active_alarms",
            timeout: Duration::from_secs(3),
        }
        .into();
        assert!(matches!(timeout, CoreError::StoreTimeout { .. }));
        assert!(timeout.is_transient());

        let gone: CoreError = StoreError::Unavailable.into();
        assert!(matches!(gone, CoreError::StoreConnection { .. }));

        let missing: CoreError = StoreError::NotFound {
            entity: "object",
            id: 77,
        }
        .into();
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "object not found: 77");
        assert!(!missing.is_transient());
    }
}
