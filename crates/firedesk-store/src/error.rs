use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `firedesk-store` crate.
///
/// Every store call resolves to one of these; nothing in the store layer
/// panics on a slow or unreachable database. `firedesk-core` maps them into
/// the console's error kinds.
#[derive(Debug, Error)]
pub enum StoreError {
    // ── Transport ───────────────────────────────────────────────────
    /// The query did not complete within its deadline.
    #[error("{operation} timed out after {}ms", timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Opening or talking to the database server failed.
    #[error("database connection error: {0}")]
    Connection(String),

    /// The worker pool behind this store has shut down.
    #[error("store is closed")]
    Unavailable,

    // ── Data ────────────────────────────────────────────────────────
    /// A single-row lookup matched nothing.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The server rejected or failed the statement.
    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Returns `true` if the next poll tick may well succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection(_) | Self::Unavailable
        )
    }

    /// Returns `true` if this is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
