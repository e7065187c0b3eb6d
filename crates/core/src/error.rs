//! The error taxonomy shared by the reservation engine.
//!
//! Every failure the engine can produce is a distinct, inspectable variant.
//! Callers match on the kind to decide presentation and retry policy; the
//! engine itself never retries and never uses errors for control flow.

use thiserror::Error;

use crate::ticket::{RequestType, TicketStatus};

/// Errors produced by the reservation engine.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed or out-of-range input (seat out of range, non-positive
    /// capacity or price, past date, start >= end).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced user, showing or ticket does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Seat or schedule collision, including races lost at the storage
    /// backstop. User-recoverable: pick another seat or time.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested lifecycle transition is not in the state machine table.
    #[error("invalid action for this ticket: cannot {action} a {status}/{request_type} ticket")]
    InvalidTransition {
        action: String,
        status: TicketStatus,
        request_type: RequestType,
    },

    /// The action name itself is not a known ticket action.
    #[error("unknown ticket action: {0}")]
    InvalidAction(String),

    /// The acting user is not permitted to perform this operation.
    #[error("not permitted: {0}")]
    Authorization(String),

    /// The external movie-metadata lookup failed. Not retryable here.
    #[error("movie lookup failed: {0}")]
    Upstream(String),

    /// A storage call exceeded its bounded timeout.
    #[error("storage timed out: {0}")]
    Timeout(String),

    /// Any other persistence failure. Operational, not user-recoverable.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                // The unique-index backstop rejecting a conflicting write.
                rusqlite::ErrorCode::ConstraintViolation => {
                    BookingError::Conflict(e.to_string())
                }
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    BookingError::Timeout(e.to_string())
                }
                _ => BookingError::Storage(e.to_string()),
            },
            _ => BookingError::Storage(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_maps_to_conflict() {
        let failure = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT);
        let err: BookingError = rusqlite::Error::SqliteFailure(failure, None).into();
        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[test]
    fn busy_maps_to_timeout() {
        let failure = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY);
        let err: BookingError = rusqlite::Error::SqliteFailure(failure, None).into();
        assert!(matches!(err, BookingError::Timeout(_)));
    }

    #[test]
    fn other_sqlite_errors_map_to_storage() {
        let err: BookingError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, BookingError::Storage(_)));
    }
}
