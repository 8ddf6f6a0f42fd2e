use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a [`Storage`](crate::storage::Storage) implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    /// A conditional appointment insert lost against an overlapping record.
    #[error("an overlapping appointment already exists")]
    Conflict,
}

/// Caller-facing error taxonomy of the booking core. Storage failures are
/// translated at the BookingManager boundary and never propagated raw.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("no matching record for id {0}")]
    NotFound(Uuid),
    #[error("appointment {0} belongs to a different user")]
    NotOwner(Uuid),
    #[error("slot at {0} was taken by a concurrent booking")]
    SlotConflict(NaiveDateTime),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl BookingError {
    pub fn storage(err: StorageError) -> Self {
        BookingError::StorageUnavailable(err.to_string())
    }
}
