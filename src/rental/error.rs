use crate::storage::StorageError;

/// Error types for booking and catalog operations
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    /// A booking rule was violated (availability, notice window, date order)
    #[error("Invalid booking: {0}")]
    InvalidBooking(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// Duplicate key, or removal of an entity that is still referenced
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// The change was applied in memory but could not be written out
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type RentalResult<T> = Result<T, RentalError>;
