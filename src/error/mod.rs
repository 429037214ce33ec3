// Error types for the desk signal-conditioning layer
//
// Classification and presence tracking never fail: bad configuration is
// clamped where it is assigned. Only measurements can come back empty, and
// those are reported through the typed errors defined here.

mod measurement;

pub use measurement::{log_measurement_error, MeasurementError, MeasurementErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting from host loops.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
