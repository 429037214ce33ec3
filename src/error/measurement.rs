// Measurement error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Measurement error code constants
///
/// Single source of truth for the numeric codes reported by host loops
/// and the simulator CLI.
///
/// Error code range: 3001-3002
pub struct MeasurementErrorCodes {}

impl MeasurementErrorCodes {
    /// Every attempt of a multi-sample measurement timed out
    pub const NO_ECHO: i32 = 3001;

    /// A single pulse measurement timed out
    pub const TIMEOUT: i32 = 3002;
}

/// Log a measurement error with structured context
///
/// This function logs measurement errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_measurement_error(err: &MeasurementError, context: &str) {
    error!(
        "Measurement error in {}: code={}, component=DistanceSampler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Measurement-related errors
///
/// A failed reading is always surfaced as one of these variants, never as
/// a numeric default: a distance of 0 would be indistinguishable from an
/// object touching the sensor.
///
/// Error code ranges: 3001-3002
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    /// No attempt produced an echo
    NoEcho { attempts: u8 },

    /// The pulse did not arrive within the timeout
    Timeout { timeout_us: u64 },
}

impl ErrorCode for MeasurementError {
    fn code(&self) -> i32 {
        match self {
            MeasurementError::NoEcho { .. } => MeasurementErrorCodes::NO_ECHO,
            MeasurementError::Timeout { .. } => MeasurementErrorCodes::TIMEOUT,
        }
    }

    fn message(&self) -> String {
        match self {
            MeasurementError::NoEcho { attempts } => {
                format!("No echo received in {} attempt(s)", attempts)
            }
            MeasurementError::Timeout { timeout_us } => {
                format!("Pulse timed out after {} us", timeout_us)
            }
        }
    }
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MeasurementError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for MeasurementError {}
