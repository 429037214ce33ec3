// Desk Signals - signal conditioning for a desk-automation controller
// Turns jittery light, ultrasonic and RFID readings into stable discrete states

// Module declarations
pub mod conditioning;
pub mod config;
pub mod controller;
pub mod error;
pub mod hal;

// Re-exports for convenience
pub use conditioning::{
    Classification, DistanceSampler, LightSensor, Polarity, PresenceToggle, RangeCalibrator,
    SmoothedSignal, SoundLevel, TagToggle, ThresholdBand, ThresholdClassifier, ToggleMode,
};
pub use config::AppConfig;
pub use controller::{DeskController, DeskInputs, DeskSnapshot};
pub use error::{ErrorCode, MeasurementError};

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
