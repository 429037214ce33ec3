// Conditioning module - noisy sensor signals reduced to stable discrete states
//
// Components:
// - ThresholdClassifier / LightSensor: EMA smoothing + hysteresis band -> tri-state
// - RangeCalibrator: observed min/max sweep -> threshold band
// - DistanceSampler: N echo timings -> median distance, timeouts dropped
// - PresenceToggle / TagToggle: debounced tag presence -> latched boolean
// - SoundLevel: averaged microphone level
//
// Components never call each other. Each one owns its state and is advanced
// only by its own update/measure call from the host loop.

pub mod calibration;
pub mod classifier;
pub mod light;
pub mod median;
pub mod presence;
pub mod smoothing;
pub mod sound;

pub use calibration::{CalibratedBand, RangeCalibrator, RangeSweep};
pub use classifier::{Classification, Polarity, ThresholdBand, ThresholdClassifier};
pub use light::LightSensor;
pub use median::{median_of, pulse_to_cm, DistanceSampler};
pub use presence::{AuthorizedIdentity, PresenceEvent, PresenceToggle, TagToggle, ToggleMode};
pub use smoothing::SmoothedSignal;
pub use sound::SoundLevel;
