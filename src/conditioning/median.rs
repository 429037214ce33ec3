// DistanceSampler - outlier-resistant ultrasonic ranging
//
// Takes up to 15 echo-time readings, drops timeouts, converts the rest to
// centimetres and returns their median. A measurement where every attempt
// timed out is reported as `MeasurementError::NoEcho`, never as a distance.

use std::time::Duration;

use crate::config::DistanceConfig;
use crate::error::MeasurementError;
use crate::hal::{Clock, PulseInput};

/// Upper bound on attempts per measurement
pub const MAX_SAMPLES: u8 = 15;

/// Speed of sound in cm/us at room temperature
const SOUND_CM_PER_US: f32 = 0.0343;

/// Convert a round-trip echo time to a one-way distance in cm
pub fn pulse_to_cm(echo: Duration) -> f32 {
    echo.as_micros() as f32 * SOUND_CM_PER_US / 2.0
}

/// Median of `values`, sorting them in place (ascending)
///
/// Even-length input averages the two middle values. Returns `None` for an
/// empty slice.
pub fn median_of(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    // Insertion sort: stable and plenty for n <= 15
    for i in 1..values.len() {
        let key = values[i];
        let mut j = i;
        while j > 0 && values[j - 1] > key {
            values[j] = values[j - 1];
            j -= 1;
        }
        values[j] = key;
    }

    let n = values.len();
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some(0.5 * (values[n / 2 - 1] + values[n / 2]))
    }
}

/// Multi-sample median ranging over a pulse input
pub struct DistanceSampler<P, C> {
    pulse: P,
    clock: C,
    config: DistanceConfig,
}

impl<P: PulseInput, C: Clock> DistanceSampler<P, C> {
    pub fn new(pulse: P, clock: C, config: DistanceConfig) -> Self {
        Self {
            pulse,
            clock,
            config,
        }
    }

    /// One reading in cm, or `Timeout` if no echo arrived
    ///
    /// A zero-length pulse is a timeout, whatever the input reported.
    pub fn read_once(&mut self, timeout: Duration) -> Result<f32, MeasurementError> {
        match self.pulse.measure_pulse(timeout)? {
            echo if echo.is_zero() => Err(MeasurementError::Timeout {
                timeout_us: timeout.as_micros() as u64,
            }),
            echo => Ok(pulse_to_cm(echo)),
        }
    }

    /// Median distance over `sample_count` attempts
    ///
    /// # Arguments
    /// * `sample_count` - Attempts, clamped into [1, 15]
    /// * `inter_sample_delay` - Pause between attempts (not after the last)
    /// * `per_sample_timeout` - Maximum wait for each echo
    ///
    /// # Returns
    /// * `Ok(cm)` - Median of the attempts that produced an echo
    /// * `Err(MeasurementError::NoEcho)` - Every attempt timed out
    pub fn measure(
        &mut self,
        sample_count: u8,
        inter_sample_delay: Duration,
        per_sample_timeout: Duration,
    ) -> Result<f32, MeasurementError> {
        let attempts = sample_count.clamp(1, MAX_SAMPLES);
        let mut values = [0.0f32; MAX_SAMPLES as usize];
        let mut got = 0usize;

        for i in 0..attempts {
            match self.read_once(per_sample_timeout) {
                Ok(cm) => {
                    values[got] = cm;
                    got += 1;
                }
                Err(err) => {
                    tracing::trace!("[DistanceSampler] attempt {} dropped: {}", i, err);
                }
            }

            if i + 1 < attempts {
                self.clock.sleep(inter_sample_delay);
            }
        }

        match median_of(&mut values[..got]) {
            Some(cm) => {
                tracing::debug!(
                    "[DistanceSampler] {:.2} cm from {}/{} echoes",
                    cm,
                    got,
                    attempts
                );
                Ok(cm)
            }
            None => Err(MeasurementError::NoEcho { attempts }),
        }
    }

    /// Median distance using the configured sample count and timings
    pub fn measure_default(&mut self) -> Result<f32, MeasurementError> {
        self.measure(
            self.config.samples,
            self.config.inter_sample_delay(),
            self.config.per_sample_timeout(),
        )
    }

    pub fn config(&self) -> &DistanceConfig {
        &self.config
    }

    pub fn pulse(&self) -> &P {
        &self.pulse
    }
}
