// LightSensor - ambient light classifier bound to an analog input
//
// Wraps a ThresholdClassifier with the input it reads from, and runs the
// range calibrator against that same input.

use std::time::Duration;

use crate::conditioning::calibration::{CalibratedBand, RangeCalibrator};
use crate::conditioning::classifier::{Classification, ThresholdClassifier};
use crate::config::LightConfig;
use crate::hal::{AnalogInput, Clock};

pub struct LightSensor<A> {
    input: A,
    classifier: ThresholdClassifier,
}

impl<A: AnalogInput> LightSensor<A> {
    pub fn new(input: A, classifier: ThresholdClassifier) -> Self {
        Self { input, classifier }
    }

    pub fn from_config(input: A, config: &LightConfig) -> Self {
        Self::new(input, ThresholdClassifier::from_config(config))
    }

    /// Seed the smoother from one reading so the first update starts near the signal
    pub fn begin(&mut self) {
        let raw = self.input.read_raw();
        self.classifier.seed(raw);
    }

    /// Read one sample and classify it
    pub fn update(&mut self) -> Classification {
        let raw = self.input.read_raw();
        self.classifier.update(raw)
    }

    /// Sweep the input for `window`, install the derived band and reseed
    ///
    /// Blocks the caller for the whole window.
    pub fn auto_calibrate<C: Clock + ?Sized>(
        &mut self,
        clock: &C,
        window: Duration,
        interval: Duration,
    ) -> CalibratedBand {
        let calibrated = RangeCalibrator::new(window, interval).calibrate(&mut self.input, clock);
        let band = calibrated.to_band(self.classifier.polarity(), self.classifier.adc_max());
        let reseed = self.input.read_raw();
        self.classifier.apply_calibration(band, reseed);

        tracing::info!(
            "[LightSensor] calibrated: low_trip={} high_trip={} hyst={} (reseeded at {})",
            band.low_trip,
            band.high_trip,
            band.hysteresis,
            reseed
        );

        calibrated
    }

    pub fn classifier(&self) -> &ThresholdClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut ThresholdClassifier {
        &mut self.classifier
    }
}
