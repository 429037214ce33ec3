// ThresholdClassifier - smoothed tri-state classification with hysteresis
//
// Each raw sample is folded into an exponential moving average, and the
// smoothed value (truncated to whole ADC counts) is compared against a
// threshold band. The decision depends only on the current smoothed value
// and the band; the previous state is reported but never consulted.
//
// Two comparison conventions exist, selected by `Polarity`:
//
// Inverted (default, light sensor wired 5V - LDR - pin - R - GND, where a
// small reading means bright light):
//   v <= high_trip - hysteresis  => Above
//   v >= low_trip + hysteresis   => Below
//   otherwise                    => Normal
//
// Direct (reading grows with the measured quantity):
//   v <= low_trip - hysteresis   => Below
//   v >= high_trip + hysteresis  => Above
//   otherwise                    => Normal

use crate::conditioning::smoothing::SmoothedSignal;
use crate::config::LightConfig;
use crate::hal::ADC_MAX;

/// Discrete output of the classifier
///
/// For the light sensor: Below = too dark, Normal = comfort, Above = too bright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Below,
    #[default]
    Normal,
    Above,
}

impl Classification {
    /// Human-readable label for the light sensor
    pub fn display_name(&self) -> &'static str {
        match self {
            Classification::Below => "TOO DARK",
            Classification::Normal => "COMFORT",
            Classification::Above => "TOO BRIGHT",
        }
    }
}

/// Which comparison convention the trip points follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Small readings trip `Above` at `high_trip - hysteresis`;
    /// large readings trip `Below` at `low_trip + hysteresis`.
    #[default]
    Inverted,
    /// Small readings trip `Below` at `low_trip - hysteresis`;
    /// large readings trip `Above` at `high_trip + hysteresis`.
    Direct,
}

/// Trip points and dead-zone width in raw sensor units
///
/// No ordering is imposed between the two trip points; their meaning comes
/// from the classifier's `Polarity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThresholdBand {
    pub low_trip: i32,
    pub high_trip: i32,
    pub hysteresis: i32,
}

impl ThresholdBand {
    /// Build a band, clamping trips into `[0, adc_max]` and hysteresis to `>= 0`
    pub fn new(low_trip: i32, high_trip: i32, hysteresis: i32, adc_max: u16) -> Self {
        let max = adc_max as i32;
        Self {
            low_trip: low_trip.clamp(0, max),
            high_trip: high_trip.clamp(0, max),
            hysteresis: hysteresis.max(0),
        }
    }

    /// Classify a smoothed value against this band
    pub fn classify(&self, value: i32, polarity: Polarity) -> Classification {
        match polarity {
            Polarity::Inverted => {
                if value <= self.high_trip - self.hysteresis {
                    Classification::Above
                } else if value >= self.low_trip + self.hysteresis {
                    Classification::Below
                } else {
                    Classification::Normal
                }
            }
            Polarity::Direct => {
                if value <= self.low_trip - self.hysteresis {
                    Classification::Below
                } else if value >= self.high_trip + self.hysteresis {
                    Classification::Above
                } else {
                    Classification::Normal
                }
            }
        }
    }
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self::new(650, 350, 20, ADC_MAX)
    }
}

/// Exponential smoothing followed by hysteresis-banded classification
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    signal: SmoothedSignal,
    band: ThresholdBand,
    polarity: Polarity,
    adc_max: u16,
    state: Classification,
}

impl ThresholdClassifier {
    /// Create a classifier; `band` is re-clamped against `ADC_MAX`
    pub fn new(alpha: f32, band: ThresholdBand, polarity: Polarity) -> Self {
        Self::with_range(alpha, band, polarity, ADC_MAX)
    }

    /// Create a classifier for a sensor whose full-scale value is `adc_max`
    pub fn with_range(alpha: f32, band: ThresholdBand, polarity: Polarity, adc_max: u16) -> Self {
        Self {
            signal: SmoothedSignal::new(alpha),
            band: ThresholdBand::new(band.low_trip, band.high_trip, band.hysteresis, adc_max),
            polarity,
            adc_max,
            state: Classification::Normal,
        }
    }

    pub fn from_config(config: &LightConfig) -> Self {
        let band = ThresholdBand::new(
            config.low_trip,
            config.high_trip,
            config.hysteresis,
            config.adc_max,
        );
        Self::with_range(config.alpha, band, config.polarity, config.adc_max)
    }

    /// Fold `raw` into the average and classify the smoothed value
    pub fn update(&mut self, raw: u16) -> Classification {
        let smoothed = self.signal.update(raw.min(self.adc_max));
        let next = self.band.classify(smoothed as i32, self.polarity);

        if next != self.state {
            tracing::debug!(
                "[Classifier] {:?} -> {:?} (raw={}, smoothed={:.1})",
                self.state,
                next,
                raw,
                smoothed
            );
        }

        self.state = next;
        next
    }

    /// Seed the filter with a first reading (no classification)
    pub fn seed(&mut self, raw: u16) {
        self.signal.reseed(raw.min(self.adc_max));
    }

    /// Set trip points and hysteresis in raw units; out-of-range values are clamped
    pub fn set_thresholds(&mut self, low_trip: i32, high_trip: i32, hysteresis: i32) {
        self.band = ThresholdBand::new(low_trip, high_trip, hysteresis, self.adc_max);
    }

    pub fn set_band(&mut self, band: ThresholdBand) {
        self.set_thresholds(band.low_trip, band.high_trip, band.hysteresis);
    }

    /// Set the smoothing factor, clamped into [0, 1]
    pub fn set_alpha(&mut self, alpha: f32) {
        self.signal.set_alpha(alpha);
    }

    /// Install a freshly calibrated band, reseed the filter and return to `Normal`
    pub fn apply_calibration(&mut self, band: ThresholdBand, reseed_raw: u16) {
        self.set_band(band);
        self.signal.reseed(reseed_raw.min(self.adc_max));
        self.state = Classification::Normal;
    }

    pub fn state(&self) -> Classification {
        self.state
    }

    pub fn signal(&self) -> &SmoothedSignal {
        &self.signal
    }

    pub fn band(&self) -> ThresholdBand {
        self.band
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn adc_max(&self) -> u16 {
        self.adc_max
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::from_config(&LightConfig::default())
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
