// RangeCalibrator - derive a threshold band from an observed signal range
//
// The calibrator samples the raw signal for a fixed window while the user
// sweeps the sensor (dark -> bright -> normal for the light sensor) and
// keeps the running minimum and maximum. The comfort band is the middle 40%
// of the observed span:
//
//   span   = max(max - min, 10)
//   edge30 = min + trunc(0.30 * span)
//   edge70 = min + trunc(0.70 * span)
//   hyst   = max(5, span / 25)
//
// The sweep is blocking: it owns the calling context until the window has
// elapsed on the supplied clock.

use std::time::Duration;

use crate::conditioning::classifier::{Polarity, ThresholdBand};
use crate::hal::{AnalogInput, Clock};

/// Spans narrower than this are widened to avoid a zero-width band
pub const MIN_SPAN: i32 = 10;

/// Hysteresis never drops below this many raw units
pub const MIN_HYSTERESIS: i32 = 5;

/// Running minimum and maximum of a raw signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSweep {
    min: u16,
    max: u16,
    samples: usize,
}

impl RangeSweep {
    pub fn new() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
            samples: 0,
        }
    }

    pub fn observe(&mut self, raw: u16) {
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
        self.samples += 1;
    }

    pub fn min(&self) -> Option<u16> {
        (self.samples > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<u16> {
        (self.samples > 0).then_some(self.max)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Observed span with the minimum-width guard applied
    pub fn span(&self) -> Option<i32> {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) => Some((max as i32 - min as i32).max(MIN_SPAN)),
            _ => None,
        }
    }

    /// Derive the comfort band from what has been observed so far
    pub fn derive(&self) -> Option<CalibratedBand> {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) => Some(CalibratedBand::from_range(min, max)),
            _ => None,
        }
    }
}

impl Default for RangeSweep {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a calibration sweep, independent of polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalibratedBand {
    /// Lower edge of the comfort band (30% of span)
    pub edge30: i32,
    /// Upper edge of the comfort band (70% of span)
    pub edge70: i32,
    pub hysteresis: i32,
    pub observed_min: u16,
    pub observed_max: u16,
}

impl CalibratedBand {
    pub fn from_range(min: u16, max: u16) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let span = (max as i32 - min as i32).max(MIN_SPAN);

        Self {
            edge30: min as i32 + (0.30 * span as f32) as i32,
            edge70: min as i32 + (0.70 * span as f32) as i32,
            hysteresis: MIN_HYSTERESIS.max(span / 25),
            observed_min: min,
            observed_max: max,
        }
    }

    /// Span used for the derivation, after the minimum-width guard
    pub fn span(&self) -> i32 {
        (self.observed_max as i32 - self.observed_min as i32).max(MIN_SPAN)
    }

    /// Map the edges onto trip points for the given polarity
    ///
    /// Inverted: readings at or below edge30 are `Above`, so it becomes
    /// `high_trip`; edge70 becomes `low_trip`. Direct is the mirror image.
    pub fn to_band(&self, polarity: Polarity, adc_max: u16) -> ThresholdBand {
        match polarity {
            Polarity::Inverted => {
                ThresholdBand::new(self.edge70, self.edge30, self.hysteresis, adc_max)
            }
            Polarity::Direct => {
                ThresholdBand::new(self.edge30, self.edge70, self.hysteresis, adc_max)
            }
        }
    }
}

/// Blocking min/max sweep over a time window
#[derive(Debug, Clone, Copy)]
pub struct RangeCalibrator {
    window: Duration,
    interval: Duration,
}

impl RangeCalibrator {
    /// # Arguments
    /// * `window` - Total sweep duration
    /// * `interval` - Delay between reads (hint; the deadline is what bounds the sweep)
    pub fn new(window: Duration, interval: Duration) -> Self {
        Self { window, interval }
    }

    /// Sweep `input` until `window` has elapsed on `clock`
    ///
    /// At least one sample is always taken, so a zero window still yields a
    /// valid band.
    pub fn sweep<A, C>(&self, input: &mut A, clock: &C) -> RangeSweep
    where
        A: AnalogInput + ?Sized,
        C: Clock + ?Sized,
    {
        let mut sweep = RangeSweep::new();
        let start = clock.now();

        loop {
            sweep.observe(input.read_raw());
            if clock.now().duration_since(start) >= self.window {
                break;
            }
            clock.sleep(self.interval);
            if clock.now().duration_since(start) >= self.window {
                break;
            }
        }

        sweep
    }

    /// Run the sweep and derive the comfort band
    pub fn calibrate<A, C>(&self, input: &mut A, clock: &C) -> CalibratedBand
    where
        A: AnalogInput + ?Sized,
        C: Clock + ?Sized,
    {
        let sweep = self.sweep(input, clock);
        // sweep() always observes at least once
        let band = sweep
            .derive()
            .unwrap_or_else(|| CalibratedBand::from_range(0, 0));

        tracing::info!(
            "[Calibration] {} samples over {:?}: min={} max={} edge30={} edge70={} hyst={}",
            sweep.samples(),
            self.window,
            band.observed_min,
            band.observed_max,
            band.edge30,
            band.edge70,
            band.hysteresis
        );

        band
    }
}

impl Default for RangeCalibrator {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000), Duration::from_millis(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::{ScriptedAnalog, StubClock};
    use crate::hal::ADC_MAX;

    #[test]
    fn test_band_from_known_range() {
        let band = CalibratedBand::from_range(100, 600);
        assert_eq!(band.edge30, 250);
        assert_eq!(band.edge70, 450);
        assert_eq!(band.hysteresis, 20);
        assert_eq!(band.span(), 500);
    }

    #[test]
    fn test_degenerate_range_widened() {
        let band = CalibratedBand::from_range(500, 503);
        assert_eq!(band.span(), 10);
        assert_eq!(band.edge30, 503);
        assert_eq!(band.edge70, 507);
        assert_eq!(band.hysteresis, MIN_HYSTERESIS);
    }

    #[test]
    fn test_hysteresis_floor_and_scaling() {
        assert_eq!(CalibratedBand::from_range(0, 100).hysteresis, 5);
        assert_eq!(CalibratedBand::from_range(0, 1000).hysteresis, 40);
    }

    #[test]
    fn test_to_band_by_polarity() {
        let band = CalibratedBand::from_range(100, 600);

        let inverted = band.to_band(Polarity::Inverted, ADC_MAX);
        assert_eq!(inverted.high_trip, 250);
        assert_eq!(inverted.low_trip, 450);
        assert_eq!(inverted.hysteresis, 20);

        let direct = band.to_band(Polarity::Direct, ADC_MAX);
        assert_eq!(direct.low_trip, 250);
        assert_eq!(direct.high_trip, 450);
    }

    #[test]
    fn test_sweep_tracks_min_and_max() {
        let mut sweep = RangeSweep::new();
        assert!(sweep.derive().is_none());
        assert_eq!(sweep.span(), None);
        for v in [300, 120, 580, 600, 100, 450] {
            sweep.observe(v);
        }
        assert_eq!(sweep.min(), Some(100));
        assert_eq!(sweep.max(), Some(600));
        assert_eq!(sweep.samples(), 6);
        assert_eq!(sweep.span(), Some(500));
    }

    #[test]
    fn test_calibrate_runs_for_window() {
        let clock = StubClock::new();
        let mut input = ScriptedAnalog::new(vec![300, 100, 600, 350]);
        let calibrator =
            RangeCalibrator::new(Duration::from_millis(100), Duration::from_millis(10));

        let band = calibrator.calibrate(&mut input, &clock);

        assert_eq!(clock.elapsed(), Duration::from_millis(100));
        assert_eq!(input.reads(), 10);
        assert_eq!(band.observed_min, 100);
        assert_eq!(band.observed_max, 600);
        assert_eq!(band.edge30, 250);
        assert_eq!(band.edge70, 450);
    }

    #[test]
    fn test_zero_window_still_samples_once() {
        let clock = StubClock::new();
        let mut input = ScriptedAnalog::new(vec![512]);
        let calibrator = RangeCalibrator::new(Duration::ZERO, Duration::from_millis(10));

        let band = calibrator.calibrate(&mut input, &clock);

        assert_eq!(input.reads(), 1);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(band.observed_min, 512);
        assert_eq!(band.span(), MIN_SPAN);
    }
}
