// SmoothedSignal - exponential moving average over raw samples
//
// smoothed' = alpha * raw + (1 - alpha) * smoothed
//
// Lower alpha is smoother but slower to follow the signal; higher alpha is
// more reactive and noisier. Alpha is clamped to [0, 1] whenever it is set.

/// Exponentially smoothed view of a raw integer signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedSignal {
    raw: u16,
    smoothed: f32,
    alpha: f32,
}

impl SmoothedSignal {
    /// Create a signal starting at zero with the given smoothing factor
    pub fn new(alpha: f32) -> Self {
        Self {
            raw: 0,
            smoothed: 0.0,
            alpha: clamp_alpha(alpha),
        }
    }

    /// Set the smoothing factor, clamped into [0, 1]
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = clamp_alpha(alpha);
    }

    /// Fold one raw sample into the average and return the new smoothed value
    pub fn update(&mut self, raw: u16) -> f32 {
        self.raw = raw;
        self.smoothed = self.alpha * raw as f32 + (1.0 - self.alpha) * self.smoothed;
        self.smoothed
    }

    /// Restart the filter at `raw` so earlier history no longer biases it
    pub fn reseed(&mut self, raw: u16) {
        self.raw = raw;
        self.smoothed = raw as f32;
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for SmoothedSignal {
    fn default() -> Self {
        Self::new(0.20)
    }
}

// NaN has no meaningful position in [0, 1]; treat it as "hold".
fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_clamped_on_construction_and_set() {
        assert_eq!(SmoothedSignal::new(-0.5).alpha(), 0.0);
        assert_eq!(SmoothedSignal::new(3.0).alpha(), 1.0);
        assert_eq!(SmoothedSignal::new(f32::NAN).alpha(), 0.0);

        let mut signal = SmoothedSignal::new(0.2);
        for alpha in [-10.0, -0.01, 1.01, 42.0, f32::INFINITY, f32::NEG_INFINITY] {
            signal.set_alpha(alpha);
            assert!(
                (0.0..=1.0).contains(&signal.alpha()),
                "alpha {} stored as {}",
                alpha,
                signal.alpha()
            );
        }
    }

    #[test]
    fn test_update_applies_ema_formula() {
        let mut signal = SmoothedSignal::new(0.25);
        signal.reseed(100);
        let v = signal.update(200);
        assert!((v - 125.0).abs() < 1e-4);
        assert_eq!(signal.raw(), 200);
    }

    #[test]
    fn test_constant_input_converges_monotonically() {
        let mut signal = SmoothedSignal::new(0.2);
        signal.reseed(0);

        let mut prev_gap = f32::MAX;
        for _ in 0..100 {
            let v = signal.update(800);
            let gap = 800.0 - v;
            assert!(gap >= -1e-3, "overshoot: {}", v);
            assert!(gap <= prev_gap + 1e-3, "gap grew from {} to {}", prev_gap, gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 0.01);
    }

    #[test]
    fn test_alpha_extremes() {
        let mut hold = SmoothedSignal::new(0.0);
        hold.reseed(300);
        assert_eq!(hold.update(900), 300.0);

        let mut follow = SmoothedSignal::new(1.0);
        follow.reseed(300);
        assert_eq!(follow.update(900), 900.0);
    }

    #[test]
    fn test_reseed_resets_history() {
        let mut signal = SmoothedSignal::new(0.1);
        signal.update(1000);
        signal.reseed(42);
        assert_eq!(signal.smoothed(), 42.0);
        assert_eq!(signal.raw(), 42);
    }
}
