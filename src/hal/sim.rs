//! Deterministic simulation backend used by tests and the `desk_sim` CLI.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{AnalogInput, Clock, IdentityReader, PulseInput, ADC_MAX};
use crate::error::MeasurementError;

/// Virtual clock for desktop runs.
///
/// `sleep` advances virtual time instead of blocking, so calibration windows
/// and removal timeouts run instantly. Clones share one timeline.
#[derive(Debug, Clone)]
pub struct StubClock {
    start: Instant,
    offset_us: Arc<AtomicU64>,
}

impl StubClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move virtual time forward without going through `sleep`.
    pub fn advance(&self, duration: Duration) {
        self.offset_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.offset_us.load(Ordering::SeqCst))
    }
}

impl Default for StubClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StubClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Replays a fixed list of raw samples; the last one repeats forever.
#[derive(Debug, Clone)]
pub struct ScriptedAnalog {
    samples: Vec<u16>,
    cursor: usize,
}

impl ScriptedAnalog {
    pub fn new(samples: Vec<u16>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.cursor
    }
}

impl AnalogInput for ScriptedAnalog {
    fn read_raw(&mut self) -> u16 {
        let value = match self.samples.get(self.cursor) {
            Some(v) => *v,
            None => self.samples.last().copied().unwrap_or(0),
        };
        self.cursor += 1;
        value.min(ADC_MAX)
    }
}

/// Replays echo durations; `None` entries and an exhausted script time out.
#[derive(Debug, Clone)]
pub struct ScriptedPulse {
    script: VecDeque<Option<Duration>>,
    attempts: usize,
}

impl ScriptedPulse {
    pub fn new(script: Vec<Option<Duration>>) -> Self {
        Self {
            script: script.into(),
            attempts: 0,
        }
    }

    /// Convenience constructor taking echo times in microseconds (0 = timeout).
    pub fn from_micros(script: &[u64]) -> Self {
        Self::new(
            script
                .iter()
                .map(|us| Some(Duration::from_micros(*us)))
                .collect(),
        )
    }

    /// Number of pulse measurements requested so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl PulseInput for ScriptedPulse {
    fn measure_pulse(&mut self, timeout: Duration) -> Result<Duration, MeasurementError> {
        self.attempts += 1;
        match self.script.pop_front().flatten() {
            Some(echo) if !echo.is_zero() && echo <= timeout => Ok(echo),
            _ => Err(MeasurementError::Timeout {
                timeout_us: timeout.as_micros() as u64,
            }),
        }
    }
}

/// Replays per-cycle tag reads; an exhausted script reads nothing.
#[derive(Debug, Clone)]
pub struct ScriptedIdentity {
    script: VecDeque<Option<Vec<u8>>>,
}

impl ScriptedIdentity {
    pub fn new(script: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl IdentityReader for ScriptedIdentity {
    fn read_identity(&mut self) -> Option<Vec<u8>> {
        self.script.pop_front().flatten()
    }
}

/// Analog source following a triangle sweep with uniform noise.
///
/// A steady source is a sweep whose bounds are equal.
#[derive(Debug, Clone)]
pub struct NoisyAnalog {
    low: u16,
    high: u16,
    period_reads: u32,
    noise: u16,
    step: u32,
    rng: StdRng,
}

impl NoisyAnalog {
    pub fn steady(level: u16, noise: u16, seed: u64) -> Self {
        Self::sweeping(level, level, 1, noise, seed)
    }

    pub fn sweeping(low: u16, high: u16, period_reads: u32, noise: u16, seed: u64) -> Self {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Self {
            low: low.min(ADC_MAX),
            high: high.min(ADC_MAX),
            period_reads: period_reads.max(2),
            noise,
            step: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn level(&self) -> f32 {
        let phase = (self.step % self.period_reads) as f32 / self.period_reads as f32;
        let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
        self.low as f32 + tri * (self.high - self.low) as f32
    }
}

impl AnalogInput for NoisyAnalog {
    fn read_raw(&mut self) -> u16 {
        let base = self.level();
        self.step = self.step.wrapping_add(1);
        let jitter = if self.noise == 0 {
            0
        } else {
            let n = self.noise as i32;
            self.rng.gen_range(-n..=n)
        };
        (base as i32 + jitter).clamp(0, ADC_MAX as i32) as u16
    }
}
