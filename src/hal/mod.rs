//! Hardware abstractions consumed by the conditioning layer.
//!
//! Pin setup, bus drivers and wiring live outside this crate. Components only
//! see the narrow capabilities below, which keeps them testable against the
//! deterministic backend in [`sim`].

use std::thread;
use std::time::{Duration, Instant};

use crate::error::MeasurementError;

pub mod sim;

/// Full-scale value of a 10-bit ADC.
pub const ADC_MAX: u16 = 1023;

/// Single instantaneous analog reading in `[0, ADC_MAX]`.
pub trait AnalogInput {
    fn read_raw(&mut self) -> u16;
}

/// Blocking wait for a timed echo pulse, bounded by `timeout`.
///
/// Implementations return [`MeasurementError::Timeout`] when nothing arrives
/// in time. The distance sampler also treats a zero-length pulse as a timeout.
pub trait PulseInput {
    fn measure_pulse(&mut self, timeout: Duration) -> Result<Duration, MeasurementError>;
}

/// Tag reader returning the raw identity bytes seen this cycle, if any.
pub trait IdentityReader {
    fn read_identity(&mut self) -> Option<Vec<u8>>;
}

/// Monotonic time source plus blocking delay.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Default clock backed by `Instant::now` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<A: AnalogInput + ?Sized> AnalogInput for Box<A> {
    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}

impl<P: PulseInput + ?Sized> PulseInput for Box<P> {
    fn measure_pulse(&mut self, timeout: Duration) -> Result<Duration, MeasurementError> {
        (**self).measure_pulse(timeout)
    }
}

impl<R: IdentityReader + ?Sized> IdentityReader for Box<R> {
    fn read_identity(&mut self) -> Option<Vec<u8>> {
        (**self).read_identity()
    }
}
