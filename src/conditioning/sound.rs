// SoundLevel - microphone level reader
//
// Each instance owns its analog input, so several microphones can coexist
// without sharing any process-wide pin state.

use crate::config::SoundConfig;
use crate::hal::AnalogInput;

/// Raw and averaged microphone level
pub struct SoundLevel<A> {
    input: A,
    average_count: u16,
}

impl<A: AnalogInput> SoundLevel<A> {
    /// # Arguments
    /// * `input` - Analog input wired to the microphone
    /// * `average_count` - Reads per averaged level (minimum 1)
    pub fn new(input: A, average_count: u16) -> Self {
        Self {
            input,
            average_count: average_count.max(1),
        }
    }

    pub fn from_config(input: A, config: &SoundConfig) -> Self {
        Self::new(input, config.average_count)
    }

    /// Single instantaneous reading
    pub fn read_raw(&mut self) -> u16 {
        self.input.read_raw()
    }

    /// Integer mean of `average_count` back-to-back readings
    pub fn read_average(&mut self) -> u16 {
        let sum: u32 = (0..self.average_count)
            .map(|_| self.input.read_raw() as u32)
            .sum();
        (sum / self.average_count as u32) as u16
    }

    pub fn average_count(&self) -> u16 {
        self.average_count
    }
}
