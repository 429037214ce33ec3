// DeskController: host polling loop for the desk sensors
//
// Owns one of each conditioning component and advances every one of them
// exactly once per `poll()`. Components never see each other; the only
// cross-component step is the light calibration, which runs on demand
// before steady-state polling.

use serde::{Deserialize, Serialize};

use crate::conditioning::{
    CalibratedBand, Classification, DistanceSampler, LightSensor, PresenceEvent, SoundLevel,
    TagToggle,
};
use crate::config::AppConfig;
use crate::error::ErrorCode;
use crate::hal::{AnalogInput, Clock, IdentityReader, PulseInput};

/// Hardware capabilities the controller is built from
pub struct DeskInputs {
    pub light: Box<dyn AnalogInput>,
    pub pulse: Box<dyn PulseInput>,
    pub tag_reader: Box<dyn IdentityReader>,
    pub microphone: Box<dyn AnalogInput>,
}

/// Stable outputs of one polling cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskSnapshot {
    /// Cycle number, starting at 1
    pub cycle: u64,
    pub light: Classification,
    pub raw_light: u16,
    pub smoothed_light: f32,
    /// Median distance; `None` when no echo came back
    pub distance_cm: Option<f32>,
    /// Error code of a failed distance measurement
    pub distance_error: Option<i32>,
    pub study_mode: bool,
    pub tag_present: bool,
    pub sound_level: u16,
}

/// Single-threaded owner of all desk sensor components
pub struct DeskController<C> {
    clock: C,
    config: AppConfig,
    light: LightSensor<Box<dyn AnalogInput>>,
    distance: DistanceSampler<Box<dyn PulseInput>, C>,
    presence: TagToggle<Box<dyn IdentityReader>, C>,
    sound: SoundLevel<Box<dyn AnalogInput>>,
    cycle: u64,
}

impl<C: Clock + Clone> DeskController<C> {
    /// Build every component from `config` and seed the light smoother
    pub fn new(inputs: DeskInputs, clock: C, config: AppConfig) -> Self {
        let mut light = LightSensor::from_config(inputs.light, &config.light);
        light.begin();

        Self {
            distance: DistanceSampler::new(inputs.pulse, clock.clone(), config.distance.clone()),
            presence: TagToggle::from_config(inputs.tag_reader, clock.clone(), &config.presence),
            sound: SoundLevel::from_config(inputs.microphone, &config.sound),
            light,
            clock,
            config,
            cycle: 0,
        }
    }

    /// Run the light calibration sweep with the configured window
    pub fn calibrate_light(&mut self) -> CalibratedBand {
        let window = self.config.light.calibration_window();
        let interval = self.config.light.calibration_interval();
        self.light.auto_calibrate(&self.clock, window, interval)
    }

    /// Advance every component once and report their outputs
    pub fn poll(&mut self) -> DeskSnapshot {
        self.cycle += 1;

        let light = self.light.update();

        let (distance_cm, distance_error) = match self.distance.measure_default() {
            Ok(cm) => (Some(cm), None),
            Err(err) => {
                tracing::debug!("[Controller] cycle {}: {}", self.cycle, err);
                (None, Some(err.code()))
            }
        };

        if let Some(event) = self.presence.update() {
            match event {
                PresenceEvent::Arrived { state } | PresenceEvent::Removed { state } => {
                    tracing::info!(
                        "[Controller] cycle {}: study mode {}",
                        self.cycle,
                        if state { "ON" } else { "OFF" }
                    );
                }
            }
        }

        let sound_level = self.sound.read_average();
        let signal = self.light.classifier().signal();

        DeskSnapshot {
            cycle: self.cycle,
            light,
            raw_light: signal.raw(),
            smoothed_light: signal.smoothed(),
            distance_cm,
            distance_error,
            study_mode: self.presence.current_state(),
            tag_present: self.presence.toggle().is_present(),
            sound_level,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn light(&self) -> &LightSensor<Box<dyn AnalogInput>> {
        &self.light
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeasurementErrorCodes;
    use crate::hal::sim::{ScriptedAnalog, ScriptedIdentity, ScriptedPulse, StubClock};

    fn create_controller(pulse: ScriptedPulse, tags: ScriptedIdentity) -> DeskController<StubClock> {
        let inputs = DeskInputs {
            light: Box::new(ScriptedAnalog::new(vec![500])),
            pulse: Box::new(pulse),
            tag_reader: Box::new(tags),
            microphone: Box::new(ScriptedAnalog::new(vec![42])),
        };
        DeskController::new(inputs, StubClock::new(), AppConfig::default())
    }

    #[test]
    fn test_poll_reports_every_component() {
        let mut controller = create_controller(
            ScriptedPulse::from_micros(&[1000; 5]),
            ScriptedIdentity::new(vec![Some(vec![0xDE, 0xAD, 0xBE, 0xEF])]),
        );

        let snapshot = controller.poll();

        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.light, Classification::Normal);
        assert_eq!(snapshot.raw_light, 500);
        assert!((snapshot.distance_cm.unwrap() - 17.15).abs() < 1e-3);
        assert_eq!(snapshot.distance_error, None);
        assert!(snapshot.study_mode);
        assert!(snapshot.tag_present);
        assert_eq!(snapshot.sound_level, 42);
    }

    #[test]
    fn test_failed_distance_is_none_not_zero() {
        let mut controller =
            create_controller(ScriptedPulse::new(vec![]), ScriptedIdentity::new(vec![]));

        let snapshot = controller.poll();

        assert_eq!(snapshot.distance_cm, None);
        assert_eq!(snapshot.distance_error, Some(MeasurementErrorCodes::NO_ECHO));
        assert!(!snapshot.study_mode);
    }

    #[test]
    fn test_snapshot_json_fields() {
        let mut controller =
            create_controller(ScriptedPulse::new(vec![]), ScriptedIdentity::new(vec![]));
        let json = serde_json::to_value(controller.poll()).unwrap();
        assert!(json["distance_cm"].is_null());
        assert_eq!(json["distance_error"], MeasurementErrorCodes::NO_ECHO);
        assert_eq!(json["light"], "normal");
        assert_eq!(json["cycle"], 1);
        assert_eq!(json["raw_light"], 500);
        assert!((json["smoothed_light"].as_f64().unwrap() - 500.0).abs() < 1e-3);
        assert_eq!(json["tag_present"], false);
    }
}
