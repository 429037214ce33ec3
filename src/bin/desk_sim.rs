use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use desk_signals::conditioning::{CalibratedBand, DistanceSampler, RangeCalibrator};
use desk_signals::error::{log_measurement_error, ErrorCode};
use desk_signals::hal::sim::{NoisyAnalog, ScriptedIdentity, ScriptedPulse, StubClock};
use desk_signals::hal::Clock;
use desk_signals::{AppConfig, DeskController, DeskInputs, ThresholdBand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "desk_sim",
    about = "Deterministic simulator for the desk signal-conditioning layer"
)]
struct Cli {
    /// JSON configuration file (defaults are used when missing or invalid)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sweep a simulated light sensor and print the derived threshold band
    Calibrate {
        #[arg(long, default_value_t = 100)]
        low: u16,
        #[arg(long, default_value_t = 600)]
        high: u16,
        #[arg(long, default_value_t = 0)]
        noise: u16,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Poll the full controller against simulated sensors, one JSON line per cycle
    Run {
        #[arg(long, default_value_t = 20)]
        cycles: u64,
        #[arg(long, default_value_t = 100)]
        cycle_ms: u64,
        /// Run the light calibration sweep before polling
        #[arg(long)]
        calibrate: bool,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Median distance over explicit echo times in microseconds (0 = timeout)
    Distance {
        #[arg(long, value_delimiter = ',', required = true)]
        echo_us: Vec<u64>,
        #[arg(long)]
        samples: Option<u8>,
    },
    /// Print the effective configuration
    DumpConfig,
}

fn main() -> ExitCode {
    desk_signals::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Calibrate {
            low,
            high,
            noise,
            seed,
        } => run_calibrate(&config, low, high, noise, seed),
        Commands::Run {
            cycles,
            cycle_ms,
            calibrate,
            seed,
        } => run_controller(config, cycles, cycle_ms, calibrate, seed),
        Commands::Distance { echo_us, samples } => run_distance(&config, &echo_us, samples),
        Commands::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_calibrate(
    config: &AppConfig,
    low: u16,
    high: u16,
    noise: u16,
    seed: u64,
) -> Result<ExitCode> {
    let clock = StubClock::new();
    let interval = config.light.calibration_interval();
    let window = config.light.calibration_window();
    let period = (window.as_millis() / interval.as_millis().max(1)).max(2) as u32;
    let mut input = NoisyAnalog::sweeping(low, high, period, noise, seed);

    let calibrated = RangeCalibrator::new(window, interval).calibrate(&mut input, &clock);
    let band = calibrated.to_band(config.light.polarity, config.light.adc_max);

    let report = CalibrationReport {
        calibrated,
        band,
        elapsed_ms: clock.elapsed().as_millis() as u64,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_controller(
    config: AppConfig,
    cycles: u64,
    cycle_ms: u64,
    calibrate: bool,
    seed: u64,
) -> Result<ExitCode> {
    let mut rng = StdRng::seed_from_u64(seed);
    let attempts = cycles as usize * config.distance.samples.clamp(1, 15) as usize;
    let echoes = simulated_echoes(&mut rng, attempts);
    let tags = simulated_tags(&config.presence.authorized_uid, cycles);

    let clock = StubClock::new();
    let inputs = DeskInputs {
        light: Box::new(NoisyAnalog::sweeping(100, 900, 400, 15, rng.gen())),
        pulse: Box::new(ScriptedPulse::new(echoes)),
        tag_reader: Box::new(ScriptedIdentity::new(tags)),
        microphone: Box::new(NoisyAnalog::steady(300, 40, rng.gen())),
    };
    let mut controller = DeskController::new(inputs, clock.clone(), config);

    if calibrate {
        let band = controller.calibrate_light();
        eprintln!("{}", serde_json::to_string(&band)?);
    }

    let cycle = Duration::from_millis(cycle_ms);
    for _ in 0..cycles {
        let snapshot = controller.poll();
        println!(
            "{}",
            serde_json::to_string(&snapshot).context("serializing snapshot")?
        );
        clock.sleep(cycle);
    }

    Ok(ExitCode::from(0))
}

fn run_distance(config: &AppConfig, echo_us: &[u64], samples: Option<u8>) -> Result<ExitCode> {
    let clock = StubClock::new();
    let mut distance_config = config.distance.clone();
    distance_config.samples = samples.unwrap_or(echo_us.len().min(u8::MAX as usize) as u8);
    let mut sampler =
        DistanceSampler::new(ScriptedPulse::from_micros(echo_us), clock, distance_config);

    match sampler.measure_default() {
        Ok(cm) => {
            println!(
                "{}",
                serde_json::to_string(&DistanceReport {
                    distance_cm: Some(cm),
                    error_code: None
                })?
            );
            Ok(ExitCode::from(0))
        }
        Err(err) => {
            log_measurement_error(&err, "desk_sim distance");
            println!(
                "{}",
                serde_json::to_string(&DistanceReport {
                    distance_cm: None,
                    error_code: Some(err.code())
                })?
            );
            Ok(ExitCode::from(2))
        }
    }
}

/// Echoes around 60 cm with jitter, an occasional reflection outlier and ~10% timeouts
fn simulated_echoes(rng: &mut StdRng, attempts: usize) -> Vec<Option<Duration>> {
    (0..attempts)
        .map(|_| {
            let roll: f32 = rng.gen();
            if roll < 0.10 {
                None
            } else if roll < 0.15 {
                Some(Duration::from_micros(rng.gen_range(8_000..12_000)))
            } else {
                Some(Duration::from_micros(rng.gen_range(3_400..3_600)))
            }
        })
        .collect()
}

/// Tag rests on the reader for the second quarter of the run, read on alternate cycles
fn simulated_tags(uid: &[u8], cycles: u64) -> Vec<Option<Vec<u8>>> {
    let start = cycles / 4;
    let end = cycles / 2;
    (0..cycles)
        .map(|i| (i >= start && i < end && i % 2 == 0).then(|| uid.to_vec()))
        .collect()
}

#[derive(Serialize)]
struct CalibrationReport {
    calibrated: CalibratedBand,
    band: ThresholdBand,
    elapsed_ms: u64,
}

#[derive(Serialize)]
struct DistanceReport {
    distance_cm: Option<f32>,
    error_code: Option<i32>,
}
