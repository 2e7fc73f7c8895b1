use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use baro_flight::airbrake::Airbrake;
use baro_flight::barometer::BarometerBank;
use baro_flight::calibration::Calibration;
use baro_flight::imu::Bno055Imu;
use baro_flight::transmitter::{LogSink, TelemetrySink, Transmitter};
use baro_flight::{FlightComputer, FlightConfig};

/// Onboard flight computer: sensor fusion and flight phase tracking.
#[derive(Parser, Debug)]
#[command(name = "baro-flight")]
#[command(version)]
struct Args {
    /// JSON configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Validate the configuration and exit without touching hardware
    #[arg(long)]
    check_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => FlightConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            let config = FlightConfig::default();
            config.validate().context("built-in configuration")?;
            config
        }
    };

    if args.check_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    // Sensor bring-up. Either failing here halts us on the pad.
    let mut imu = Bno055Imu::new(&config.imu).context("inertial sensor")?;
    let barometers = BarometerBank::connect(&config.barometers).context("barometric sensors")?;
    info!("{} of {} barometers online", barometers.len(), config.barometers.len());

    info!("Calibrating, keep the vehicle still...");
    let calibration = Calibration::capture(&mut imu, config.calibration_samples, config.tick_period())
        .context("accelerometer calibration")?;

    let telemetry: Box<dyn TelemetrySink> = match &config.telemetry {
        Some(t) => match Transmitter::new(&t.serial_path, t.baud_rate) {
            Ok(transmitter) => Box::new(transmitter),
            Err(e) => {
                warn!("{e}; telemetry goes to the log only");
                Box::new(LogSink)
            }
        },
        None => Box::new(LogSink),
    };

    let mut computer = FlightComputer::new(&config, calibration, Box::new(imu), barometers, telemetry);
    computer.add_actuator(Box::new(Airbrake::new()));
    computer.run()
}
