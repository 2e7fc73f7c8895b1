//! Bench check: brings up the IMU and every configured barometer and prints
//! what they report, without running the flight loop.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use baro_flight::FlightConfig;
use baro_flight::altitude::pressure_to_altitude;
use baro_flight::barometer::{BarometricSource, Bmp280Barometer};
use baro_flight::imu::{Bno055Imu, InertialSource};

#[derive(Parser, Debug)]
#[command(name = "sensor_check")]
#[command(about = "Print raw IMU and barometer readings")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to poll for, in seconds
    #[arg(short, long, default_value = "10")]
    seconds: u64,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "50")]
    interval_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FlightConfig::load(path).context("loading configuration")?,
        None => FlightConfig::default(),
    };

    let mut imu = Bno055Imu::new(&config.imu).context("inertial sensor")?;
    // Unlike the flight binary we want to know about each barometer separately.
    let mut barometers = Vec::new();
    for baro_config in &config.barometers {
        match Bmp280Barometer::new(baro_config) {
            Ok(baro) => barometers.push(baro),
            Err(e) => warn!("{e}"),
        }
    }
    info!("{} barometers responding", barometers.len());

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        match imu.read_acceleration() {
            Ok(a) => println!("Accel: {:.3} {:.3} {:.3} m/s^2", a[0], a[1], a[2]),
            Err(e) => warn!("Error reading acceleration: {e}"),
        }
        match imu.read_angular_rate() {
            Ok(g) => println!("Gyro: {:.3} {:.3} {:.3} deg/s", g[0], g[1], g[2]),
            Err(e) => warn!("Error reading angular rate: {e}"),
        }
        for baro in barometers.iter_mut() {
            match baro.read_pressure_hpa() {
                Some(p) => println!(
                    "{}: {:.2} hPa, {:.1} m",
                    baro.name(),
                    p,
                    pressure_to_altitude(p, config.sea_level_hpa)
                ),
                None => warn!("{}: read/write error", baro.name()),
            }
        }
        println!();
        thread::sleep(Duration::from_millis(args.interval_ms));
    }
    Ok(())
}
