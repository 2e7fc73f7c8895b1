//! Inertial measurement: the raw per-tick sample and the accelerometer/gyro source.

use std::time::Duration;

use bno055::{BNO055OperationMode, Bno055};
use linux_embedded_hal::{Delay, I2cdev};
use tracing::{info, warn};

use crate::config::ImuConfig;
use crate::error::{FlightError, SensorError};

/// Three sensor axes, (x, y, z).
pub type Vec3 = [f32; 3];

/// One tick worth of raw readings. Any field may be missing if that sensor had
/// nothing fresh to give us this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    /// Time since the loop started.
    pub timestamp: Duration,
    pub accel: Option<Vec3>, // m/s^2, gravity included
    pub gyro: Option<Vec3>,  // deg/s
    pub pressure_hpa: Option<f32>,
}

/// Anything that can give us acceleration and angular rate.
pub trait InertialSource {
    /// Acceleration in m/s^2 on each sensor axis.
    fn read_acceleration(&mut self) -> Result<Vec3, SensorError>;
    /// Angular rate in deg/s on each sensor axis.
    fn read_angular_rate(&mut self) -> Result<Vec3, SensorError>;
}

/// BNO055 running in raw accel/mag/gyro mode over Linux I2C.
pub struct Bno055Imu {
    sensor: Bno055<I2cdev>,
}

impl Bno055Imu {
    /// Brings up the BNO055. A missing IMU is fatal; we never fly blind.
    pub fn new(config: &ImuConfig) -> Result<Self, FlightError> {
        let i2c = I2cdev::new(&config.i2c_path).map_err(|e| {
            FlightError::Initialization(format!("failed to open {}: {e:?}", config.i2c_path))
        })?;

        let mut sensor = Bno055::new(i2c);
        if config.use_alternative_address {
            sensor = sensor.with_alternative_address();
        }

        let mut delay = Delay;
        sensor
            .init(&mut delay)
            .map_err(|e| FlightError::Initialization(format!("BNO055 init failed: {e:?}")))?;
        // AMG gives us the raw sensors; we do our own fusion.
        sensor
            .set_mode(BNO055OperationMode::AMG, &mut delay)
            .map_err(|e| FlightError::Initialization(format!("BNO055 mode switch failed: {e:?}")))?;

        info!(path = %config.i2c_path, "BNO055 initialized");
        Ok(Self { sensor })
    }
}

impl InertialSource for Bno055Imu {
    fn read_acceleration(&mut self) -> Result<Vec3, SensorError> {
        let accel = self
            .sensor
            .accel_data()
            .map_err(|e| SensorError::Bus(format!("{e:?}")))?;
        Ok([accel.x, accel.y, accel.z])
    }

    fn read_angular_rate(&mut self) -> Result<Vec3, SensorError> {
        let gyro = self
            .sensor
            .gyro_data()
            .map_err(|e| SensorError::Bus(format!("{e:?}")))?;
        Ok([gyro.x, gyro.y, gyro.z])
    }
}

/// Reads both inertial channels. A failed read becomes `None` so the estimator
/// can hold its previous value instead of integrating a zero.
pub fn read_inertial(source: &mut dyn InertialSource) -> (Option<Vec3>, Option<Vec3>) {
    let accel = match source.read_acceleration() {
        Ok(accel) => Some(accel),
        Err(e) => {
            warn!("Failed to read acceleration: {e}");
            None
        }
    };
    let gyro = match source.read_angular_rate() {
        Ok(gyro) => Some(gyro),
        Err(e) => {
            warn!("Failed to read angular rate: {e}");
            None
        }
    };
    (accel, gyro)
}
