//! Flight configuration. Everything has a default from [`crate::constants`], and
//! a JSON file can override any subset of it.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{FlightError, Result};

/// Thresholds driving the flight phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    pub launch_accel_threshold: f32,
    pub coast_accel_threshold: f32,
    pub pressure_drop_margin: f32,
    pub apogee_altitude_threshold: f32,
    pub apogee_altitude_tolerance: f32,
    pub apogee_accel_bound: f32,
    pub landing_accel_tolerance: f32,
    /// Diagnostic only: a rate of climb below this raises an apogee warning
    /// without touching the phase.
    pub apogee_rate_threshold: f32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            launch_accel_threshold: LAUNCH_ACCEL_THRESHOLD,
            coast_accel_threshold: COAST_ACCEL_THRESHOLD,
            pressure_drop_margin: PRESSURE_DROP_MARGIN,
            apogee_altitude_threshold: APOGEE_ALTITUDE_THRESHOLD,
            apogee_altitude_tolerance: APOGEE_ALTITUDE_TOLERANCE,
            apogee_accel_bound: APOGEE_ACCEL_BOUND,
            landing_accel_tolerance: LANDING_ACCEL_TOLERANCE,
            apogee_rate_threshold: APOGEE_RATE_THRESHOLD,
        }
    }
}

/// Tuning of the scalar altitude filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeFilterConfig {
    pub measurement_uncertainty: f32,
    pub estimate_uncertainty: f32,
    pub process_noise: f32,
}

impl Default for AltitudeFilterConfig {
    fn default() -> Self {
        Self {
            measurement_uncertainty: ALTITUDE_MEASUREMENT_UNCERTAINTY,
            estimate_uncertainty: ALTITUDE_ESTIMATE_UNCERTAINTY,
            process_noise: ALTITUDE_PROCESS_NOISE,
        }
    }
}

/// Dead-reckoning heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub noise_threshold: f32,
    pub motion_threshold: f32,
    pub drag_factor: f32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            noise_threshold: ACCEL_NOISE_THRESHOLD,
            motion_threshold: MOTION_THRESHOLD,
            drag_factor: DRAG_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    pub i2c_path: String,
    /// Use 0x28 instead of the default 0x29.
    pub use_alternative_address: bool,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            i2c_path: I2C_BUS.to_string(),
            use_alternative_address: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarometerConfig {
    pub i2c_path: String,
    pub address: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub serial_path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_status_decimation")]
    pub status_decimation: u32,
}

fn default_baud_rate() -> u32 {
    TELEMETRY_BAUD_RATE
}

fn default_status_decimation() -> u32 {
    STATUS_DECIMATION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub thresholds: PhaseThresholds,
    pub altitude_filter: AltitudeFilterConfig,
    pub integrator: IntegratorConfig,
    pub tick_period_ms: u64,
    pub sea_level_hpa: f32,
    /// Index of the sensor axis pointing along the airframe's long axis.
    pub vertical_axis: usize,
    pub calibration_samples: usize,
    pub imu: ImuConfig,
    /// Redundant barometers in priority order.
    pub barometers: Vec<BarometerConfig>,
    pub telemetry: Option<TelemetryConfig>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            thresholds: PhaseThresholds::default(),
            altitude_filter: AltitudeFilterConfig::default(),
            integrator: IntegratorConfig::default(),
            tick_period_ms: TICK_PERIOD_MS,
            sea_level_hpa: SEA_LEVEL_PRESSURE_HPA,
            vertical_axis: 2,
            calibration_samples: CALIBRATION_SAMPLES,
            imu: ImuConfig::default(),
            barometers: vec![
                BarometerConfig {
                    i2c_path: I2C_BUS.to_string(),
                    address: BMP_PRIMARY_ADDRESS,
                },
                BarometerConfig {
                    i2c_path: I2C_BUS.to_string(),
                    address: BMP_SECONDARY_ADDRESS,
                },
            ],
            telemetry: Some(TelemetryConfig {
                serial_path: "/dev/ttyS0".to_string(),
                baud_rate: TELEMETRY_BAUD_RATE,
                status_decimation: STATUS_DECIMATION,
            }),
        }
    }
}

impl FlightConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: FlightConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Rejects anything we would not want to fly with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        // The launch and coast thresholds are signed accelerations; the rest are
        // magnitudes and must not be negative.
        finite("launch_accel_threshold", t.launch_accel_threshold)?;
        finite("coast_accel_threshold", t.coast_accel_threshold)?;
        finite("apogee_altitude_threshold", t.apogee_altitude_threshold)?;
        non_negative("pressure_drop_margin", t.pressure_drop_margin)?;
        non_negative("apogee_altitude_tolerance", t.apogee_altitude_tolerance)?;
        non_negative("apogee_accel_bound", t.apogee_accel_bound)?;
        non_negative("landing_accel_tolerance", t.landing_accel_tolerance)?;
        finite("apogee_rate_threshold", t.apogee_rate_threshold)?;
        if t.apogee_rate_threshold > 0.0 {
            return Err(FlightError::Configuration(format!(
                "apogee_rate_threshold must not be positive, got {}",
                t.apogee_rate_threshold
            )));
        }

        let f = &self.altitude_filter;
        positive("measurement_uncertainty", f.measurement_uncertainty)?;
        positive("estimate_uncertainty", f.estimate_uncertainty)?;
        positive("process_noise", f.process_noise)?;

        let i = &self.integrator;
        non_negative("noise_threshold", i.noise_threshold)?;
        non_negative("motion_threshold", i.motion_threshold)?;
        if !(i.drag_factor > 0.0 && i.drag_factor < 1.0) {
            return Err(FlightError::Configuration(format!(
                "drag_factor must be in (0, 1), got {}",
                i.drag_factor
            )));
        }

        positive("sea_level_hpa", self.sea_level_hpa)?;
        if self.tick_period_ms == 0 {
            return Err(FlightError::Configuration(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.vertical_axis > 2 {
            return Err(FlightError::Configuration(format!(
                "vertical_axis must be 0, 1 or 2, got {}",
                self.vertical_axis
            )));
        }
        if self.calibration_samples == 0 {
            return Err(FlightError::Configuration(
                "calibration_samples must be greater than zero".to_string(),
            ));
        }
        if self.barometers.is_empty() {
            return Err(FlightError::Configuration(
                "at least one barometer must be configured".to_string(),
            ));
        }
        if let Some(telemetry) = &self.telemetry {
            if telemetry.status_decimation == 0 {
                return Err(FlightError::Configuration(
                    "status_decimation must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FlightError::Configuration(format!("{name} is not a finite number")))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(FlightError::Configuration(format!(
            "{name} must not be negative, got {value}"
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f32) -> Result<()> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(FlightError::Configuration(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FlightConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut config = FlightConfig::default();
        config.thresholds.landing_accel_tolerance = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FlightError::Configuration(_)));
        assert!(err.to_string().contains("landing_accel_tolerance"));
    }

    #[test]
    fn drag_factor_must_be_a_decay() {
        let mut config = FlightConfig::default();
        config.integrator.drag_factor = 1.2;
        assert!(config.validate().is_err());
        config.integrator.drag_factor = 0.0;
        assert!(config.validate().is_err());
        config.integrator.drag_factor = 1.0;
        assert!(config.validate().is_err());
        config.integrator.drag_factor = 0.999;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_barometer_list_is_rejected() {
        let mut config = FlightConfig::default();
        config.barometers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "thresholds": { "apogee_altitude_threshold": 450.0 },
            "tick_period_ms": 50,
            "telemetry": null
        }"#;
        let config: FlightConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.thresholds.apogee_altitude_threshold, 450.0);
        assert_eq!(config.thresholds.launch_accel_threshold, LAUNCH_ACCEL_THRESHOLD);
        assert_eq!(config.tick_period(), Duration::from_millis(50));
        assert_eq!(config.barometers.len(), 2);
        assert!(config.telemetry.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn accel_bounds_sit_above_one_g() {
        // Baseline-removed acceleration in free fall is -1 g; the apogee guard
        // has to accept it.
        let t = PhaseThresholds::default();
        assert!(t.apogee_accel_bound > GRAVITY);
        assert!(t.landing_accel_tolerance > 0.0);
    }

    #[test]
    fn positive_apogee_rate_threshold_is_rejected() {
        let mut config = FlightConfig::default();
        config.thresholds.apogee_rate_threshold = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn vertical_axis_out_of_range() {
        let mut config = FlightConfig::default();
        config.vertical_axis = 3;
        assert!(config.validate().is_err());
    }
}
