//! Barometric pressure sources and the redundant bank we poll them through.

use bmp280::{Bmp280, Bmp280Builder};
use tracing::{debug, info, warn};

use crate::config::BarometerConfig;
use crate::error::FlightError;

/// Pressures outside this window (hPa) are treated as a bad read.
const VALID_PRESSURE_HPA: std::ops::RangeInclusive<f32> = 1.0..=1200.0;

pub trait BarometricSource {
    /// Static pressure in hPa, or `None` if the sensor had nothing usable.
    fn read_pressure_hpa(&mut self) -> Option<f32>;
    /// Human readable identifier for logs.
    fn name(&self) -> String;
}

pub struct Bmp280Barometer {
    sensor: Bmp280,
    config: BarometerConfig,
}

impl Bmp280Barometer {
    pub fn new(config: &BarometerConfig) -> Result<Self, FlightError> {
        let sensor = Bmp280Builder::new()
            .path(config.i2c_path.as_str())
            .address(config.address)
            .build()
            .map_err(|e| {
                FlightError::Initialization(format!(
                    "BMP280 at {}:0x{:02X} not found: {e:?}",
                    config.i2c_path, config.address
                ))
            })?;
        Ok(Self {
            sensor,
            config: config.clone(),
        })
    }
}

impl BarometricSource for Bmp280Barometer {
    fn read_pressure_hpa(&mut self) -> Option<f32> {
        match self.sensor.pressure_kpa() {
            Ok(kpa) => Some(kpa * 10.0),
            Err(e) => {
                debug!("Failed to read pressure from {}: {e:?}", self.name());
                None
            }
        }
    }

    fn name(&self) -> String {
        format!("BMP280@0x{:02X}", self.config.address)
    }
}

/// Redundant barometers polled in priority order. The first sensor giving a
/// valid reading wins the tick.
pub struct BarometerBank {
    sources: Vec<Box<dyn BarometricSource>>,
}

impl BarometerBank {
    pub fn new(sources: Vec<Box<dyn BarometricSource>>) -> Self {
        BarometerBank { sources }
    }

    /// Brings up every configured BMP280. Missing sensors are reported and skipped;
    /// only an empty bank is fatal.
    pub fn connect(configs: &[BarometerConfig]) -> Result<Self, FlightError> {
        let mut sources: Vec<Box<dyn BarometricSource>> = Vec::new();
        for config in configs {
            match Bmp280Barometer::new(config) {
                Ok(baro) => {
                    info!("{} initialized on {}", baro.name(), config.i2c_path);
                    sources.push(Box::new(baro));
                }
                Err(e) => warn!("{e}"),
            }
        }

        if sources.is_empty() {
            return Err(FlightError::Initialization(
                "no barometric sensor responded, check wiring".to_string(),
            ));
        }
        Ok(Self::new(sources))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the first valid pressure, or `None` if every source is gapped.
    pub fn read_pressure_hpa(&mut self) -> Option<f32> {
        let reading = self.sources.iter_mut().find_map(|source| {
            source
                .read_pressure_hpa()
                .filter(|p| p.is_finite() && VALID_PRESSURE_HPA.contains(p))
        });
        if reading.is_none() {
            warn!("Failed to read pressure from all barometers");
        }
        reading
    }
}
