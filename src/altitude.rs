//! Barometric altitude and rate of climb.

use crate::config::AltitudeFilterConfig;

/// International barometric formula, altitude in meters.
pub fn pressure_to_altitude(pressure_hpa: f32, sea_level_hpa: f32) -> f32 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(0.1903))
}

/// One-dimensional recursive filter in predict/update form. The estimate
/// uncertainty is inflated by how far the last update moved the estimate,
/// scaled by the process noise, so a higher process noise tracks steps faster.
#[derive(Clone, Debug)]
pub struct AltitudeFilter {
    measurement_uncertainty: f32,
    estimate_uncertainty: f32,
    process_noise: f32,
    estimate: Option<f32>,
}

impl AltitudeFilter {
    pub fn new(config: &AltitudeFilterConfig) -> Self {
        AltitudeFilter {
            measurement_uncertainty: config.measurement_uncertainty,
            estimate_uncertainty: config.estimate_uncertainty,
            process_noise: config.process_noise,
            estimate: None,
        }
    }

    pub fn update(&mut self, measurement: f32) -> f32 {
        // First reading seeds the estimate; starting from zero would show up as
        // a huge bogus climb on the pad.
        let Some(last) = self.estimate else {
            self.estimate = Some(measurement);
            return measurement;
        };

        let gain = self.estimate_uncertainty / (self.estimate_uncertainty + self.measurement_uncertainty);
        let current = last + gain * (measurement - last);
        self.estimate_uncertainty =
            (1.0 - gain) * self.estimate_uncertainty + (last - current).abs() * self.process_noise;
        self.estimate = Some(current);
        current
    }

    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }
}

/// Smoothed barometric altitude plus a one-tick backward difference.
#[derive(Clone, Debug)]
pub struct AltitudeEstimator {
    filter: AltitudeFilter,
    altitude: f32,
}

impl AltitudeEstimator {
    pub fn new(config: &AltitudeFilterConfig) -> Self {
        AltitudeEstimator {
            filter: AltitudeFilter::new(config),
            altitude: 0.0,
        }
    }

    /// Returns `(altitude, rate_of_climb)`. The rate is per tick, not per second,
    /// and is left unsmoothed so apogee shows up as soon as possible.
    ///
    /// With no pressure this tick the previous altitude is held and the rate is
    /// zero; a gap must never look like a sudden drop.
    pub fn update(&mut self, pressure_hpa: Option<f32>, sea_level_hpa: f32) -> (f32, f32) {
        let Some(pressure) = pressure_hpa else {
            return (self.altitude, 0.0);
        };

        let raw = pressure_to_altitude(pressure, sea_level_hpa);
        let previous = self.filter.estimate();
        let altitude = self.filter.update(raw);
        let rate_of_climb = previous.map_or(0.0, |prev| altitude - prev);
        self.altitude = altitude;
        (altitude, rate_of_climb)
    }

    pub fn altitude(&self) -> f32 {
        self.altitude
    }
}
