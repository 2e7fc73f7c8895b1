//! Sensor fusion for the rocket: runs the altitude estimator and the motion
//! integrator once per tick and keeps the resulting state for the next tick.

use std::time::Duration;

use crate::altitude::AltitudeEstimator;
use crate::calibration::Calibration;
use crate::config::FlightConfig;
use crate::imu::{RawSample, Vec3};
use crate::motion::{DeadReckoning, MotionIntegrator};

/// Fused estimate of the vehicle's motion. Each tick derives a new one from the
/// previous value and the new sample; nothing is ever revised backwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FusedState {
    pub timestamp: Duration,
    pub angles: Vec3, // degrees, open-loop gyro integration
    /// Baseline-removed, dead-zoned acceleration in m/s^2.
    pub acceleration: Vec3,
    pub velocity: Vec3,
    pub position: Vec3,
    pub altitude: f32,
    /// Meters per tick, positive going up.
    pub rate_of_climb: f32,
}

impl FusedState {
    pub fn vertical_acceleration(&self, axis: usize) -> f32 {
        self.acceleration[axis]
    }

    pub fn vertical_velocity(&self, axis: usize) -> f32 {
        self.velocity[axis]
    }
}

pub struct DataProcessor<M: MotionIntegrator = DeadReckoning> {
    altitude: AltitudeEstimator,
    motion: M,
    calibration: Calibration,
    sea_level_hpa: f32,
    tick_period: Duration,
    state: FusedState,
    last_timestamp: Option<Duration>,
    max_altitude: Option<f32>,
}

impl DataProcessor<DeadReckoning> {
    pub fn new(config: &FlightConfig, calibration: Calibration) -> Self {
        Self::with_integrator(config, calibration, DeadReckoning::new(&config.integrator))
    }
}

impl<M: MotionIntegrator> DataProcessor<M> {
    pub fn with_integrator(config: &FlightConfig, calibration: Calibration, motion: M) -> Self {
        DataProcessor {
            altitude: AltitudeEstimator::new(&config.altitude_filter),
            motion,
            calibration,
            sea_level_hpa: config.sea_level_hpa,
            tick_period: config.tick_period(),
            state: FusedState::default(),
            last_timestamp: None,
            max_altitude: None,
        }
    }

    /// Advances the estimate by one sample and returns the new state.
    pub fn update(&mut self, sample: &RawSample) -> &FusedState {
        let delta_t = self.delta_t(sample.timestamp);

        let mut next = self.motion.update(
            sample.accel,
            sample.gyro,
            delta_t,
            &self.state,
            &self.calibration,
        );

        let (altitude, rate_of_climb) = self.altitude.update(sample.pressure_hpa, self.sea_level_hpa);
        next.altitude = altitude;
        next.rate_of_climb = rate_of_climb;
        next.timestamp = sample.timestamp;

        if sample.pressure_hpa.is_some() {
            self.max_altitude = Some(self.max_altitude.map_or(altitude, |m| m.max(altitude)));
        }
        self.last_timestamp = Some(sample.timestamp);
        self.state = next;
        &self.state
    }

    pub fn state(&self) -> &FusedState {
        &self.state
    }

    /// Highest filtered altitude seen so far; `None` until the first pressure reading.
    pub fn max_altitude(&self) -> Option<f32> {
        self.max_altitude
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Seconds since the previous sample. The first tick assumes one nominal
    /// period; a clock that went backwards integrates nothing.
    fn delta_t(&self, timestamp: Duration) -> f32 {
        match self.last_timestamp {
            Some(last) => timestamp
                .checked_sub(last)
                .map_or(0.0, |dt| dt.as_secs_f32()),
            None => self.tick_period.as_secs_f32(),
        }
    }
}
