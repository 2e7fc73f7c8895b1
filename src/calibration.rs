//! Zero-motion accelerometer baseline, captured on the pad before tracking starts.

use std::thread;
use std::time::Duration;

use fixed_deque::Deque;
use tracing::{debug, info};

use crate::constants::CALIBRATION_ATTEMPTS_PER_SAMPLE;
use crate::error::FlightError;
use crate::imu::{InertialSource, Vec3};

/// Fixed for the rest of the flight once built; there is no way to mutate it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    accel_baseline: Vec3,
}

impl Calibration {
    pub fn new(accel_baseline: Vec3) -> Self {
        Calibration { accel_baseline }
    }

    pub fn accel_baseline(&self) -> Vec3 {
        self.accel_baseline
    }

    /// Averages `samples` stationary accelerometer readings into a baseline.
    /// Gaps are skipped, but if the window can't be filled within a bounded
    /// number of reads the IMU is considered dead.
    pub fn capture(
        source: &mut dyn InertialSource,
        samples: usize,
        period: Duration,
    ) -> Result<Self, FlightError> {
        let mut collector = CalibrationCollector::new(samples);
        let max_attempts = samples.saturating_mul(CALIBRATION_ATTEMPTS_PER_SAMPLE);

        for _ in 0..max_attempts {
            match source.read_acceleration() {
                Ok(accel) => collector.push(accel),
                Err(e) => debug!("Calibration read skipped: {e}"),
            }
            if collector.is_complete() {
                break;
            }
            thread::sleep(period);
        }

        let calibration = collector.finish().ok_or_else(|| {
            FlightError::Initialization(format!(
                "accelerometer gave fewer than {samples} readings during calibration"
            ))
        })?;
        info!(baseline = ?calibration.accel_baseline, "Accelerometer calibrated");
        Ok(calibration)
    }
}

/// Rolling window of stationary readings.
pub struct CalibrationCollector {
    window: Deque<Vec3>,
    capacity: usize,
}

impl CalibrationCollector {
    pub fn new(capacity: usize) -> Self {
        CalibrationCollector {
            window: Deque::new(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, accel: Vec3) {
        self.window.push_back(accel);
    }

    pub fn is_complete(&self) -> bool {
        self.capacity > 0 && self.window.len() >= self.capacity
    }

    /// Per-axis mean of the window, once it is full.
    pub fn finish(&self) -> Option<Calibration> {
        if !self.is_complete() {
            return None;
        }
        let mut sum = [0.0_f32; 3];
        for sample in self.window.iter() {
            for (total, value) in sum.iter_mut().zip(sample) {
                *total += value;
            }
        }
        let n = self.window.len() as f32;
        Some(Calibration::new(sum.map(|total| total / n)))
    }
}
