//! Dead reckoning from the IMU: gyro rate into angles, acceleration into
//! velocity and position.
//!
//! Everything here is per-axis and in the sensor frame. There is no attitude
//! aware rotation of the acceleration vector, so the integrated position is only
//! meaningful while the airframe points roughly the way it did on the pad.

use crate::calibration::Calibration;
use crate::config::IntegratorConfig;
use crate::data_processor::FusedState;
use crate::imu::Vec3;

/// Produces the next motion estimate from the previous one.
///
/// The drift heuristics live behind this trait so a proper accel/gyro filter
/// can replace them without touching the phase detector.
pub trait MotionIntegrator {
    /// Returns `previous` advanced by `delta_t` seconds. Only the motion fields
    /// (angles, acceleration, velocity, position) are touched; the altitude
    /// fields are carried over as-is.
    fn update(
        &mut self,
        accel: Option<Vec3>,
        gyro: Option<Vec3>,
        delta_t: f32,
        previous: &FusedState,
        calib: &Calibration,
    ) -> FusedState;
}

/// Open-loop integration with a dead-zone, a zero-velocity reset when nothing
/// is moving, and a constant drag decay.
///
/// The reset assumes the vehicle is sitting still whenever acceleration is
/// negligible. That is wrong during a long smooth coast but keeps the pad idle
/// from walking off; it is a deliberate bias correction, not physics.
#[derive(Clone, Copy, Debug)]
pub struct DeadReckoning {
    noise_threshold: f32,
    motion_threshold: f32,
    drag_factor: f32,
}

impl DeadReckoning {
    pub fn new(config: &IntegratorConfig) -> Self {
        DeadReckoning {
            noise_threshold: config.noise_threshold,
            motion_threshold: config.motion_threshold,
            drag_factor: config.drag_factor,
        }
    }

    /// Baseline removal followed by the per-axis dead-zone.
    pub fn condition(&self, raw: Vec3, calib: &Calibration) -> Vec3 {
        let baseline = calib.accel_baseline();
        let mut out = [0.0; 3];
        for axis in 0..3 {
            let a = raw[axis] - baseline[axis];
            out[axis] = if a.abs() < self.noise_threshold { 0.0 } else { a };
        }
        out
    }
}

impl MotionIntegrator for DeadReckoning {
    fn update(
        &mut self,
        accel: Option<Vec3>,
        gyro: Option<Vec3>,
        delta_t: f32,
        previous: &FusedState,
        calib: &Calibration,
    ) -> FusedState {
        let mut next = previous.clone();
        let dt = delta_t.max(0.0);

        if let Some(rate) = gyro {
            for axis in 0..3 {
                next.angles[axis] = previous.angles[axis] + rate[axis] * dt;
            }
        }

        // No fresh acceleration: hold what we had rather than integrate a zero.
        let Some(raw) = accel else {
            return next;
        };

        let a = self.condition(raw, calib);
        let moving = a.iter().any(|x| x.abs() > self.motion_threshold);

        for axis in 0..3 {
            let v = if moving {
                previous.velocity[axis] + a[axis] * dt
            } else {
                0.0
            };
            next.velocity[axis] = v * self.drag_factor;
            next.position[axis] = previous.position[axis] + next.velocity[axis] * dt;
        }
        next.acceleration = a;
        next
    }
}
