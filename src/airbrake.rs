//! Outward-facing actuator hook and the airbrake deployment policy.

use tracing::info;

use crate::data_processor::FusedState;
use crate::state::FlightPhase;

/// Receives the phase and fused state after every tick and decides on its
/// own whether to act. The flight computer assumes nothing about it.
pub trait Actuator {
    fn on_tick(&mut self, phase: FlightPhase, state: &FusedState);
}

/// Extends the brakes while coasting upwards, stows them from apogee on.
/// Driving the servo itself is left to whoever reads [`Airbrake::is_deployed`].
#[derive(Debug, Default)]
pub struct Airbrake {
    deployed: bool,
}

impl Airbrake {
    pub fn new() -> Self {
        Airbrake { deployed: false }
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    fn should_deploy(phase: FlightPhase, state: &FusedState) -> bool {
        phase == FlightPhase::Coasting && state.rate_of_climb > 0.0
    }
}

impl Actuator for Airbrake {
    fn on_tick(&mut self, phase: FlightPhase, state: &FusedState) {
        let deploy = Self::should_deploy(phase, state);
        if deploy != self.deployed {
            info!(
                phase = %phase,
                altitude = state.altitude,
                "{}",
                if deploy { "Opening airbrake" } else { "Closing airbrake" }
            );
            self.deployed = deploy;
        }
    }
}
