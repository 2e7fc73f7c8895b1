//! Flight phase state machine.
//!
//! The phase only ever moves forward: Ground, PoweredAscent, Coasting, Apogee,
//! Descent, Landing. Each tick evaluates the single guard leading out of the
//! current phase; earlier guards are never looked at again.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::PhaseThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlightPhase {
    Ground,
    PoweredAscent,
    Coasting,
    Apogee,
    Descent,
    Landing,
}

impl FlightPhase {
    pub fn name(&self) -> &'static str {
        match self {
            FlightPhase::Ground => "Ground",
            FlightPhase::PoweredAscent => "PoweredAscent",
            FlightPhase::Coasting => "Coasting",
            FlightPhase::Apogee => "Apogee",
            FlightPhase::Descent => "Descent",
            FlightPhase::Landing => "Landing",
        }
    }

    /// Single character used in the telemetry stream.
    pub fn code(&self) -> char {
        match self {
            FlightPhase::Ground => 'G',
            FlightPhase::PoweredAscent => 'P',
            FlightPhase::Coasting => 'C',
            FlightPhase::Apogee => 'A',
            FlightPhase::Descent => 'D',
            FlightPhase::Landing => 'L',
        }
    }

    /// The only phase reachable from this one, if any.
    pub fn successor(&self) -> Option<FlightPhase> {
        match self {
            FlightPhase::Ground => Some(FlightPhase::PoweredAscent),
            FlightPhase::PoweredAscent => Some(FlightPhase::Coasting),
            FlightPhase::Coasting => Some(FlightPhase::Apogee),
            FlightPhase::Apogee => Some(FlightPhase::Descent),
            FlightPhase::Descent => Some(FlightPhase::Landing),
            FlightPhase::Landing => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the state machine looks at each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInput {
    pub timestamp: Duration,
    /// Baseline-removed acceleration along the airframe axis, m/s^2.
    pub vertical_accel: f32,
    pub altitude: f32,
    /// This tick's pressure, if any barometer answered.
    pub pressure_hpa: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: FlightPhase,
    pub to: FlightPhase,
    pub timestamp: Duration,
}

/// Result of evaluating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Transition(TransitionEvent),
    /// The tick matched no guard for the current phase. The phase holds.
    Anomaly {
        phase: FlightPhase,
        timestamp: Duration,
    },
    /// Already landed; nothing left to evaluate.
    Terminal,
}

impl PhaseOutcome {
    pub fn transition(&self) -> Option<&TransitionEvent> {
        match self {
            PhaseOutcome::Transition(event) => Some(event),
            _ => None,
        }
    }
}

pub struct FlightPhaseDetector {
    thresholds: PhaseThresholds,
    phase: FlightPhase,
    last_pressure: Option<f32>,
}

impl FlightPhaseDetector {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        FlightPhaseDetector {
            thresholds,
            phase: FlightPhase::Ground,
            last_pressure: None,
        }
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn update(&mut self, input: &PhaseInput) -> PhaseOutcome {
        // Only compare against the immediately preceding tick; a gap breaks the chain.
        let pressure_drop = match (self.last_pressure, input.pressure_hpa) {
            (Some(last), Some(now)) => Some(last - now),
            _ => None,
        };
        self.last_pressure = input.pressure_hpa;

        let Some(next) = self.phase.successor() else {
            return PhaseOutcome::Terminal;
        };

        if !self.guard_holds(input, pressure_drop) {
            debug!(phase = %self.phase, accel = input.vertical_accel, altitude = input.altitude, "No transition guard matched");
            return PhaseOutcome::Anomaly {
                phase: self.phase,
                timestamp: input.timestamp,
            };
        }

        let event = TransitionEvent {
            from: self.phase,
            to: next,
            timestamp: input.timestamp,
        };
        info!(
            from = %event.from,
            to = %event.to,
            t_ms = event.timestamp.as_millis() as u64,
            "{}",
            detection_message(next)
        );
        self.phase = next;
        PhaseOutcome::Transition(event)
    }

    /// The guard on the single edge leaving the current phase.
    fn guard_holds(&self, input: &PhaseInput, pressure_drop: Option<f32>) -> bool {
        let t = &self.thresholds;
        let accel = input.vertical_accel;
        match self.phase {
            FlightPhase::Ground => accel >= t.launch_accel_threshold,
            FlightPhase::PoweredAscent => {
                accel < t.coast_accel_threshold
                    && pressure_drop.is_some_and(|drop| drop > t.pressure_drop_margin)
            }
            FlightPhase::Coasting => {
                (input.altitude - t.apogee_altitude_threshold).abs() < t.apogee_altitude_tolerance
                    && accel.abs() < t.apogee_accel_bound
            }
            FlightPhase::Apogee => accel < 0.0 && input.altitude < t.apogee_altitude_threshold,
            FlightPhase::Descent => accel.abs() < t.landing_accel_tolerance,
            FlightPhase::Landing => false,
        }
    }
}

fn detection_message(phase: FlightPhase) -> &'static str {
    match phase {
        FlightPhase::Ground => "On the ground",
        FlightPhase::PoweredAscent => "Launch detected!",
        FlightPhase::Coasting => "Coasting phase detected!",
        FlightPhase::Apogee => "Apogee detected!",
        FlightPhase::Descent => "Descent detected!",
        FlightPhase::Landing => "Landing detected!",
    }
}

#[cfg(test)]
mod tests;
