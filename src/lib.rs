//! Flight computer for a sounding rocket: fuses IMU and barometer readings into
//! a motion estimate and tracks the flight phase from the pad to landing.

pub mod airbrake;
pub mod altitude;
pub mod barometer;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod context;
pub mod data_processor;
pub mod error;
pub mod imu;
pub mod motion;
pub mod state;
pub mod transmitter;

pub use config::FlightConfig;
pub use context::{FlightComputer, TickReport};
pub use data_processor::FusedState;
pub use error::{FlightError, SensorError};
pub use state::{FlightPhase, FlightPhaseDetector, PhaseOutcome, TransitionEvent};
