//! Line-oriented telemetry. Every write is fire-and-forget: a failed or slow
//! radio must never hold up the control loop.

use std::io::Write;
use std::time::Duration;

use serialport::TTYPort;
use tracing::{info, warn};

use crate::data_processor::FusedState;
use crate::error::FlightError;
use crate::state::{FlightPhase, TransitionEvent};

/// Anything that accepts status lines.
pub trait TelemetrySink {
    /// Sends one line. Implementations add the newline and swallow errors.
    fn send_line(&mut self, line: &str);
}

pub struct Transmitter {
    port: TTYPort,
}

impl Transmitter {
    pub fn new(path: &str, baud_rate: u32) -> Result<Self, FlightError> {
        let port = serialport::new(path, baud_rate)
            // Short timeout so a stalled radio costs us at most a few ms per line.
            .timeout(Duration::from_millis(5))
            .open_native()
            .map_err(|e| FlightError::Initialization(format!("failed to open serial port {path}: {e}")))?;

        info!("Telemetry on {path} at {baud_rate} baud");
        Ok(Transmitter { port })
    }
}

impl TelemetrySink for Transmitter {
    fn send_line(&mut self, line: &str) {
        let output = format!("{line}\n");
        if let Err(e) = self.port.write_all(output.as_bytes()) {
            warn!("Failed to write to port for transmission: {e}");
        }
    }
}

/// Used when no radio is configured; the lines end up in the log instead.
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn send_line(&mut self, line: &str) {
        info!(target: "telemetry", "{line}");
    }
}

pub fn session_header() -> String {
    format!("H,{}", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
}

pub fn transition_line(event: &TransitionEvent) -> String {
    format!(
        "T,{},{},{}",
        event.timestamp.as_millis(),
        event.from.name(),
        event.to.name()
    )
}

pub fn anomaly_line(phase: FlightPhase, timestamp: Duration) -> String {
    format!("A,{},{}", timestamp.as_millis(), phase.name())
}

/// Periodic status. The last column is the highest altitude so far, left
/// empty until the barometer has produced anything.
pub fn status_line(
    phase: FlightPhase,
    state: &FusedState,
    vertical_axis: usize,
    max_altitude: Option<f32>,
) -> String {
    let max = max_altitude.map(|m| format!("{m:.2}")).unwrap_or_default();
    format!(
        "S,{},{},{:.2},{:.2},{:.2},{max}",
        state.timestamp.as_millis(),
        phase.code(),
        state.altitude,
        state.rate_of_climb,
        state.vertical_velocity(vertical_axis)
    )
}

/// Barometric apogee indication, sent once when the rate of climb first goes
/// below the configured threshold.
pub fn rate_apogee_line(phase: FlightPhase, timestamp: Duration, rate_of_climb: f32) -> String {
    format!("R,{},{},{rate_of_climb:.2}", timestamp.as_millis(), phase.name())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Collects lines so tests can look at what would have been sent.
    #[derive(Clone, Default)]
    pub(crate) struct MemorySink {
        pub lines: Rc<RefCell<Vec<String>>>,
    }

    impl TelemetrySink for MemorySink {
        fn send_line(&mut self, line: &str) {
            self.lines.borrow_mut().push(line.to_string());
        }
    }

    #[test]
    fn transition_format() {
        let event = TransitionEvent {
            from: FlightPhase::Coasting,
            to: FlightPhase::Apogee,
            timestamp: Duration::from_millis(12_345),
        };
        assert_eq!(transition_line(&event), "T,12345,Coasting,Apogee");
    }

    #[test]
    fn anomaly_format() {
        assert_eq!(
            anomaly_line(FlightPhase::Descent, Duration::from_millis(40)),
            "A,40,Descent"
        );
    }

    #[test]
    fn status_format() {
        let state = FusedState {
            timestamp: Duration::from_millis(500),
            altitude: 123.456,
            rate_of_climb: -0.5,
            velocity: [0.0, 0.0, 7.25],
            ..FusedState::default()
        };
        assert_eq!(
            status_line(FlightPhase::Coasting, &state, 2, Some(130.0)),
            "S,500,C,123.46,-0.50,7.25,130.00"
        );
        assert_eq!(
            status_line(FlightPhase::Ground, &FusedState::default(), 2, None),
            "S,0,G,0.00,0.00,0.00,"
        );
    }

    #[test]
    fn rate_apogee_format() {
        assert_eq!(
            rate_apogee_line(FlightPhase::Coasting, Duration::from_millis(9_100), -0.734),
            "R,9100,Coasting,-0.73"
        );
    }

    #[test]
    fn header_is_tagged() {
        assert!(session_header().starts_with("H,"));
    }
}
