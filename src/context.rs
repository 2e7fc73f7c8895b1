use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::airbrake::Actuator;
use crate::barometer::BarometerBank;
use crate::calibration::Calibration;
use crate::config::FlightConfig;
use crate::constants::STATUS_DECIMATION;
use crate::data_processor::{DataProcessor, FusedState};
use crate::imu::{InertialSource, RawSample, read_inertial};
use crate::motion::{DeadReckoning, MotionIntegrator};
use crate::state::{FlightPhase, FlightPhaseDetector, PhaseInput, PhaseOutcome, TransitionEvent};
use crate::transmitter::{self, TelemetrySink};

/// What one tick hands to the outside world.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub state: FusedState,
    pub phase: FlightPhase,
    pub transition: Option<TransitionEvent>,
}

/// The flight computer: owns the sensors, the estimator and the phase detector,
/// and runs them once per tick.
pub struct FlightComputer<M: MotionIntegrator = DeadReckoning> {
    imu: Box<dyn InertialSource>,
    barometers: BarometerBank,
    data_processor: DataProcessor<M>,
    detector: FlightPhaseDetector,
    apogee_rate_threshold: f32,
    rate_apogee_seen: bool,
    telemetry: Box<dyn TelemetrySink>,
    actuators: Vec<Box<dyn Actuator>>,
    vertical_axis: usize,
    tick_period: Duration,
    status_decimation: u32,
    ticks: u64,
}

impl FlightComputer<DeadReckoning> {
    pub fn new(
        config: &FlightConfig,
        calibration: Calibration,
        imu: Box<dyn InertialSource>,
        barometers: BarometerBank,
        telemetry: Box<dyn TelemetrySink>,
    ) -> Self {
        let motion = DeadReckoning::new(&config.integrator);
        Self::with_integrator(config, calibration, imu, barometers, telemetry, motion)
    }
}

impl<M: MotionIntegrator> FlightComputer<M> {
    /// Like [`FlightComputer::new`], with a different motion integrator.
    pub fn with_integrator(
        config: &FlightConfig,
        calibration: Calibration,
        imu: Box<dyn InertialSource>,
        barometers: BarometerBank,
        telemetry: Box<dyn TelemetrySink>,
        motion: M,
    ) -> Self {
        let status_decimation = config
            .telemetry
            .as_ref()
            .map_or(STATUS_DECIMATION, |t| t.status_decimation);

        FlightComputer {
            imu,
            barometers,
            data_processor: DataProcessor::with_integrator(config, calibration, motion),
            detector: FlightPhaseDetector::new(config.thresholds),
            apogee_rate_threshold: config.thresholds.apogee_rate_threshold,
            rate_apogee_seen: false,
            telemetry,
            actuators: Vec::new(),
            vertical_axis: config.vertical_axis,
            tick_period: config.tick_period(),
            status_decimation,
            ticks: 0,
        }
    }

    pub fn add_actuator(&mut self, actuator: Box<dyn Actuator>) {
        self.actuators.push(actuator);
    }

    pub fn phase(&self) -> FlightPhase {
        self.detector.phase()
    }

    pub fn state(&self) -> &FusedState {
        self.data_processor.state()
    }

    pub fn max_altitude(&self) -> Option<f32> {
        self.data_processor.max_altitude()
    }

    /// Polls the sensors once. Missing readings stay `None`.
    pub fn acquire(&mut self, timestamp: Duration) -> RawSample {
        let (accel, gyro) = read_inertial(self.imu.as_mut());
        let pressure_hpa = self.barometers.read_pressure_hpa();
        RawSample {
            timestamp,
            accel,
            gyro,
            pressure_hpa,
        }
    }

    /// One full tick: acquire, fuse, evaluate the phase, publish.
    pub fn tick(&mut self, timestamp: Duration) -> TickReport {
        let sample = self.acquire(timestamp);
        self.process(&sample)
    }

    /// Everything after acquisition, split out so recorded samples can be replayed.
    pub fn process(&mut self, sample: &RawSample) -> TickReport {
        let state = self.data_processor.update(sample).clone();

        let input = PhaseInput {
            timestamp: state.timestamp,
            vertical_accel: state.vertical_acceleration(self.vertical_axis),
            altitude: state.altitude,
            pressure_hpa: sample.pressure_hpa,
        };

        let outcome = self.detector.update(&input);
        let transition = match outcome {
            PhaseOutcome::Transition(event) => {
                self.telemetry.send_line(&transmitter::transition_line(&event));
                Some(event)
            }
            PhaseOutcome::Anomaly { phase, timestamp } => {
                self.telemetry.send_line(&transmitter::anomaly_line(phase, timestamp));
                None
            }
            PhaseOutcome::Terminal => None,
        };

        let phase = self.detector.phase();
        self.check_rate_apogee(phase, &state);
        for actuator in self.actuators.iter_mut() {
            actuator.on_tick(phase, &state);
        }

        if self.ticks % u64::from(self.status_decimation) == 0 {
            self.telemetry.send_line(&transmitter::status_line(
                phase,
                &state,
                self.vertical_axis,
                self.data_processor.max_altitude(),
            ));
        }
        self.ticks += 1;

        TickReport {
            state,
            phase,
            transition,
        }
    }

    /// Barometer-only apogee indication, reported once per flight next to
    /// whatever phase the detector is in. It never changes the phase.
    fn check_rate_apogee(&mut self, phase: FlightPhase, state: &FusedState) {
        if self.rate_apogee_seen
            || phase < FlightPhase::PoweredAscent
            || state.rate_of_climb >= self.apogee_rate_threshold
        {
            return;
        }
        self.rate_apogee_seen = true;
        warn!(
            phase = %phase,
            rate_of_climb = state.rate_of_climb,
            altitude = state.altitude,
            "Barometer reports apogee"
        );
        self.telemetry.send_line(&transmitter::rate_apogee_line(
            phase,
            state.timestamp,
            state.rate_of_climb,
        ));
    }

    /// Runs forever at the configured period. An overrun tick just pushes the
    /// next one back; we never burst to catch up.
    pub fn run(&mut self) -> ! {
        self.telemetry.send_line(&transmitter::session_header());
        info!(period_ms = self.tick_period.as_millis() as u64, "Starting control loop");

        let start = Instant::now();
        let mut tick_start = start;
        loop {
            self.tick(tick_start.duration_since(start));

            let now = Instant::now();
            let (wait, overran) = schedule(tick_start, now, self.tick_period);
            if overran {
                warn!(
                    elapsed_ms = now.duration_since(tick_start).as_millis() as u64,
                    "Tick overran its period"
                );
            } else {
                debug!("Tick finished with {:?} to spare", wait);
                thread::sleep(wait);
            }
            tick_start = Instant::now();
        }
    }
}

/// How long to wait before the next tick, and whether this one overran.
pub fn schedule(tick_start: Instant, now: Instant, period: Duration) -> (Duration, bool) {
    let elapsed = now.saturating_duration_since(tick_start);
    match period.checked_sub(elapsed) {
        Some(wait) if !wait.is_zero() => (wait, false),
        _ => (Duration::ZERO, true),
    }
}
