use super::*;
use crate::constants::GRAVITY;

fn thresholds() -> PhaseThresholds {
    PhaseThresholds {
        launch_accel_threshold: 30.0,
        coast_accel_threshold: 0.0,
        pressure_drop_margin: 0.05,
        apogee_altitude_threshold: 1000.0,
        apogee_altitude_tolerance: 10.0,
        apogee_accel_bound: 5.0,
        landing_accel_tolerance: 2.0,
        apogee_rate_threshold: -0.5,
    }
}

fn input(ms: u64, vertical_accel: f32, altitude: f32, pressure_hpa: Option<f32>) -> PhaseInput {
    PhaseInput {
        timestamp: Duration::from_millis(ms),
        vertical_accel,
        altitude,
        pressure_hpa,
    }
}

/// Forces the detector into a phase without replaying a flight.
fn detector_in(phase: FlightPhase) -> FlightPhaseDetector {
    let mut detector = FlightPhaseDetector::new(thresholds());
    detector.phase = phase;
    detector
}

#[test]
fn test_initial_phase() {
    let detector = FlightPhaseDetector::new(thresholds());
    assert_eq!(detector.phase(), FlightPhase::Ground);
}

#[test]
fn test_phase_ordering() {
    assert!(FlightPhase::Ground < FlightPhase::PoweredAscent);
    assert!(FlightPhase::PoweredAscent < FlightPhase::Coasting);
    assert!(FlightPhase::Coasting < FlightPhase::Apogee);
    assert!(FlightPhase::Apogee < FlightPhase::Descent);
    assert!(FlightPhase::Descent < FlightPhase::Landing);
    assert!(FlightPhase::Landing.is_terminal());
}

#[test]
fn test_launch_detection() {
    let mut detector = FlightPhaseDetector::new(thresholds());
    let outcome = detector.update(&input(1200, 3.0 * 30.0, 0.0, Some(1013.0)));
    assert_eq!(
        outcome,
        PhaseOutcome::Transition(TransitionEvent {
            from: FlightPhase::Ground,
            to: FlightPhase::PoweredAscent,
            timestamp: Duration::from_millis(1200),
        })
    );
    assert_eq!(detector.phase(), FlightPhase::PoweredAscent);
}

#[test]
fn test_launch_threshold_is_inclusive() {
    let mut detector = FlightPhaseDetector::new(thresholds());
    assert!(detector.update(&input(0, 30.0, 0.0, None)).transition().is_some());
}

#[test]
fn test_false_launch_rejected() {
    let mut detector = FlightPhaseDetector::new(thresholds());
    let outcome = detector.update(&input(0, 29.0, 0.0, Some(1013.0)));
    assert!(outcome.transition().is_none());
    assert!(matches!(outcome, PhaseOutcome::Anomaly { phase: FlightPhase::Ground, .. }));
    assert_eq!(detector.phase(), FlightPhase::Ground);
}

#[test]
fn test_coast_needs_pressure_drop() {
    let mut detector = detector_in(FlightPhase::PoweredAscent);
    // Burnout, but no previous pressure to compare against.
    assert!(detector.update(&input(0, -9.0, 200.0, Some(990.0))).transition().is_none());
    // Pressure rising.
    assert!(detector.update(&input(100, -9.0, 200.0, Some(991.0))).transition().is_none());
    // Pressure falling by less than the margin.
    assert!(detector.update(&input(200, -9.0, 200.0, Some(990.98))).transition().is_none());
    assert_eq!(detector.phase(), FlightPhase::PoweredAscent);

    let outcome = detector.update(&input(300, -9.0, 210.0, Some(990.5)));
    assert_eq!(outcome.transition().map(|e| e.to), Some(FlightPhase::Coasting));
}

#[test]
fn test_coast_needs_burnout() {
    let mut detector = detector_in(FlightPhase::PoweredAscent);
    detector.update(&input(0, 60.0, 100.0, Some(1000.0)));
    let outcome = detector.update(&input(100, 60.0, 120.0, Some(998.0)));
    assert!(outcome.transition().is_none());
}

#[test]
fn test_pressure_gap_breaks_comparison() {
    let mut detector = detector_in(FlightPhase::PoweredAscent);
    detector.update(&input(0, -9.0, 100.0, Some(1000.0)));
    detector.update(&input(100, -9.0, 100.0, None));
    let outcome = detector.update(&input(200, -9.0, 120.0, Some(990.0)));
    assert!(outcome.transition().is_none());
}

#[test]
fn test_apogee_detection() {
    let mut detector = detector_in(FlightPhase::Coasting);
    let outcome = detector.update(&input(9000, -1.0, 1004.0, Some(898.0)));
    assert_eq!(outcome.transition().map(|e| e.to), Some(FlightPhase::Apogee));
}

#[test]
fn test_ballistic_coast_reaches_apogee_with_default_thresholds() {
    let defaults = PhaseThresholds::default();
    let mut detector = FlightPhaseDetector::new(defaults);
    detector.phase = FlightPhase::Coasting;

    // Drag-free coast from 900 m topping out just above the expected apogee.
    // With the launch baseline removed the accelerometer reads -1 g throughout.
    let launch_speed = (2.0 * GRAVITY * 101.0).sqrt();
    let mut apogee = None;
    for i in 0..60u64 {
        let t = i as f32 * 0.1;
        let altitude = 900.0 + launch_speed * t - 0.5 * GRAVITY * t * t;
        let outcome = detector.update(&input(i * 100, -GRAVITY, altitude, None));
        if let Some(event) = outcome.transition() {
            assert_eq!(event.to, FlightPhase::Apogee);
            apogee = Some(altitude);
            break;
        }
    }

    let altitude = apogee.expect("coast never reached apogee");
    assert!((altitude - defaults.apogee_altitude_threshold).abs() < defaults.apogee_altitude_tolerance);
    assert_eq!(detector.phase(), FlightPhase::Apogee);
}

#[test]
fn test_apogee_rejected_far_from_expected_altitude() {
    let mut detector = detector_in(FlightPhase::Coasting);
    assert!(detector.update(&input(0, -1.0, 900.0, None)).transition().is_none());
    // Close enough, but still decelerating hard.
    assert!(detector.update(&input(100, -9.0, 1001.0, None)).transition().is_none());
    assert_eq!(detector.phase(), FlightPhase::Coasting);
}

#[test]
fn test_descent_and_landing() {
    let mut detector = detector_in(FlightPhase::Apogee);
    // Still above the expected apogee.
    assert!(detector.update(&input(0, -3.0, 1005.0, None)).transition().is_none());
    assert!(detector.update(&input(100, -3.0, 995.0, None)).transition().is_some());
    assert_eq!(detector.phase(), FlightPhase::Descent);

    // Parachute opening shock is not a landing.
    assert!(detector.update(&input(200, 25.0, 800.0, None)).transition().is_none());
    assert!(detector.update(&input(300, -1.5, 3.0, None)).transition().is_some());
    assert_eq!(detector.phase(), FlightPhase::Landing);
}

#[test]
fn test_landing_is_terminal() {
    let mut detector = detector_in(FlightPhase::Landing);
    assert_eq!(detector.update(&input(0, 90.0, 0.0, None)), PhaseOutcome::Terminal);
    assert_eq!(detector.phase(), FlightPhase::Landing);
}

#[test]
fn test_hold_is_idempotent() {
    for phase in [
        FlightPhase::Ground,
        FlightPhase::PoweredAscent,
        FlightPhase::Coasting,
        FlightPhase::Apogee,
        FlightPhase::Descent,
    ] {
        let mut detector = detector_in(phase);
        // 20 m/s^2 at 500 m with no pressure matches none of the guards.
        let outcome = detector.update(&input(0, 20.0, 500.0, None));
        assert!(matches!(outcome, PhaseOutcome::Anomaly { .. }), "{phase}");
        assert_eq!(detector.phase(), phase);
    }
}

#[test]
fn test_full_flight() {
    let mut detector = FlightPhaseDetector::new(thresholds());
    let script = [
        input(0, 0.0, 0.0, Some(1013.0)),       // idle on the pad
        input(100, 90.0, 0.0, Some(1013.0)),    // ignition
        input(200, 40.0, 50.0, Some(1007.0)),   // burning
        input(300, -9.0, 120.0, Some(999.0)),   // burnout
        input(400, -9.0, 800.0, Some(921.0)),   // coasting up
        input(500, -3.0, 995.0, Some(900.0)),   // near the top
        input(600, -9.0, 990.0, Some(900.5)),   // falling
        input(700, 8.0, 600.0, Some(943.0)),    // under canopy
        input(800, 0.5, 2.0, Some(1013.0)),     // on the ground
        input(900, 0.0, 2.0, Some(1013.0)),     // stays there
    ];

    let mut events = Vec::new();
    let mut last = detector.phase();
    for tick in &script {
        if let Some(event) = detector.update(tick).transition() {
            events.push(*event);
        }
        assert!(detector.phase() >= last);
        last = detector.phase();
    }

    assert_eq!(detector.phase(), FlightPhase::Landing);
    let pairs: Vec<_> = events.iter().map(|e| (e.from, e.to)).collect();
    assert_eq!(
        pairs,
        vec![
            (FlightPhase::Ground, FlightPhase::PoweredAscent),
            (FlightPhase::PoweredAscent, FlightPhase::Coasting),
            (FlightPhase::Coasting, FlightPhase::Apogee),
            (FlightPhase::Apogee, FlightPhase::Descent),
            (FlightPhase::Descent, FlightPhase::Landing),
        ]
    );
    assert_eq!(events[4].timestamp, Duration::from_millis(800));
}

#[test]
fn test_phase_never_moves_backwards() {
    // Deterministic pseudo-random ticks; no input may ever walk the phase back.
    let mut seed: u32 = 0x1234_5678;
    let mut next = move |range: f32| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (seed >> 8) as f32 / (1u32 << 24) as f32 * range
    };

    for _ in 0..50 {
        let mut detector = FlightPhaseDetector::new(thresholds());
        let mut last = detector.phase();
        for i in 0..200 {
            let accel = next(120.0) - 40.0;
            let altitude = next(1200.0);
            let pressure = if next(1.0) < 0.1 { None } else { Some(850.0 + next(170.0)) };
            detector.update(&input(i * 100, accel, altitude, pressure));
            assert!(detector.phase() >= last);
            last = detector.phase();
        }
    }
}
