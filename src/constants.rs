//! Constants used throughout the program. These are the tuned defaults; every
//! threshold can be overridden from the configuration file.

/// Standard gravity, m/s^2.
pub const GRAVITY: f32 = 9.806_65;

/// Standard sea-level pressure in hPa.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = 1013.25;

/// Period of one control loop tick:
pub const TICK_PERIOD_MS: u64 = 100;

/// Vertical acceleration (m/s^2, baseline removed) at or above which we call a launch:
pub const LAUNCH_ACCEL_THRESHOLD: f32 = 30.0;
/// Vertical acceleration below which the motor is considered burnt out:
pub const COAST_ACCEL_THRESHOLD: f32 = 0.0;
/// Tick-over-tick pressure drop (hPa) required to confirm we are still climbing:
pub const PRESSURE_DROP_MARGIN: f32 = 0.05;
/// Expected apogee altitude in meters above the sea-level reference:
pub const APOGEE_ALTITUDE_THRESHOLD: f32 = 1000.0;
/// How close to the expected apogee we have to be, meters:
pub const APOGEE_ALTITUDE_TOLERANCE: f32 = 10.0;
/// Vertical acceleration magnitude below which apogee may be declared. A
/// ballistic coast reads about -1 g once the baseline is removed, so this must
/// sit well above g:
pub const APOGEE_ACCEL_BOUND: f32 = 5.0 * GRAVITY;
/// Vertical acceleration magnitude below which we consider ourselves landed:
pub const LANDING_ACCEL_TOLERANCE: f32 = 2.0 * GRAVITY;
/// Rate of climb (m per tick) below which the barometer alone says we are past apogee:
pub const APOGEE_RATE_THRESHOLD: f32 = -0.5;

// Altitude filter tuning (measurement error, estimate error, process noise):
pub const ALTITUDE_MEASUREMENT_UNCERTAINTY: f32 = 2.0;
pub const ALTITUDE_ESTIMATE_UNCERTAINTY: f32 = 2.0;
pub const ALTITUDE_PROCESS_NOISE: f32 = 0.5;

/// Dead-zone applied per axis after baseline subtraction, m/s^2:
pub const ACCEL_NOISE_THRESHOLD: f32 = 0.1 * GRAVITY;
/// Any axis above this keeps the velocity integrator running, m/s^2:
pub const MOTION_THRESHOLD: f32 = 0.05;
/// Multiplicative velocity decay applied every tick:
pub const DRAG_FACTOR: f32 = 0.98;

/// Number of stationary samples averaged into the accelerometer baseline:
pub const CALIBRATION_SAMPLES: usize = 50;
/// Give up on calibration after this many reads per requested sample:
pub const CALIBRATION_ATTEMPTS_PER_SAMPLE: usize = 4;

/// Send a status line every N ticks:
pub const STATUS_DECIMATION: u32 = 5;

pub const I2C_BUS: &str = "/dev/i2c-1";
pub const BMP_PRIMARY_ADDRESS: u16 = 0x76;
pub const BMP_SECONDARY_ADDRESS: u16 = 0x77;
pub const TELEMETRY_BAUD_RATE: u32 = 9600;
