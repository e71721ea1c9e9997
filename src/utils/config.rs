//! Configuration and constants for the CLI and the built-in backend.

/// Version reported by `--version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name used in the version banner
pub const PROGRAM_NAME: &str = "sigrok-cli";

/// Library version reported by the built-in backend
pub const LIB_VERSION: &str = "0.1.0";

/// Output format used when `--output-format` is not given
pub const DEFAULT_OUTPUT_FORMAT: &str = "bits";

/// Width of the name column in the `--version` listings
pub const LISTING_NAME_WIDTH: usize = 20;

// Acquisition defaults for the demo driver
pub const DEMO_DEFAULT_SAMPLERATE: u64 = 200_000; // 200 kHz
pub const DEMO_DEFAULT_LOGIC_CHANNELS: u64 = 8;
pub const DEMO_DEFAULT_ANALOG_CHANNELS: u64 = 1;
pub const DEMO_DEFAULT_AMPLITUDE: f64 = 10.0;
pub const DEMO_FRAME_SAMPLES: u64 = 1000;
pub const DEMO_MAX_LOGIC_CHANNELS: u64 = 64;
pub const DEMO_MAX_ANALOG_CHANNELS: u64 = 16;

// Samples per analog square-wave period
pub const DEMO_ANALOG_PERIOD: u64 = 20;

/// Maximum number of samples delivered in one datafeed packet
pub const CHUNK_SAMPLES: u64 = 4096;

/// Samples per line in the `bits` and `hex` outputs
pub const SAMPLES_PER_LINE: usize = 64;

/// Version of the datafeed packet layout, sent in every header packet
pub const FEED_VERSION: u32 = 1;
