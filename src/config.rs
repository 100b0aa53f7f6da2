use clap::Parser;

pub const MIN_INTERVAL_MS: u64 = 50;
pub const MAX_INTERVAL_MS: u64 = 5000;
pub const INTERVAL_STEP_MS: u64 = 50;
pub const DEFAULT_INTERVAL_MS: u64 = 100;

pub const MIN_MAX_TAPS: u32 = 1;
pub const MAX_MAX_TAPS: u32 = 1_000_000;
pub const MAX_TAPS_STEP: u32 = 100;
pub const DEFAULT_MAX_TAPS: u32 = 5000;

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Parser, Debug, Clone)]
#[command(name = "tap_dispatcher", about = "Round-robin simulated taps over draggable targets")]
pub struct Args {
    /// Milliseconds between taps (clamped to 50..=5000)
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Stop automatically after this many taps
    #[arg(long, default_value_t = DEFAULT_MAX_TAPS)]
    pub max_taps: u32,

    /// Run without a tap bound
    #[arg(long)]
    pub unbounded: bool,

    /// Targets created by the batch button
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,
}

/// Session settings after clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub interval_ms: u64,
    pub max_taps: Option<u32>,
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            max_taps: Some(DEFAULT_MAX_TAPS),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Self {
            interval_ms: clamp_interval(args.interval_ms),
            max_taps: if args.unbounded { None } else { Some(clamp_max_taps(args.max_taps)) },
            batch_size: args.batch_size.max(1),
        }
    }
}

pub fn clamp_interval(ms: u64) -> u64 { ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS) }

pub fn clamp_max_taps(n: u32) -> u32 { n.clamp(MIN_MAX_TAPS, MAX_MAX_TAPS) }
