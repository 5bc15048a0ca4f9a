// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod combos;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod round;
pub mod runtime;
pub mod session;
pub mod symbol;
pub mod ui;

/// Countdown refresh period in timed mode
pub const TICK_RATE_MS: u64 = 100;

pub use error::{GameError, Result};
pub use session::{Mode, SessionConfig, SessionEnd, SessionReport};
