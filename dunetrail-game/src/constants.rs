//! Centralized tuning constants for Dunetrail travel logic.
//!
//! These values define the deterministic math for the core simulation.
//! Stage files supply prices, weights and weather costs; everything here is
//! fixed by the rules themselves.

// Consumption intensities ---------------------------------------------------
/// Multiplier applied for a day spent in place (and for sandstorm travel days).
pub const STAY_INTENSITY: i32 = 1;
/// Multiplier applied for a day that makes travel progress.
pub const TRAVEL_INTENSITY: i32 = 2;
/// Multiplier applied for a day spent mining.
pub const MINING_INTENSITY: i32 = 3;

// Graph ---------------------------------------------------------------------
/// Distance used for any lookup without an explicit override.
pub const DEFAULT_EDGE_DISTANCE: u32 = 1;

// Economy -------------------------------------------------------------------
/// Price factor applied to every purchase after the first.
pub const REPEAT_PURCHASE_FACTOR: i32 = 2;

// Weather -------------------------------------------------------------------
pub const DEFAULT_SUNNY_WEIGHT: u32 = 5;
pub const DEFAULT_HIGH_TEMP_WEIGHT: u32 = 4;
pub const DEFAULT_SANDSTORM_WEIGHT: u32 = 1;

// Timeline ------------------------------------------------------------------
/// Command prefixes that never receive a history label.
pub const HISTORY_EXEMPT_PREFIXES: [&str; 4] = ["redo", "undo", "history", "log"];

// Estimator -----------------------------------------------------------------
pub const ESTIMATE_DEFAULT_ITERATIONS: usize = 30;
pub const ESTIMATE_DEFAULT_HORIZON_DAYS: u32 = 8;
