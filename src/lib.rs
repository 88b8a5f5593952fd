//! Dog Courier - session-based multiplayer collection game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (road network, dogs, collisions, sessions)
//! - `catalog`: Per-map loot type descriptors
//! - `config`: JSON game configuration loading
//! - `persistence`: Snapshot save/restore
//! - `leaderboard`: Retired dog records
//! - `app`: Per-session actors, application facade and ticker

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod persistence;
pub mod sim;

pub use catalog::LootCatalog;
pub use error::{ConfigError, GameError, PersistenceError};
pub use leaderboard::{Leaderboard, RetiredDogSink};

/// Game configuration constants
pub mod consts {
    /// Dog body width (collection radius is half of it)
    pub const DOG_WIDTH: f64 = 0.6;
    /// Road width (dogs may stray half of it off the centerline)
    pub const ROAD_WIDTH: f64 = 0.8;
    /// Office width (hand-in radius adds half of it)
    pub const OFFICE_WIDTH: f64 = 0.5;

    /// Dog speed when neither the map nor the game overrides it
    pub const DEFAULT_DOG_SPEED: f64 = 1.0;
    /// Bag capacity when neither the map nor the game overrides it
    pub const DEFAULT_BAG_CAPACITY: usize = 3;
    /// Idle seconds before a dog retires, when the config is silent
    pub const DEFAULT_RETIREMENT_SECS: f64 = 60.0;

    /// Ticker period when none is given on the command line (ms)
    pub const DEFAULT_TICK_PERIOD_MS: u64 = 50;
}

/// Float comparison tolerance used for positions
pub const EPSILON: f64 = f64::EPSILON;

/// Compare two coordinates with the position tolerance
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
