//! Concurrency layer
//!
//! - `actor`: one task per session, commands applied in submission order
//! - `application`: registry of running sessions and the public entry points
//! - `ticker`: periodic ticks and autosave

pub mod actor;
pub mod application;
pub mod ticker;

pub use actor::{Command, SessionHandle, TickOutcome, spawn_session_actor};
pub use application::Application;
pub use ticker::{AutoSave, Ticker};
