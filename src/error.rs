//! Error types for the simulation, configuration and persistence layers

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sim::{DogId, MapId, OfficeId, SessionId};

/// Errors returned across the simulation boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("map `{0}` not found")]
    MapNotFound(MapId),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("dog {dog} not found in session {session}")]
    DogNotFound { session: SessionId, dog: DogId },
    #[error("map `{0}` already exists")]
    DuplicateMap(MapId),
    #[error("session {0} already exists")]
    DuplicateSession(SessionId),
    #[error("office `{0}` already exists")]
    DuplicateOffice(OfficeId),
    #[error("loot type {loot_type} is not described for map `{map}`")]
    UnknownLootType { map: MapId, loot_type: u32 },
    #[error("map `{0}` has no roads")]
    MapHasNoRoads(MapId),
    #[error("session {0} is shutting down")]
    SessionClosed(SessionId),
}

/// Errors raised while loading the game configuration (fatal at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Errors raised while saving or restoring a game snapshot
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed state file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("state rejected: {0}")]
    Game(#[from] GameError),
}
