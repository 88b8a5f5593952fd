//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same map seed and the same
//! commands, a session evolves identically:
//! - Seeded RNG per map
//! - Stable iteration order (dogs and loot by id)
//! - Explicit collision tie-breaks
//! - No I/O and no threading; callers decide where sessions run

pub mod collision;
pub mod game;
pub mod geometry;
pub mod loot_generator;
pub mod map;
pub mod road;
pub mod session;
pub mod state;
pub mod tick;

pub use collision::{
    CollisionEvent, CollisionEventKind, CollisionResult, CollisionTarget, Gatherer, find_events,
    try_collect_point,
};
pub use game::{Game, GameParts};
pub use geometry::{Direction, GridPoint, Offset, ParseDirectionError, Point, Rectangle, Size, Speed};
pub use loot_generator::{LootGenerator, RandomSource};
pub use map::{Building, Map, MapId, MapParams, MapRegistry, Office, OfficeId};
pub use road::Road;
pub use session::{BagItem, GameSession, LootState, PlayerState, SessionId, SessionState};
pub use state::{Dog, DogId, LootId, LostObject, RetiredDog};
pub use tick::tick;
