//! Synchronous game registry: maps, sessions and id allocation
//!
//! `Game` is what the config loader builds and what a state file restores
//! into. It can drive sessions on its own (tests, tools); the server takes
//! it apart with [`Game::into_parts`] and hands each session to an actor.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::geometry::Direction;
use super::loot_generator::{LootGenerator, RandomSource};
use super::map::{Map, MapId, MapRegistry};
use super::session::{GameSession, SessionId};
use super::state::{DogId, RetiredDog};
use super::tick::tick;
use crate::catalog::LootCatalog;
use crate::error::GameError;
use crate::persistence::{GameSnapshot, SessionSnapshot};

#[derive(Debug)]
pub struct Game {
    maps: MapRegistry,
    catalog: Arc<LootCatalog>,
    /// Template every new session's generator is forked from
    loot_generator: LootGenerator,
    sessions: BTreeMap<SessionId, GameSession>,
    next_session_id: u32,
    randomize_spawn: bool,
}

/// Everything a `Game` owns, for callers that manage sessions themselves
#[derive(Debug)]
pub struct GameParts {
    pub maps: MapRegistry,
    pub catalog: Arc<LootCatalog>,
    pub loot_generator: LootGenerator,
    pub sessions: Vec<GameSession>,
    pub next_session_id: u32,
    pub randomize_spawn: bool,
}

impl Game {
    pub fn new(catalog: LootCatalog, loot_generator: LootGenerator) -> Self {
        Self {
            maps: MapRegistry::new(),
            catalog: Arc::new(catalog),
            loot_generator,
            sessions: BTreeMap::new(),
            next_session_id: 0,
            randomize_spawn: false,
        }
    }

    pub fn set_randomize_spawn(&mut self, randomize: bool) {
        self.randomize_spawn = randomize;
    }

    pub fn randomize_spawn(&self) -> bool {
        self.randomize_spawn
    }

    /// Replace the random factor of the loot generator template. Sessions
    /// created or restored afterwards use it.
    pub fn set_loot_random(&mut self, random: RandomSource) {
        self.loot_generator.set_random(random);
    }

    /// Register a map; duplicate ids are rejected
    pub fn add_map(&mut self, map: Map) -> Result<Arc<Map>, GameError> {
        self.maps.add(map)
    }

    pub fn map(&self, id: &MapId) -> Option<&Arc<Map>> {
        self.maps.get(id)
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn catalog(&self) -> &Arc<LootCatalog> {
        &self.catalog
    }

    /// Open a new session on `map_id`
    pub fn create_session(&mut self, map_id: &MapId) -> Result<SessionId, GameError> {
        let map = self.maps.require(map_id)?;
        let id = SessionId(self.next_session_id);
        let session = GameSession::new(id, map.name(), map_id.clone(), self.loot_generator.fork());
        self.next_session_id += 1;
        self.sessions.insert(id, session);
        log::info!("Session {} created on map `{}`", id, map_id);
        Ok(id)
    }

    /// Add a dog named `name` to a session
    pub fn join_session(&mut self, session: SessionId, name: &str) -> Result<DogId, GameError> {
        let randomize = self.randomize_spawn;
        let (target, map) = self.session_and_map(session)?;
        target.add_dog(map, name, randomize)
    }

    pub fn move_dog(
        &mut self,
        session: SessionId,
        dog: DogId,
        direction: Option<Direction>,
    ) -> Result<(), GameError> {
        let (target, map) = self.session_and_map(session)?;
        target.move_dog(dog, direction, map.dog_speed())
    }

    /// Advance one session. A session left without dogs is removed.
    pub fn tick_session(&mut self, session: SessionId, dt: Duration) -> Result<Vec<RetiredDog>, GameError> {
        let catalog = self.catalog.clone();
        let (target, map) = self.session_and_map(session)?;
        let retired = tick(target, map, &catalog, dt)?;
        if target.is_empty() {
            self.sessions.remove(&session);
            log::info!("Session {} removed (no dogs left)", session);
        }
        Ok(retired)
    }

    /// Advance every session. A failing session is logged and skipped; the
    /// others still advance.
    pub fn tick_all(&mut self, dt: Duration) -> Vec<RetiredDog> {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        let mut retired = Vec::new();
        for id in ids {
            match self.tick_session(id, dt) {
                Ok(mut dogs) => retired.append(&mut dogs),
                Err(err) => log::error!("Tick failed for session {}: {}", id, err),
            }
        }
        retired
    }

    pub fn session(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    /// Sessions in id order
    pub fn sessions(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.values()
    }

    /// Lowest-id session running `map_id`
    pub fn session_for_map(&self, map_id: &MapId) -> Option<SessionId> {
        self.sessions_for_map(map_id).next()
    }

    pub fn sessions_for_map<'a>(&'a self, map_id: &'a MapId) -> impl Iterator<Item = SessionId> + 'a {
        self.sessions
            .values()
            .filter(move |s| s.map_id() == map_id)
            .map(GameSession::id)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            sessions: self.sessions.values().map(SessionSnapshot::from).collect(),
        }
    }

    /// Re-create sessions from a snapshot.
    ///
    /// Every session is checked before any is inserted: an unknown map or a
    /// clashing session id rejects the whole snapshot.
    pub fn restore(&mut self, snapshot: GameSnapshot) -> Result<(), GameError> {
        let mut seen = BTreeSet::new();
        for s in &snapshot.sessions {
            self.maps.require(&s.map_id)?;
            if self.sessions.contains_key(&s.id) || !seen.insert(s.id) {
                return Err(GameError::DuplicateSession(s.id));
            }
        }

        for s in snapshot.sessions {
            let session = s.into_session(self.loot_generator.fork());
            let id = session.id();
            self.next_session_id = self.next_session_id.max(id.0 + 1);
            log::info!(
                "Session {} restored with {} dog(s) and {} loot",
                id,
                session.dog_count(),
                session.loot_count()
            );
            self.sessions.insert(id, session);
        }
        Ok(())
    }

    pub fn into_parts(self) -> GameParts {
        GameParts {
            maps: self.maps,
            catalog: self.catalog,
            loot_generator: self.loot_generator,
            sessions: self.sessions.into_values().collect(),
            next_session_id: self.next_session_id,
            randomize_spawn: self.randomize_spawn,
        }
    }

    fn session_and_map(&mut self, id: SessionId) -> Result<(&mut GameSession, &Arc<Map>), GameError> {
        let session = self.sessions.get_mut(&id).ok_or(GameError::SessionNotFound(id))?;
        let map = self.maps.require(session.map_id())?;
        Ok((session, map))
    }
}
