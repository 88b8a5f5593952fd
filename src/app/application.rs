//! Application facade over the session actors
//!
//! Owns the read-only maps and catalog, and a registry of running actors.
//! The registry is only locked to look up, add or remove a handle; all
//! session work happens on the actors.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::actor::{SessionHandle, spawn_session_actor};
use crate::catalog::LootCatalog;
use crate::error::GameError;
use crate::leaderboard::RetiredDogSink;
use crate::persistence::GameSnapshot;
use crate::sim::{
    Direction, DogId, Game, GameParts, GameSession, LootGenerator, Map, MapId, MapRegistry,
    RetiredDog, SessionId, SessionState,
};

#[derive(Debug, Default)]
struct Registry {
    sessions: BTreeMap<SessionId, SessionHandle>,
    next_session_id: u32,
}

pub struct Application {
    maps: MapRegistry,
    catalog: Arc<LootCatalog>,
    loot_generator: LootGenerator,
    randomize_spawn: bool,
    registry: Mutex<Registry>,
    sink: Arc<dyn RetiredDogSink>,
}

impl Application {
    /// Take over a loaded game, spawning an actor for each of its sessions.
    /// Must be called from within a tokio runtime.
    pub fn new(game: Game, sink: Arc<dyn RetiredDogSink>) -> Result<Arc<Self>, GameError> {
        let GameParts {
            maps,
            catalog,
            loot_generator,
            sessions,
            next_session_id,
            randomize_spawn,
        } = game.into_parts();

        let mut registry = Registry {
            sessions: BTreeMap::new(),
            next_session_id,
        };
        for session in sessions {
            let map = maps.require(session.map_id())?.clone();
            let (handle, _) = spawn_session_actor(session, map, catalog.clone(), randomize_spawn);
            registry.sessions.insert(handle.id(), handle);
        }

        Ok(Arc::new(Self {
            maps,
            catalog,
            loot_generator,
            randomize_spawn,
            registry: Mutex::new(registry),
            sink,
        }))
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

    /// Start a new session on `map_id`
    pub fn create_session(&self, map_id: &MapId) -> Result<SessionId, GameError> {
        let map = self.maps.require(map_id)?.clone();
        let mut registry = self.registry();
        let id = SessionId(registry.next_session_id);
        let session = GameSession::new(id, map.name(), map_id.clone(), self.loot_generator.fork());
        let (handle, _) = spawn_session_actor(session, map, self.catalog.clone(), self.randomize_spawn);
        registry.next_session_id += 1;
        registry.sessions.insert(id, handle);
        log::info!("Session {} created on map `{}`", id, map_id);
        Ok(id)
    }

    pub async fn join_session(&self, session: SessionId, name: &str) -> Result<DogId, GameError> {
        self.handle(session)?.join(name).await
    }

    /// Join the first session running `map_id`, starting one if there is
    /// none or the one found closed in the meantime
    pub async fn join_game(&self, map_id: &MapId, name: &str) -> Result<(SessionId, DogId), GameError> {
        if let Some(session) = self.session_for_map(map_id) {
            match self.join_session(session, name).await {
                Ok(dog) => return Ok((session, dog)),
                Err(GameError::SessionClosed(_)) | Err(GameError::SessionNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        let session = self.create_session(map_id)?;
        let dog = self.join_session(session, name).await?;
        Ok((session, dog))
    }

    pub async fn move_dog(&self, session: SessionId, dog: DogId, direction: Option<Direction>) -> Result<(), GameError> {
        self.handle(session)?.move_dog(dog, direction).await
    }

    pub async fn session_state(&self, session: SessionId) -> Result<SessionState, GameError> {
        self.handle(session)?.state().await
    }

    /// Lowest-id session running `map_id`
    pub fn session_for_map(&self, map_id: &MapId) -> Option<SessionId> {
        self.sessions_for_map(map_id).into_iter().next()
    }

    pub fn sessions_for_map(&self, map_id: &MapId) -> Vec<SessionId> {
        self.registry()
            .sessions
            .values()
            .filter(|h| h.map_id() == map_id)
            .map(SessionHandle::id)
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.registry().sessions.len()
    }

    /// Queue a tick on every session and return at once.
    ///
    /// The returned task collects the outcomes: retirees go to the sink and
    /// sessions that ran out of dogs leave the registry. A failing session
    /// does not hold up the others.
    pub fn tick_all(self: &Arc<Self>, dt: Duration) -> JoinHandle<Vec<RetiredDog>> {
        let handles: Vec<SessionHandle> = self.registry().sessions.values().cloned().collect();
        let pending: Vec<_> = handles
            .iter()
            .filter_map(|h| match h.tick(dt) {
                Ok(rx) => Some((h.id(), rx)),
                Err(err) => {
                    log::warn!("Tick not queued for session {}: {}", h.id(), err);
                    None
                }
            })
            .collect();

        let app = Arc::clone(self);
        tokio::spawn(async move {
            let mut retired = Vec::new();
            for (id, rx) in pending {
                let Ok(outcome) = rx.await else {
                    log::warn!("Session {} stopped before finishing its tick", id);
                    app.remove_session(id);
                    continue;
                };
                match outcome.retired {
                    Ok(mut dogs) => retired.append(&mut dogs),
                    Err(err) => log::error!("Tick failed for session {}: {}", id, err),
                }
                if outcome.closed {
                    app.remove_session(id);
                }
            }
            if !retired.is_empty() {
                app.sink.record(&retired);
            }
            retired
        })
    }

    /// Snapshot every session. Each one is taken after the commands already
    /// queued on it.
    pub async fn snapshot(&self) -> GameSnapshot {
        let handles: Vec<SessionHandle> = self.registry().sessions.values().cloned().collect();
        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.snapshot().await {
                Ok(s) if !s.dogs.is_empty() => sessions.push(s),
                Ok(_) => {}
                Err(err) => log::warn!("Session {} skipped in snapshot: {}", handle.id(), err),
            }
        }
        GameSnapshot { sessions }
    }

    /// Stop every actor and return the final state of all sessions
    pub async fn shutdown(&self) -> GameSnapshot {
        let handles: Vec<SessionHandle> = {
            let mut registry = self.registry();
            std::mem::take(&mut registry.sessions).into_values().collect()
        };
        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.shutdown().await {
                Ok(s) if !s.dogs.is_empty() => sessions.push(s),
                Ok(_) => {}
                Err(err) => log::warn!("Session {} already stopped: {}", handle.id(), err),
            }
        }
        log::info!("All sessions stopped");
        GameSnapshot { sessions }
    }

    fn handle(&self, id: SessionId) -> Result<SessionHandle, GameError> {
        self.registry()
            .sessions
            .get(&id)
            .cloned()
            .ok_or(GameError::SessionNotFound(id))
    }

    fn remove_session(&self, id: SessionId) {
        if self.registry().sessions.remove(&id).is_some() {
            log::info!("Session {} removed (no dogs left)", id);
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
