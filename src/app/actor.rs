//! Per-session actor
//!
//! Each session is owned by one tokio task that processes commands from an
//! unbounded queue strictly in submission order. Different sessions run on
//! different tasks and advance in parallel on the runtime's workers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::catalog::LootCatalog;
use crate::error::GameError;
use crate::persistence::SessionSnapshot;
use crate::sim::{self, Direction, DogId, GameSession, Map, MapId, RetiredDog, SessionId, SessionState};

/// Result of one tick as seen by whoever triggered it
#[derive(Debug)]
pub struct TickOutcome {
    pub session: SessionId,
    pub retired: Result<Vec<RetiredDog>, GameError>,
    /// The session ran out of dogs; the actor has stopped taking commands
    pub closed: bool,
}

#[derive(Debug)]
pub enum Command {
    Join {
        name: String,
        reply: oneshot::Sender<Result<DogId, GameError>>,
    },
    Move {
        dog: DogId,
        direction: Option<Direction>,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Tick {
        dt: Duration,
        reply: oneshot::Sender<TickOutcome>,
    },
    State {
        reply: oneshot::Sender<SessionState>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Stop after replying with the final snapshot
    Shutdown {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cheap, cloneable address of a running session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    map_id: MapId,
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    pub async fn join(&self, name: impl Into<String>) -> Result<DogId, GameError> {
        let name = name.into();
        self.request(|reply| Command::Join { name, reply }).await?
    }

    pub async fn move_dog(&self, dog: DogId, direction: Option<Direction>) -> Result<(), GameError> {
        self.request(|reply| Command::Move {
            dog,
            direction,
            reply,
        })
        .await?
    }

    /// Queue a tick without waiting for it; the outcome arrives on the
    /// returned receiver
    pub fn tick(&self, dt: Duration) -> Result<oneshot::Receiver<TickOutcome>, GameError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Tick { dt, reply })
            .map_err(|_| GameError::SessionClosed(self.id))?;
        Ok(rx)
    }

    pub async fn state(&self) -> Result<SessionState, GameError> {
        self.request(|reply| Command::State { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, GameError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> Result<SessionSnapshot, GameError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, GameError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| GameError::SessionClosed(self.id))?;
        rx.await.map_err(|_| GameError::SessionClosed(self.id))
    }
}

struct SessionActor {
    session: GameSession,
    map: Arc<Map>,
    catalog: Arc<LootCatalog>,
    randomize_spawn: bool,
    rx: mpsc::UnboundedReceiver<Command>,
}

/// Spawn the task that owns `session` and return its handle
pub fn spawn_session_actor(
    session: GameSession,
    map: Arc<Map>,
    catalog: Arc<LootCatalog>,
    randomize_spawn: bool,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        id: session.id(),
        map_id: session.map_id().clone(),
        tx,
    };
    let actor = SessionActor {
        session,
        map,
        catalog,
        randomize_spawn,
        rx,
    };
    (handle, tokio::spawn(actor.run()))
}

impl SessionActor {
    async fn run(mut self) {
        let id = self.session.id();
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Join { name, reply } => {
                    let result = self.session.add_dog(&self.map, name, self.randomize_spawn);
                    let _ = reply.send(result);
                }
                Command::Move {
                    dog,
                    direction,
                    reply,
                } => {
                    let result = self.session.move_dog(dog, direction, self.map.dog_speed());
                    let _ = reply.send(result);
                }
                Command::Tick { dt, reply } => {
                    let retired = sim::tick(&mut self.session, &self.map, &self.catalog, dt);
                    if let Err(err) = &retired {
                        log::error!("Tick failed for session {}: {}", id, err);
                    }
                    let closed = self.session.is_empty();
                    let _ = reply.send(TickOutcome {
                        session: id,
                        retired,
                        closed,
                    });
                    if closed {
                        self.drain_closed();
                        break;
                    }
                }
                Command::State { reply } => {
                    let _ = reply.send(self.session.state());
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(SessionSnapshot::from(&self.session));
                }
                Command::Shutdown { reply } => {
                    let _ = reply.send(SessionSnapshot::from(&self.session));
                    break;
                }
            }
        }
        log::debug!("Session {} actor stopped", id);
    }

    /// Refuse everything still queued behind the tick that emptied the
    /// session; requests answered here see `SessionClosed`
    fn drain_closed(&mut self) {
        self.rx.close();
        let id = self.session.id();
        while let Ok(command) = self.rx.try_recv() {
            match command {
                Command::Join { reply, .. } => {
                    let _ = reply.send(Err(GameError::SessionClosed(id)));
                }
                Command::Move { reply, .. } => {
                    let _ = reply.send(Err(GameError::SessionClosed(id)));
                }
                Command::Tick { reply, .. } => {
                    let _ = reply.send(TickOutcome {
                        session: id,
                        retired: Ok(Vec::new()),
                        closed: true,
                    });
                }
                Command::State { reply } => {
                    let _ = reply.send(self.session.state());
                }
                Command::Snapshot { reply } | Command::Shutdown { reply } => {
                    let _ = reply.send(SessionSnapshot::from(&self.session));
                }
            }
        }
    }
}
