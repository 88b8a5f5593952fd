//! One live instance of a map with its own dogs and loot

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Point, Speed};
use super::loot_generator::LootGenerator;
use super::map::{Map, MapId};
use super::state::{Dog, DogId, LootId, LostObject};
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dogs and loot of one session.
///
/// Both collections are keyed by id so iteration is always in id order.
/// The session refers to its map by id only; the map itself is passed in
/// by whoever drives the session.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    name: String,
    map_id: MapId,
    pub(super) dogs: BTreeMap<DogId, Dog>,
    pub(super) loot: BTreeMap<LootId, LostObject>,
    next_dog_id: u32,
    next_loot_id: u32,
    pub(super) loot_generator: LootGenerator,
}

impl GameSession {
    pub fn new(id: SessionId, name: impl Into<String>, map_id: MapId, loot_generator: LootGenerator) -> Self {
        Self {
            id,
            name: name.into(),
            map_id,
            dogs: BTreeMap::new(),
            loot: BTreeMap::new(),
            next_dog_id: 0,
            next_loot_id: 0,
            loot_generator,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    /// Spawn a new dog on `map`.
    ///
    /// The spawn point is chosen before anything is allocated, so a failure
    /// leaves the session unchanged.
    pub fn add_dog(&mut self, map: &Map, name: impl Into<String>, randomize_spawn: bool) -> Result<DogId, GameError> {
        let (pos, road) = map.random_position(randomize_spawn)?;
        let id = self.next_dog_id();
        let dog = Dog::new(id, name, pos, road, map.bag_capacity());
        log::info!("Dog {} ({}) joined session {}", id, dog.name, self.id);
        self.dogs.insert(id, dog);
        Ok(id)
    }

    /// Insert a restored dog; later dogs get ids above it, and later loot
    /// gets ids above anything in its bag
    pub fn load_dog(&mut self, dog: Dog) {
        self.next_dog_id = self.next_dog_id.max(dog.id.0 + 1);
        if let Some(max_item) = dog.bag.iter().map(|item| item.id.0).max() {
            self.next_loot_id = self.next_loot_id.max(max_item + 1);
        }
        self.dogs.insert(dog.id, dog);
    }

    /// Insert a restored lost object; later loot gets ids above it
    pub fn load_lost_object(&mut self, item: LostObject) {
        self.next_loot_id = self.next_loot_id.max(item.id.0 + 1);
        self.loot.insert(item.id, item);
    }

    /// Apply a move command to a dog. `None` stops it.
    pub fn move_dog(&mut self, dog: DogId, direction: Option<Direction>, map_speed: Speed) -> Result<(), GameError> {
        let session = self.id;
        let target = self
            .dogs
            .get_mut(&dog)
            .ok_or(GameError::DogNotFound { session, dog })?;
        target.set_movement(direction, map_speed);
        Ok(())
    }

    pub fn dog(&self, id: DogId) -> Option<&Dog> {
        self.dogs.get(&id)
    }

    pub fn dog_by_name(&self, name: &str) -> Option<&Dog> {
        self.dogs.values().find(|dog| dog.name == name)
    }

    /// Dogs in id order
    pub fn dogs(&self) -> impl Iterator<Item = &Dog> + Clone {
        self.dogs.values()
    }

    /// Loose loot in id order
    pub fn loot(&self) -> impl Iterator<Item = &LostObject> + Clone {
        self.loot.values()
    }

    pub fn dog_count(&self) -> usize {
        self.dogs.len()
    }

    pub fn loot_count(&self) -> usize {
        self.loot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty()
    }

    pub fn dog_id_counter(&self) -> u32 {
        self.next_dog_id
    }

    pub fn loot_id_counter(&self) -> u32 {
        self.next_loot_id
    }

    pub fn loot_generator(&self) -> &LootGenerator {
        &self.loot_generator
    }

    /// Build the client-facing view of this session
    pub fn state(&self) -> SessionState {
        SessionState {
            session_id: self.id,
            players: self
                .dogs
                .values()
                .map(|dog| PlayerState {
                    id: dog.id,
                    name: dog.name.clone(),
                    pos: dog.pos,
                    speed: dog.speed,
                    dir: dog.direction,
                    bag: dog
                        .bag
                        .iter()
                        .map(|item| BagItem {
                            id: item.id,
                            loot_type: item.loot_type,
                        })
                        .collect(),
                    score: dog.score,
                })
                .collect(),
            lost_objects: self
                .loot
                .values()
                .map(|item| LootState {
                    id: item.id,
                    loot_type: item.loot_type,
                    pos: item.pos,
                })
                .collect(),
        }
    }

    pub(super) fn next_dog_id(&mut self) -> DogId {
        let id = DogId(self.next_dog_id);
        self.next_dog_id += 1;
        id
    }

    pub(super) fn next_loot_id(&mut self) -> LootId {
        let id = LootId(self.next_loot_id);
        self.next_loot_id += 1;
        id
    }
}

/// Client-facing view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: SessionId,
    pub players: Vec<PlayerState>,
    pub lost_objects: Vec<LootState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: DogId,
    pub name: String,
    pub pos: Point,
    pub speed: Speed,
    pub dir: Direction,
    pub bag: Vec<BagItem>,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagItem {
    pub id: LootId,
    #[serde(rename = "type")]
    pub loot_type: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LootState {
    pub id: LootId,
    #[serde(rename = "type")]
    pub loot_type: u32,
    pub pos: Point,
}
