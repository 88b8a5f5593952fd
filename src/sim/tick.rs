//! Session tick
//!
//! One tick of a session, in order:
//! - Spawn the requested loot
//! - Advance every dog (idle dogs accumulate idle time and may retire)
//! - Drop retired dogs
//! - Detect collisions along this tick's sweeps and resolve them in order

use std::time::Duration;

use super::collision::{CollisionEventKind, CollisionTarget, Gatherer, find_events};
use super::geometry::Point;
use super::map::Map;
use super::session::GameSession;
use super::state::{LostObject, RetiredDog};
use crate::catalog::LootCatalog;
use crate::error::GameError;

/// Advance a session by `dt`, asking its loot generator how much to spawn.
///
/// Returns the dogs retired during this tick.
pub fn tick(
    session: &mut GameSession,
    map: &Map,
    catalog: &LootCatalog,
    dt: Duration,
) -> Result<Vec<RetiredDog>, GameError> {
    let loot_count = u32::try_from(session.loot_count()).unwrap_or(u32::MAX);
    let dog_count = u32::try_from(session.dog_count()).unwrap_or(u32::MAX);
    let before = session.loot_generator.clone();
    let to_spawn = session.loot_generator.generate(dt, loot_count, dog_count);
    let result = session.update(map, catalog, to_spawn, dt);
    if result.is_err() {
        // Nothing was spawned, so the generator keeps counting from before
        session.loot_generator = before;
    }
    result
}

impl GameSession {
    /// Advance the session by `dt` after spawning `loot_to_spawn` items.
    ///
    /// Spawned loot is rolled in full before any of it is added, so a
    /// catalog miss fails the tick with the session untouched.
    pub fn update(
        &mut self,
        map: &Map,
        catalog: &LootCatalog,
        loot_to_spawn: u32,
        dt: Duration,
    ) -> Result<Vec<RetiredDog>, GameError> {
        let spawned = roll_loot(map, catalog, loot_to_spawn)?;
        for (loot_type, value, pos) in spawned {
            let id = self.next_loot_id();
            self.loot.insert(id, LostObject::new(id, loot_type, value, pos));
        }

        let session_id = self.id();
        let retirement = map.retirement_time();
        let mut retired = Vec::new();
        let mut gatherers = Vec::new();

        for dog in self.dogs.values_mut() {
            dog.time_in_game += dt;
            if !dog.is_moving() {
                dog.idle_time += dt;
                if dog.idle_time >= retirement {
                    retired.push(dog.retire(session_id));
                }
                continue;
            }
            let start = dog.pos;
            dog.update_position(map, dt);
            gatherers.push(Gatherer {
                dog: dog.id,
                start,
                end: dog.pos,
                width: dog.width,
            });
        }

        for record in &retired {
            self.dogs.remove(&record.id);
            log::info!(
                "Dog {} ({}) retired from session {} with score {} after {:.1}s",
                record.id,
                record.name,
                record.session,
                record.score,
                record.play_time.as_secs_f64()
            );
        }

        self.resolve_collisions(map, &gatherers);
        Ok(retired)
    }

    fn resolve_collisions(&mut self, map: &Map, gatherers: &[Gatherer]) {
        let events = find_events(gatherers, self.loot.values(), map.offices());

        for event in events {
            let Some(dog) = self.dogs.get_mut(&event.dog) else {
                continue;
            };
            match event.kind {
                CollisionEventKind::Collect => {
                    let (CollisionTarget::Loot(id), Some(copy)) = (event.target, event.item) else {
                        continue;
                    };
                    let available = self.loot.get(&id).is_some_and(|item| !item.collected);
                    if available && dog.put_in_bag(copy) {
                        self.loot.remove(&id);
                    }
                }
                CollisionEventKind::HandIn => dog.hand_over_loot(),
            }
        }
    }
}

/// Type, value and position of each item to spawn
fn roll_loot(map: &Map, catalog: &LootCatalog, count: u32) -> Result<Vec<(u32, u64, Point)>, GameError> {
    (0..count)
        .map(|_| {
            let loot_type = map.random_loot_type();
            let value = catalog.value_of(map.id(), loot_type)?;
            let (pos, _) = map.random_position(true)?;
            Ok((loot_type, value, pos))
        })
        .collect()
}
