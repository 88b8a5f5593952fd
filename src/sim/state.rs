//! Entities owned by a session: lost objects, dogs and retirement records
//!
//! Dogs and lost objects never leave their session. The only values that
//! escape are copies: items in a bag, and `RetiredDog` records produced on
//! retirement.

use std::fmt;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Point, Speed, same_point};
use super::map::Map;
use super::road::Road;
use super::session::SessionId;
use crate::consts::DOG_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DogId(pub u32);

impl fmt::Display for DogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootId(pub u32);

impl fmt::Display for LootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A collectible item lying on the map or carried in a bag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LostObject {
    pub id: LootId,
    #[serde(rename = "type")]
    pub loot_type: u32,
    pub value: u64,
    pub pos: Point,
    #[serde(default)]
    pub collected: bool,
}

impl LostObject {
    pub fn new(id: LootId, loot_type: u32, value: u64, pos: Point) -> Self {
        Self {
            id,
            loot_type,
            value,
            pos,
            collected: false,
        }
    }
}

/// A player's dog
#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    pub width: f64,
    pub pos: Point,
    pub prev_pos: Point,
    pub speed: Speed,
    pub direction: Direction,
    /// Road the dog is currently standing on
    pub road: Road,
    pub bag: Vec<LostObject>,
    pub bag_capacity: usize,
    pub score: u64,
    /// Time spent standing still since the last move command or clamp
    pub idle_time: Duration,
    pub time_in_game: Duration,
}

impl Dog {
    pub fn new(id: DogId, name: impl Into<String>, pos: Point, road: Road, bag_capacity: usize) -> Self {
        Self {
            id,
            name: name.into(),
            width: DOG_WIDTH,
            pos,
            prev_pos: pos,
            speed: DVec2::ZERO,
            direction: Direction::default(),
            road,
            bag: Vec::with_capacity(bag_capacity),
            bag_capacity,
            score: 0,
            idle_time: Duration::ZERO,
            time_in_game: Duration::ZERO,
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.speed != DVec2::ZERO
    }

    #[inline]
    pub fn bag_is_full(&self) -> bool {
        self.bag.len() >= self.bag_capacity
    }

    /// Put a copy of `item` in the bag. Returns false when the bag is full.
    pub fn put_in_bag(&mut self, item: LostObject) -> bool {
        if self.bag_is_full() {
            return false;
        }
        self.bag.push(item);
        true
    }

    /// Exchange the bag for score. An empty bag leaves everything as is.
    pub fn hand_over_loot(&mut self) {
        if self.bag.is_empty() {
            return;
        }
        self.score += self.bag.iter().map(|item| item.value).sum::<u64>();
        self.bag.clear();
    }

    /// Apply a move command: face and run in `direction`, or stop on `None`.
    /// Either way the idle accumulator starts over.
    pub fn set_movement(&mut self, direction: Option<Direction>, map_speed: Speed) {
        match direction {
            Some(dir) => {
                self.direction = dir;
                self.speed = dir.velocity(map_speed);
            }
            None => self.speed = DVec2::ZERO,
        }
        self.idle_time = Duration::ZERO;
    }

    /// Advance along the road network for `dt`.
    ///
    /// Movement stays on the current road when it can. Otherwise the map is
    /// asked for a road leading from the current position to the target. A
    /// dog that cannot reach its target is stopped at the edge of the road
    /// in its direction of travel.
    pub fn update_position(&mut self, map: &Map, dt: Duration) {
        let next = self.pos + self.speed * dt.as_secs_f64();

        if self.road.contains_point(next) {
            self.move_to(next);
            return;
        }

        match map.road_from_to(self.pos, next) {
            Some((point, road)) => {
                self.road = *road;
                if same_point(point, next) {
                    self.move_to(next);
                } else {
                    self.stop_at_edge(next, point, point);
                }
            }
            None => {
                let (start, end) = (self.road.start, self.road.end);
                self.stop_at_edge(next, start, end);
            }
        }
    }

    /// Snapshot for the leaderboard; carries no reference back to the session
    pub fn retire(&self, session: SessionId) -> RetiredDog {
        RetiredDog {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            play_time: self.time_in_game,
            session,
        }
    }

    fn move_to(&mut self, pos: Point) {
        self.prev_pos = self.pos;
        self.pos = pos;
    }

    /// Stop at the boundary of the span `a..b`, grown by half the current
    /// road width, on the side the dog is facing. The coordinate across the
    /// direction of travel is kept from `target`.
    fn stop_at_edge(&mut self, target: Point, a: Point, b: Point) {
        let h = self.road.half_width();
        let (lo, hi) = (a.min(b), a.max(b));
        let pos = match self.direction {
            Direction::North => DVec2::new(target.x, lo.y - h),
            Direction::South => DVec2::new(target.x, hi.y + h),
            Direction::West => DVec2::new(lo.x - h, target.y),
            Direction::East => DVec2::new(hi.x + h, target.y),
        };
        self.speed = DVec2::ZERO;
        self.idle_time = Duration::ZERO;
        self.move_to(pos);
    }
}

/// Final record of a dog removed for idling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredDog {
    pub id: DogId,
    pub name: String,
    pub score: u64,
    pub play_time: Duration,
    pub session: SessionId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::map::tests::cross_map;

    fn dog_on(road: Road, pos: Point) -> Dog {
        Dog::new(DogId(0), "Rex", pos, road, 3)
    }

    fn item(id: u32, value: u64) -> LostObject {
        LostObject::new(LootId(id), 0, value, DVec2::ZERO)
    }

    #[test]
    fn test_bag_capacity_is_exact() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = dog_on(road, DVec2::ZERO);
        assert!(dog.put_in_bag(item(0, 1)));
        assert!(dog.put_in_bag(item(1, 1)));
        assert!(dog.put_in_bag(item(2, 1)));
        assert!(!dog.put_in_bag(item(3, 1)));
        assert_eq!(dog.bag.len(), 3);
    }

    #[test]
    fn test_hand_over_loot() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = dog_on(road, DVec2::ZERO);

        dog.hand_over_loot();
        assert_eq!(dog.score, 0);
        assert!(dog.bag.is_empty());

        dog.put_in_bag(item(0, 10));
        dog.put_in_bag(item(1, 30));
        dog.hand_over_loot();
        assert_eq!(dog.score, 40);
        assert!(dog.bag.is_empty());

        // Second hand-over with an empty bag changes nothing
        dog.hand_over_loot();
        assert_eq!(dog.score, 40);
    }

    #[test]
    fn test_set_movement_resets_idle() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = dog_on(road, DVec2::ZERO);
        let speed = DVec2::new(2.0, 3.0);

        dog.idle_time = Duration::from_secs(5);
        dog.set_movement(Some(Direction::East), speed);
        assert_eq!(dog.speed, DVec2::new(2.0, 0.0));
        assert_eq!(dog.direction, Direction::East);
        assert_eq!(dog.idle_time, Duration::ZERO);

        dog.idle_time = Duration::from_secs(5);
        dog.set_movement(None, speed);
        assert!(!dog.is_moving());
        assert_eq!(dog.direction, Direction::East);
        assert_eq!(dog.idle_time, Duration::ZERO);
    }

    #[test]
    fn test_move_within_road() {
        let map = cross_map();
        let mut dog = dog_on(map.roads()[0], DVec2::new(1.0, 0.0));
        dog.set_movement(Some(Direction::East), map.dog_speed());
        dog.update_position(&map, Duration::from_millis(1500));
        assert_eq!(dog.pos, DVec2::new(2.5, 0.0));
        assert_eq!(dog.prev_pos, DVec2::new(1.0, 0.0));
        assert!(dog.is_moving());
    }

    #[test]
    fn test_clamp_at_road_end() {
        let map = cross_map();
        let mut dog = dog_on(map.roads()[0], DVec2::new(9.0, 0.0));
        dog.set_movement(Some(Direction::East), map.dog_speed());
        dog.idle_time = Duration::from_secs(1);
        dog.update_position(&map, Duration::from_secs(5));
        assert_eq!(dog.pos, DVec2::new(10.4, 0.0));
        assert!(!dog.is_moving());
        assert_eq!(dog.idle_time, Duration::ZERO);
    }

    #[test]
    fn test_clamp_sideways_off_road() {
        let map = cross_map();
        let mut dog = dog_on(map.roads()[0], DVec2::new(2.0, 0.0));
        dog.set_movement(Some(Direction::North), map.dog_speed());
        dog.update_position(&map, Duration::from_secs(1));
        assert_eq!(dog.pos, DVec2::new(2.0, -0.4));
        assert!(!dog.is_moving());
    }

    #[test]
    fn test_turn_onto_crossing_road() {
        let map = cross_map();
        let mut dog = dog_on(map.roads()[0], DVec2::new(5.0, 0.0));
        dog.set_movement(Some(Direction::South), map.dog_speed());
        dog.update_position(&map, Duration::from_secs(2));
        assert_eq!(dog.pos, DVec2::new(5.0, 2.0));
        assert_eq!(dog.road, map.roads()[1]);
        assert!(dog.is_moving());
    }

    #[test]
    fn test_overshoot_crossing_road_stops_at_its_end() {
        let map = cross_map();
        let mut dog = dog_on(map.roads()[0], DVec2::new(5.0, 0.0));
        dog.set_movement(Some(Direction::South), map.dog_speed());
        dog.update_position(&map, Duration::from_secs(20));
        assert_eq!(dog.pos, DVec2::new(5.0, 5.4));
        assert_eq!(dog.road, map.roads()[1]);
        assert!(!dog.is_moving());
    }

    #[test]
    fn test_retire_snapshot() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = dog_on(road, DVec2::ZERO);
        dog.score = 12;
        dog.time_in_game = Duration::from_secs(61);
        let retired = dog.retire(SessionId(4));
        assert_eq!(retired.id, DogId(0));
        assert_eq!(retired.name, "Rex");
        assert_eq!(retired.score, 12);
        assert_eq!(retired.play_time, Duration::from_secs(61));
        assert_eq!(retired.session, SessionId(4));
    }
}
