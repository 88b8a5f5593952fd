//! Serializable image of every live session

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sim::{
    Direction, Dog, DogId, GameSession, LootGenerator, LostObject, MapId, Point, Road, SessionId,
    Speed,
};

/// Whole-game state as written to the state file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub sessions: Vec<SessionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub name: String,
    pub map_id: MapId,
    pub dogs: Vec<DogSnapshot>,
    pub loot: Vec<LostObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogSnapshot {
    pub id: DogId,
    pub name: String,
    pub width: f64,
    pub curr_pos: Point,
    pub prev_pos: Point,
    pub speed: Speed,
    pub direction: Direction,
    pub current_road: Road,
    pub bag_capacity: usize,
    pub bag: Vec<LostObject>,
    pub score: u64,
    /// Kept at full precision as `{secs, nanos}`; zero when absent
    #[serde(default)]
    pub idle_time: Duration,
    #[serde(default)]
    pub time_in_game: Duration,
}

impl From<&Dog> for DogSnapshot {
    fn from(dog: &Dog) -> Self {
        Self {
            id: dog.id,
            name: dog.name.clone(),
            width: dog.width,
            curr_pos: dog.pos,
            prev_pos: dog.prev_pos,
            speed: dog.speed,
            direction: dog.direction,
            current_road: dog.road,
            bag_capacity: dog.bag_capacity,
            bag: dog.bag.clone(),
            score: dog.score,
            idle_time: dog.idle_time,
            time_in_game: dog.time_in_game,
        }
    }
}

impl From<DogSnapshot> for Dog {
    fn from(s: DogSnapshot) -> Self {
        let mut dog = Dog::new(s.id, s.name, s.curr_pos, s.current_road, s.bag_capacity);
        dog.width = s.width;
        dog.prev_pos = s.prev_pos;
        dog.speed = s.speed;
        dog.direction = s.direction;
        dog.bag = s.bag;
        dog.score = s.score;
        dog.idle_time = s.idle_time;
        dog.time_in_game = s.time_in_game;
        dog
    }
}

impl From<&GameSession> for SessionSnapshot {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id(),
            name: session.name().to_string(),
            map_id: session.map_id().clone(),
            dogs: session.dogs().map(DogSnapshot::from).collect(),
            loot: session.loot().copied().collect(),
        }
    }
}

impl SessionSnapshot {
    /// Rebuild the session. Id counters end up above every restored id.
    pub fn into_session(self, loot_generator: LootGenerator) -> GameSession {
        let mut session = GameSession::new(self.id, self.name, self.map_id, loot_generator);
        for dog in self.dogs {
            session.load_dog(dog.into());
        }
        for item in self.loot {
            session.load_lost_object(item);
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LootId;
    use glam::DVec2;

    #[test]
    fn test_dog_snapshot_layout() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = Dog::new(DogId(2), "Rex", DVec2::new(1.5, 0.0), road, 3);
        dog.set_movement(Some(Direction::West), DVec2::ONE);
        let json = serde_json::to_value(DogSnapshot::from(&dog)).unwrap();

        for key in [
            "id", "name", "width", "currPos", "prevPos", "speed", "direction", "currentRoad",
            "bagCapacity", "bag", "score",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["direction"], "L");
        assert_eq!(json["currentRoad"]["width"], 0.8);
    }

    #[test]
    fn test_timers_default_when_absent() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let dog = Dog::new(DogId(0), "Rex", DVec2::ZERO, road, 3);
        let mut json = serde_json::to_value(DogSnapshot::from(&dog)).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("idleTime");
        obj.remove("timeInGame");

        let restored: DogSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(restored.idle_time, Duration::ZERO);
        assert_eq!(restored.time_in_game, Duration::ZERO);
    }

    #[test]
    fn test_timers_keep_sub_millisecond_precision() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = Dog::new(DogId(0), "Rex", DVec2::ZERO, road, 3);
        dog.idle_time = Duration::new(2, 345_678_901);
        dog.time_in_game = Duration::from_nanos(16_666_667);

        let text = serde_json::to_string(&DogSnapshot::from(&dog)).unwrap();
        let restored = Dog::from(serde_json::from_str::<DogSnapshot>(&text).unwrap());
        assert_eq!(restored.idle_time, Duration::new(2, 345_678_901));
        assert_eq!(restored.time_in_game, Duration::from_nanos(16_666_667));
    }

    #[test]
    fn test_session_restore_bumps_counters() {
        let road = Road::horizontal(DVec2::ZERO, 10.0);
        let mut dog = Dog::new(DogId(4), "Rex", DVec2::ZERO, road, 3);
        dog.put_in_bag(LostObject::new(LootId(9), 0, 5, DVec2::ZERO));
        let snapshot = SessionSnapshot {
            id: SessionId(1),
            name: "Town".into(),
            map_id: MapId::from("town"),
            dogs: vec![DogSnapshot::from(&dog)],
            loot: vec![LostObject::new(LootId(3), 1, 7, DVec2::new(2.0, 0.0))],
        };

        let session = snapshot.clone().into_session(LootGenerator::new(Duration::from_secs(1), 0.5));
        assert_eq!(session.dog_id_counter(), 5);
        assert_eq!(session.loot_id_counter(), 10);
        assert_eq!(SessionSnapshot::from(&session), snapshot);
    }
}
