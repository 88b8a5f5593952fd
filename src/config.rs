//! Game configuration loading
//!
//! The config file is JSON with camelCase keys. Durations are in seconds,
//! speeds in map units per second. Per-map `dogSpeed` and `bagCapacity`
//! override the game-level defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::LootCatalog;
use crate::consts::{DEFAULT_BAG_CAPACITY, DEFAULT_DOG_SPEED, DEFAULT_RETIREMENT_SECS};
use crate::error::ConfigError;
use crate::sim::{
    Building, Game, LootGenerator, Map, MapId, MapParams, Office, OfficeId, Offset, Rectangle,
    Road, Size,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub loot_generator_config: LootGeneratorConfig,
    #[serde(default)]
    pub default_dog_speed: Option<f64>,
    #[serde(default)]
    pub default_bag_capacity: Option<usize>,
    /// Seconds a dog may stand still before it retires
    #[serde(default)]
    pub dog_retirement_time: Option<f64>,
    pub maps: Vec<MapConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LootGeneratorConfig {
    /// Base interval in seconds
    pub period: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dog_speed: Option<f64>,
    #[serde(default)]
    pub bag_capacity: Option<usize>,
    pub roads: Vec<RoadConfig>,
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
    #[serde(default)]
    pub offices: Vec<OfficeConfig>,
    pub loot_types: Vec<Value>,
}

/// A road starts at (x0, y0) and ends at x1 (horizontal) or y1 (vertical)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadConfig {
    pub x0: f64,
    pub y0: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingConfig {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeConfig {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl RoadConfig {
    fn to_road(self, map: &str) -> Result<Road, ConfigError> {
        let start = DVec2::new(self.x0, self.y0);
        match (self.x1, self.y1) {
            (Some(x1), None) => Ok(Road::horizontal(start, x1)),
            (None, Some(y1)) => Ok(Road::vertical(start, y1)),
            _ => Err(ConfigError::Invalid(format!(
                "map `{map}`: road at ({}, {}) needs exactly one of x1, y1",
                self.x0, self.y0
            ))),
        }
    }
}

impl GameConfig {
    /// Build the game. Each map's random source is seeded from `seed` and
    /// its position in the config.
    pub fn into_game(self, seed: u64) -> Result<Game, ConfigError> {
        let lg = self.loot_generator_config;
        let period = seconds("loot generator period", lg.period)?;
        if !(0.0..=1.0).contains(&lg.probability) {
            return Err(ConfigError::Invalid(format!(
                "loot generator probability {} must be within [0, 1]",
                lg.probability
            )));
        }
        let retirement_time = seconds(
            "dog retirement time",
            self.dog_retirement_time.unwrap_or(DEFAULT_RETIREMENT_SECS),
        )?;
        let default_speed = self.default_dog_speed.unwrap_or(DEFAULT_DOG_SPEED);
        let default_capacity = self.default_bag_capacity.unwrap_or(DEFAULT_BAG_CAPACITY);

        let mut catalog = LootCatalog::new();
        let mut maps = Vec::with_capacity(self.maps.len());
        for (index, cfg) in self.maps.into_iter().enumerate() {
            let speed = cfg.dog_speed.unwrap_or(default_speed);
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(ConfigError::Invalid(format!("map `{}`: dog speed {speed} must be >= 0", cfg.id)));
            }
            if cfg.roads.is_empty() {
                return Err(ConfigError::Invalid(format!("map `{}` has no roads", cfg.id)));
            }
            if cfg.loot_types.is_empty() {
                return Err(ConfigError::Invalid(format!("map `{}` has no loot types", cfg.id)));
            }
            if let Some(index) = cfg
                .loot_types
                .iter()
                .position(|descriptor| descriptor.get("value").and_then(Value::as_u64).is_none())
            {
                return Err(ConfigError::Invalid(format!(
                    "map `{}`: loot type {index} needs a non-negative integer `value`",
                    cfg.id
                )));
            }

            let params = MapParams {
                dog_speed: DVec2::splat(speed),
                bag_capacity: cfg.bag_capacity.unwrap_or(default_capacity),
                retirement_time,
                loot_type_count: u32::try_from(cfg.loot_types.len()).unwrap_or(u32::MAX),
            };
            let id = MapId(cfg.id.clone());
            let mut map = Map::new(id.clone(), cfg.name, params, seed.wrapping_add(index as u64));
            for road in cfg.roads {
                map.add_road(road.to_road(&cfg.id)?);
            }
            for b in cfg.buildings {
                map.add_building(Building {
                    bounds: Rectangle {
                        pos: DVec2::new(b.x, b.y),
                        size: Size { width: b.w, height: b.h },
                    },
                });
            }
            for o in cfg.offices {
                map.add_office(Office::new(
                    OfficeId(o.id),
                    DVec2::new(o.x, o.y),
                    Offset { dx: o.offset_x, dy: o.offset_y },
                ))?;
            }
            catalog.add(id, cfg.loot_types);
            maps.push(map);
        }

        let generator = LootGenerator::new(period, lg.probability);
        let mut game = Game::new(catalog, generator);
        for map in maps {
            game.add_map(map)?;
        }
        Ok(game)
    }
}

/// Seconds from the config as a `Duration`; negative, NaN and out of range
/// values are rejected
fn seconds(what: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|err| ConfigError::Invalid(format!("{what} {secs}: {err}")))
}

pub fn parse_config(text: &str) -> Result<GameConfig, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse and build a game with randomly seeded maps
pub fn parse_game(text: &str) -> Result<Game, ConfigError> {
    parse_config(text)?.into_game(rand::random())
}

/// Read, parse and build the game described by the file at `path`
pub fn load_game(path: &Path) -> Result<Game, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let game = parse_game(&text)?;
    log::info!("Loaded {} map(s) from {}", game.maps().len(), path.display());
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    const CONFIG: &str = r#"{
        "defaultDogSpeed": 3.0,
        "dogRetirementTime": 15.5,
        "lootGeneratorConfig": {"period": 5.0, "probability": 0.5},
        "maps": [
            {
                "id": "map1",
                "name": "Map 1",
                "dogSpeed": 4,
                "lootTypes": [
                    {"name": "key", "file": "assets/key.obj", "type": "obj", "value": 10},
                    {"name": "wallet", "value": 30}
                ],
                "roads": [
                    {"x0": 0, "y0": 0, "x1": 40},
                    {"x0": 40, "y0": 0, "y1": 30},
                    {"x0": 40, "y0": 30, "x1": 0}
                ],
                "buildings": [{"x": 5, "y": 5, "w": 30, "h": 20}],
                "offices": [{"id": "o0", "x": 40, "y": 30, "offsetX": 5, "offsetY": 0}]
            },
            {
                "id": "town",
                "name": "Town",
                "bagCapacity": 5,
                "lootTypes": [{"value": 1}],
                "roads": [{"x0": 0, "y0": 0, "y1": 10}]
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let game = parse_config(CONFIG).unwrap().into_game(1).unwrap();
        assert_eq!(game.maps().len(), 2);

        let map1 = game.map(&MapId::from("map1")).unwrap();
        assert_eq!(map1.name(), "Map 1");
        assert_eq!(map1.roads().len(), 3);
        assert!(map1.roads()[1].is_vertical());
        assert_eq!(map1.buildings().len(), 1);
        assert_eq!(map1.offices()[0].offset, Offset { dx: 5.0, dy: 0.0 });
        assert_eq!(map1.dog_speed(), DVec2::splat(4.0));
        assert_eq!(map1.bag_capacity(), DEFAULT_BAG_CAPACITY);
        assert_eq!(map1.retirement_time(), Duration::from_millis(15_500));
        assert_eq!(map1.loot_type_count(), 2);

        let town = game.map(&MapId::from("town")).unwrap();
        assert_eq!(town.dog_speed(), DVec2::splat(3.0));
        assert_eq!(town.bag_capacity(), 5);

        assert_eq!(game.catalog().value_of(&MapId::from("map1"), 1).unwrap(), 30);
        let descriptors = game.catalog().descriptors_of(&MapId::from("map1")).unwrap();
        assert_eq!(descriptors[0]["file"], "assets/key.obj");
    }

    #[test]
    fn test_defaults() {
        let text = r#"{
            "lootGeneratorConfig": {"period": 1, "probability": 0.1},
            "maps": [{"id": "m", "name": "M", "lootTypes": [{"value": 1}], "roads": [{"x0": 0, "y0": 0, "x1": 5}]}]
        }"#;
        let game = parse_game(text).unwrap();
        let map = game.map(&MapId::from("m")).unwrap();
        assert_eq!(map.dog_speed(), DVec2::splat(DEFAULT_DOG_SPEED));
        assert_eq!(map.retirement_time(), Duration::from_secs(60));
        assert!(map.offices().is_empty());
    }

    #[test]
    fn test_road_needs_one_end() {
        for road in [r#"{"x0": 0, "y0": 0}"#, r#"{"x0": 0, "y0": 0, "x1": 1, "y1": 1}"#] {
            let text = format!(
                r#"{{"lootGeneratorConfig": {{"period": 1, "probability": 0.1}},
                    "maps": [{{"id": "m", "name": "M", "lootTypes": [{{"value": 1}}], "roads": [{road}]}}]}}"#
            );
            assert!(matches!(parse_game(&text), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_rejects_empty_maps() {
        let no_roads = r#"{"lootGeneratorConfig": {"period": 1, "probability": 0.1},
            "maps": [{"id": "m", "name": "M", "lootTypes": [{"value": 1}], "roads": []}]}"#;
        assert!(matches!(parse_game(no_roads), Err(ConfigError::Invalid(_))));

        let no_loot = r#"{"lootGeneratorConfig": {"period": 1, "probability": 0.1},
            "maps": [{"id": "m", "name": "M", "lootTypes": [], "roads": [{"x0": 0, "y0": 0, "x1": 5}]}]}"#;
        assert!(matches!(parse_game(no_loot), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicates_rejected() {
        let dup_map = r#"{"lootGeneratorConfig": {"period": 1, "probability": 0.1}, "maps": [
            {"id": "m", "name": "M", "lootTypes": [{"value": 1}], "roads": [{"x0": 0, "y0": 0, "x1": 5}]},
            {"id": "m", "name": "M2", "lootTypes": [{"value": 1}], "roads": [{"x0": 0, "y0": 0, "x1": 5}]}
        ]}"#;
        assert!(matches!(
            parse_game(dup_map),
            Err(ConfigError::Game(GameError::DuplicateMap(_)))
        ));

        let dup_office = r#"{"lootGeneratorConfig": {"period": 1, "probability": 0.1}, "maps": [
            {"id": "m", "name": "M", "lootTypes": [{"value": 1}], "roads": [{"x0": 0, "y0": 0, "x1": 5}],
             "offices": [{"id": "o", "x": 0, "y": 0, "offsetX": 0, "offsetY": 0},
                         {"id": "o", "x": 1, "y": 0, "offsetX": 0, "offsetY": 0}]}
        ]}"#;
        assert!(matches!(
            parse_game(dup_office),
            Err(ConfigError::Game(GameError::DuplicateOffice(_)))
        ));
    }

    #[test]
    fn test_malformed_json_and_bad_probability() {
        assert!(matches!(parse_game("{"), Err(ConfigError::Parse(_))));
        let text = r#"{"lootGeneratorConfig": {"period": 1, "probability": 1.5}, "maps": []}"#;
        assert!(matches!(parse_game(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_loot_type_needs_value() {
        for loot in [r#"{"name": "key"}"#, r#"{"value": -5}"#, r#"{"value": 2.5}"#, r#"{"value": "10"}"#] {
            let text = format!(
                r#"{{"lootGeneratorConfig": {{"period": 1, "probability": 0.1}},
                    "maps": [{{"id": "m", "name": "M", "lootTypes": [{{"value": 1}}, {loot}],
                               "roads": [{{"x0": 0, "y0": 0, "x1": 5}}]}}]}}"#
            );
            match parse_game(&text) {
                Err(ConfigError::Invalid(msg)) => assert!(msg.contains("loot type 1"), "{msg}"),
                other => panic!("expected Invalid for {loot}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let huge_retirement = r#"{"dogRetirementTime": 1e30,
            "lootGeneratorConfig": {"period": 1, "probability": 0.1},
            "maps": [{"id": "m", "name": "M", "lootTypes": [{"value": 1}], "roads": [{"x0": 0, "y0": 0, "x1": 5}]}]}"#;
        assert!(matches!(parse_game(huge_retirement), Err(ConfigError::Invalid(_))));

        let huge_period = r#"{"lootGeneratorConfig": {"period": 1e300, "probability": 0.1}, "maps": []}"#;
        assert!(matches!(parse_game(huge_period), Err(ConfigError::Invalid(_))));

        let negative_period = r#"{"lootGeneratorConfig": {"period": -1, "probability": 0.1}, "maps": []}"#;
        assert!(matches!(parse_game(negative_period), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_game(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
