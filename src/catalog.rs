//! Loot type descriptors per map
//!
//! Descriptors are opaque JSON objects handed through to clients unchanged.
//! The simulation only ever reads the numeric `value` of a type.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::GameError;
use crate::sim::MapId;

/// Read-only after load; shared behind an `Arc`
#[derive(Debug, Clone, Default)]
pub struct LootCatalog {
    types: HashMap<MapId, Vec<Value>>,
}

impl LootCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the descriptors of a map, replacing any earlier ones
    pub fn add(&mut self, map: MapId, descriptors: Vec<Value>) {
        self.types.insert(map, descriptors);
    }

    /// Point value of `loot_type` on `map`
    pub fn value_of(&self, map: &MapId, loot_type: u32) -> Result<u64, GameError> {
        self.types
            .get(map)
            .and_then(|types| types.get(loot_type as usize))
            .and_then(|descriptor| descriptor.get("value"))
            .and_then(Value::as_u64)
            .ok_or_else(|| GameError::UnknownLootType {
                map: map.clone(),
                loot_type,
            })
    }

    /// Descriptors of `map` exactly as configured
    pub fn descriptors_of(&self, map: &MapId) -> Option<&[Value]> {
        self.types.get(map).map(Vec::as_slice)
    }

    pub fn type_count(&self, map: &MapId) -> usize {
        self.types.get(map).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> LootCatalog {
        let mut catalog = LootCatalog::new();
        catalog.add(
            MapId::from("town"),
            vec![
                json!({"name": "key", "file": "assets/key.obj", "value": 10}),
                json!({"name": "wallet", "value": 30, "scale": 0.03}),
                json!({"name": "broken"}),
            ],
        );
        catalog
    }

    #[test]
    fn test_value_of() {
        let catalog = catalog();
        let town = MapId::from("town");
        assert_eq!(catalog.value_of(&town, 0).unwrap(), 10);
        assert_eq!(catalog.value_of(&town, 1).unwrap(), 30);
    }

    #[test]
    fn test_value_of_unknown() {
        let catalog = catalog();
        let town = MapId::from("town");
        for loot_type in [2, 3] {
            assert_eq!(
                catalog.value_of(&town, loot_type).unwrap_err(),
                GameError::UnknownLootType {
                    map: town.clone(),
                    loot_type
                }
            );
        }
        assert!(catalog.value_of(&MapId::from("nowhere"), 0).is_err());
    }

    #[test]
    fn test_descriptors_verbatim() {
        let catalog = catalog();
        let descriptors = catalog.descriptors_of(&MapId::from("town")).unwrap();
        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[1]["scale"], json!(0.03));
        assert_eq!(catalog.type_count(&MapId::from("town")), 3);
        assert!(catalog.descriptors_of(&MapId::from("nowhere")).is_none());
    }
}
