//! Road network, buildings and offices of one map
//!
//! A map is assembled once through `add_road` / `add_building` /
//! `add_office` and is read-only afterwards, apart from its random source.
//! Maps are shared between sessions behind an `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{GridPoint, Offset, Point, Rectangle, Speed};
use super::road::Road;
use crate::approx_eq;
use crate::consts::OFFICE_WIDTH;
use crate::error::GameError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub String);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MapId {
    fn from(s: &str) -> Self {
        MapId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficeId(pub String);

impl fmt::Display for OfficeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A building; only its outline matters, and only to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub bounds: Rectangle,
}

/// A hand-in point where bags are exchanged for score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub pos: Point,
    pub offset: Offset,
    pub width: f64,
}

impl Office {
    pub fn new(id: OfficeId, pos: Point, offset: Offset) -> Self {
        Self {
            id,
            pos,
            offset,
            width: OFFICE_WIDTH,
        }
    }
}

/// Per-map gameplay parameters resolved from the config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapParams {
    pub dog_speed: Speed,
    pub bag_capacity: usize,
    pub retirement_time: Duration,
    pub loot_type_count: u32,
}

pub struct Map {
    id: MapId,
    name: String,
    params: MapParams,
    roads: Vec<Road>,
    buildings: Vec<Building>,
    offices: Vec<Office>,
    office_index: HashMap<OfficeId, usize>,
    /// Grid point -> indices of the roads passing through it
    intersections: IntersectionIndex,
    rng: Mutex<Pcg32>,
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("roads", &self.roads.len())
            .field("offices", &self.offices.len())
            .finish()
    }
}

impl Map {
    pub fn new(id: MapId, name: impl Into<String>, params: MapParams, seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            params,
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            office_index: HashMap::new(),
            intersections: HashMap::new(),
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }

    pub fn id(&self) -> &MapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn dog_speed(&self) -> Speed {
        self.params.dog_speed
    }

    pub fn bag_capacity(&self) -> usize {
        self.params.bag_capacity
    }

    pub fn retirement_time(&self) -> Duration {
        self.params.retirement_time
    }

    pub fn loot_type_count(&self) -> u32 {
        self.params.loot_type_count
    }

    /// Roads whose index entry covers the grid cell nearest to `p`
    pub fn roads_at(&self, p: Point) -> impl Iterator<Item = &Road> + '_ {
        self.intersections
            .get(&GridPoint::round(p))
            .into_iter()
            .flat_map(|set| set.iter().map(|&i| &self.roads[i]))
    }

    /// Add a road and index every point where it meets the existing network.
    ///
    /// Each existing road is intersected with the new one by solving the
    /// parametric system start + t * (end - start) for both segments. Crossing
    /// roads (non-zero determinant) register the crossing point against both;
    /// collinear roads on the same line register the endpoints of one that
    /// fall within the span of the other. The new road's own endpoints are
    /// always registered against itself.
    pub fn add_road(&mut self, road: Road) {
        let new_index = self.roads.len();
        let (ts, te) = (road.start, road.end);

        for (index, other) in self.roads.iter().enumerate() {
            let (rs, re) = (other.start, other.end);
            let denominator = (te.x - ts.x) * (re.y - rs.y) - (te.y - ts.y) * (re.x - rs.x);

            if denominator == 0.0 {
                if road.is_horizontal() && other.is_horizontal() && approx_eq(ts.y, rs.y) {
                    let pairs = overlapping_endpoints(ts.x, te.x, rs.x, re.x);
                    register_overlap(&mut self.intersections, pairs, &road, new_index, other, index);
                } else if road.is_vertical() && other.is_vertical() && approx_eq(ts.x, rs.x) {
                    let pairs = overlapping_endpoints(ts.y, te.y, rs.y, re.y);
                    register_overlap(&mut self.intersections, pairs, &road, new_index, other, index);
                }
                continue;
            }

            let numerator_t1 = (rs.x - ts.x) * (re.y - rs.y) + (ts.y - rs.y) * (re.x - rs.x);
            let numerator_t2 = (ts.y - rs.y) * (te.x - ts.x) + (rs.x - ts.x) * (te.y - ts.y);
            let t1 = numerator_t1 / denominator;
            let t2 = numerator_t2 / denominator;

            if (0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2) {
                let point = ts + (te - ts) * t1;
                let cell = self.intersections.entry(GridPoint::round(point)).or_default();
                cell.insert(new_index);
                cell.insert(index);
            }
        }

        self.index_point(ts, new_index);
        self.index_point(te, new_index);
        self.roads.push(road);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    /// Add an office; duplicate ids are rejected and leave the map untouched
    pub fn add_office(&mut self, office: Office) -> Result<(), GameError> {
        if self.office_index.contains_key(&office.id) {
            return Err(GameError::DuplicateOffice(office.id));
        }
        self.office_index.insert(office.id.clone(), self.offices.len());
        self.offices.push(office);
        Ok(())
    }

    pub fn office(&self, id: &OfficeId) -> Option<&Office> {
        self.office_index.get(id).map(|&i| &self.offices[i])
    }

    /// Find the road a dog standing at `from` may continue onto to reach `to`.
    ///
    /// Only roads indexed at the grid cell nearest to `from` are candidates.
    /// A candidate containing `to` wins outright and `to` is returned
    /// unchanged. Otherwise a candidate running along the direction of travel,
    /// whose band covers `to` across the axis, stops the dog at its far end.
    /// `None` means no road qualifies.
    pub fn road_from_to(&self, from: Point, to: Point) -> Option<(Point, &Road)> {
        let candidates = self.intersections.get(&GridPoint::round(from))?;

        if let Some(road) = candidates
            .iter()
            .map(|&i| &self.roads[i])
            .find(|road| road.contains_point(to))
        {
            return Some((to, road));
        }

        for road in candidates.iter().map(|&i| &self.roads[i]) {
            let h = road.half_width();
            let (lo, hi) = (road.min_corner(), road.max_corner());

            if approx_eq(from.x, to.x)
                && road.is_vertical()
                && to.x >= road.end.x - h
                && to.x <= road.end.x + h
            {
                let y = if to.y > from.y { hi.y } else { lo.y };
                return Some((DVec2::new(to.x, y), road));
            }
            if approx_eq(from.y, to.y)
                && road.is_horizontal()
                && to.y >= road.end.y - h
                && to.y <= road.end.y + h
            {
                let x = if to.x > from.x { hi.x } else { lo.x };
                return Some((DVec2::new(x, to.y), road));
            }
        }
        None
    }

    /// Pick a spawn position.
    ///
    /// With `randomize` off this is the start of the first road; otherwise a
    /// uniformly random road and a uniformly random point along it.
    pub fn random_position(&self, randomize: bool) -> Result<(Point, Road), GameError> {
        let Some(first) = self.roads.first() else {
            return Err(GameError::MapHasNoRoads(self.id.clone()));
        };
        if !randomize {
            return Ok((first.start, *first));
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let road = self.roads[rng.random_range(0..self.roads.len())];
        let t: f64 = rng.random();
        Ok((road.start + (road.end - road.start) * t, road))
    }

    /// Uniform loot type in `[0, loot_type_count)`
    pub fn random_loot_type(&self) -> u32 {
        if self.params.loot_type_count <= 1 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..self.params.loot_type_count)
    }

    fn index_point(&mut self, p: Point, road_index: usize) {
        index_point(&mut self.intersections, p, road_index);
    }
}

type IntersectionIndex = HashMap<GridPoint, BTreeSet<usize>>;

fn index_point(intersections: &mut IntersectionIndex, p: Point, road_index: usize) {
    intersections
        .entry(GridPoint::round(p))
        .or_default()
        .insert(road_index);
}

/// Index each endpoint lying inside the other span against that other road
fn register_overlap(
    intersections: &mut IntersectionIndex,
    pairs: Overlap,
    road: &Road,
    road_index: usize,
    other: &Road,
    other_index: usize,
) {
    if pairs.first_start_in_second {
        index_point(intersections, road.start, other_index);
    }
    if pairs.first_end_in_second {
        index_point(intersections, road.end, other_index);
    }
    if pairs.second_start_in_first {
        index_point(intersections, other.start, road_index);
    }
    if pairs.second_end_in_first {
        index_point(intersections, other.end, road_index);
    }
}

/// Which endpoints of two collinear spans fall inside the other span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Overlap {
    first_start_in_second: bool,
    first_end_in_second: bool,
    second_start_in_first: bool,
    second_end_in_first: bool,
}

fn overlapping_endpoints(a0: f64, a1: f64, b0: f64, b1: f64) -> Overlap {
    let within = |v: f64, s: f64, e: f64| v >= s.min(e) && v <= s.max(e);
    Overlap {
        first_start_in_second: within(a0, b0, b1),
        first_end_in_second: within(a1, b0, b1),
        second_start_in_first: within(b0, a0, a1),
        second_end_in_first: within(b1, a0, a1),
    }
}

/// Append-only registry of loaded maps, shared read-only across sessions
#[derive(Debug, Default, Clone)]
pub struct MapRegistry {
    maps: Vec<Arc<Map>>,
    index: HashMap<MapId, usize>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map; a duplicate id is rejected and the registry is unchanged
    pub fn add(&mut self, map: Map) -> Result<Arc<Map>, GameError> {
        if self.index.contains_key(map.id()) {
            return Err(GameError::DuplicateMap(map.id().clone()));
        }
        let map = Arc::new(map);
        self.index.insert(map.id().clone(), self.maps.len());
        self.maps.push(map.clone());
        Ok(map)
    }

    pub fn get(&self, id: &MapId) -> Option<&Arc<Map>> {
        self.index.get(id).map(|&i| &self.maps[i])
    }

    pub fn require(&self, id: &MapId) -> Result<&Arc<Map>, GameError> {
        self.get(id).ok_or_else(|| GameError::MapNotFound(id.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Map>> {
        self.maps.iter()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
