//! Collision detection between moving dogs and static targets
//!
//! A dog sweeps a straight segment each tick. A target is hit when its
//! projection falls on the segment and it lies within the combined radius of
//! the segment. Events are ordered by how far along the segment they happen
//! so that resolution approximates chronological order.

use std::cmp::Ordering;

use super::geometry::Point;
use super::map::Office;
use super::state::{DogId, LootId, LostObject};

/// Projection of a target onto a movement segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Squared distance from the target to the segment's line
    pub sq_distance: f64,
    /// Position of the projection along the segment (0 = start, 1 = end)
    pub proj_ratio: f64,
}

impl CollisionResult {
    /// Whether the target is reached within `radius` while on the segment
    pub fn is_collected(&self, radius: f64) -> bool {
        (0.0..=1.0).contains(&self.proj_ratio) && self.sq_distance <= radius * radius
    }
}

/// Project `target` onto the segment `start -> end`.
///
/// Returns `None` for a zero-length segment, which has no direction to
/// project onto.
pub fn try_collect_point(start: Point, end: Point, target: Point) -> Option<CollisionResult> {
    let u = target - start;
    let v = end - start;
    let v_len2 = v.length_squared();
    if v_len2 == 0.0 {
        return None;
    }
    let u_dot_v = u.dot(v);
    Some(CollisionResult {
        sq_distance: u.length_squared() - u_dot_v * u_dot_v / v_len2,
        proj_ratio: u_dot_v / v_len2,
    })
}

/// A dog's sweep over one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gatherer {
    pub dog: DogId,
    pub start: Point,
    pub end: Point,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventKind {
    Collect,
    HandIn,
}

/// What was hit. Loot orders before offices, each by its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CollisionTarget {
    Loot(LootId),
    /// Index into the map's office list
    Office(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub kind: CollisionEventKind,
    pub dog: DogId,
    pub target: CollisionTarget,
    /// Copy of the loot as it was when the event was found
    pub item: Option<LostObject>,
    pub sq_distance: f64,
    pub proj_ratio: f64,
}

impl CollisionEvent {
    /// Resolution order: projection ratio, then dog id, then target
    fn resolution_order(&self, other: &Self) -> Ordering {
        self.proj_ratio
            .total_cmp(&other.proj_ratio)
            .then(self.dog.cmp(&other.dog))
            .then(self.target.cmp(&other.target))
    }
}

/// Find every loot pickup and office visit along the gatherers' sweeps.
///
/// Collected loot is ignored. Stationary gatherers produce nothing. The
/// result is sorted in resolution order.
pub fn find_events<'a>(
    gatherers: &[Gatherer],
    loot: impl IntoIterator<Item = &'a LostObject> + Clone,
    offices: &[Office],
) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    for g in gatherers {
        let reach = g.width / 2.0;

        for item in loot.clone().into_iter().filter(|item| !item.collected) {
            let Some(hit) = try_collect_point(g.start, g.end, item.pos) else {
                break;
            };
            if hit.is_collected(reach) {
                events.push(CollisionEvent {
                    kind: CollisionEventKind::Collect,
                    dog: g.dog,
                    target: CollisionTarget::Loot(item.id),
                    item: Some(*item),
                    sq_distance: hit.sq_distance,
                    proj_ratio: hit.proj_ratio,
                });
            }
        }

        for (index, office) in offices.iter().enumerate() {
            let Some(hit) = try_collect_point(g.start, g.end, office.pos) else {
                break;
            };
            if hit.is_collected(reach + office.width / 2.0) {
                events.push(CollisionEvent {
                    kind: CollisionEventKind::HandIn,
                    dog: g.dog,
                    target: CollisionTarget::Office(index),
                    item: None,
                    sq_distance: hit.sq_distance,
                    proj_ratio: hit.proj_ratio,
                });
            }
        }
    }

    events.sort_by(CollisionEvent::resolution_order);
    events
}
