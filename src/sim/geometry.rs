//! Plane geometry primitives shared by the road network and the dogs
//!
//! Positions and velocities are `DVec2` in map units; +y points south.

use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approx_eq;

/// A position on the map
pub type Point = DVec2;

/// A velocity in map units per second
pub type Speed = DVec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub pos: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

/// Facing of a dog; serialized with the single-letter movement tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "U")]
    North,
    #[serde(rename = "D")]
    South,
    #[serde(rename = "L")]
    West,
    #[serde(rename = "R")]
    East,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "U",
            Direction::South => "D",
            Direction::West => "L",
            Direction::East => "R",
        }
    }

    /// Velocity for this facing given the map's per-axis dog speed
    pub fn velocity(&self, speed: Speed) -> Speed {
        match self {
            Direction::North => DVec2::new(0.0, -speed.y),
            Direction::South => DVec2::new(0.0, speed.y),
            Direction::West => DVec2::new(-speed.x, 0.0),
            Direction::East => DVec2::new(speed.x, 0.0),
        }
    }
}

/// A movement token other than U, D, L or R
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U" => Ok(Direction::North),
            "D" => Ok(Direction::South),
            "L" => Ok(Direction::West),
            "R" => Ok(Direction::East),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Signed area of the parallelogram (p1→p2, p1→target).
///
/// Non-negative when `target` lies on the left of (or on) the directed
/// edge p1→p2.
#[inline]
pub fn pseudoscalar(target: Point, p1: Point, p2: Point) -> f64 {
    (p2.x - p1.x) * (target.y - p1.y) - (target.x - p1.x) * (p2.y - p1.y)
}

/// Point equality with the position tolerance
#[inline]
pub fn same_point(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// Integer grid cell used as the key of the intersection index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    /// Round a point to the nearest grid cell
    pub fn round(p: Point) -> Self {
        Self {
            x: p.x.round() as i64,
            y: p.y.round() as i64,
        }
    }
}
