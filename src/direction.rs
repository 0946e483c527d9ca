//! Discrete facing directions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the eight compass facings, in standard sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// Standard row order used when an animation does not list its own.
    pub const STANDARD_ORDER: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Index in [`Direction::STANDARD_ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Default capture yaw in degrees, clockwise from north.
    pub fn yaw(self) -> f32 {
        self.index() as f32 * 45.0
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }

    /// Bucket a 2D facing vector (x right, y up) into a direction.
    ///
    /// Vectors shorter than 0.1 carry no facing and give `None`.
    pub fn from_vector(x: f32, y: f32) -> Option<Direction> {
        if x * x + y * y < 0.01 {
            return None;
        }

        // Counter-clockwise sectors starting at east
        const BY_SECTOR: [Direction; 8] = [
            Direction::E,
            Direction::NE,
            Direction::N,
            Direction::NW,
            Direction::W,
            Direction::SW,
            Direction::S,
            Direction::SE,
        ];

        let angle = y.atan2(x).to_degrees().rem_euclid(360.0);
        let sector = (angle / 45.0).round_ties_even() as usize % 8;
        Some(BY_SECTOR[sector])
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::STANDARD_ORDER
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown direction '{}' (expected N, NE, E, SE, S, SW, W or NW)", s))
    }
}

/// Camera setup for one direction row of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionConfig {
    /// Label written to the manifest
    pub label: String,
    /// Rotation about the vertical axis, degrees
    pub yaw: f32,
    /// Rotation about the horizontal axis, degrees
    pub pitch: f32,
}

impl DirectionConfig {
    pub fn new(label: impl Into<String>, yaw: f32, pitch: f32) -> Self {
        Self { label: label.into(), yaw, pitch }
    }

    /// Standard eight directions at 45° yaw steps and no pitch.
    pub fn standard() -> Vec<DirectionConfig> {
        Direction::STANDARD_ORDER.iter().map(|&d| DirectionConfig::from(d)).collect()
    }
}

impl From<Direction> for DirectionConfig {
    fn from(direction: Direction) -> Self {
        Self::new(direction.label(), direction.yaw(), 0.0)
    }
}
