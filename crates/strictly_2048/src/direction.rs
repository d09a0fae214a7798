//! Move directions.

use serde::{Deserialize, Serialize};

/// A direction to slide tiles.
///
/// Keyboard, touch and click input are normalized into this type before
/// they reach the rules.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Slide towards row 0.
    Up,
    /// Slide towards row 3.
    Down,
    /// Slide towards column 0.
    Left,
    /// Slide towards column 3.
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}
