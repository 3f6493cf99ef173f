use std::fmt;
use std::ops::{Add, Mul};

/// Continuous position in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Integer cell coordinate in a room's tile grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TilePosition {
    pub x: i64,
    pub y: i64,
}

impl TilePosition {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn neighbour(self, direction: Direction) -> Self {
        let (dx, dy) = direction.cell_offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Self::Output {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// Cardinal facing. North is towards smaller `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn mask(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 8,
        }
    }

    pub const fn cell_offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn unit(self) -> Vector2 {
        let (x, y) = self.cell_offset();
        Vector2::new(x as f64, y as f64)
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_masks_are_distinct_bits() {
        let combined = Direction::ALL
            .iter()
            .fold(0u8, |acc, direction| acc | direction.mask());
        assert_eq!(combined, 0b1111);
    }

    #[test]
    fn neighbour_follows_screen_axes() {
        let origin = TilePosition::new(3, 3);
        assert_eq!(origin.neighbour(Direction::North), TilePosition::new(3, 2));
        assert_eq!(origin.neighbour(Direction::East), TilePosition::new(4, 3));
        assert_eq!(Direction::West.unit(), Vector2::new(-1.0, 0.0));
        assert_eq!(Direction::South.opposite(), Direction::North);
    }
}
