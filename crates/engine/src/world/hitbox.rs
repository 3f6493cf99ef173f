use std::fmt;

use thiserror::Error;

use super::geometry::{Position, TilePosition};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum HitboxError {
    #[error("hitbox dimensions must be finite and non-negative, got {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("hitbox origin must be finite, got ({x}, {y})")]
    InvalidOrigin { x: f64, y: f64 },
}

/// Axis-aligned rectangle in tile units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Hitbox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, HitboxError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(HitboxError::InvalidOrigin { x, y });
        }
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(HitboxError::InvalidSize { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// For compile-time constants whose dimensions are known to be valid.
    pub const fn new_unchecked(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Unit box covering one grid cell.
    pub fn of_tile(position: TilePosition) -> Self {
        Self {
            x: position.x as f64,
            y: position.y as f64,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Open-interval overlap on both axes; touching edges do not intersect.
    pub fn intersects(&self, other: &Hitbox) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn resolve_relative_to(&self, position: Position) -> Hitbox {
        Hitbox {
            x: self.x + position.x,
            y: self.y + position.y,
            ..*self
        }
    }
}

impl fmt::Display for Hitbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3} {:.3}x{:.3}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Anything that occupies a hitbox in absolute room coordinates.
pub trait Hitboxed {
    fn hitbox(&self) -> Hitbox;
}

impl Hitboxed for Hitbox {
    fn hitbox(&self) -> Hitbox {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hb(x: f64, y: f64, w: f64, h: f64) -> Hitbox {
        Hitbox::new(x, y, w, h).expect("hitbox")
    }

    #[test]
    fn rejects_negative_and_non_finite_dimensions() {
        assert!(Hitbox::new(0.0, 0.0, -1.0, 1.0).is_err());
        assert!(Hitbox::new(0.0, 0.0, 1.0, f64::NAN).is_err());
        assert!(Hitbox::new(f64::INFINITY, 0.0, 1.0, 1.0).is_err());
        assert!(Hitbox::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = hb(0.0, 0.0, 1.0, 1.0);
        assert!(!a.intersects(&hb(1.0, 0.0, 1.0, 1.0)));
        assert!(!a.intersects(&hb(0.0, 1.0, 1.0, 1.0)));
        assert!(a.intersects(&hb(0.999, 0.5, 1.0, 1.0)));
    }

    #[test]
    fn zero_area_boxes_never_intersect_coincident_zero_area() {
        let dot = hb(2.0, 2.0, 0.0, 0.0);
        assert!(!dot.intersects(&dot));
        assert!(!hb(2.0, 2.0, 0.0, 1.0).intersects(&hb(2.0, 2.0, 0.0, 1.0)));
    }

    #[test]
    fn intersection_is_symmetric() {
        let boxes = [
            hb(0.0, 0.0, 1.0, 1.0),
            hb(0.5, 0.5, 1.0, 1.0),
            hb(1.0, 0.0, 1.0, 1.0),
            hb(-2.0, -2.0, 10.0, 0.5),
            hb(0.25, 0.25, 0.0, 0.0),
            hb(0.2, -3.0, 0.1, 8.0),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(a.intersects(b), b.intersects(a), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn resolve_relative_translates_only_origin() {
        let relative = hb(-0.375, -0.5, 0.75, 0.99);
        for position in [
            Position::new(0.0, 0.0),
            Position::new(3.0, 5.0),
            Position::new(-1.25, 7.5),
        ] {
            let resolved = relative.resolve_relative_to(position);
            assert_eq!(resolved.x(), relative.x() + position.x);
            assert_eq!(resolved.y(), relative.y() + position.y);
            assert_eq!(resolved.width(), relative.width());
            assert_eq!(resolved.height(), relative.height());
        }
    }
}
