use thiserror::Error;

use super::geometry::TilePosition;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

/// Fixed-size row-major 2D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid2D<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Result<Self, GridError> {
        Self::from_fn(width, height, |_| fill.clone())
    }
}

impl<T> Grid2D<T> {
    pub fn from_fn(
        width: usize,
        height: usize,
        mut init: impl FnMut(TilePosition) -> T,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(init(TilePosition::new(x as i64, y as i64)));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    fn index(&self, x: i64, y: i64) -> Result<usize, GridError> {
        if self.contains(x, y) {
            Ok(y as usize * self.width + x as usize)
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn get(&self, x: i64, y: i64) -> Result<&T, GridError> {
        let index = self.index(x, y)?;
        Ok(&self.cells[index])
    }

    pub fn get_mut(&mut self, x: i64, y: i64) -> Result<&mut T, GridError> {
        let index = self.index(x, y)?;
        Ok(&mut self.cells[index])
    }

    pub fn get_or_none(&self, x: i64, y: i64) -> Option<&T> {
        self.get(x, y).ok()
    }

    /// Replaces a cell, returning the previous value.
    pub fn set(&mut self, x: i64, y: i64, value: T) -> Result<T, GridError> {
        let index = self.index(x, y)?;
        Ok(std::mem::replace(&mut self.cells[index], value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TilePosition, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            (
                TilePosition::new((index % width) as i64, (index / width) as i64),
                cell,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TilePosition, &mut T)> {
        let width = self.width;
        self.cells.iter_mut().enumerate().map(move |(index, cell)| {
            (
                TilePosition::new((index % width) as i64, (index / width) as i64),
                cell,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            Grid2D::new(0, 3, 0u8),
            Err(GridError::ZeroSize {
                width: 0,
                height: 3
            })
        );
        assert!(Grid2D::new(3, 0, 0u8).is_err());
    }

    #[test]
    fn access_is_bounds_checked() {
        let mut grid = Grid2D::new(2, 3, 7u8).expect("grid");
        assert_eq!(grid.get(1, 2), Ok(&7));
        assert!(matches!(
            grid.get(2, 0),
            Err(GridError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(grid.get(-1, 0).is_err());
        assert_eq!(grid.get_or_none(0, 3), None);
        assert_eq!(grid.set(0, 0, 9), Ok(7));
        assert_eq!(grid.get(0, 0), Ok(&9));
        assert!(grid.set(5, 5, 1).is_err());
    }

    #[test]
    fn iteration_is_row_major_with_positions() {
        let grid = Grid2D::from_fn(2, 2, |pos| pos.x + pos.y * 10).expect("grid");
        let seen: Vec<_> = grid.iter().map(|(pos, value)| (pos.x, pos.y, *value)).collect();
        assert_eq!(seen, vec![(0, 0, 0), (1, 0, 1), (0, 1, 10), (1, 1, 11)]);
    }
}
