use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::color::Color;
use super::grid::PixelGrid;

const PLACEHOLDER_SIZE: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture data has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Immutable, cheaply cloneable pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture(Arc<PixelGrid>);

impl Texture {
    pub fn from_grid(grid: PixelGrid) -> Self {
        Self(Arc::new(grid))
    }

    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        Self::from_grid(PixelGrid::filled(width, height, color))
    }

    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let pixels = rgba
            .chunks_exact(4)
            .map(|px| Color::rgba(px[0], px[1], px[2], px[3]))
            .collect();
        PixelGrid::from_pixels(width, height, pixels)
            .map(Self::from_grid)
            .ok_or(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            })
    }

    /// Magenta/black checker used wherever a texture could not be resolved.
    pub fn placeholder() -> Self {
        static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
        PLACEHOLDER
            .get_or_init(|| {
                let mut grid = PixelGrid::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE);
                for y in 0..PLACEHOLDER_SIZE as i32 {
                    for x in 0..PLACEHOLDER_SIZE as i32 {
                        let magenta = (x / 4 + y / 4) % 2 == 0;
                        grid.set_pixel(x, y, if magenta { Color::MAGENTA } else { Color::BLACK });
                    }
                }
                Texture::from_grid(grid)
            })
            .clone()
    }

    /// Fully transparent tile-sized texture.
    pub fn empty() -> Self {
        static EMPTY: OnceLock<Texture> = OnceLock::new();
        EMPTY
            .get_or_init(|| Texture::from_grid(PixelGrid::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)))
            .clone()
    }

    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Texture {
    type Target = PixelGrid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
