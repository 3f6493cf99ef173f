mod color;
mod grid;
mod texture;

pub use color::{blend_over, interpolate_rgb, Color, ColorParseError};
pub use grid::{overlay, overlay_pixels, PixelAndTextGrid, PixelGrid, TextCell, RESET_CHAR};
pub use texture::{Texture, TextureError};

/// Pixel size of one tile on screen.
pub const TILE_WIDTH: u32 = 8;
pub const TILE_HEIGHT: u32 = 8;
