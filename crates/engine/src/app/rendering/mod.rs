mod glyphs;
mod renderer;

pub use glyphs::{draw_glyph, glyph};
pub use renderer::{draw_grid, Renderer, DEFAULT_PRESENT_SCALE};
