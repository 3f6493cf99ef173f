use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::render::{blend_over, Color, PixelAndTextGrid};

use super::glyphs::{draw_glyph, write_pixel, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Window pixels per grid pixel. One text cell covers `1 x 2` grid pixels, so at 4x
/// it is `4 x 8` on screen, enough for a 3x5 glyph.
pub const DEFAULT_PRESENT_SCALE: u32 = 4;

/// Presents published [`PixelAndTextGrid`] frames in the window through `pixels`.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
    scale: u32,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        grid_width: u32,
        grid_height: u32,
        scale: u32,
    ) -> Result<Self, Error> {
        let scale = scale.max(1);
        let buffer_width = grid_width.max(1) * scale;
        let buffer_height = grid_height.max(1) * scale;
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            size.width,
            size.height,
            buffer_width,
            buffer_height,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
            scale,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            width,
            height,
            self.buffer_width,
            self.buffer_height,
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_width: u32,
        surface_height: u32,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width.max(1), surface_height.max(1), window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    pub fn present(&mut self, frame: &PixelAndTextGrid) -> Result<(), Error> {
        draw_grid(
            self.pixels.frame_mut(),
            self.buffer_width,
            self.buffer_height,
            frame,
            self.scale,
        );
        self.pixels.render()
    }
}

/// Rasterizes `grid` into an RGBA `frame` of `width x height`, each grid pixel
/// `scale` frame pixels square. Text cells paint their background over the pixels
/// they cover, then their glyph in the foreground color. The result is opaque.
pub fn draw_grid(frame: &mut [u8], width: u32, height: u32, grid: &PixelAndTextGrid, scale: u32) {
    let scale = scale.max(1) as i32;
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let mut color = blend_over(Color::BLACK, grid.pixel(x, y).unwrap_or(Color::BLACK));
            if let Some(cell) = grid.cell(x, y).filter(|cell| !cell.is_empty()) {
                color = blend_over(color, cell.bg);
            }
            let rgba = color.to_rgba();
            for py in y * scale..(y + 1) * scale {
                for px in x * scale..(x + 1) * scale {
                    write_pixel(frame, width, height, px, py, rgba);
                }
            }
        }
    }

    let cell_width = scale;
    let cell_height = scale * 2;
    let glyph_scale = (cell_width / (GLYPH_WIDTH as i32 + 1))
        .min(cell_height / (GLYPH_HEIGHT as i32 + 1))
        .max(1);
    let inset_x = (cell_width - GLYPH_WIDTH as i32 * glyph_scale).max(0) / 2;
    let inset_y = (cell_height - GLYPH_HEIGHT as i32 * glyph_scale).max(0) / 2;
    for row in 0..grid.text_rows() as i32 {
        for x in 0..grid.width() as i32 {
            let Some(cell) = grid.text_cell(x, row) else {
                continue;
            };
            if cell.is_empty() || cell.fg.a == 0 {
                continue;
            }
            let under = grid.pixel(x, row * 2).unwrap_or(Color::BLACK);
            let ink = blend_over(blend_over(Color::BLACK, under), cell.fg).to_rgba();
            draw_glyph(
                frame,
                width,
                height,
                x * cell_width + inset_x,
                row * cell_height + inset_y,
                cell.ch,
                ink,
                glyph_scale as u32,
            );
        }
    }
}
