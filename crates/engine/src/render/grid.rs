use super::color::{blend_over, Color};

/// Character value meaning "no text here, show the pixels underneath".
pub const RESET_CHAR: char = '\0';

/// Rectangular RGBA pixel buffer. Out-of-range writes are clipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color;
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = blend_over(self.pixels[index], color);
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(width).min(self.width as i32);
        let end_y = y.saturating_add(height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.set_pixel(px, py, color);
            }
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl TextCell {
    pub const EMPTY: TextCell = TextCell {
        ch: RESET_CHAR,
        fg: Color::TRANSPARENT,
        bg: Color::TRANSPARENT,
    };

    pub fn new(ch: char, fg: Color, bg: Color) -> Self {
        Self { ch, fg, bg }
    }

    pub fn is_empty(&self) -> bool {
        self.ch == RESET_CHAR
    }
}

impl Default for TextCell {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Pixel buffer with a character layer on top. One text row covers two pixel rows,
/// so text coordinates take a pixel `y` and address row `y / 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelAndTextGrid {
    pixels: PixelGrid,
    text_rows: u32,
    cells: Vec<TextCell>,
}

impl PixelAndTextGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let text_rows = height.div_ceil(2);
        Self {
            pixels: PixelGrid::new(width, height),
            text_rows,
            cells: vec![TextCell::EMPTY; width as usize * text_rows as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    pub fn text_rows(&self) -> u32 {
        self.text_rows
    }

    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut PixelGrid {
        &mut self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.pixels.pixel(x, y)
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.pixels.set_pixel(x, y, color);
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.pixels.blend_pixel(x, y, color);
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.pixels.fill_rect(x, y, width, height, color);
    }

    fn cell_index(&self, x: i32, text_row: i32) -> Option<usize> {
        if x < 0 || text_row < 0 || x as u32 >= self.width() || text_row as u32 >= self.text_rows {
            return None;
        }
        Some(text_row as usize * self.width() as usize + x as usize)
    }

    pub fn cell(&self, x: i32, pixel_y: i32) -> Option<TextCell> {
        self.text_cell(x, pixel_y.div_euclid(2))
    }

    pub fn set_cell(&mut self, x: i32, pixel_y: i32, cell: TextCell) {
        self.set_text_cell(x, pixel_y.div_euclid(2), cell);
    }

    pub fn text_cell(&self, x: i32, text_row: i32) -> Option<TextCell> {
        self.cell_index(x, text_row).map(|index| self.cells[index])
    }

    pub fn set_text_cell(&mut self, x: i32, text_row: i32, cell: TextCell) {
        if let Some(index) = self.cell_index(x, text_row) {
            self.cells[index] = cell;
        }
    }

    /// Writes `text` left to right from `(x, pixel_y)`, clipping at the right edge.
    pub fn put_text(&mut self, x: i32, pixel_y: i32, text: &str, fg: Color, bg: Color) {
        for (offset, ch) in text.chars().enumerate() {
            self.set_cell(x + offset as i32, pixel_y, TextCell::new(ch, fg, bg));
        }
    }

    pub fn clear_text(&mut self) {
        self.cells.fill(TextCell::EMPTY);
    }
}

/// Composites `src` onto `dest` with its top-left corner at `(x_offset, y_offset)`.
/// Pixels blend by source alpha. Text cells copy only where the source has a character,
/// landing on text row `floor(y_offset / 2)`.
pub fn overlay(src: &PixelAndTextGrid, dest: &mut PixelAndTextGrid, x_offset: i32, y_offset: i32) {
    overlay_pixels(&src.pixels, dest, x_offset, y_offset);

    let row_offset = y_offset.div_euclid(2);
    for row in 0..src.text_rows as i32 {
        for x in 0..src.width() as i32 {
            let Some(cell) = src.text_cell(x, row) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            let (dx, dy) = (x + x_offset, row + row_offset);
            if let Some(under) = dest.text_cell(dx, dy) {
                dest.set_text_cell(
                    dx,
                    dy,
                    TextCell {
                        ch: cell.ch,
                        fg: blend_over(under.fg, cell.fg),
                        bg: blend_over(under.bg, cell.bg),
                    },
                );
            }
        }
    }
}

/// Pixel-only overlay used for textures.
pub fn overlay_pixels(src: &PixelGrid, dest: &mut PixelAndTextGrid, x_offset: i32, y_offset: i32) {
    let dest_w = dest.width() as i32;
    let dest_h = dest.height() as i32;
    let start_x = (-x_offset).max(0);
    let start_y = (-y_offset).max(0);
    let end_x = (src.width as i32).min(dest_w - x_offset);
    let end_y = (src.height as i32).min(dest_h - y_offset);
    for y in start_y..end_y {
        for x in start_x..end_x {
            if let Some(color) = src.pixel(x, y) {
                dest.blend_pixel(x + x_offset, y + y_offset, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_layer_has_one_row_per_two_pixel_rows() {
        assert_eq!(PixelAndTextGrid::new(4, 6).text_rows(), 3);
        assert_eq!(PixelAndTextGrid::new(4, 5).text_rows(), 3);
        let mut grid = PixelAndTextGrid::new(4, 6);
        grid.set_cell(1, 3, TextCell::new('x', Color::WHITE, Color::BLACK));
        assert_eq!(grid.cell(1, 2).map(|cell| cell.ch), Some('x'));
        assert_eq!(grid.text_cell(1, 1).map(|cell| cell.ch), Some('x'));
    }

    #[test]
    fn out_of_range_access_is_clipped() {
        let mut grid = PixelAndTextGrid::new(2, 2);
        grid.set_pixel(-1, 0, Color::RED);
        grid.set_pixel(2, 0, Color::RED);
        grid.set_cell(5, 0, TextCell::new('x', Color::WHITE, Color::BLACK));
        assert_eq!(grid.pixel(2, 0), None);
        assert!(grid
            .pixels()
            .rows()
            .flatten()
            .all(|color| *color == Color::TRANSPARENT));
    }

    #[test]
    fn overlay_of_transparent_source_is_noop() {
        let mut dest = PixelAndTextGrid::new(3, 3);
        dest.fill(Color::rgba(10, 20, 30, 200));
        let before = dest.clone();
        overlay(&PixelAndTextGrid::new(3, 3), &mut dest, 0, 0);
        assert_eq!(dest, before);
    }

    #[test]
    fn overlay_blends_by_source_alpha() {
        let mut dest = PixelAndTextGrid::new(2, 2);
        dest.fill(Color::BLACK);
        let mut src = PixelAndTextGrid::new(1, 1);
        src.set_pixel(0, 0, Color::rgba(255, 255, 255, 51));
        overlay(&src, &mut dest, 1, 1);
        assert_eq!(dest.pixel(1, 1), Some(Color::rgba(51, 51, 51, 255)));
        assert_eq!(dest.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn overlay_clips_negative_offsets() {
        let mut dest = PixelAndTextGrid::new(2, 2);
        let mut src = PixelAndTextGrid::new(2, 2);
        src.fill(Color::GREEN);
        overlay(&src, &mut dest, -1, -1);
        assert_eq!(dest.pixel(0, 0), Some(Color::GREEN));
        assert_eq!(dest.pixel(1, 0), Some(Color::TRANSPARENT));
        assert_eq!(dest.pixel(0, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn overlay_text_skips_reset_cells_and_floors_row_offset() {
        let mut dest = PixelAndTextGrid::new(4, 4);
        dest.put_text(0, 0, "abcd", Color::WHITE, Color::BLACK);
        dest.put_text(0, 2, "efgh", Color::WHITE, Color::BLACK);
        let mut src = PixelAndTextGrid::new(2, 2);
        src.set_cell(1, 0, TextCell::new('Z', Color::RED, Color::TRANSPARENT));

        overlay(&src, &mut dest, 1, 3);

        let row1: String = (0..4)
            .filter_map(|x| dest.text_cell(x, 1).map(|cell| cell.ch))
            .collect();
        assert_eq!(row1, "efZh");
        let z = dest.text_cell(2, 1).expect("cell");
        assert_eq!(z.fg, Color::RED);
        assert_eq!(z.bg, Color::BLACK);
        assert_eq!(dest.text_cell(1, 1).map(|cell| cell.ch), Some('f'));
    }
}
