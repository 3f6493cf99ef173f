use crate::keybind::Keybind;
use crate::render::{overlay, Color, PixelAndTextGrid};

use super::{GuiComponent, GuiLookAndFeel, GuiParent};

/// Bordered, filled container. Children lay out against the interior rectangle.
pub struct GuiPanel {
    background: Color,
    border_color: Color,
    border_width: u32,
    children: GuiParent,
}

impl GuiPanel {
    pub fn new(background: Color, border_color: Color, border_width: u32) -> Self {
        Self {
            background,
            border_color,
            border_width,
            children: GuiParent::new(),
        }
    }

    pub fn transparent() -> Self {
        Self::new(Color::TRANSPARENT, Color::TRANSPARENT, 0)
    }

    pub fn styled(look: &GuiLookAndFeel) -> Self {
        Self::new(look.panel_background, look.panel_border, look.panel_border_width)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn border_color(&self) -> Color {
        self.border_color
    }

    pub fn set_border_color(&mut self, color: Color) {
        self.border_color = color;
    }

    pub fn border_width(&self) -> u32 {
        self.border_width
    }

    pub fn set_border_width(&mut self, width: u32) {
        self.border_width = width;
    }

    pub fn children(&self) -> &GuiParent {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut GuiParent {
        &mut self.children
    }

    /// Size and offset of the interior for a panel drawn at `width`x`height`, or `None`
    /// when the border leaves no room. The vertical offset is rounded up to an even
    /// pixel row so interior text stays aligned with the parent's text rows.
    pub(crate) fn interior(&self, width: u32, height: u32) -> Option<(u32, u32, i32, i32)> {
        let border = self.border_width;
        let inner_w = width.checked_sub(2 * border).filter(|w| *w > 0)?;
        let inner_h = height.checked_sub(2 * border).filter(|h| *h > 0)?;
        Some((inner_w, inner_h, border as i32, border.div_ceil(2) as i32 * 2))
    }

    pub(crate) fn paint_frame(&self, target: &mut PixelAndTextGrid) {
        let (w, h) = (target.width() as i32, target.height() as i32);
        let border = self.border_width as i32;
        for y in 0..h {
            for x in 0..w {
                let on_border = x < border || y < border || x >= w - border || y >= h - border;
                let color = if on_border { self.border_color } else { self.background };
                target.set_pixel(x, y, color);
            }
        }
    }
}

impl GuiComponent for GuiPanel {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        self.paint_frame(target);
        if let Some((inner_w, inner_h, x, y)) = self.interior(target.width(), target.height()) {
            let mut inner = PixelAndTextGrid::new(inner_w, inner_h);
            self.children.render(&mut inner);
            overlay(&inner, target, x, y);
        }
    }

    fn on_input(&mut self, key: &Keybind) {
        self.children.on_input(key);
    }
}
