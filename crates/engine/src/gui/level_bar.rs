use crate::render::{Color, PixelAndTextGrid};

use super::GuiComponent;

/// Horizontal fill gauge. `level` is clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiLevelBar {
    level: f64,
    background: Color,
    foreground: Color,
}

impl GuiLevelBar {
    pub fn new(level: f64, background: Color, foreground: Color) -> Self {
        let mut bar = Self {
            level: 0.0,
            background,
            foreground,
        };
        bar.set_level(level);
        bar
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn set_level(&mut self, level: f64) {
        self.level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    }
}

impl GuiComponent for GuiLevelBar {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        let width = target.width() as i32;
        let height = target.height() as i32;
        let filled = (f64::from(width) * self.level).round() as i32;
        target.fill_rect(0, 0, filled, height, self.foreground);
        target.fill_rect(filled, 0, width - filled, height, self.background);
    }
}
