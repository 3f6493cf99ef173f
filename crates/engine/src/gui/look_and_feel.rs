use crate::render::Color;

/// Shared colours for panels and selectable text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiLookAndFeel {
    pub panel_background: Color,
    pub panel_border: Color,
    pub panel_border_width: u32,
    pub text_selected_background: Color,
    pub text_selected_foreground: Color,
    pub text_background: Color,
    pub text_foreground: Color,
}

impl Default for GuiLookAndFeel {
    fn default() -> Self {
        Self {
            panel_background: Color::TRANSPARENT,
            panel_border: Color::TRANSPARENT,
            panel_border_width: 1,
            text_selected_background: Color::LIGHT_GRAY,
            text_selected_foreground: Color::BLACK,
            text_background: Color::TRANSPARENT,
            text_foreground: Color::WHITE,
        }
    }
}
