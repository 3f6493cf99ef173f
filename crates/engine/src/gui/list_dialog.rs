use crate::keybind::Keybind;
use crate::render::{overlay, PixelAndTextGrid};

use super::{GuiComponent, GuiConstraints, GuiLookAndFeel, GuiPanel, GuiText};

const DEFAULT_OPTION_PADDING: GuiConstraints = GuiConstraints::row(2, 2, -2, 4, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOption {
    pub label: String,
    /// Caller-defined tag reported with the choice.
    pub value: String,
}

impl DialogOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

type ChoiceCallback = Box<dyn FnMut(usize, &DialogOption) + Send>;

/// Vertical list of options inside a panel. North/south move the selection, use/enter
/// confirms it.
pub struct GuiListDialog {
    frame: GuiPanel,
    look: GuiLookAndFeel,
    options: Vec<DialogOption>,
    option_padding: GuiConstraints,
    selected: usize,
    view_offset: usize,
    choice: Option<usize>,
    callbacks: Vec<ChoiceCallback>,
}

impl GuiListDialog {
    pub fn new(options: Vec<DialogOption>, look: GuiLookAndFeel) -> Self {
        Self {
            frame: GuiPanel::styled(&look),
            look,
            options,
            option_padding: DEFAULT_OPTION_PADDING,
            selected: 0,
            view_offset: 0,
            choice: None,
            callbacks: Vec::new(),
        }
    }

    /// Placement of each option row within the interior. Only the width and height
    /// matter for rows after the first; they stack at `height` intervals.
    pub fn with_option_padding(mut self, padding: GuiConstraints) -> Self {
        self.option_padding = padding;
        self
    }

    pub fn on_choice(&mut self, callback: impl FnMut(usize, &DialogOption) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn options(&self) -> &[DialogOption] {
        &self.options
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn set_selected(&mut self, index: usize) {
        self.selected = index.min(self.options.len().saturating_sub(1));
    }

    /// The last confirmed option, cleared by the call.
    pub fn take_choice(&mut self) -> Option<usize> {
        self.choice.take()
    }

    fn confirm(&mut self) {
        let Some(option) = self.options.get(self.selected) else {
            return;
        };
        self.choice = Some(self.selected);
        for callback in &mut self.callbacks {
            callback(self.selected, option);
        }
    }

    fn scroll_to_selection(&mut self, visible: usize) {
        if self.selected < self.view_offset {
            self.view_offset = self.selected;
        } else if self.selected >= self.view_offset + visible {
            self.view_offset = self.selected + 1 - visible;
        }
    }
}

impl GuiComponent for GuiListDialog {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        self.frame.render(target);
        if self.options.is_empty() {
            return;
        }
        let Some((inner_w, inner_h, inner_x, inner_y)) = self.frame.interior(target.width(), target.height()) else {
            return;
        };

        let padding = self.option_padding;
        let row_x = padding.resolve_x(inner_w, inner_h);
        let row_y = padding.resolve_y(inner_w, inner_h);
        let row_w = padding
            .resolve_width(inner_w, inner_h)
            .min(inner_w as i32 - row_x);
        let row_h = padding.resolve_height(inner_w, inner_h);
        if row_w <= 0 || row_h <= 0 {
            return;
        }
        let visible = ((inner_h as i32 - row_y) / row_h).max(1) as usize;
        self.scroll_to_selection(visible);

        let mut inner = PixelAndTextGrid::new(inner_w, inner_h);
        let mut y = 0;
        for (index, option) in self.options.iter().enumerate().skip(self.view_offset) {
            if y >= inner_h as i32 {
                break;
            }
            let (background, foreground) = if index == self.selected {
                (self.look.text_selected_background, self.look.text_selected_foreground)
            } else {
                (self.look.text_background, self.look.text_foreground)
            };
            let mut row = PixelAndTextGrid::new(row_w as u32, row_h as u32);
            GuiText::colored(option.label.as_str(), background, foreground).render(&mut row);
            overlay(&row, &mut inner, row_x, y + row_y);
            y += row_h;
        }
        overlay(&inner, target, inner_x, inner_y);
    }

    fn on_input(&mut self, key: &Keybind) {
        if *key == Keybind::NORTH {
            self.set_selected(self.selected.saturating_sub(1));
        } else if *key == Keybind::SOUTH {
            self.set_selected(self.selected + 1);
        } else if key.is_confirm() {
            self.confirm();
        }
    }
}
