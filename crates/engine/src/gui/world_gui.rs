use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::keybind::Keybind;
use crate::render::{Color, PixelAndTextGrid};

use super::{
    ComponentId, Factors, GuiComponent, GuiConstraints, GuiError, GuiLevelBar, GuiLookAndFeel,
    GuiPanel, GuiParent, GuiText, Offsets,
};

/// Dialogue characters revealed per simulation step.
pub const DIALOGUE_REVEAL_PER_STEP: usize = 2;

struct OpenDialogue {
    name_panel: Option<(ComponentId, ComponentId)>,
    text_panel: ComponentId,
    text_label: ComponentId,
    text: String,
    revealed: usize,
}

impl OpenDialogue {
    fn fully_revealed(&self) -> bool {
        self.revealed >= self.text.chars().count()
    }
}

/// In-world overlay: health bar, a timed toast line, and a dialogue box that takes
/// focus while it is open.
pub struct WorldGui {
    look: GuiLookAndFeel,
    root: GuiParent,
    health_bar: ComponentId,
    toast: ComponentId,
    toast_steps_left: u32,
    text_panel_layout: GuiConstraints,
    name_panel_layout: GuiConstraints,
    dialogue: Option<OpenDialogue>,
    queued: VecDeque<(String, String)>,
}

impl WorldGui {
    pub fn new(look: GuiLookAndFeel) -> Result<Self, GuiError> {
        let text_panel_layout = GuiConstraints::new(
            Factors {
                x: 0.0,
                y: 0.75,
                width: 1.0,
                height: 0.25,
            },
            Offsets {
                x: 2,
                y: 0,
                width: -4,
                height: -2,
            },
            10,
        )?;
        let name_panel_layout = GuiConstraints::new(
            Factors {
                x: 0.0,
                y: 0.75,
                width: 0.0,
                height: 0.0,
            },
            Offsets {
                x: 2,
                y: -4,
                width: 4,
                height: 5,
            },
            11,
        )?;

        let mut root = GuiParent::new();
        let health_bar = root.add(
            GuiLevelBar::new(1.0, Color::DARK_GRAY, Color::RED),
            GuiConstraints::absolute(2, 2, 24, 2, 0),
        );
        let toast = root.add(
            GuiText::colored("", Color::TRANSPARENT, look.text_foreground),
            GuiConstraints::row(2, 6, -4, 2, 1),
        );
        root.set_hidden(toast, true)?;

        Ok(Self {
            look,
            root,
            health_bar,
            toast,
            toast_steps_left: 0,
            text_panel_layout,
            name_panel_layout,
            dialogue: None,
            queued: VecDeque::new(),
        })
    }

    /// True while a dialogue box is open and consuming input.
    pub fn has_focus(&self) -> bool {
        self.dialogue.is_some()
    }

    pub fn dialogue_text(&self) -> Option<&str> {
        self.dialogue.as_ref().map(|dialogue| dialogue.text.as_str())
    }

    pub fn set_health(&mut self, fraction: f64) {
        if let Some(bar) = self.root.child_mut::<GuiLevelBar>(self.health_bar) {
            bar.set_level(fraction);
        }
    }

    pub fn health(&self) -> Option<f64> {
        self.root
            .child::<GuiLevelBar>(self.health_bar)
            .map(GuiLevelBar::level)
    }

    /// Shows `text` in the toast line for `steps` simulation steps.
    pub fn toast(&mut self, text: &str, steps: u32) -> Result<(), GuiError> {
        if let Some(label) = self.root.child_mut::<GuiText>(self.toast) {
            label.set_text(text);
        }
        self.toast_steps_left = steps;
        self.root.set_hidden(self.toast, steps == 0)
    }

    pub fn toast_text(&self) -> Option<&str> {
        if self.root.is_hidden(self.toast) == Some(false) {
            self.root.child::<GuiText>(self.toast).map(GuiText::text)
        } else {
            None
        }
    }

    /// Opens a dialogue box, or queues it behind the one already open.
    pub fn show_dialogue(&mut self, name: &str, text: &str) -> Result<(), GuiError> {
        if self.dialogue.is_some() {
            self.queued.push_back((name.to_string(), text.to_string()));
            return Ok(());
        }

        let mut text_panel = GuiPanel::styled(&self.look);
        let text_label = text_panel.children_mut().add(
            GuiText::colored("", self.look.text_background, self.look.text_foreground),
            GuiConstraints::FULL,
        );
        let text_panel = self.root.add(text_panel, self.text_panel_layout);

        let name_panel = if name.is_empty() {
            None
        } else {
            let mut panel = GuiPanel::styled(&self.look);
            let label = panel.children_mut().add(
                GuiText::colored(name, self.look.text_background, self.look.text_foreground),
                GuiConstraints::FULL,
            );
            let width = name.chars().count() as i32;
            let id = self
                .root
                .add(panel, self.name_panel_layout.offset_by(0, 0, width, 0));
            Some((id, label))
        };

        self.root.set_focus(Some(text_panel))?;
        debug!(name, chars = text.chars().count(), "dialogue_opened");
        self.dialogue = Some(OpenDialogue {
            name_panel,
            text_panel,
            text_label,
            text: text.to_string(),
            revealed: 0,
        });
        Ok(())
    }

    fn close_dialogue(&mut self) -> Result<(), GuiError> {
        if let Some(dialogue) = self.dialogue.take() {
            self.root.remove(dialogue.text_panel);
            if let Some((panel, _)) = dialogue.name_panel {
                self.root.remove(panel);
            }
            debug!("dialogue_closed");
        }
        if let Some((name, text)) = self.queued.pop_front() {
            self.show_dialogue(&name, &text)?;
        }
        Ok(())
    }

    fn sync_dialogue_text(&mut self) {
        let Some(dialogue) = &self.dialogue else {
            return;
        };
        let shown: String = dialogue.text.chars().take(dialogue.revealed).collect();
        let label = dialogue.text_label;
        if let Some(text) = self
            .root
            .child_mut::<GuiPanel>(dialogue.text_panel)
            .and_then(|panel| panel.children_mut().child_mut::<GuiText>(label))
        {
            text.set_text(shown);
        }
    }

    /// Advances timers once per simulation step.
    pub fn tick(&mut self) {
        if self.toast_steps_left > 0 {
            self.toast_steps_left -= 1;
            if self.toast_steps_left == 0 {
                let _ = self.root.set_hidden(self.toast, true);
            }
        }
        let revealing = match &mut self.dialogue {
            Some(dialogue) if !dialogue.fully_revealed() => {
                dialogue.revealed += DIALOGUE_REVEAL_PER_STEP;
                true
            }
            _ => false,
        };
        if revealing {
            self.sync_dialogue_text();
        }
    }

    /// Confirm finishes the reveal, then closes the box. Other keys go to the focused
    /// child.
    pub fn handle_input(&mut self, key: &Keybind) -> Result<(), GuiError> {
        let Some(dialogue) = &mut self.dialogue else {
            self.root.on_input(key);
            return Ok(());
        };
        if !key.is_confirm() {
            self.root.on_input(key);
            return Ok(());
        }
        if dialogue.fully_revealed() {
            self.close_dialogue()
        } else {
            dialogue.revealed = dialogue.text.chars().count();
            self.sync_dialogue_text();
            Ok(())
        }
    }
}

impl GuiComponent for WorldGui {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        self.root.render(target);
    }

    fn on_input(&mut self, key: &Keybind) {
        if let Err(error) = self.handle_input(key) {
            warn!(error = %error, "world_gui_input_failed");
        }
    }
}
