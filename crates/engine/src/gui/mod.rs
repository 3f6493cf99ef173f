//! Retained-mode GUI composited onto a [`PixelAndTextGrid`](crate::render::PixelAndTextGrid).

mod component;
mod constraints;
mod image;
mod level_bar;
mod level_intro;
mod list_dialog;
mod look_and_feel;
mod panel;
mod parent;
mod text;
mod world_gui;

use thiserror::Error;

pub use component::{AsAny, ComponentId, GuiComponent};
pub use constraints::{Factors, GuiConstraints, Offsets};
pub use image::GuiImage;
pub use level_bar::GuiLevelBar;
pub use level_intro::{GuiLevelIntro, LEVEL_INTRO_STEPS};
pub use list_dialog::{DialogOption, GuiListDialog};
pub use look_and_feel::GuiLookAndFeel;
pub use panel::GuiPanel;
pub use parent::GuiParent;
pub use text::{wrap_text, GuiText};
pub use world_gui::{WorldGui, DIALOGUE_REVEAL_PER_STEP};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuiError {
    #[error("constraint factor for {axis} must be finite, got {value}")]
    NonFiniteFactor { axis: &'static str, value: f64 },
    #[error("invalid constraint `{input}`: {reason}")]
    InvalidConstraint { input: String, reason: &'static str },
    #[error("component {0} is not a child of this parent")]
    NotAChild(ComponentId),
}
