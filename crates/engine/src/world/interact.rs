use thiserror::Error;

use crate::keybind::Keybind;

use super::geometry::Direction;
use super::room::{EntityInfo, RoomContext};

/// Error returned by a room callback. The room logs it and moves on.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CallbackError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type CallbackResult = Result<(), CallbackError>;

/// Reactions to the room's step pipeline. Every hook defaults to doing nothing.
pub trait Interactable {
    fn on_step(&mut self, _ctx: &mut RoomContext<'_>) -> CallbackResult {
        Ok(())
    }

    fn on_entity_step(&mut self, _ctx: &mut RoomContext<'_>, _entity: &EntityInfo) -> CallbackResult {
        Ok(())
    }

    /// `direction` is the direction `entity` was travelling when it was stopped.
    fn on_entity_hit(
        &mut self,
        _ctx: &mut RoomContext<'_>,
        _entity: &EntityInfo,
        _direction: Direction,
    ) -> CallbackResult {
        Ok(())
    }

    fn on_player_interact(&mut self, _ctx: &mut RoomContext<'_>, _key: &Keybind) -> CallbackResult {
        Ok(())
    }
}
