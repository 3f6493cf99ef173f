use std::fmt;

use crate::world::entity::{Entity, EntityHandle};
use crate::world::geometry::{Position, TilePosition, Vector2};
use crate::world::hitbox::Hitbox;
use crate::world::tile::{Tile, TileLayer};

/// Read-only view of an entity handed to callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub handle: EntityHandle,
    pub id: String,
    pub position: Position,
    pub hitbox: Hitbox,
    pub is_player: bool,
    pub health: Option<f64>,
}

impl EntityInfo {
    pub(crate) fn of(handle: EntityHandle, entity: &dyn Entity, is_player: bool) -> Self {
        Self {
            handle,
            id: entity.id().to_string(),
            position: entity.position(),
            hitbox: entity.hitbox(),
            is_player,
            health: entity.as_mortal().map(|mortal| mortal.health()),
        }
    }
}

/// The object whose callback is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Tile {
        layer: TileLayer,
        position: TilePosition,
    },
    Entity(EntityHandle),
    Area(usize),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Tile { layer, position } => write!(f, "{layer}_tile{position}"),
            Subject::Entity(handle) => write!(f, "entity{handle}"),
            Subject::Area(index) => write!(f, "area[{index}]"),
        }
    }
}

/// Host-facing outcome of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    ChangeRoom { room_id: String },
    ShowDialogue { name: String, text: String },
    Toast { text: String, steps: u32 },
    PlayerDied,
    Custom(String),
}

/// Deferred room mutation requested from inside a callback. Commands queued during a
/// pass are applied, in order, once that pass finishes.
pub enum RoomCommand {
    SetTile {
        layer: TileLayer,
        position: TilePosition,
        tile: Box<dyn Tile>,
    },
    Spawn(Box<dyn Entity>),
    Despawn(EntityHandle),
    Accelerate {
        target: EntityHandle,
        amount: Vector2,
    },
    Teleport {
        target: EntityHandle,
        position: Position,
    },
    Damage {
        target: EntityHandle,
        amount: f64,
    },
    Emit(RoomEvent),
}

pub struct RoomContext<'a> {
    subject: Subject,
    room_size: (usize, usize),
    player: EntityHandle,
    entities: &'a [EntityInfo],
    commands: &'a mut Vec<RoomCommand>,
}

impl<'a> RoomContext<'a> {
    pub(crate) fn new(
        subject: Subject,
        room_size: (usize, usize),
        player: EntityHandle,
        entities: &'a [EntityInfo],
        commands: &'a mut Vec<RoomCommand>,
    ) -> Self {
        Self {
            subject,
            room_size,
            player,
            entities,
            commands,
        }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Grid cell of the tile being called, if the subject is a tile.
    pub fn tile_position(&self) -> Option<TilePosition> {
        match self.subject {
            Subject::Tile { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Handle of the entity being called, if the subject is an entity.
    pub fn entity_handle(&self) -> Option<EntityHandle> {
        match self.subject {
            Subject::Entity(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn room_width(&self) -> usize {
        self.room_size.0
    }

    pub fn room_height(&self) -> usize {
        self.room_size.1
    }

    /// Entities as they stood when the current pass began, player last.
    pub fn entities(&self) -> &[EntityInfo] {
        self.entities
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&EntityInfo> {
        self.entities.iter().find(|info| info.handle == handle)
    }

    pub fn player(&self) -> Option<&EntityInfo> {
        self.entity(self.player)
    }

    pub fn push(&mut self, command: RoomCommand) {
        self.commands.push(command);
    }

    pub fn set_tile(&mut self, layer: TileLayer, position: TilePosition, tile: Box<dyn Tile>) {
        self.push(RoomCommand::SetTile {
            layer,
            position,
            tile,
        });
    }

    pub fn spawn(&mut self, entity: Box<dyn Entity>) {
        self.push(RoomCommand::Spawn(entity));
    }

    pub fn despawn(&mut self, target: EntityHandle) {
        self.push(RoomCommand::Despawn(target));
    }

    pub fn accelerate(&mut self, target: EntityHandle, amount: Vector2) {
        self.push(RoomCommand::Accelerate { target, amount });
    }

    pub fn teleport(&mut self, target: EntityHandle, position: Position) {
        self.push(RoomCommand::Teleport { target, position });
    }

    pub fn damage(&mut self, target: EntityHandle, amount: f64) {
        self.push(RoomCommand::Damage { target, amount });
    }

    pub fn emit(&mut self, event: RoomEvent) {
        self.push(RoomCommand::Emit(event));
    }
}
