//! Room simulation: geometry, collision indexing, tiles, entities, and the step pipeline.

mod area;
mod entity;
mod geometry;
mod grid2d;
mod hitbox;
mod hitbox_manager;
mod interact;
mod quadtree;
mod room;
mod tile;

pub use area::Area;
pub use entity::{
    Accelerable, Entity, EntityHandle, MobState, Mortal, Player, Renderable, MAX_PLAYER_HEALTH,
    PLAYER_FRICTION, PLAYER_HITBOX, PLAYER_ID,
};
pub use geometry::{Direction, Position, TilePosition, Vector2};
pub use grid2d::{Grid2D, GridError};
pub use hitbox::{Hitbox, HitboxError, Hitboxed};
pub use hitbox_manager::HitboxManager;
pub use interact::{CallbackError, CallbackResult, Interactable};
pub use quadtree::{QuadTree, MAX_DEPTH, MAX_OBJECTS};
pub use room::{
    Collider, EntityInfo, Room, RoomCommand, RoomContext, RoomError, RoomEvent, Subject,
    MOVE_SUBSTEPS,
};
pub use tile::{
    BasicTile, EmptyTile, Neighbours, Tile, TileDefinition, TileLayer, TileTextures,
    DEFAULT_TEXTURE_MASK, EMPTY_TILE_ID,
};
