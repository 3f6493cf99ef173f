//! A single room: tile grids, entities, areas, and the per-step simulation.

mod context;
mod render;
mod step;

use thiserror::Error;
use tracing::{debug, warn};

use crate::render::{Color, Texture};

use super::area::Area;
use super::entity::{Entity, EntityHandle, Player};
use super::geometry::{Position, TilePosition};
use super::grid2d::{Grid2D, GridError};
use super::hitbox::Hitbox;
use super::hitbox_manager::HitboxManager;
use super::tile::{EmptyTile, Tile, TileLayer};

pub use context::{EntityInfo, RoomCommand, RoomContext, RoomEvent, Subject};
pub use step::MOVE_SUBSTEPS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room `{room_id}` has an invalid size: {source}")]
    InvalidSize {
        room_id: String,
        #[source]
        source: GridError,
    },
}

/// Key for everything the room tracks in its [`HitboxManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collider {
    Entity(EntityHandle),
    Tile {
        layer: TileLayer,
        position: TilePosition,
    },
}

impl Collider {
    fn is_tile(self) -> bool {
        matches!(self, Collider::Tile { .. })
    }
}

pub(crate) struct EntitySlot {
    handle: EntityHandle,
    entity: Box<dyn Entity>,
}

pub struct Room {
    id: String,
    width: usize,
    height: usize,
    floor_tiles: Grid2D<Box<dyn Tile>>,
    wall_tiles: Grid2D<Box<dyn Tile>>,
    entities: Vec<EntitySlot>,
    player: Player,
    player_handle: EntityHandle,
    player_death_reported: bool,
    areas: Vec<Box<dyn Area>>,
    hitboxes: HitboxManager<Collider>,
    reset_color: Color,
    next_handle: u64,
    steps: u64,
}

impl Room {
    /// Empty room of `width`x`height` cells with the player at `player_start`.
    pub fn new(
        id: impl Into<String>,
        width: usize,
        height: usize,
        player_start: Position,
    ) -> Result<Self, RoomError> {
        let id = id.into();
        let empty_grid = || {
            Grid2D::from_fn(width, height, |_| Box::new(EmptyTile) as Box<dyn Tile>).map_err(
                |source| RoomError::InvalidSize {
                    room_id: id.clone(),
                    source,
                },
            )
        };
        let floor_tiles = empty_grid()?;
        let wall_tiles = empty_grid()?;
        let bounds = Hitbox::new(0.0, 0.0, width as f64, height as f64).map_err(|_| {
            RoomError::InvalidSize {
                room_id: id.clone(),
                source: GridError::ZeroSize { width, height },
            }
        })?;

        Ok(Self {
            id,
            width,
            height,
            floor_tiles,
            wall_tiles,
            entities: Vec::new(),
            player: Player::new(player_start, Texture::placeholder()),
            player_handle: EntityHandle(0),
            player_death_reported: false,
            areas: Vec::new(),
            hitboxes: HitboxManager::new(bounds),
            reset_color: Color::BLACK,
            next_handle: 1,
            steps: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Steps simulated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn reset_color(&self) -> Color {
        self.reset_color
    }

    pub fn set_reset_color(&mut self, color: Color) {
        self.reset_color = color;
    }

    fn grid(&self, layer: TileLayer) -> &Grid2D<Box<dyn Tile>> {
        match layer {
            TileLayer::Floor => &self.floor_tiles,
            TileLayer::Wall => &self.wall_tiles,
        }
    }

    pub fn tile(&self, layer: TileLayer, position: TilePosition) -> Option<&dyn Tile> {
        self.grid(layer)
            .get_or_none(position.x, position.y)
            .map(|tile| tile.as_ref())
    }

    pub fn floor_tile(&self, position: TilePosition) -> Option<&dyn Tile> {
        self.tile(TileLayer::Floor, position)
    }

    pub fn wall_tile(&self, position: TilePosition) -> Option<&dyn Tile> {
        self.tile(TileLayer::Wall, position)
    }

    /// Writes a cell. `None` resets it to the empty tile.
    pub fn set_tile(
        &mut self,
        layer: TileLayer,
        position: TilePosition,
        tile: Option<Box<dyn Tile>>,
    ) -> Result<(), GridError> {
        let tile = tile.unwrap_or_else(|| Box::new(EmptyTile));
        let grid = match layer {
            TileLayer::Floor => &mut self.floor_tiles,
            TileLayer::Wall => &mut self.wall_tiles,
        };
        grid.set(position.x, position.y, tile)?;
        Ok(())
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn player_handle(&self) -> EntityHandle {
        self.player_handle
    }

    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        debug!(room = %self.id, entity = entity.id(), handle = %handle, "entity_spawned");
        self.entities.push(EntitySlot { handle, entity });
        handle
    }

    /// Removes a non-player entity.
    pub fn despawn(&mut self, handle: EntityHandle) -> Option<Box<dyn Entity>> {
        let index = self.entities.iter().position(|slot| slot.handle == handle)?;
        let slot = self.entities.remove(index);
        debug!(room = %self.id, entity = slot.entity.id(), handle = %handle, "entity_despawned");
        Some(slot.entity)
    }

    /// Non-player entities in spawn order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &dyn Entity)> {
        self.entities
            .iter()
            .map(|slot| (slot.handle, slot.entity.as_ref()))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Looks up any entity, the player included.
    pub fn entity(&self, handle: EntityHandle) -> Option<&dyn Entity> {
        if handle == self.player_handle {
            return Some(&self.player);
        }
        self.entities
            .iter()
            .find(|slot| slot.handle == handle)
            .map(|slot| slot.entity.as_ref())
    }

    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn Entity> {
        if handle == self.player_handle {
            return Some(&mut self.player);
        }
        self.entities
            .iter_mut()
            .find(|slot| slot.handle == handle)
            .map(|slot| slot.entity.as_mut() as &mut dyn Entity)
    }

    pub fn add_area(&mut self, area: Box<dyn Area>) {
        self.areas.push(area);
    }

    pub fn areas(&self) -> impl Iterator<Item = &dyn Area> {
        self.areas.iter().map(|area| area.as_ref())
    }

    /// Current entity views, player last.
    pub fn snapshot(&self) -> Vec<EntityInfo> {
        snapshot_of(&self.entities, &self.player, self.player_handle)
    }

    /// Replaces the collision index contents with every impassable tile, every entity,
    /// and the player.
    fn repopulate_hitboxes(&mut self) {
        self.hitboxes.clear();
        for (layer, grid) in [
            (TileLayer::Floor, &self.floor_tiles),
            (TileLayer::Wall, &self.wall_tiles),
        ] {
            for (position, tile) in grid.iter() {
                if !tile.is_passable() {
                    self.hitboxes
                        .add(Collider::Tile { layer, position }, Hitbox::of_tile(position));
                }
            }
        }
        for slot in &self.entities {
            self.hitboxes
                .add(Collider::Entity(slot.handle), slot.entity.hitbox());
        }
        self.hitboxes
            .add(Collider::Entity(self.player_handle), self.player.hitbox());
    }

    /// Everything currently overlapping `handle`'s hitbox.
    pub fn collisions_of(&mut self, handle: EntityHandle) -> Vec<Collider> {
        self.repopulate_hitboxes();
        self.hitboxes.all_collisions_of(Collider::Entity(handle))
    }

    fn apply_commands(&mut self, commands: Vec<RoomCommand>, events: &mut Vec<RoomEvent>) {
        for command in commands {
            match command {
                RoomCommand::SetTile {
                    layer,
                    position,
                    tile,
                } => {
                    if let Err(error) = self.set_tile(layer, position, Some(tile)) {
                        warn!(room = %self.id, layer = %layer, error = %error, "room_command_rejected");
                    }
                }
                RoomCommand::Spawn(entity) => {
                    self.spawn(entity);
                }
                RoomCommand::Despawn(handle) => {
                    if handle == self.player_handle {
                        warn!(room = %self.id, "room_command_rejected_player_despawn");
                    } else if self.despawn(handle).is_none() {
                        debug!(room = %self.id, handle = %handle, "despawn_target_missing");
                    }
                }
                RoomCommand::Accelerate { target, amount } => {
                    if let Some(body) = self
                        .entity_mut(target)
                        .and_then(|entity| entity.as_accelerable_mut())
                    {
                        let next = body.acceleration() + amount;
                        body.set_acceleration(next);
                    }
                }
                RoomCommand::Teleport { target, position } => {
                    if let Some(entity) = self.entity_mut(target) {
                        entity.set_position(position);
                    }
                }
                RoomCommand::Damage { target, amount } => {
                    if let Some(mortal) = self
                        .entity_mut(target)
                        .and_then(|entity| entity.as_mortal_mut())
                    {
                        mortal.damage(amount);
                    }
                }
                RoomCommand::Emit(event) => events.push(event),
            }
        }
    }

    /// Despawns dead non-player mortals and reports a dead player once.
    fn reap_dead(&mut self, events: &mut Vec<RoomEvent>) {
        let before = self.entities.len();
        self.entities.retain(|slot| {
            !slot
                .entity
                .as_mortal()
                .is_some_and(|mortal| mortal.is_dead())
        });
        if self.entities.len() != before {
            debug!(room = %self.id, reaped = before - self.entities.len(), "dead_entities_reaped");
        }

        let player_dead = self
            .player
            .as_mortal()
            .is_some_and(|mortal| mortal.is_dead());
        if player_dead && !self.player_death_reported {
            events.push(RoomEvent::PlayerDied);
        }
        self.player_death_reported = player_dead;
    }
}

fn snapshot_of(
    entities: &[EntitySlot],
    player: &Player,
    player_handle: EntityHandle,
) -> Vec<EntityInfo> {
    let mut infos: Vec<EntityInfo> = entities
        .iter()
        .map(|slot| EntityInfo::of(slot.handle, slot.entity.as_ref(), false))
        .collect();
    infos.push(EntityInfo::of(player_handle, player, true));
    infos
}
