use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, trace, warn};

use crate::keybind::Keybind;
use crate::world::entity::{Entity, EntityHandle};
use crate::world::geometry::{Direction, Position, TilePosition};
use crate::world::grid2d::Grid2D;
use crate::world::hitbox::{Hitbox, Hitboxed};
use crate::world::hitbox_manager::HitboxManager;
use crate::world::interact::{CallbackResult, Interactable};
use crate::world::tile::{Tile, TileLayer};

use super::{
    snapshot_of, Collider, EntityInfo, Room, RoomCommand, RoomContext, RoomEvent, Subject,
};

/// Sub-steps per tick in the movement integrator.
pub const MOVE_SUBSTEPS: u32 = 16;

impl Room {
    /// Advances the room by one tick. `fired` holds the keybinds that fired this tick.
    ///
    /// Runs every `on_step`, then moves accelerable entities against impassable tiles and
    /// dispatches entity collisions, then dispatches to the passable tiles and areas each
    /// entity covers. Commands queued by callbacks are applied after each of those passes.
    pub fn step(&mut self, fired: &[Keybind]) -> Vec<RoomEvent> {
        let mut events = Vec::new();

        let commands = self.run_step_callbacks();
        self.apply_commands(commands, &mut events);

        self.repopulate_hitboxes();
        let commands = self.run_movement(fired);
        self.apply_commands(commands, &mut events);

        let commands = self.run_covered_dispatch(fired);
        self.apply_commands(commands, &mut events);

        self.reap_dead(&mut events);
        self.steps += 1;
        trace!(room = %self.id, step = self.steps, events = events.len(), "room_stepped");
        events
    }

    fn run_step_callbacks(&mut self) -> Vec<RoomCommand> {
        let snapshot = self.snapshot();
        let Room {
            id,
            width,
            height,
            floor_tiles,
            wall_tiles,
            entities,
            player,
            player_handle,
            areas,
            ..
        } = self;
        let mut dispatch = Dispatcher::new(id, (*width, *height), *player_handle, snapshot);

        for (layer, grid) in [(TileLayer::Floor, floor_tiles), (TileLayer::Wall, wall_tiles)] {
            for (position, tile) in grid.iter_mut() {
                dispatch.call("on_step", Subject::Tile { layer, position }, |ctx| {
                    tile.on_step(ctx)
                });
            }
        }
        for slot in entities.iter_mut() {
            dispatch.call("on_step", Subject::Entity(slot.handle), |ctx| {
                slot.entity.on_step(ctx)
            });
        }
        dispatch.call("on_step", Subject::Entity(*player_handle), |ctx| player.on_step(ctx));
        for (index, area) in areas.iter_mut().enumerate() {
            dispatch.call("on_step", Subject::Area(index), |ctx| area.on_step(ctx));
        }

        dispatch.commands
    }

    fn run_movement(&mut self, fired: &[Keybind]) -> Vec<RoomCommand> {
        let Room {
            id,
            width,
            height,
            floor_tiles,
            wall_tiles,
            entities,
            player,
            player_handle,
            hitboxes,
            ..
        } = self;
        let player_handle = *player_handle;

        let mut crashes: Vec<(EntityHandle, Collider, Direction)> = Vec::new();
        for slot in entities.iter_mut() {
            let key = Collider::Entity(slot.handle);
            for (collider, direction) in integrate(slot.entity.as_mut(), key, floor_tiles, hitboxes) {
                crashes.push((slot.handle, collider, direction));
            }
        }
        let key = Collider::Entity(player_handle);
        for (collider, direction) in integrate(&mut *player, key, floor_tiles, hitboxes) {
            crashes.push((player_handle, collider, direction));
        }

        let snapshot = snapshot_of(entities, player, player_handle);
        let mut dispatch = Dispatcher::new(id, (*width, *height), player_handle, snapshot);

        for (handle, collider, direction) in crashes {
            let Collider::Tile { layer, position } = collider else {
                continue;
            };
            let Some(info) = dispatch.info(handle) else {
                continue;
            };
            let grid = match layer {
                TileLayer::Floor => &mut *floor_tiles,
                TileLayer::Wall => &mut *wall_tiles,
            };
            let Ok(tile) = grid.get_mut(position.x, position.y) else {
                continue;
            };
            dispatch.call("on_entity_hit", Subject::Tile { layer, position }, |ctx| {
                tile.on_entity_hit(ctx, &info, direction)
            });
        }

        for slot in entities.iter_mut() {
            for other in entity_partners(hitboxes, slot.handle) {
                let Some(info) = dispatch.info(other) else {
                    continue;
                };
                dispatch.call("on_entity_step", Subject::Entity(slot.handle), |ctx| {
                    slot.entity.on_entity_step(ctx, &info)
                });
            }
        }

        let touching = entity_partners(hitboxes, player_handle);
        for other in &touching {
            let Some(info) = dispatch.info(*other) else {
                continue;
            };
            dispatch.call("on_entity_step", Subject::Entity(player_handle), |ctx| {
                player.on_entity_step(ctx, &info)
            });
        }
        for key in fired {
            for other in &touching {
                let Some(slot) = entities.iter_mut().find(|slot| slot.handle == *other) else {
                    continue;
                };
                dispatch.call("on_player_interact", Subject::Entity(*other), |ctx| {
                    slot.entity.on_player_interact(ctx, key)
                });
            }
        }

        dispatch.commands
    }

    fn run_covered_dispatch(&mut self, fired: &[Keybind]) -> Vec<RoomCommand> {
        let snapshot = self.snapshot();
        let Room {
            id,
            width,
            height,
            floor_tiles,
            wall_tiles,
            player_handle,
            areas,
            ..
        } = self;
        let (width, height) = (*width, *height);
        let subjects = snapshot.clone();
        let mut dispatch = Dispatcher::new(id, (width, height), *player_handle, snapshot);

        for info in &subjects {
            for position in covered_cells(&info.hitbox, width, height) {
                for (layer, grid) in [
                    (TileLayer::Floor, &mut *floor_tiles),
                    (TileLayer::Wall, &mut *wall_tiles),
                ] {
                    let Ok(tile) = grid.get_mut(position.x, position.y) else {
                        continue;
                    };
                    if !tile.is_passable() {
                        continue;
                    }
                    let subject = Subject::Tile { layer, position };
                    dispatch.call("on_entity_step", subject, |ctx| tile.on_entity_step(ctx, info));
                    if info.is_player {
                        for key in fired {
                            dispatch.call("on_player_interact", subject, |ctx| {
                                tile.on_player_interact(ctx, key)
                            });
                        }
                    }
                }
            }

            for (index, area) in areas.iter_mut().enumerate() {
                if !area.hitbox().intersects(&info.hitbox) {
                    continue;
                }
                dispatch.call("on_entity_step", Subject::Area(index), |ctx| {
                    area.on_entity_step(ctx, info)
                });
                if info.is_player {
                    for key in fired {
                        dispatch.call("on_player_interact", Subject::Area(index), |ctx| {
                            area.on_player_interact(ctx, key)
                        });
                    }
                }
            }
        }

        dispatch.commands
    }
}

/// Builds contexts for one pass and collects the commands its callbacks queue.
struct Dispatcher<'r> {
    room_id: &'r str,
    size: (usize, usize),
    player: EntityHandle,
    snapshot: Vec<EntityInfo>,
    commands: Vec<RoomCommand>,
}

impl<'r> Dispatcher<'r> {
    fn new(
        room_id: &'r str,
        size: (usize, usize),
        player: EntityHandle,
        snapshot: Vec<EntityInfo>,
    ) -> Self {
        Self {
            room_id,
            size,
            player,
            snapshot,
            commands: Vec::new(),
        }
    }

    fn info(&self, handle: EntityHandle) -> Option<EntityInfo> {
        self.snapshot
            .iter()
            .find(|info| info.handle == handle)
            .cloned()
    }

    fn call(
        &mut self,
        callback: &'static str,
        subject: Subject,
        run: impl FnOnce(&mut RoomContext<'_>) -> CallbackResult,
    ) {
        let mut ctx = RoomContext::new(
            subject,
            self.size,
            self.player,
            &self.snapshot,
            &mut self.commands,
        );
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(&mut ctx)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(
                room = self.room_id,
                callback,
                subject = %subject,
                error = %err,
                "room_callback_failed"
            ),
            Err(payload) => error!(
                room = self.room_id,
                callback,
                subject = %subject,
                panic = panic_message(payload.as_ref()),
                "room_callback_panicked"
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn entity_partners(hitboxes: &mut HitboxManager<Collider>, handle: EntityHandle) -> Vec<EntityHandle> {
    hitboxes
        .all_collisions_of(Collider::Entity(handle))
        .into_iter()
        .filter_map(|collider| match collider {
            Collider::Entity(other) => Some(other),
            Collider::Tile { .. } => None,
        })
        .collect()
}

/// Grid cells whose unit square `hitbox` reaches, clipped to the room.
pub(crate) fn covered_cells(
    hitbox: &Hitbox,
    width: usize,
    height: usize,
) -> impl Iterator<Item = TilePosition> {
    let clamp = |value: f64, limit: usize| value.clamp(0.0, limit as f64) as i64;
    let x0 = clamp(hitbox.x().floor(), width);
    let x1 = clamp(hitbox.right().ceil(), width);
    let y0 = clamp(hitbox.y().floor(), height);
    let y1 = clamp(hitbox.bottom().ceil(), height);
    (y0..y1).flat_map(move |y| (x0..x1).map(move |x| TilePosition::new(x, y)))
}

fn floor_viscosity(floor: &Grid2D<Box<dyn Tile>>, hitbox: &Hitbox) -> f64 {
    covered_cells(hitbox, floor.width(), floor.height())
        .filter_map(|cell| floor.get_or_none(cell.x, cell.y))
        .filter(|tile| tile.is_passable())
        .map(|tile| tile.viscosity().clamp(0.0, 1.0))
        .fold(0.0, f64::max)
}

fn tile_blockers(
    hitboxes: &mut HitboxManager<Collider>,
    candidate: &Hitbox,
    key: Collider,
) -> Vec<Collider> {
    let mut blockers = hitboxes.collisions_with(candidate, Some(key));
    blockers.retain(|collider| collider.is_tile());
    blockers
}

/// Moves one entity through [`MOVE_SUBSTEPS`] axis-separated sub-steps, stopping each
/// axis at the first impassable tile it would enter. Returns the tiles that stopped it
/// with the direction of travel.
fn integrate(
    entity: &mut dyn Entity,
    key: Collider,
    floor: &Grid2D<Box<dyn Tile>>,
    hitboxes: &mut HitboxManager<Collider>,
) -> Vec<(Collider, Direction)> {
    let viscosity = floor_viscosity(floor, &entity.hitbox());
    let relative = entity.relative_hitbox();
    let mut position = entity.position();
    let Some(body) = entity.as_accelerable() else {
        return Vec::new();
    };
    let mut velocity = body.acceleration() * (body.friction() * (1.0 - viscosity));
    let substep = velocity * (1.0 / f64::from(MOVE_SUBSTEPS));

    let mut crashes = Vec::new();
    let mut x_done = substep.x == 0.0;
    let mut y_done = substep.y == 0.0;
    for _ in 0..MOVE_SUBSTEPS {
        if x_done && y_done {
            break;
        }
        if !x_done {
            let candidate = Position::new(position.x + substep.x, position.y);
            let blockers = tile_blockers(hitboxes, &relative.resolve_relative_to(candidate), key);
            if blockers.is_empty() {
                position = candidate;
            } else {
                let direction = if substep.x > 0.0 { Direction::East } else { Direction::West };
                crashes.extend(blockers.into_iter().map(|collider| (collider, direction)));
                velocity.x = 0.0;
                x_done = true;
            }
        }
        if !y_done {
            let candidate = Position::new(position.x, position.y + substep.y);
            let blockers = tile_blockers(hitboxes, &relative.resolve_relative_to(candidate), key);
            if blockers.is_empty() {
                position = candidate;
            } else {
                let direction = if substep.y > 0.0 { Direction::South } else { Direction::North };
                crashes.extend(blockers.into_iter().map(|collider| (collider, direction)));
                velocity.y = 0.0;
                y_done = true;
            }
        }
    }

    if let Some(body) = entity.as_accelerable_mut() {
        body.set_acceleration(velocity);
    }
    entity.set_position(position);
    hitboxes.update(key, entity.hitbox());
    crashes
}
