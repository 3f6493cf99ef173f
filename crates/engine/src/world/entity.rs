use std::fmt;

use crate::render::Texture;

use super::geometry::{Direction, Position, Vector2};
use super::hitbox::Hitbox;
use super::interact::Interactable;

pub const PLAYER_ID: &str = "boss.player";
pub const PLAYER_FRICTION: f64 = 0.6;
pub const MAX_PLAYER_HEALTH: f64 = 100.0;
pub const PLAYER_HITBOX: Hitbox = Hitbox::new_unchecked(-0.375, -0.5, 0.75, 0.99);

/// Room-unique entity identity, stable for the entity's lifetime in that room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait Renderable {
    fn texture(&self) -> Texture;
}

/// Something with a velocity that the room integrates every step.
pub trait Accelerable {
    fn acceleration(&self) -> Vector2;
    fn set_acceleration(&mut self, acceleration: Vector2);
    /// Per-step velocity multiplier.
    fn friction(&self) -> f64;
    fn direction(&self) -> Direction;
    fn set_direction(&mut self, direction: Direction);

    /// Pushes in `direction` by `magnitude` and turns to face it.
    fn accelerate(&mut self, direction: Direction, magnitude: f64) {
        let next = self.acceleration() + direction.unit() * magnitude;
        self.set_acceleration(next);
        self.set_direction(direction);
    }
}

pub trait Mortal {
    fn health(&self) -> f64;
    fn set_health(&mut self, health: f64);
    fn max_health(&self) -> f64;

    fn damage(&mut self, amount: f64) {
        let next = (self.health() - amount).min(self.max_health());
        self.set_health(next);
    }

    fn is_dead(&self) -> bool {
        self.health() <= 0.0
    }
}

/// A room inhabitant. Optional capabilities are reached through the `as_*` accessors.
pub trait Entity: Interactable + Renderable + Send {
    fn id(&self) -> &str;
    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
    /// Hitbox relative to [`Entity::position`].
    fn relative_hitbox(&self) -> Hitbox;

    fn hitbox(&self) -> Hitbox {
        self.relative_hitbox().resolve_relative_to(self.position())
    }

    fn as_accelerable(&self) -> Option<&dyn Accelerable> {
        None
    }

    fn as_accelerable_mut(&mut self) -> Option<&mut dyn Accelerable> {
        None
    }

    fn as_mortal(&self) -> Option<&dyn Mortal> {
        None
    }

    fn as_mortal_mut(&mut self) -> Option<&mut dyn Mortal> {
        None
    }
}

/// Shared state for moving, damageable entities. Concrete entities embed one and hand
/// it out from `as_accelerable*`/`as_mortal*`.
#[derive(Debug, Clone)]
pub struct MobState {
    pub texture: Texture,
    pub position: Position,
    pub direction: Direction,
    pub acceleration: Vector2,
    pub friction: f64,
    pub health: f64,
    pub max_health: f64,
    pub relative_hitbox: Hitbox,
}

impl MobState {
    pub fn new(
        texture: Texture,
        position: Position,
        relative_hitbox: Hitbox,
        friction: f64,
        max_health: f64,
    ) -> Self {
        Self {
            texture,
            position,
            direction: Direction::North,
            acceleration: Vector2::ZERO,
            friction,
            health: max_health,
            max_health,
            relative_hitbox,
        }
    }
}

impl Accelerable for MobState {
    fn acceleration(&self) -> Vector2 {
        self.acceleration
    }

    fn set_acceleration(&mut self, acceleration: Vector2) {
        self.acceleration = acceleration;
    }

    fn friction(&self) -> f64 {
        self.friction
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }
}

impl Mortal for MobState {
    fn health(&self) -> f64 {
        self.health
    }

    fn set_health(&mut self, health: f64) {
        self.health = health;
    }

    fn max_health(&self) -> f64 {
        self.max_health
    }
}

/// The room's distinguished entity, steered by the host's movement keybinds.
#[derive(Debug, Clone)]
pub struct Player {
    mob: MobState,
}

impl Player {
    pub fn new(position: Position, texture: Texture) -> Self {
        Self {
            mob: MobState::new(
                texture,
                position,
                PLAYER_HITBOX,
                PLAYER_FRICTION,
                MAX_PLAYER_HEALTH,
            ),
        }
    }

    pub fn mob(&self) -> &MobState {
        &self.mob
    }

    pub fn mob_mut(&mut self) -> &mut MobState {
        &mut self.mob
    }

    pub fn set_texture(&mut self, texture: Texture) {
        self.mob.texture = texture;
    }
}

impl Interactable for Player {}

impl Renderable for Player {
    fn texture(&self) -> Texture {
        self.mob.texture.clone()
    }
}

impl Entity for Player {
    fn id(&self) -> &str {
        PLAYER_ID
    }

    fn position(&self) -> Position {
        self.mob.position
    }

    fn set_position(&mut self, position: Position) {
        self.mob.position = position;
    }

    fn relative_hitbox(&self) -> Hitbox {
        self.mob.relative_hitbox
    }

    fn as_accelerable(&self) -> Option<&dyn Accelerable> {
        Some(&self.mob)
    }

    fn as_accelerable_mut(&mut self) -> Option<&mut dyn Accelerable> {
        Some(&mut self.mob)
    }

    fn as_mortal(&self) -> Option<&dyn Mortal> {
        Some(&self.mob)
    }

    fn as_mortal_mut(&mut self) -> Option<&mut dyn Mortal> {
        Some(&mut self.mob)
    }
}
