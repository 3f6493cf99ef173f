use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::world::{
    Area, BasicTile, Entity, Hitbox, Position, Tile, TileDefinition, TileLayer, TilePosition,
};

/// Extra fields attached to a tile, entity or area entry in a level file.
pub type Context = Map<String, Value>;

/// Why a builder refused an entry. The level loader logs it and skips the entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BuildError(pub String);

impl BuildError {
    pub fn missing_field(field: &str) -> Self {
        Self(format!("missing or mistyped field `{field}`"))
    }
}

pub type TileBuilder =
    Arc<dyn Fn(TilePosition, &Context) -> Result<Box<dyn Tile>, BuildError> + Send + Sync>;
pub type EntityBuilder =
    Arc<dyn Fn(Position, &Context) -> Result<Box<dyn Entity>, BuildError> + Send + Sync>;
pub type AreaBuilder =
    Arc<dyn Fn(Hitbox, &Context) -> Result<Box<dyn Area>, BuildError> + Send + Sync>;

/// Tile ids for one layer. Ids are either backed by a code builder or by a data-only
/// definition loaded from a `.btile` file.
#[derive(Clone, Default)]
pub struct TileRegistry {
    builders: BTreeMap<String, TileBuilder>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier registration of `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, builder: F)
    where
        F: Fn(TilePosition, &Context) -> Result<Box<dyn Tile>, BuildError> + Send + Sync + 'static,
    {
        self.builders.insert(id.into(), Arc::new(builder));
    }

    pub fn register_definition(&mut self, definition: TileDefinition) {
        let id = definition.id.clone();
        let shared = Arc::new(definition);
        self.register(id, move |_, _| {
            Ok(Box::new(BasicTile::new(Arc::clone(&shared))) as Box<dyn Tile>)
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.builders.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// `None` when `id` is unknown.
    pub fn build(
        &self,
        id: &str,
        position: TilePosition,
        context: &Context,
    ) -> Option<Result<Box<dyn Tile>, BuildError>> {
        self.builders.get(id).map(|builder| builder(position, context))
    }
}

#[derive(Clone, Default)]
pub struct EntityRegistry {
    builders: BTreeMap<String, EntityBuilder>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, builder: F)
    where
        F: Fn(Position, &Context) -> Result<Box<dyn Entity>, BuildError> + Send + Sync + 'static,
    {
        self.builders.insert(id.into(), Arc::new(builder));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.builders.contains_key(id)
    }

    pub fn build(
        &self,
        id: &str,
        position: Position,
        context: &Context,
    ) -> Option<Result<Box<dyn Entity>, BuildError>> {
        self.builders.get(id).map(|builder| builder(position, context))
    }
}

#[derive(Clone, Default)]
pub struct AreaRegistry {
    builders: BTreeMap<String, AreaBuilder>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, builder: F)
    where
        F: Fn(Hitbox, &Context) -> Result<Box<dyn Area>, BuildError> + Send + Sync + 'static,
    {
        self.builders.insert(id.into(), Arc::new(builder));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.builders.contains_key(id)
    }

    pub fn build(
        &self,
        id: &str,
        hitbox: Hitbox,
        context: &Context,
    ) -> Option<Result<Box<dyn Area>, BuildError>> {
        self.builders.get(id).map(|builder| builder(hitbox, context))
    }
}

/// Everything a level needs to turn ids into live objects.
#[derive(Clone, Default)]
pub struct Registries {
    pub floor_tiles: TileRegistry,
    pub wall_tiles: TileRegistry,
    pub entities: EntityRegistry,
    pub areas: AreaRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self, layer: TileLayer) -> &TileRegistry {
        match layer {
            TileLayer::Floor => &self.floor_tiles,
            TileLayer::Wall => &self.wall_tiles,
        }
    }

    pub fn tiles_mut(&mut self, layer: TileLayer) -> &mut TileRegistry {
        match layer {
            TileLayer::Floor => &mut self.floor_tiles,
            TileLayer::Wall => &mut self.wall_tiles,
        }
    }
}
