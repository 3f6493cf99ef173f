use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::render::Texture;

use super::geometry::Direction;
use super::interact::Interactable;

pub const EMPTY_TILE_ID: &str = "empty";

/// Mask key a smart tile falls back to when its exact neighbour mask has no texture.
pub const DEFAULT_TEXTURE_MASK: u8 = 1 << 4;

/// Which orthogonal neighbours carry the same tile id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Neighbours(u8);

impl Neighbours {
    pub const NONE: Neighbours = Neighbours(0);

    pub fn from_directions(directions: impl IntoIterator<Item = Direction>) -> Self {
        directions
            .into_iter()
            .fold(Self::NONE, |acc, direction| acc.with(direction))
    }

    pub fn with(self, direction: Direction) -> Self {
        Self(self.0 | direction.mask())
    }

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & direction.mask() != 0
    }

    pub fn mask(self) -> u8 {
        self.0
    }
}

/// A cell occupant in a room's floor or wall grid.
pub trait Tile: Interactable + Send {
    fn id(&self) -> &str;

    /// Texture to draw given the same-id neighbour mask. Only smart tiles look at it.
    fn texture(&self, neighbours: Neighbours) -> Texture;

    fn is_passable(&self) -> bool {
        true
    }

    /// Fraction of an occupying entity's movement lost per tick, in `[0, 1]`.
    fn viscosity(&self) -> f64 {
        0.0
    }

    /// Whether [`Tile::texture`] depends on the neighbour mask.
    fn is_smart(&self) -> bool {
        false
    }
}

/// Placeholder for unpopulated cells: passable, invisible, inert.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTile;

impl Interactable for EmptyTile {}

impl Tile for EmptyTile {
    fn id(&self) -> &str {
        EMPTY_TILE_ID
    }

    fn texture(&self, _neighbours: Neighbours) -> Texture {
        Texture::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayer {
    Floor,
    Wall,
}

impl fmt::Display for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TileLayer::Floor => "floor",
            TileLayer::Wall => "wall",
        })
    }
}

#[derive(Debug, Clone)]
pub enum TileTextures {
    Single(Texture),
    /// Neighbour mask to texture, with [`DEFAULT_TEXTURE_MASK`] as the fallback key.
    Smart(BTreeMap<u8, Texture>),
}

impl TileTextures {
    pub fn resolve(&self, neighbours: Neighbours) -> Texture {
        match self {
            TileTextures::Single(texture) => texture.clone(),
            TileTextures::Smart(by_mask) => by_mask
                .get(&neighbours.mask())
                .or_else(|| by_mask.get(&DEFAULT_TEXTURE_MASK))
                .cloned()
                .unwrap_or_else(Texture::empty),
        }
    }
}

/// Data-only tile description, shared by every cell built from it.
#[derive(Debug, Clone)]
pub struct TileDefinition {
    pub id: String,
    pub layer: TileLayer,
    pub textures: TileTextures,
    pub passable: bool,
    pub viscosity: f64,
}

/// Tile driven entirely by a [`TileDefinition`].
#[derive(Debug, Clone)]
pub struct BasicTile {
    definition: Arc<TileDefinition>,
}

impl BasicTile {
    pub fn new(definition: Arc<TileDefinition>) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &TileDefinition {
        &self.definition
    }
}

impl Interactable for BasicTile {}

impl Tile for BasicTile {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn texture(&self, neighbours: Neighbours) -> Texture {
        self.definition.textures.resolve(neighbours)
    }

    fn is_passable(&self) -> bool {
        self.definition.passable
    }

    fn viscosity(&self) -> f64 {
        self.definition.viscosity
    }

    fn is_smart(&self) -> bool {
        matches!(self.definition.textures, TileTextures::Smart(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn smart_textures_fall_back_to_default_mask_then_empty() {
        let straight = Texture::solid(8, 8, Color::RED);
        let fallback = Texture::solid(8, 8, Color::BLUE);
        let mut by_mask = BTreeMap::new();
        let ns = Neighbours::from_directions([Direction::North, Direction::South]);
        by_mask.insert(ns.mask(), straight.clone());
        let textures = TileTextures::Smart(by_mask.clone());
        assert!(textures.resolve(ns).ptr_eq(&straight));
        assert!(textures.resolve(Neighbours::NONE).ptr_eq(&Texture::empty()));

        by_mask.insert(DEFAULT_TEXTURE_MASK, fallback.clone());
        let textures = TileTextures::Smart(by_mask);
        assert!(textures
            .resolve(Neighbours::NONE.with(Direction::East))
            .ptr_eq(&fallback));
    }

    #[test]
    fn basic_tile_reports_definition() {
        let tile = BasicTile::new(Arc::new(TileDefinition {
            id: "boss.water".to_string(),
            layer: TileLayer::Floor,
            textures: TileTextures::Single(Texture::placeholder()),
            passable: true,
            viscosity: 0.5,
        }));
        assert_eq!(tile.id(), "boss.water");
        assert!(tile.is_passable());
        assert_eq!(tile.viscosity(), 0.5);
        assert!(!tile.is_smart());
        assert!(EmptyTile.is_passable());
        assert_eq!(EmptyTile.id(), EMPTY_TILE_ID);
    }
}
