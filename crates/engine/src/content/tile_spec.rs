use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::render::Texture;
use crate::world::{
    Direction, Neighbours, TileDefinition, TileLayer, TileTextures, DEFAULT_TEXTURE_MASK,
};

use super::discovery::files_with_extension;
use super::error::ContentError;
use super::json::{parse_versioned, read_text};
use super::registry::Registries;
use super::textures::TextureCache;

pub const BTILE_EXTENSION: &str = ".btile";

/// A single texture key, or several keys drawn on top of each other (first on top).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextureRef {
    Key(String),
    Layers(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionName {
    North,
    East,
    South,
    West,
}

impl From<DirectionName> for Direction {
    fn from(name: DirectionName) -> Self {
        match name {
            DirectionName::North => Direction::North,
            DirectionName::East => Direction::East,
            DirectionName::South => Direction::South,
            DirectionName::West => Direction::West,
        }
    }
}

/// One entry of a smart tile's texture table: the same-id neighbours it applies to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SmartTextureRef {
    #[serde(default)]
    pub directions: Vec<DirectionName>,
    #[serde(default)]
    pub texture: Option<TextureRef>,
    /// Marks the entry used when no other entry matches the neighbour mask.
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TileTextureSpec {
    Plain(TextureRef),
    Smart(Vec<SmartTextureRef>),
}

/// On-disk `.btile` document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSpec {
    pub version_id: u64,
    pub tile_id: String,
    pub tile_type: String,
    #[serde(default)]
    pub smart: bool,
    #[serde(default)]
    pub texture: Option<TileTextureSpec>,
    #[serde(default)]
    pub passable: bool,
    #[serde(default)]
    pub viscosity: f64,
}

impl TileSpec {
    pub fn layer(&self, path: &Path) -> Result<TileLayer, ContentError> {
        match self.tile_type.trim().to_ascii_lowercase().as_str() {
            "floortile" => Ok(TileLayer::Floor),
            "walltile" => Ok(TileLayer::Wall),
            _ => Err(ContentError::UnknownTileType {
                path: path.to_path_buf(),
                tile_type: self.tile_type.clone(),
            }),
        }
    }

    /// Resolves textures through `textures`. Shape mismatches between `smart` and the
    /// texture table are reported and degrade to the placeholder or an empty table.
    pub fn into_definition(
        self,
        path: &Path,
        textures: &mut TextureCache,
    ) -> Result<TileDefinition, ContentError> {
        let layer = self.layer(path)?;
        let id = self.tile_id.trim().to_string();
        let resolved = match (self.smart, self.texture) {
            (false, Some(TileTextureSpec::Plain(texture))) => {
                TileTextures::Single(resolve(textures, &texture))
            }
            (false, other) => {
                warn!(
                    tile_id = %id,
                    smart = false,
                    has_texture = other.is_some(),
                    "tile_spec_texture_unusable"
                );
                TileTextures::Single(Texture::placeholder())
            }
            (true, Some(TileTextureSpec::Smart(entries))) => smart_textures(textures, &entries),
            (true, other) => {
                warn!(
                    tile_id = %id,
                    smart = true,
                    has_texture = other.is_some(),
                    "tile_spec_texture_unusable"
                );
                TileTextures::Smart(BTreeMap::new())
            }
        };
        Ok(TileDefinition {
            id,
            layer,
            textures: resolved,
            passable: self.passable,
            viscosity: self.viscosity,
        })
    }
}

fn resolve(textures: &mut TextureCache, texture: &TextureRef) -> Texture {
    match texture {
        TextureRef::Key(key) => textures.get(key),
        TextureRef::Layers(keys) => textures.layered(keys),
    }
}

fn smart_textures(textures: &mut TextureCache, entries: &[SmartTextureRef]) -> TileTextures {
    let mut by_mask = BTreeMap::new();
    for entry in entries {
        let mask = if entry.fallback {
            DEFAULT_TEXTURE_MASK
        } else {
            let directions = entry.directions.iter().copied().map(Direction::from);
            Neighbours::from_directions(directions).mask()
        };
        let texture = entry
            .texture
            .as_ref()
            .map(|texture| resolve(textures, texture))
            .unwrap_or_else(Texture::placeholder);
        by_mask.insert(mask, texture);
    }
    TileTextures::Smart(by_mask)
}

pub fn load_tile_spec(
    path: &Path,
    textures: &mut TextureCache,
) -> Result<TileDefinition, ContentError> {
    let raw = read_text(path)?;
    let spec: TileSpec = parse_versioned(path, &raw, BTILE_EXTENSION)?;
    spec.into_definition(path, textures)
}

/// Registers every `.btile` under `dir`. Files that fail to load are reported and
/// skipped; the count of registered tiles is returned.
pub fn register_tile_specs(
    dir: &Path,
    registries: &mut Registries,
    textures: &mut TextureCache,
) -> Result<usize, ContentError> {
    let mut registered = 0;
    for path in files_with_extension(dir, BTILE_EXTENSION)? {
        match load_tile_spec(&path, textures) {
            Ok(definition) => {
                let layer = definition.layer;
                registries.tiles_mut(layer).register_definition(definition);
                registered += 1;
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "tile_spec_load_failed");
            }
        }
    }
    info!(dir = %dir.display(), registered, "tile_specs_registered");
    Ok(registered)
}
