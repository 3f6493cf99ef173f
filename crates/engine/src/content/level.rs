use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::render::{Color, Texture};
use crate::world::{Hitbox, Position, Room, TileLayer, TilePosition};

use super::discovery::files_with_extension;
use super::error::ContentError;
use super::json::{parse_versioned, read_text};
use super::registry::{Context, Registries};

pub const BLVL_EXTENSION: &str = ".blvl";

/// A cell in `floorTiles`/`wallTiles`, or a palette slot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TileEntry {
    Index(i64),
    Id(String),
    Tagged(TaggedTile),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedTile {
    pub tile_id: String,
    #[serde(flatten)]
    pub context: Context,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEntry {
    pub entity_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub context: Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HitboxEntry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaEntry {
    pub area_id: String,
    pub hitbox: HitboxEntry,
    #[serde(flatten)]
    pub context: Context,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSpec {
    pub room_id: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub initial_x: f64,
    #[serde(default)]
    pub initial_y: f64,
    #[serde(default)]
    pub reset_color: Option<String>,
    pub floor_tiles: Vec<Vec<Option<TileEntry>>>,
    pub wall_tiles: Vec<Vec<Option<TileEntry>>>,
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
}

/// On-disk `.blvl` document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSpec {
    pub version_id: u64,
    pub level_id: String,
    pub world: String,
    pub level: String,
    pub title: String,
    #[serde(default)]
    pub intro_background_color: Option<String>,
    #[serde(default)]
    pub intro_foreground_color: Option<String>,
    #[serde(default)]
    pub initial_room: Option<String>,
    #[serde(default)]
    pub palette: Vec<TileEntry>,
    pub rooms: Vec<RoomSpec>,
}

/// A loaded level: its rooms plus the intro card shown before play starts.
pub struct Level {
    pub id: String,
    pub world: String,
    pub level: String,
    pub title: String,
    pub intro_background: Color,
    pub intro_foreground: Color,
    initial_room: String,
    rooms: BTreeMap<String, Room>,
    source: PathBuf,
}

impl Level {
    pub fn initial_room(&self) -> &str {
        &self.initial_room
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn set_player_texture(&mut self, texture: &Texture) {
        for room in self.rooms.values_mut() {
            room.player_mut().set_texture(texture.clone());
        }
    }
}

pub fn level_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    files_with_extension(dir, BLVL_EXTENSION)
}

pub fn load_level(path: &Path, registries: &Registries) -> Result<Level, ContentError> {
    let raw = read_text(path)?;
    let spec: LevelSpec = parse_versioned(path, &raw, BLVL_EXTENSION)?;
    build_level(path, spec, registries)
}

pub fn build_level(
    path: &Path,
    spec: LevelSpec,
    registries: &Registries,
) -> Result<Level, ContentError> {
    let intro_background = optional_color(
        path,
        "introBackgroundColor",
        spec.intro_background_color.as_deref(),
        Color::BLACK,
    )?;
    let intro_foreground = optional_color(
        path,
        "introForegroundColor",
        spec.intro_foreground_color.as_deref(),
        Color::WHITE,
    )?;

    let first_room = spec
        .rooms
        .first()
        .map(|room| room.room_id.clone())
        .ok_or_else(|| ContentError::NoRooms {
            path: path.to_path_buf(),
        })?;

    let builder = RoomBuilder {
        path,
        palette: &spec.palette,
        registries,
    };
    let mut rooms = BTreeMap::new();
    for room_spec in &spec.rooms {
        if rooms.contains_key(&room_spec.room_id) {
            return Err(ContentError::DuplicateRoom {
                path: path.to_path_buf(),
                room_id: room_spec.room_id.clone(),
            });
        }
        let room = builder.build(room_spec)?;
        rooms.insert(room_spec.room_id.clone(), room);
    }

    let initial_room = match spec.initial_room {
        Some(room_id) if rooms.contains_key(&room_id) => room_id,
        requested => {
            warn!(
                level_id = %spec.level_id,
                requested = requested.as_deref().unwrap_or("<none>"),
                fallback = %first_room,
                "level_initial_room_missing"
            );
            first_room
        }
    };

    info!(
        level_id = %spec.level_id,
        rooms = rooms.len(),
        initial_room = %initial_room,
        "level_loaded"
    );
    Ok(Level {
        id: spec.level_id,
        world: spec.world,
        level: spec.level,
        title: spec.title,
        intro_background,
        intro_foreground,
        initial_room,
        rooms,
        source: path.to_path_buf(),
    })
}

fn optional_color(
    path: &Path,
    field: &str,
    raw: Option<&str>,
    default: Color,
) -> Result<Color, ContentError> {
    match raw {
        None => Ok(default),
        Some(raw) => Color::from_hex(raw.trim()).map_err(|source| ContentError::BadColor {
            path: path.to_path_buf(),
            field: field.to_string(),
            source,
        }),
    }
}

struct RoomBuilder<'a> {
    path: &'a Path,
    palette: &'a [TileEntry],
    registries: &'a Registries,
}

impl RoomBuilder<'_> {
    fn build(&self, spec: &RoomSpec) -> Result<Room, ContentError> {
        let mut room = Room::new(
            spec.room_id.as_str(),
            spec.width,
            spec.height,
            Position::new(spec.initial_x, spec.initial_y),
        )
        .map_err(|source| ContentError::Room {
            path: self.path.to_path_buf(),
            source,
        })?;
        if let Some(raw) = spec.reset_color.as_deref() {
            let field = format!("rooms[{}].resetColor", spec.room_id);
            room.set_reset_color(optional_color(self.path, &field, Some(raw), Color::BLACK)?);
        }

        self.fill_layer(&mut room, spec, TileLayer::Floor, &spec.floor_tiles)?;
        self.fill_layer(&mut room, spec, TileLayer::Wall, &spec.wall_tiles)?;

        for entry in &spec.entities {
            let position = Position::new(entry.x, entry.y);
            match self
                .registries
                .entities
                .build(&entry.entity_id, position, &entry.context)
            {
                Some(Ok(entity)) => {
                    room.spawn(entity);
                }
                Some(Err(error)) => warn!(
                    room_id = %spec.room_id,
                    entity_id = %entry.entity_id,
                    error = %error,
                    "level_entity_build_failed"
                ),
                None => warn!(
                    room_id = %spec.room_id,
                    entity_id = %entry.entity_id,
                    "level_entity_unknown"
                ),
            }
        }

        for entry in &spec.areas {
            let HitboxEntry { x, y, w, h } = entry.hitbox;
            let hitbox = match Hitbox::new(x, y, w, h) {
                Ok(hitbox) => hitbox,
                Err(error) => {
                    warn!(
                        room_id = %spec.room_id,
                        area_id = %entry.area_id,
                        error = %error,
                        "level_area_hitbox_invalid"
                    );
                    continue;
                }
            };
            match self.registries.areas.build(&entry.area_id, hitbox, &entry.context) {
                Some(Ok(area)) => room.add_area(area),
                Some(Err(error)) => warn!(
                    room_id = %spec.room_id,
                    area_id = %entry.area_id,
                    error = %error,
                    "level_area_build_failed"
                ),
                None => warn!(
                    room_id = %spec.room_id,
                    area_id = %entry.area_id,
                    "level_area_unknown"
                ),
            }
        }

        Ok(room)
    }

    fn fill_layer(
        &self,
        room: &mut Room,
        spec: &RoomSpec,
        layer: TileLayer,
        rows: &[Vec<Option<TileEntry>>],
    ) -> Result<(), ContentError> {
        if rows.len() != spec.height {
            return Err(self.malformed(
                spec,
                format!("{layer} tiles have {} rows, expected {}", rows.len(), spec.height),
            ));
        }
        let no_context = Context::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != spec.width {
                return Err(self.malformed(
                    spec,
                    format!(
                        "{layer} tile row {y} has {} entries, expected {}",
                        row.len(),
                        spec.width
                    ),
                ));
            }
            for (x, entry) in row.iter().enumerate() {
                let Some(entry) = entry else {
                    continue;
                };
                let position = TilePosition::new(x as i64, y as i64);
                let Some((tile_id, context)) = self.resolve_entry(spec, layer, position, entry)
                else {
                    continue;
                };
                let context = context.unwrap_or(&no_context);
                match self.registries.tiles(layer).build(tile_id, position, context) {
                    Some(Ok(tile)) => {
                        room.set_tile(layer, position, Some(tile))
                            .map_err(|error| self.malformed(spec, error.to_string()))?;
                    }
                    Some(Err(error)) => warn!(
                        room_id = %spec.room_id,
                        %layer,
                        %position,
                        tile_id,
                        error = %error,
                        "level_tile_build_failed"
                    ),
                    None => warn!(
                        room_id = %spec.room_id,
                        %layer,
                        %position,
                        tile_id,
                        "level_tile_unknown"
                    ),
                }
            }
        }
        Ok(())
    }

    /// Follows palette indices to an id plus optional context. Bad indices are reported
    /// and the cell is left empty.
    fn resolve_entry<'e>(
        &'e self,
        spec: &RoomSpec,
        layer: TileLayer,
        position: TilePosition,
        entry: &'e TileEntry,
    ) -> Option<(&'e str, Option<&'e Context>)> {
        let entry = match entry {
            TileEntry::Index(index) => {
                let slot = usize::try_from(*index)
                    .ok()
                    .and_then(|index| self.palette.get(index));
                match slot {
                    Some(TileEntry::Index(_)) | None => {
                        warn!(
                            room_id = %spec.room_id,
                            %layer,
                            %position,
                            index = *index,
                            palette_len = self.palette.len(),
                            "level_palette_index_invalid"
                        );
                        return None;
                    }
                    Some(slot) => slot,
                }
            }
            other => other,
        };
        match entry {
            TileEntry::Id(tile_id) => Some((tile_id.as_str(), None)),
            TileEntry::Tagged(tagged) => Some((tagged.tile_id.as_str(), Some(&tagged.context))),
            TileEntry::Index(_) => None,
        }
    }

    fn malformed(&self, spec: &RoomSpec, reason: String) -> ContentError {
        ContentError::Malformed {
            path: self.path.to_path_buf(),
            room_id: spec.room_id.clone(),
            reason,
        }
    }
}
