use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::render::{ColorParseError, TextureError};
use crate::world::RoomError;

use super::textures::TextureKeyError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {json_path}: {source}")]
    Json {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: versionId {version} is not supported for {extension} files")]
    UnsupportedVersion {
        path: PathBuf,
        version: u64,
        extension: &'static str,
    },
    #[error("{path}: room `{room_id}` is malformed: {reason}")]
    Malformed {
        path: PathBuf,
        room_id: String,
        reason: String,
    },
    #[error("{path}: room id `{room_id}` is declared more than once")]
    DuplicateRoom { path: PathBuf, room_id: String },
    #[error("{path}: level declares no rooms")]
    NoRooms { path: PathBuf },
    #[error("{path}: tileType `{tile_type}` must be `floortile` or `walltile`")]
    UnknownTileType { path: PathBuf, tile_type: String },
    #[error("{path}: bad color in `{field}`: {source}")]
    BadColor {
        path: PathBuf,
        field: String,
        #[source]
        source: ColorParseError,
    },
    #[error("{path}: {source}")]
    Room {
        path: PathBuf,
        #[source]
        source: RoomError,
    },
    #[error("invalid texture key `{key}`: {source}")]
    TextureKey {
        key: String,
        #[source]
        source: TextureKeyError,
    },
    #[error("failed to decode texture {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture {path} has inconsistent dimensions: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: TextureError,
    },
}
