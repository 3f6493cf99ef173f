//! Loading of `.btile` tile specs, `.blvl` levels and PNG textures.

mod discovery;
mod error;
mod json;
mod level;
mod registry;
mod textures;
mod tile_spec;

pub use error::ContentError;
pub use json::SUPPORTED_VERSION;
pub use level::{
    build_level, level_files, load_level, AreaEntry, EntityEntry, HitboxEntry, Level, LevelSpec,
    RoomSpec, TaggedTile, TileEntry, BLVL_EXTENSION,
};
pub use registry::{
    AreaBuilder, AreaRegistry, BuildError, Context, EntityBuilder, EntityRegistry, Registries,
    TileBuilder, TileRegistry,
};
pub use textures::{validate_texture_key, TextureCache, TextureKeyError};
pub use tile_spec::{
    load_tile_spec, register_tile_specs, DirectionName, SmartTextureRef, TextureRef,
    TileSpec, TileTextureSpec, BTILE_EXTENSION,
};
