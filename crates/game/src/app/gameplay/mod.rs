//! The game's own tiles, entities and areas, plus the title screen.

mod areas;
mod entities;
mod tiles;
mod title;

use engine::content::{BuildError, Context, Registries, TextureCache};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) use title::TitleScene;

/// Registers every code-defined builder. Data-driven `.btile` tiles are added
/// separately from the tiles directory.
pub(crate) fn register_builtins(registries: &mut Registries, textures: &mut TextureCache) {
    tiles::register(registries, textures);
    entities::register(&mut registries.entities, textures);
    areas::register(&mut registries.areas);
}

/// Reads a builder's extra level fields into `T`, naming the offending field on error.
fn context_as<T: DeserializeOwned>(context: &Context) -> Result<T, BuildError> {
    serde_path_to_error::deserialize(Value::Object(context.clone())).map_err(|error| {
        let path = error.path().to_string();
        BuildError(format!("context field `{path}`: {}", error.into_inner()))
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[allow(dead_code)]
        target: String,
    }

    #[test]
    fn context_errors_name_the_field() {
        let Value::Object(context) = json!({"target": 3}) else {
            unreachable!()
        };
        let error = context_as::<Sample>(&context).expect_err("wrong type");
        assert!(error.0.contains("`target`"), "{}", error.0);
    }

    #[test]
    fn builtins_cover_the_level_ids() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut textures = TextureCache::new(temp.path().to_path_buf());
        let mut registries = Registries::new();
        register_builtins(&mut registries, &mut textures);

        assert!(registries.floor_tiles.contains(tiles::DOOR_ID));
        assert!(registries.floor_tiles.contains(tiles::SPIKES_ID));
        assert!(registries.floor_tiles.contains(tiles::LEVER_ID));
        assert!(registries.wall_tiles.contains(tiles::GATE_ID));
        assert!(registries.entities.contains(entities::SLIME_ID));
        assert!(registries.entities.contains(entities::NPC_ID));
        assert!(registries.areas.contains(areas::SIGN_ID));
        assert!(registries.areas.contains(areas::NOTICE_ID));
    }
}
