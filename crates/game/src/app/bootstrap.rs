use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::content::{level_files, BLVL_EXTENSION};
use engine::gui::{GuiError, GuiLookAndFeel};
use engine::{
    load_level, register_tile_specs, resolve_app_paths, AppPaths, ContentError, KeybindRegistry,
    LevelFactory, LoopConfig, Registries, SceneCommand, SceneMachine, StartupError,
    TextureCache, WorldScene,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, TitleScene};
use super::{TITLE, WORLD};

const LEVEL_ENV_VAR: &str = "BOSS_LEVEL";
const PLAYER_TEXTURE: &str = "entities/player";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("failed to build the title screen: {0}")]
    Gui(#[from] GuiError),
    #[error("no {extension} levels found in {dir}")]
    NoLevels { dir: PathBuf, extension: &'static str },
    #[error("{env_var} names `{requested}`, which is not a level in {dir}")]
    UnknownLevel {
        requested: String,
        dir: PathBuf,
        env_var: &'static str,
    },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: SceneMachine,
    pub(crate) keybinds: KeybindRegistry,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Bosstrove's Revenge startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "root_resolved");
    let mut textures = TextureCache::new(paths.textures_dir.clone());
    let player_texture = textures.get(PLAYER_TEXTURE);
    let factory = level_factory(
        &paths,
        &mut textures,
        env::var(LEVEL_ENV_VAR).ok().as_deref(),
    )?;

    let world = WorldScene::new(
        factory,
        GuiLookAndFeel::default(),
        SceneCommand::SwitchTo(TITLE),
    );
    let scenes = SceneMachine::new(TITLE, Box::new(TitleScene::new(player_texture)?))
        .with_scene(WORLD, Box::new(world));

    Ok(AppWiring {
        config: LoopConfig::default(),
        scenes,
        keybinds: KeybindRegistry::with_defaults(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Registers the builtins plus every `.btile`, then returns a factory that rebuilds the
/// chosen level from disk each time the world scene loads.
fn level_factory(
    paths: &AppPaths,
    textures: &mut TextureCache,
    requested: Option<&str>,
) -> Result<LevelFactory, BootstrapError> {
    let mut registries = Registries::new();
    gameplay::register_builtins(&mut registries, textures);
    register_tile_specs(&paths.tiles_dir, &mut registries, textures)?;
    let player_texture = textures.get(PLAYER_TEXTURE);

    let level_path = select_level(&paths.levels_dir, requested)?;
    info!(
        level = %level_path.display(),
        textures = textures.len(),
        "level_selected"
    );

    let registries = Arc::new(registries);
    Ok(Box::new(move || {
        let mut level = load_level(&level_path, &registries)?;
        level.set_player_texture(&player_texture);
        Ok(level)
    }))
}

/// `requested` is a file name inside `dir`, with or without the extension. Without one
/// the first level in name order is used.
fn select_level(dir: &Path, requested: Option<&str>) -> Result<PathBuf, BootstrapError> {
    let levels = level_files(dir)?;
    let Some(requested) = requested.map(str::trim).filter(|name| !name.is_empty()) else {
        return levels.into_iter().next().ok_or_else(|| BootstrapError::NoLevels {
            dir: dir.to_path_buf(),
            extension: BLVL_EXTENSION,
        });
    };

    let wanted = if requested.ends_with(BLVL_EXTENSION) {
        requested.to_string()
    } else {
        format!("{requested}{BLVL_EXTENSION}")
    };
    levels
        .into_iter()
        .find(|path| path.file_name().is_some_and(|name| name == wanted.as_str()))
        .ok_or_else(|| BootstrapError::UnknownLevel {
            requested: requested.to_string(),
            dir: dir.to_path_buf(),
            env_var: LEVEL_ENV_VAR,
        })
}
