use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod gui;
pub mod keybind;
pub mod render;
pub mod world;

pub use app::{
    run_app, run_app_with_metrics, AppError, FrameSlot, KeybindRegistry, LevelFactory,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, Scene, SceneCommand, SceneKey, SceneMachine,
    WorldScene, SLOW_TICK_ENV_VAR, STEPS_PER_SECOND,
};
pub use content::{load_level, register_tile_specs, ContentError, Level, Registries, TextureCache};
pub use keybind::{Keybind, DEFAULT_KEYBIND_DELAY};
pub use render::{Color, PixelAndTextGrid, Texture, TILE_HEIGHT, TILE_WIDTH};

pub const ROOT_ENV_VAR: &str = "BOSS_ROOT";

/// Where the game finds its content, all under `<root>/assets`.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
    pub tiles_dir: PathBuf,
    pub textures_dir: PathBuf,
}

impl AppPaths {
    pub fn under(root: PathBuf) -> Self {
        let assets = root.join("assets");
        Self {
            levels_dir: assets.join("levels"),
            tiles_dir: assets.join("tiles"),
            textures_dir: assets.join("textures"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/bosstroves-revenge\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    Ok(AppPaths::under(resolve_root()?))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "").expect("manifest");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_from_a_nested_directory() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "").expect("manifest");
        let nested = temp.path().join("crates").join("game").join("target");
        fs::create_dir_all(&nested).expect("nested");

        let root = find_root_above(&nested).expect("root");
        assert_eq!(root, normalize_path(temp.path()));
        let paths = AppPaths::under(root.clone());
        assert_eq!(paths.levels_dir, root.join("assets").join("levels"));
        assert_eq!(paths.textures_dir, root.join("assets").join("textures"));
    }
}
