use std::collections::BTreeMap;
use std::fmt;

use tracing::{info, warn};

use crate::keybind::Keybind;
use crate::render::PixelAndTextGrid;

/// Name a scene is registered under in the [`SceneMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneKey(pub &'static str);

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    /// Unloads the target first so it starts from a fresh `load`.
    HardResetTo(SceneKey),
    Quit,
}

/// One screen of the game. Scenes are stepped on the simulation thread.
pub trait Scene: Send {
    fn load(&mut self) {}
    fn update(&mut self, fired: &[Keybind]) -> SceneCommand;
    fn render(&mut self, target: &mut PixelAndTextGrid);
    fn unload(&mut self) {}
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    fn ensure_loaded(&mut self) {
        if !self.is_loaded {
            self.scene.load();
            self.is_loaded = true;
        }
    }

    fn ensure_unloaded(&mut self) {
        if self.is_loaded {
            self.scene.unload();
            self.is_loaded = false;
        }
    }
}

/// Keyed scenes with exactly one active. Inactive scenes keep their state unless a
/// hard reset unloads them.
pub struct SceneMachine {
    scenes: BTreeMap<SceneKey, SceneRuntime>,
    active: SceneKey,
    quit_requested: bool,
}

impl SceneMachine {
    pub fn new(active: SceneKey, scene: Box<dyn Scene>) -> Self {
        let mut scenes = BTreeMap::new();
        scenes.insert(
            active,
            SceneRuntime {
                scene,
                is_loaded: false,
            },
        );
        Self {
            scenes,
            active,
            quit_requested: false,
        }
    }

    pub fn with_scene(mut self, key: SceneKey, scene: Box<dyn Scene>) -> Self {
        self.insert(key, scene);
        self
    }

    /// Adds or replaces a scene. Replacing the active scene unloads the old one.
    pub fn insert(&mut self, key: SceneKey, scene: Box<dyn Scene>) {
        let runtime = SceneRuntime {
            scene,
            is_loaded: false,
        };
        if let Some(mut previous) = self.scenes.insert(key, runtime) {
            previous.ensure_unloaded();
        }
        if key == self.active {
            self.load_active();
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active
    }

    pub fn contains(&self, key: SceneKey) -> bool {
        self.scenes.contains_key(&key)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn load_active(&mut self) {
        if let Some(runtime) = self.scenes.get_mut(&self.active) {
            runtime.ensure_loaded();
        }
    }

    /// Steps the active scene and applies the command it returns.
    pub fn update_active(&mut self, fired: &[Keybind]) -> SceneCommand {
        let Some(runtime) = self.scenes.get_mut(&self.active) else {
            return SceneCommand::None;
        };
        runtime.ensure_loaded();
        let command = runtime.scene.update(fired);
        match command {
            SceneCommand::None => {}
            SceneCommand::SwitchTo(next) => {
                self.switch_to(next, false);
            }
            SceneCommand::HardResetTo(next) => {
                self.switch_to(next, true);
            }
            SceneCommand::Quit => self.quit_requested = true,
        }
        command
    }

    pub fn render_active(&mut self, target: &mut PixelAndTextGrid) {
        if let Some(runtime) = self.scenes.get_mut(&self.active) {
            runtime.ensure_loaded();
            runtime.scene.render(target);
        }
    }

    /// Returns whether the active scene changed.
    pub fn switch_to(&mut self, next: SceneKey, hard_reset: bool) -> bool {
        if !self.scenes.contains_key(&next) {
            warn!(scene = %next, "scene_switch_unknown_target");
            return false;
        }
        if next == self.active && !hard_reset {
            return false;
        }
        if let Some(current) = self.scenes.get_mut(&self.active) {
            current.ensure_unloaded();
        }
        if hard_reset {
            if let Some(target) = self.scenes.get_mut(&next) {
                target.ensure_unloaded();
            }
        }
        let previous = self.active;
        self.active = next;
        self.load_active();
        info!(from = %previous, to = %next, hard_reset, "scene_switched");
        true
    }

    pub fn shutdown_all(&mut self) {
        for runtime in self.scenes.values_mut() {
            runtime.ensure_unloaded();
        }
    }
}
