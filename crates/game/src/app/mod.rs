pub(crate) mod bootstrap;
pub(crate) mod gameplay;
pub(crate) mod loop_runner;

use engine::SceneKey;

pub(crate) const TITLE: SceneKey = SceneKey("title");
pub(crate) const WORLD: SceneKey = SceneKey("world");
