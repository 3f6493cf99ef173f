//! Host loop: window and presentation on the main thread, scenes stepped on a
//! fixed-rate simulation thread.

mod frame;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod world_scene;

pub use frame::FrameSlot;
pub use input::{KeybindFilter, KeybindRegistry, SharedInput};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_TICK_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{draw_glyph, draw_grid, glyph, Renderer, DEFAULT_PRESENT_SCALE};
pub use scene::{Scene, SceneCommand, SceneKey, SceneMachine};
pub use world_scene::{
    LaterTask, LevelFactory, WorldScene, DEATH_DELAY_STEPS, PLAYER_MOVE_ACCELERATION,
};

/// Simulation steps per second.
pub const STEPS_PER_SECOND: u32 = 30;
