use std::env;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowBuilder;

use crate::render::PixelAndTextGrid;

use super::frame::FrameSlot;
use super::input::{KeybindRegistry, SharedInput};
use super::metrics::{MetricsAccumulator, StepSample};
use super::rendering::{Renderer, DEFAULT_PRESENT_SCALE};
use super::scene::SceneMachine;
use super::{MetricsHandle, STEPS_PER_SECOND};

pub const SLOW_TICK_ENV_VAR: &str = "BOSS_SLOW_TICK_MS";
const SIM_THREAD_NAME: &str = "sim";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    /// Size of the grid scenes render into, in grid pixels.
    pub grid_width: u32,
    pub grid_height: u32,
    /// Window pixels per grid pixel before `pixels` fits the buffer to the window.
    pub present_scale: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_tick_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Bosstrove's Revenge".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: STEPS_PER_SECOND,
            grid_width: 160,
            grid_height: 90,
            present_scale: DEFAULT_PRESENT_SCALE,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_tick_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to spawn simulation thread: {0}")]
    SpawnSimThread(#[source] io::Error),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    scenes: SceneMachine,
    keybinds: KeybindRegistry,
) -> Result<(), AppError> {
    run_app_with_metrics(config, scenes, keybinds, MetricsHandle::default())
}

/// Opens the window, starts the simulation thread and blocks until the window closes
/// or a scene asks to quit.
pub fn run_app_with_metrics(
    config: LoopConfig,
    scenes: SceneMachine,
    keybinds: KeybindRegistry,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        config.grid_width,
        config.grid_height,
        config.present_scale,
    )
    .map_err(AppError::CreateRenderer)?;

    let tick = tick_duration(config.target_tps);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_tick_delay = resolve_slow_tick_delay(config.simulated_slow_tick_ms);
    info!(
        target_tps = config.target_tps.max(1),
        grid_width = config.grid_width,
        grid_height = config.grid_height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_tick_delay_ms = slow_tick_delay.as_millis() as u64,
        "loop_config"
    );

    let input = SharedInput::new(keybinds);
    let frames = FrameSlot::new();
    let running = Arc::new(AtomicBool::new(true));
    let sim = SimLoop {
        scenes,
        input: input.clone(),
        frames: frames.clone(),
        grid_width: config.grid_width,
        grid_height: config.grid_height,
        metrics: MetricsAccumulator::new(metrics_log_interval),
        metrics_handle,
    };
    let mut sim_thread = Some(spawn_sim_thread(
        sim,
        Arc::clone(&running),
        tick,
        slow_tick_delay,
    )?);

    let mut last_presented = 0;
    let redraw_poll = tick / 2;
    event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + redraw_poll));

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    running.store(false, Ordering::Release);
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        error!(error = %error, "renderer_resize_failed");
                        running.store(false, Ordering::Release);
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        error!(error = %error, "renderer_resize_failed");
                        running.store(false, Ordering::Release);
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.repeat {
                        return;
                    }
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match event.state {
                            ElementState::Pressed => input.key_pressed(code),
                            ElementState::Released => input.key_released(code),
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    let Some(frame) = frames.latest() else {
                        return;
                    };
                    if let Err(error) = renderer.present(&frame) {
                        error!(error = %error, "renderer_draw_failed");
                        running.store(false, Ordering::Release);
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !running.load(Ordering::Acquire) {
                    info!(reason = "scene_quit", "shutdown_requested");
                    window_target.exit();
                    return;
                }
                let generation = frames.generation();
                if generation != last_presented {
                    last_presented = generation;
                    window.request_redraw();
                }
                window_target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + redraw_poll));
            }
            Event::LoopExiting => {
                running.store(false, Ordering::Release);
                if let Some(handle) = sim_thread.take() {
                    if handle.join().is_err() {
                        error!("sim_thread_panicked");
                    }
                }
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn spawn_sim_thread(
    mut sim: SimLoop,
    running: Arc<AtomicBool>,
    tick: Duration,
    slow_tick_delay: Duration,
) -> Result<JoinHandle<()>, AppError> {
    thread::Builder::new()
        .name(SIM_THREAD_NAME.to_string())
        .spawn(move || {
            sim.scenes.load_active();
            info!(scene = %sim.scenes.active_scene(), "scene_loaded");
            while running.load(Ordering::Acquire) {
                let tick_start = Instant::now();
                if slow_tick_delay > Duration::ZERO {
                    // Debug perturbation for exercising overruns.
                    thread::sleep(slow_tick_delay);
                }
                sim.step_once(tick_start);
                if sim.scenes.quit_requested() {
                    running.store(false, Ordering::Release);
                    break;
                }

                let elapsed = Instant::now().saturating_duration_since(tick_start);
                match tick_budget(elapsed, tick) {
                    TickBudget::Sleep(remaining) => thread::sleep(remaining),
                    TickBudget::Overrun(over) => {
                        sim.metrics.record_overrun();
                        warn!(overrun_ms = over.as_millis() as u64, "sim_tick_overrun");
                    }
                }
            }
            sim.scenes.shutdown_all();
            info!("sim_stopped");
        })
        .map_err(AppError::SpawnSimThread)
}

/// Everything the simulation thread owns between ticks.
struct SimLoop {
    scenes: SceneMachine,
    input: SharedInput,
    frames: FrameSlot,
    grid_width: u32,
    grid_height: u32,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
}

impl SimLoop {
    /// Steps the active scene with the keybinds firing at `now`, renders into a fresh
    /// grid and publishes it.
    fn step_once(&mut self, now: Instant) {
        let fired = self.input.fire(now);
        let scene_before = self.scenes.active_scene();
        self.scenes.update_active(&fired);
        let updated = Instant::now();

        let mut frame = PixelAndTextGrid::new(self.grid_width, self.grid_height);
        self.scenes.render_active(&mut frame);
        self.frames.publish(frame);
        let finished = Instant::now();

        self.metrics.record_step(StepSample {
            update: updated.saturating_duration_since(now),
            render: finished.saturating_duration_since(updated),
            fired: fired.len(),
            switched_scene: self.scenes.active_scene() != scene_before,
        });
        if let Some(snapshot) = self.metrics.maybe_snapshot(finished) {
            self.metrics_handle.publish(snapshot);
            info!(
                steps_per_second = snapshot.steps_per_second,
                update_ms = snapshot.update_ms,
                render_ms = snapshot.render_ms,
                fired_per_step = snapshot.fired_per_step,
                overruns = snapshot.overruns,
                scene_switches = snapshot.scene_switches,
                scene = %self.scenes.active_scene(),
                "loop_metrics"
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickBudget {
    Sleep(Duration),
    Overrun(Duration),
}

/// Overruns are reported and the next tick starts immediately; there is no catch-up.
fn tick_budget(elapsed: Duration, tick: Duration) -> TickBudget {
    if elapsed > tick {
        TickBudget::Overrun(elapsed - tick)
    } else {
        TickBudget::Sleep(tick - elapsed)
    }
}

fn tick_duration(target_tps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / target_tps.max(1) as f64)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_tick_delay(config_slow_tick_ms: u64) -> Duration {
    slow_tick_delay_from(env::var(SLOW_TICK_ENV_VAR), config_slow_tick_ms)
}

fn slow_tick_delay_from(value: Result<String, env::VarError>, config_slow_tick_ms: u64) -> Duration {
    match value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_TICK_ENV_VAR,
                    value = value.as_str(),
                    "slow_tick_env_invalid_using_config"
                );
                Duration::from_millis(config_slow_tick_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_tick_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_TICK_ENV_VAR,
                error = %err,
                "slow_tick_env_unreadable_using_config"
            );
            Duration::from_millis(config_slow_tick_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use winit::keyboard::KeyCode;

    use super::*;
    use crate::app::scene::{Scene, SceneCommand, SceneKey};
    use crate::keybind::Keybind;
    use crate::render::Color;

    struct Echo {
        seen: Arc<Mutex<Vec<Vec<Keybind>>>>,
        quit_after: usize,
    }

    impl Scene for Echo {
        fn update(&mut self, fired: &[Keybind]) -> SceneCommand {
            let mut seen = self.seen.lock().expect("seen");
            seen.push(fired.to_vec());
            if seen.len() >= self.quit_after {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn render(&mut self, target: &mut PixelAndTextGrid) {
            target.fill(Color::GREEN);
        }
    }

    fn sim_loop(quit_after: usize) -> (SimLoop, Arc<Mutex<Vec<Vec<Keybind>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let scene = Echo {
            seen: Arc::clone(&seen),
            quit_after,
        };
        let sim = SimLoop {
            scenes: SceneMachine::new(SceneKey("echo"), Box::new(scene)),
            input: SharedInput::new(KeybindRegistry::with_defaults()),
            frames: FrameSlot::new(),
            grid_width: 4,
            grid_height: 4,
            metrics: MetricsAccumulator::new(Duration::from_secs(60)),
            metrics_handle: MetricsHandle::default(),
        };
        (sim, seen)
    }

    #[test]
    fn step_publishes_a_rendered_frame_with_fired_keys() {
        let (mut sim, seen) = sim_loop(10);
        sim.input.key_pressed(KeyCode::Space);
        sim.step_once(Instant::now());

        assert_eq!(*seen.lock().expect("seen"), vec![vec![Keybind::USE]]);
        assert_eq!(sim.frames.generation(), 1);
        let frame = sim.frames.latest().expect("frame");
        assert_eq!((frame.width(), frame.height()), (4, 4));
        assert_eq!(frame.pixel(3, 3), Some(Color::GREEN));
    }

    #[test]
    fn quit_command_reaches_the_machine() {
        let (mut sim, _) = sim_loop(2);
        let now = Instant::now();
        sim.step_once(now);
        assert!(!sim.scenes.quit_requested());
        sim.step_once(now);
        assert!(sim.scenes.quit_requested());
    }

    #[test]
    fn sim_thread_stops_when_running_is_cleared() {
        let (sim, seen) = sim_loop(usize::MAX);
        let running = Arc::new(AtomicBool::new(true));
        let frames = sim.frames.clone();
        let handle = spawn_sim_thread(sim, Arc::clone(&running), Duration::from_millis(1), Duration::ZERO)
            .expect("spawn");
        while frames.generation() < 3 {
            thread::yield_now();
        }
        running.store(false, Ordering::Release);
        handle.join().expect("sim thread");
        assert!(seen.lock().expect("seen").len() >= 3);
    }

    #[test]
    fn overrun_starts_next_tick_immediately() {
        let tick = Duration::from_millis(33);
        assert_eq!(
            tick_budget(Duration::from_millis(10), tick),
            TickBudget::Sleep(Duration::from_millis(23))
        );
        assert_eq!(tick_budget(tick, tick), TickBudget::Sleep(Duration::ZERO));
        assert_eq!(
            tick_budget(Duration::from_millis(50), tick),
            TickBudget::Overrun(Duration::from_millis(17))
        );
    }

    #[test]
    fn tick_duration_guards_zero_tps() {
        assert_eq!(tick_duration(0), Duration::from_secs(1));
        assert_eq!(tick_duration(STEPS_PER_SECOND), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn slow_tick_env_falls_back_to_config() {
        assert_eq!(
            slow_tick_delay_from(Ok("25".to_string()), 0),
            Duration::from_millis(25)
        );
        assert_eq!(
            slow_tick_delay_from(Ok("soon".to_string()), 7),
            Duration::from_millis(7)
        );
        assert_eq!(
            slow_tick_delay_from(Err(env::VarError::NotPresent), 3),
            Duration::from_millis(3)
        );
    }

    #[test]
    fn zero_metrics_interval_uses_fallback() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }
}
