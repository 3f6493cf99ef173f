use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poison_once(operation: &'static str) {
    if !METRICS_POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned_recovered");
    }
}

/// Averages over the last completed reporting interval, plus running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub steps_per_second: f32,
    pub update_ms: f32,
    pub render_ms: f32,
    /// Keybinds fired per step.
    pub fired_per_step: f32,
    /// Steps since startup that ran past their tick budget.
    pub overruns: u64,
    pub scene_switches: u64,
}

impl LoopMetricsSnapshot {
    pub fn step_ms(&self) -> f32 {
        self.update_ms + self.render_ms
    }
}

/// Read side shared with whoever wants to display loop health.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_poison_once("write");
                poisoned.into_inner()
            }
        };
        *guard = snapshot;
    }
}

/// Timing of one simulation step, split by phase.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StepSample {
    pub(crate) update: Duration,
    pub(crate) render: Duration,
    pub(crate) fired: usize,
    pub(crate) switched_scene: bool,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    window: Duration,
    steps: u32,
    update_total: Duration,
    render_total: Duration,
    fired_total: u64,
    overruns: u64,
    scene_switches: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(window: Duration) -> Self {
        Self::starting_at(Instant::now(), window)
    }

    pub(crate) fn starting_at(start: Instant, window: Duration) -> Self {
        Self {
            window_start: start,
            window,
            steps: 0,
            update_total: Duration::ZERO,
            render_total: Duration::ZERO,
            fired_total: 0,
            overruns: 0,
            scene_switches: 0,
        }
    }

    pub(crate) fn record_step(&mut self, sample: StepSample) {
        self.steps = self.steps.saturating_add(1);
        self.update_total = self.update_total.saturating_add(sample.update);
        self.render_total = self.render_total.saturating_add(sample.render);
        self.fired_total = self.fired_total.saturating_add(sample.fired as u64);
        if sample.switched_scene {
            self.scene_switches = self.scene_switches.saturating_add(1);
        }
    }

    pub(crate) fn record_overrun(&mut self) {
        self.overruns = self.overruns.saturating_add(1);
    }

    /// Closes the window once it has lasted `window`, returning its averages.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let per_step = |total: f32| {
            if self.steps == 0 {
                0.0
            } else {
                total / self.steps as f32
            }
        };
        let snapshot = LoopMetricsSnapshot {
            steps_per_second: self.steps as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            update_ms: per_step(self.update_total.as_secs_f32() * 1000.0),
            render_ms: per_step(self.render_total.as_secs_f32() * 1000.0),
            fired_per_step: per_step(self.fired_total as f32),
            overruns: self.overruns,
            scene_switches: self.scene_switches,
        };

        self.window_start = now;
        self.steps = 0;
        self.update_total = Duration::ZERO;
        self.render_total = Duration::ZERO;
        self.fired_total = 0;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn sample(update_ms: u64, render_ms: u64, fired: usize) -> StepSample {
        StepSample {
            update: Duration::from_millis(update_ms),
            render: Duration::from_millis(render_ms),
            fired,
            switched_scene: false,
        }
    }

    #[test]
    fn window_averages_each_phase() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        metrics.record_step(sample(2, 1, 0));
        metrics.record_step(sample(4, 3, 2));
        metrics.record_overrun();

        let snapshot = metrics
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("window closed");
        assert!((snapshot.steps_per_second - 2.0).abs() < 0.01);
        assert!((snapshot.update_ms - 3.0).abs() < 0.001);
        assert!((snapshot.render_ms - 2.0).abs() < 0.001);
        assert!((snapshot.step_ms() - 5.0).abs() < 0.001);
        assert!((snapshot.fired_per_step - 1.0).abs() < 0.001);
        assert_eq!(snapshot.overruns, 1);
    }

    #[test]
    fn totals_survive_window_resets() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        metrics.record_step(StepSample {
            switched_scene: true,
            ..StepSample::default()
        });
        metrics.record_overrun();
        metrics.maybe_snapshot(base + Duration::from_secs(1));
        metrics.record_overrun();

        let snapshot = metrics
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second window");
        assert_eq!(snapshot.overruns, 2);
        assert_eq!(snapshot.scene_switches, 1);
        assert_eq!(snapshot.steps_per_second, 0.0);
        assert_eq!(snapshot.update_ms, 0.0);
    }

    #[test]
    fn open_window_yields_nothing() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        metrics.record_step(sample(16, 0, 0));
        assert!(metrics
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn handle_recovers_from_a_poisoned_lock() {
        let handle = MetricsHandle::default();
        let latest = Arc::clone(&handle.latest);
        let _ = thread::spawn(move || {
            let _guard = latest.write().expect("write guard");
            panic!("poison metrics lock");
        })
        .join();

        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());
        let published = LoopMetricsSnapshot {
            steps_per_second: 30.0,
            update_ms: 1.5,
            overruns: 3,
            ..LoopMetricsSnapshot::default()
        };
        handle.publish(published);
        assert_eq!(handle.snapshot(), published);
    }
}
