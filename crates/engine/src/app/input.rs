use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::warn;
use winit::keyboard::KeyCode;

use crate::keybind::Keybind;

/// Physical keys to the keybinds they trigger. One key may trigger several keybinds
/// and several keys may share one.
#[derive(Debug, Clone, Default)]
pub struct KeybindRegistry {
    bindings: HashMap<KeyCode, Vec<Keybind>>,
}

impl KeybindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for key in [KeyCode::ArrowUp, KeyCode::KeyW] {
            registry.bind(key, Keybind::NORTH);
        }
        for key in [KeyCode::ArrowDown, KeyCode::KeyS] {
            registry.bind(key, Keybind::SOUTH);
        }
        for key in [KeyCode::ArrowRight, KeyCode::KeyD] {
            registry.bind(key, Keybind::EAST);
        }
        for key in [KeyCode::ArrowLeft, KeyCode::KeyA] {
            registry.bind(key, Keybind::WEST);
        }
        registry.bind(KeyCode::Space, Keybind::USE);
        registry.bind(KeyCode::Enter, Keybind::ENTER);
        registry.bind(KeyCode::Escape, Keybind::MENU);
        registry
    }

    pub fn bind(&mut self, key: KeyCode, keybind: Keybind) {
        let bound = self.bindings.entry(key).or_default();
        if !bound.contains(&keybind) {
            bound.push(keybind);
        }
    }

    pub fn unbind(&mut self, key: KeyCode) {
        self.bindings.remove(&key);
    }

    pub fn keybinds_for(&self, key: KeyCode) -> &[Keybind] {
        self.bindings.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug)]
struct HeldKeybind {
    keybind: Keybind,
    holders: u32,
    last_fired: Option<Instant>,
}

/// Turns press/release edges into per-tick firings. A keybind fires on the first tick
/// after it is pressed, even if it was released again before that tick, and then
/// again every time its firing delay elapses while it stays held.
#[derive(Debug, Default)]
pub struct KeybindFilter {
    held: Vec<HeldKeybind>,
}

impl KeybindFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, keybind: &Keybind) {
        match self.held.iter_mut().find(|held| held.keybind == *keybind) {
            Some(held) => held.holders = held.holders.saturating_add(1),
            None => self.held.push(HeldKeybind {
                keybind: keybind.clone(),
                holders: 1,
                last_fired: None,
            }),
        }
    }

    pub fn release(&mut self, keybind: &Keybind) {
        if let Some(held) = self.held.iter_mut().find(|held| held.keybind == *keybind) {
            held.holders = held.holders.saturating_sub(1);
        }
        // Taps that have not fired yet stay queued for the next tick.
        self.held
            .retain(|held| held.holders > 0 || held.last_fired.is_none());
    }

    pub fn is_held(&self, keybind: &Keybind) -> bool {
        self.held
            .iter()
            .any(|held| held.keybind == *keybind && held.holders > 0)
    }

    /// Keybinds firing at `now`, in press order.
    pub fn fire(&mut self, now: Instant) -> Vec<Keybind> {
        let mut fired = Vec::new();
        for held in &mut self.held {
            let due = match held.last_fired {
                None => true,
                Some(last) => now.saturating_duration_since(last) >= held.keybind.firing_delay(),
            };
            if due {
                held.last_fired = Some(now);
                fired.push(held.keybind.clone());
            }
        }
        self.held.retain(|held| held.holders > 0);
        fired
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Keyboard state shared between the window thread, which feeds key edges, and the
/// simulation thread, which drains firings once per tick.
#[derive(Debug, Clone)]
pub struct SharedInput {
    registry: Arc<KeybindRegistry>,
    filter: Arc<Mutex<KeybindFilter>>,
}

impl SharedInput {
    pub fn new(registry: KeybindRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            filter: Arc::new(Mutex::new(KeybindFilter::new())),
        }
    }

    pub fn registry(&self) -> &KeybindRegistry {
        &self.registry
    }

    pub fn key_pressed(&self, key: KeyCode) {
        let keybinds = self.registry.keybinds_for(key);
        if keybinds.is_empty() {
            return;
        }
        let mut filter = self.lock();
        for keybind in keybinds {
            filter.press(keybind);
        }
    }

    pub fn key_released(&self, key: KeyCode) {
        let keybinds = self.registry.keybinds_for(key);
        if keybinds.is_empty() {
            return;
        }
        let mut filter = self.lock();
        for keybind in keybinds {
            filter.release(keybind);
        }
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all(&self) {
        self.lock().clear();
    }

    pub fn fire(&self, now: Instant) -> Vec<Keybind> {
        self.lock().fire(now)
    }

    fn lock(&self) -> MutexGuard<'_, KeybindFilter> {
        match self.filter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("input_lock_poisoned_recovered");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_map_arrows_and_wasd() {
        let registry = KeybindRegistry::with_defaults();
        assert_eq!(registry.keybinds_for(KeyCode::ArrowUp), &[Keybind::NORTH]);
        assert_eq!(registry.keybinds_for(KeyCode::KeyA), &[Keybind::WEST]);
        assert_eq!(registry.keybinds_for(KeyCode::Space), &[Keybind::USE]);
        assert_eq!(registry.keybinds_for(KeyCode::Escape), &[Keybind::MENU]);
        assert!(registry.keybinds_for(KeyCode::KeyQ).is_empty());
    }

    #[test]
    fn held_keybind_fires_on_press_then_after_delay() {
        let mut filter = KeybindFilter::new();
        let start = Instant::now();
        filter.press(&Keybind::EAST);

        assert_eq!(filter.fire(start), vec![Keybind::EAST]);
        assert!(filter.fire(start + Duration::from_millis(100)).is_empty());
        assert_eq!(
            filter.fire(start + Duration::from_millis(150)),
            vec![Keybind::EAST]
        );
        assert!(filter.fire(start + Duration::from_millis(200)).is_empty());
    }

    #[test]
    fn tap_between_ticks_fires_once() {
        let mut filter = KeybindFilter::new();
        let start = Instant::now();
        filter.press(&Keybind::USE);
        filter.release(&Keybind::USE);

        assert_eq!(filter.fire(start), vec![Keybind::USE]);
        assert!(filter.fire(start + Duration::from_secs(1)).is_empty());
        assert!(!filter.is_held(&Keybind::USE));
    }

    #[test]
    fn keybind_stays_held_while_any_key_holds_it() {
        let shared = SharedInput::new(KeybindRegistry::with_defaults());
        let start = Instant::now();
        shared.key_pressed(KeyCode::ArrowUp);
        shared.key_pressed(KeyCode::KeyW);
        assert_eq!(shared.fire(start), vec![Keybind::NORTH]);

        shared.key_released(KeyCode::ArrowUp);
        assert_eq!(
            shared.fire(start + Duration::from_millis(150)),
            vec![Keybind::NORTH]
        );

        shared.key_released(KeyCode::KeyW);
        assert!(shared.fire(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn custom_delay_controls_repeat() {
        let fast = Keybind::new("test.fast").with_firing_delay(Duration::ZERO);
        let mut filter = KeybindFilter::new();
        let start = Instant::now();
        filter.press(&fast);
        filter.press(&Keybind::NORTH);

        assert_eq!(filter.fire(start), vec![fast.clone(), Keybind::NORTH]);
        assert_eq!(filter.fire(start), vec![fast]);
    }
}
