use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

pub const DEFAULT_KEYBIND_DELAY: Duration = Duration::from_millis(150);

/// Abstract input identifier. Two keybinds are equal when their ids match;
/// the firing delay only affects how often a held key repeats.
#[derive(Debug, Clone)]
pub struct Keybind {
    id: Cow<'static, str>,
    firing_delay: Duration,
}

impl Keybind {
    pub const NORTH: Keybind = Keybind::fixed("boss.north");
    pub const SOUTH: Keybind = Keybind::fixed("boss.south");
    pub const EAST: Keybind = Keybind::fixed("boss.east");
    pub const WEST: Keybind = Keybind::fixed("boss.west");
    pub const USE: Keybind = Keybind::fixed("boss.use");
    pub const ENTER: Keybind = Keybind::fixed("boss.enter");
    pub const MENU: Keybind = Keybind::fixed("boss.menu");

    const fn fixed(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            firing_delay: DEFAULT_KEYBIND_DELAY,
        }
    }

    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: id.into(),
            firing_delay: DEFAULT_KEYBIND_DELAY,
        }
    }

    pub fn with_firing_delay(mut self, firing_delay: Duration) -> Self {
        self.firing_delay = firing_delay;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn firing_delay(&self) -> Duration {
        self.firing_delay
    }

    /// True for `boss.use` and `boss.enter`, the two "confirm" inputs.
    pub fn is_confirm(&self) -> bool {
        *self == Keybind::USE || *self == Keybind::ENTER
    }
}

impl PartialEq for Keybind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Keybind {}

impl Hash for Keybind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Keybind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_firing_delay() {
        let slow = Keybind::new("boss.use").with_firing_delay(Duration::from_secs(2));
        assert_eq!(slow, Keybind::USE);
        assert_ne!(Keybind::USE, Keybind::ENTER);
        assert!(slow.is_confirm());
        assert!(!Keybind::NORTH.is_confirm());
    }
}
