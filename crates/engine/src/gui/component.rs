use std::any::Any;
use std::fmt;

use crate::keybind::Keybind;
use crate::render::PixelAndTextGrid;

/// Identity handed out when a component is attached to a [`GuiParent`](super::GuiParent).
/// Unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gui#{}", self.0)
    }
}

/// Downcasting support so parents can hand back concrete child types.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait GuiComponent: AsAny + Send {
    /// Draws into `target`, which is exactly the component's resolved size and starts
    /// fully transparent.
    fn render(&mut self, target: &mut PixelAndTextGrid);

    fn on_input(&mut self, _key: &Keybind) {}
}
