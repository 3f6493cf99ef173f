use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::keybind::Keybind;
use crate::render::{overlay, PixelAndTextGrid};

use super::{ComponentId, GuiComponent, GuiConstraints, GuiError, GuiPanel};

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

struct ChildSlot {
    id: ComponentId,
    component: Box<dyn GuiComponent>,
    constraints: GuiConstraints,
    hidden: bool,
}

/// Owns child components, composites them by z-order, and routes input to the
/// focused child.
#[derive(Default)]
pub struct GuiParent {
    children: Vec<ChildSlot>,
    focus: Option<ComponentId>,
}

impl GuiParent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: impl GuiComponent + 'static, constraints: GuiConstraints) -> ComponentId {
        self.add_boxed(Box::new(component), constraints)
    }

    pub fn add_boxed(&mut self, component: Box<dyn GuiComponent>, constraints: GuiConstraints) -> ComponentId {
        let id = ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed));
        self.children.push(ChildSlot {
            id,
            component,
            constraints,
            hidden: false,
        });
        id
    }

    /// Detaches a child. Removing the focused child clears focus.
    pub fn remove(&mut self, id: ComponentId) -> Option<Box<dyn GuiComponent>> {
        let index = self.children.iter().position(|slot| slot.id == id)?;
        if self.focus == Some(id) {
            self.focus = None;
        }
        Some(self.children.remove(index).component)
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.focus = None;
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn slot(&self, id: ComponentId) -> Option<&ChildSlot> {
        self.children.iter().find(|slot| slot.id == id)
    }

    fn slot_mut(&mut self, id: ComponentId) -> Result<&mut ChildSlot, GuiError> {
        self.children
            .iter_mut()
            .find(|slot| slot.id == id)
            .ok_or(GuiError::NotAChild(id))
    }

    pub fn constraints(&self, id: ComponentId) -> Option<GuiConstraints> {
        self.slot(id).map(|slot| slot.constraints)
    }

    pub fn set_constraints(&mut self, id: ComponentId, constraints: GuiConstraints) -> Result<(), GuiError> {
        self.slot_mut(id)?.constraints = constraints;
        Ok(())
    }

    pub fn is_hidden(&self, id: ComponentId) -> Option<bool> {
        self.slot(id).map(|slot| slot.hidden)
    }

    pub fn set_hidden(&mut self, id: ComponentId, hidden: bool) -> Result<(), GuiError> {
        self.slot_mut(id)?.hidden = hidden;
        Ok(())
    }

    pub fn focused(&self) -> Option<ComponentId> {
        self.focus
    }

    /// Focuses a direct child, or clears focus with `None`.
    pub fn set_focus(&mut self, id: Option<ComponentId>) -> Result<(), GuiError> {
        if let Some(id) = id {
            if !self.contains(id) {
                return Err(GuiError::NotAChild(id));
            }
        }
        self.focus = id;
        Ok(())
    }

    /// Whether `id` is a child here or anywhere below a nested parent or panel.
    pub fn contains_recursively(&self, id: ComponentId) -> bool {
        self.children.iter().any(|slot| {
            slot.id == id || nested(slot.component.as_ref()).is_some_and(|inner| inner.contains_recursively(id))
        })
    }

    /// Focuses `id` wherever it sits in the subtree, focusing each enclosing child along
    /// the way so input reaches it.
    pub fn set_focus_recursively(&mut self, id: ComponentId) -> Result<(), GuiError> {
        let slot = self
            .children
            .iter_mut()
            .find(|slot| {
                slot.id == id
                    || nested(slot.component.as_ref()).is_some_and(|inner| inner.contains_recursively(id))
            })
            .ok_or(GuiError::NotAChild(id))?;
        self.focus = Some(slot.id);
        if slot.id == id {
            return Ok(());
        }
        match nested_mut(slot.component.as_mut()) {
            Some(inner) => inner.set_focus_recursively(id),
            None => Err(GuiError::NotAChild(id)),
        }
    }

    pub fn child<T: GuiComponent + 'static>(&self, id: ComponentId) -> Option<&T> {
        self.slot(id)
            .and_then(|slot| slot.component.as_ref().as_any().downcast_ref::<T>())
    }

    pub fn child_mut<T: GuiComponent + 'static>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.children
            .iter_mut()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.component.as_mut().as_any_mut().downcast_mut::<T>())
    }

    /// Child indices in paint order. Equal z-orders are bumped upward in insertion order
    /// until each is unique, so earlier children paint first.
    fn paint_order(&self) -> Vec<usize> {
        let mut by_z: BTreeMap<i64, usize> = BTreeMap::new();
        for (index, slot) in self.children.iter().enumerate() {
            let mut z = i64::from(slot.constraints.z_order());
            while by_z.contains_key(&z) {
                z += 1;
            }
            by_z.insert(z, index);
        }
        by_z.into_values().collect()
    }
}

fn nested(component: &dyn GuiComponent) -> Option<&GuiParent> {
    let any = component.as_any();
    any.downcast_ref::<GuiParent>()
        .or_else(|| any.downcast_ref::<GuiPanel>().map(GuiPanel::children))
}

fn nested_mut(component: &mut dyn GuiComponent) -> Option<&mut GuiParent> {
    if component.as_any().is::<GuiParent>() {
        return component.as_any_mut().downcast_mut::<GuiParent>();
    }
    component
        .as_any_mut()
        .downcast_mut::<GuiPanel>()
        .map(GuiPanel::children_mut)
}

impl GuiComponent for GuiParent {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        let (target_w, target_h) = (target.width(), target.height());
        let mut composed = PixelAndTextGrid::new(target_w, target_h);

        for index in self.paint_order() {
            let slot = &mut self.children[index];
            if slot.hidden {
                continue;
            }
            let constraints = slot.constraints;
            let x = constraints.resolve_x(target_w, target_h);
            let y = constraints.resolve_y(target_w, target_h);
            let width = constraints
                .resolve_width(target_w, target_h)
                .min(target_w as i32 - x);
            let height = constraints
                .resolve_height(target_w, target_h)
                .min(target_h as i32 - y);
            if x >= target_w as i32 || y >= target_h as i32 || width <= 0 || height <= 0 {
                continue;
            }

            let mut scratch = PixelAndTextGrid::new(width as u32, height as u32);
            slot.component.render(&mut scratch);
            overlay(&scratch, &mut composed, x, y);
        }

        overlay(&composed, target, 0, 0);
    }

    fn on_input(&mut self, key: &Keybind) {
        let Some(focus) = self.focus else {
            return;
        };
        if let Some(slot) = self.children.iter_mut().find(|slot| slot.id == focus) {
            slot.component.on_input(key);
        }
    }
}
