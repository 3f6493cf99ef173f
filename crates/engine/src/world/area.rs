use super::hitbox::Hitboxed;
use super::interact::Interactable;

/// Invisible trigger region. Entities overlapping it get dispatched to it during the
/// room's tile pass; it never blocks movement.
pub trait Area: Interactable + Hitboxed + Send {
    fn id(&self) -> &str;
}
