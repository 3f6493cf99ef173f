use engine::content::AreaRegistry;
use engine::keybind::Keybind;
use engine::world::{
    Area, CallbackResult, EntityInfo, Hitbox, Hitboxed, Interactable, RoomContext, RoomEvent,
};
use serde::Deserialize;

use super::context_as;

pub(crate) const SIGN_ID: &str = "boss.sign";
pub(crate) const NOTICE_ID: &str = "boss.notice";

const DEFAULT_NOTICE_STEPS: u32 = 60;

pub(super) fn register(areas: &mut AreaRegistry) {
    areas.register(SIGN_ID, |hitbox, context| {
        let config: SignConfig = context_as(context)?;
        Ok(Box::new(Sign {
            hitbox,
            name: config.name,
            text: config.text,
        }) as Box<dyn Area>)
    });
    areas.register(NOTICE_ID, |hitbox, context| {
        let config: NoticeConfig = context_as(context)?;
        Ok(Box::new(Notice {
            hitbox,
            text: config.text,
            steps: config.steps,
            was_inside: false,
            inside: false,
        }) as Box<dyn Area>)
    });
}

#[derive(Debug, Deserialize)]
struct SignConfig {
    #[serde(default = "default_sign_name")]
    name: String,
    text: String,
}

fn default_sign_name() -> String {
    "Sign".to_string()
}

#[derive(Debug, Deserialize)]
struct NoticeConfig {
    text: String,
    #[serde(default = "default_notice_steps")]
    steps: u32,
}

fn default_notice_steps() -> u32 {
    DEFAULT_NOTICE_STEPS
}

/// Readable text; opens a dialogue when the player uses it while standing inside.
struct Sign {
    hitbox: Hitbox,
    name: String,
    text: String,
}

impl Interactable for Sign {
    fn on_player_interact(&mut self, ctx: &mut RoomContext<'_>, key: &Keybind) -> CallbackResult {
        if key.is_confirm() {
            ctx.emit(RoomEvent::ShowDialogue {
                name: self.name.clone(),
                text: self.text.clone(),
            });
        }
        Ok(())
    }
}

impl Hitboxed for Sign {
    fn hitbox(&self) -> Hitbox {
        self.hitbox
    }
}

impl Area for Sign {
    fn id(&self) -> &str {
        SIGN_ID
    }
}

/// Flavor text toasted each time the player walks in.
struct Notice {
    hitbox: Hitbox,
    text: String,
    steps: u32,
    was_inside: bool,
    inside: bool,
}

impl Interactable for Notice {
    fn on_step(&mut self, _ctx: &mut RoomContext<'_>) -> CallbackResult {
        self.was_inside = self.inside;
        self.inside = false;
        Ok(())
    }

    fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
        if !entity.is_player {
            return Ok(());
        }
        self.inside = true;
        if !self.was_inside {
            ctx.emit(RoomEvent::Toast {
                text: self.text.clone(),
                steps: self.steps,
            });
        }
        Ok(())
    }
}

impl Hitboxed for Notice {
    fn hitbox(&self) -> Hitbox {
        self.hitbox
    }
}

impl Area for Notice {
    fn id(&self) -> &str {
        NOTICE_ID
    }
}

#[cfg(test)]
mod tests {
    use engine::world::{Entity, Position, Room};
    use serde_json::{json, Value};

    use super::*;

    fn room_with(id: &str, context: Value) -> Room {
        let mut areas = AreaRegistry::new();
        register(&mut areas);
        let Value::Object(context) = context else {
            panic!("context must be an object");
        };
        let hitbox = Hitbox::new(0.0, 0.0, 2.0, 2.0).expect("hitbox");
        let area = areas
            .build(id, hitbox, &context)
            .expect("registered")
            .expect("builds");
        let mut room = Room::new("test", 6, 6, Position::new(1.0, 1.0)).expect("room");
        room.add_area(area);
        room
    }

    #[test]
    fn sign_reads_on_confirm_only() {
        let mut room = room_with(SIGN_ID, json!({"text": "Beware of slimes."}));
        assert!(room.step(&[Keybind::EAST]).is_empty());
        assert_eq!(
            room.step(&[Keybind::ENTER]),
            vec![RoomEvent::ShowDialogue {
                name: "Sign".to_string(),
                text: "Beware of slimes.".to_string(),
            }]
        );
    }

    #[test]
    fn notice_toasts_on_each_entry() {
        let mut room = room_with(NOTICE_ID, json!({"text": "A chill wind blows.", "steps": 10}));
        let toast = RoomEvent::Toast {
            text: "A chill wind blows.".to_string(),
            steps: 10,
        };
        assert_eq!(room.step(&[]), vec![toast.clone()]);
        assert!(room.step(&[]).is_empty());

        let player = room.player_handle();
        room.entity_mut(player)
            .expect("player")
            .set_position(Position::new(5.0, 5.0));
        assert!(room.step(&[]).is_empty());
        room.entity_mut(player)
            .expect("player")
            .set_position(Position::new(1.0, 1.0));
        assert_eq!(room.step(&[]), vec![toast]);
    }
}
