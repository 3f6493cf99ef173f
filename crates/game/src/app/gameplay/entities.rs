use engine::content::{EntityRegistry, TextureCache};
use engine::keybind::Keybind;
use engine::render::Texture;
use engine::world::{
    Accelerable, CallbackResult, Direction, Entity, EntityInfo, Hitbox, Interactable, MobState,
    Mortal, Position, Renderable, RoomContext, RoomEvent,
};
use serde::Deserialize;

use super::context_as;

pub(crate) const SLIME_ID: &str = "boss.slime";
pub(crate) const NPC_ID: &str = "boss.npc";

const SLIME_HITBOX: Hitbox = Hitbox::new_unchecked(-0.375, -0.375, 0.75, 0.75);
const SLIME_FRICTION: f64 = 0.5;
const SLIME_HEALTH: f64 = 20.0;
const SLIME_HOP: f64 = 0.15;
const SLIME_HOP_INTERVAL: u32 = 20;
const SLIME_BITE_DAMAGE: f64 = 10.0;
const SLIME_BITE_COOLDOWN: u32 = 15;
const NPC_HITBOX: Hitbox = Hitbox::new_unchecked(-0.5, -0.5, 1.0, 1.0);

pub(super) fn register(entities: &mut EntityRegistry, textures: &mut TextureCache) {
    let slime = textures.get("entities/slime");
    entities.register(SLIME_ID, move |position, context| {
        let config: SlimeConfig = context_as(context)?;
        Ok(Box::new(Slime::new(slime.clone(), position, config.seed)) as Box<dyn Entity>)
    });

    let npc = textures.get("entities/npc");
    entities.register(NPC_ID, move |position, context| {
        let config: NpcConfig = context_as(context)?;
        Ok(Box::new(Npc {
            texture: npc.clone(),
            position,
            name: config.name,
            lines: config.lines,
            next_line: 0,
        }) as Box<dyn Entity>)
    });
}

#[derive(Debug, Deserialize)]
struct SlimeConfig {
    #[serde(default = "default_seed")]
    seed: u32,
}

fn default_seed() -> u32 {
    0x5eed
}

#[derive(Debug, Deserialize)]
struct NpcConfig {
    name: String,
    lines: Vec<String>,
}

/// Hops about at random and bites the player on contact.
struct Slime {
    mob: MobState,
    rng: u32,
    hop_timer: u32,
    bite_cooldown: u32,
}

impl Slime {
    fn new(texture: Texture, position: Position, seed: u32) -> Self {
        Self {
            mob: MobState::new(texture, position, SLIME_HITBOX, SLIME_FRICTION, SLIME_HEALTH),
            rng: seed.max(1),
            hop_timer: 0,
            bite_cooldown: 0,
        }
    }

    /// xorshift32; deterministic per seed.
    fn next_direction(&mut self) -> Direction {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        Direction::ALL[(x % 4) as usize]
    }
}

impl Interactable for Slime {
    fn on_step(&mut self, _ctx: &mut RoomContext<'_>) -> CallbackResult {
        self.bite_cooldown = self.bite_cooldown.saturating_sub(1);
        if self.hop_timer == 0 {
            let direction = self.next_direction();
            self.mob.accelerate(direction, SLIME_HOP);
            self.hop_timer = SLIME_HOP_INTERVAL;
        } else {
            self.hop_timer -= 1;
        }
        Ok(())
    }

    fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
        if entity.is_player && self.bite_cooldown == 0 {
            ctx.damage(entity.handle, SLIME_BITE_DAMAGE);
            self.bite_cooldown = SLIME_BITE_COOLDOWN;
        }
        Ok(())
    }
}

impl Renderable for Slime {
    fn texture(&self) -> Texture {
        self.mob.texture.clone()
    }
}

impl Entity for Slime {
    fn id(&self) -> &str {
        SLIME_ID
    }

    fn position(&self) -> Position {
        self.mob.position
    }

    fn set_position(&mut self, position: Position) {
        self.mob.position = position;
    }

    fn relative_hitbox(&self) -> Hitbox {
        self.mob.relative_hitbox
    }

    fn as_accelerable(&self) -> Option<&dyn Accelerable> {
        Some(&self.mob)
    }

    fn as_accelerable_mut(&mut self) -> Option<&mut dyn Accelerable> {
        Some(&mut self.mob)
    }

    fn as_mortal(&self) -> Option<&dyn Mortal> {
        Some(&self.mob)
    }

    fn as_mortal_mut(&mut self) -> Option<&mut dyn Mortal> {
        Some(&mut self.mob)
    }
}

/// Stands still and talks when the player uses it, cycling through its lines.
struct Npc {
    texture: Texture,
    position: Position,
    name: String,
    lines: Vec<String>,
    next_line: usize,
}

impl Interactable for Npc {
    fn on_player_interact(&mut self, ctx: &mut RoomContext<'_>, key: &Keybind) -> CallbackResult {
        if !key.is_confirm() {
            return Ok(());
        }
        let Some(line) = self.lines.get(self.next_line) else {
            return Ok(());
        };
        ctx.emit(RoomEvent::ShowDialogue {
            name: self.name.clone(),
            text: line.clone(),
        });
        self.next_line = (self.next_line + 1) % self.lines.len();
        Ok(())
    }
}

impl Renderable for Npc {
    fn texture(&self) -> Texture {
        self.texture.clone()
    }
}

impl Entity for Npc {
    fn id(&self) -> &str {
        NPC_ID
    }

    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn relative_hitbox(&self) -> Hitbox {
        NPC_HITBOX
    }
}
