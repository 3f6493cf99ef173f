use engine::content::{Registries, TextureCache};
use engine::keybind::Keybind;
use engine::render::Texture;
use engine::world::{
    CallbackResult, Direction, EmptyTile, EntityInfo, Interactable, Neighbours, Position,
    RoomContext, RoomEvent, Tile, TileLayer, TilePosition,
};
use serde::Deserialize;
use tracing::debug;

use super::context_as;

pub(crate) const DOOR_ID: &str = "boss.door";
pub(crate) const LEVER_ID: &str = "boss.lever";
pub(crate) const GATE_ID: &str = "boss.gate";
pub(crate) const SPIKES_ID: &str = "boss.spikes";

const SPIKE_DAMAGE_PER_STEP: f64 = 2.0;
const GATE_TOAST_STEPS: u32 = 30;
const LEVER_TOAST_STEPS: u32 = 45;

pub(super) fn register(registries: &mut Registries, textures: &mut TextureCache) {
    let door = textures.get("tiles/door");
    registries.floor_tiles.register(DOOR_ID, move |_, context| {
        let config: DoorConfig = context_as(context)?;
        Ok(Box::new(DoorTile {
            texture: door.clone(),
            target: config.target,
            exit: Position::new(config.exit_x, config.exit_y),
        }) as Box<dyn Tile>)
    });

    let lever_off = textures.get("tiles/lever_off");
    let lever_on = textures.get("tiles/lever_on");
    registries.floor_tiles.register(LEVER_ID, move |_, context| {
        let config: LeverConfig = context_as(context)?;
        Ok(Box::new(LeverTile {
            off: lever_off.clone(),
            on: lever_on.clone(),
            gate: TilePosition::new(config.gate_x, config.gate_y),
            pulled: false,
        }) as Box<dyn Tile>)
    });

    let gate = textures.get("tiles/gate");
    registries.wall_tiles.register(GATE_ID, move |_, _| {
        Ok(Box::new(GateTile {
            texture: gate.clone(),
        }) as Box<dyn Tile>)
    });

    let spikes = textures.get("tiles/spikes");
    registries.floor_tiles.register(SPIKES_ID, move |_, _| {
        Ok(Box::new(SpikesTile {
            texture: spikes.clone(),
        }) as Box<dyn Tile>)
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoorConfig {
    target: String,
    /// Where the player is left in this room, so coming back does not re-trigger.
    exit_x: f64,
    exit_y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverConfig {
    gate_x: i64,
    gate_y: i64,
}

/// Sends the player to another room of the level.
struct DoorTile {
    texture: Texture,
    target: String,
    exit: Position,
}

impl Interactable for DoorTile {
    fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
        if !entity.is_player {
            return Ok(());
        }
        ctx.teleport(entity.handle, self.exit);
        ctx.emit(RoomEvent::ChangeRoom {
            room_id: self.target.clone(),
        });
        Ok(())
    }
}

impl Tile for DoorTile {
    fn id(&self) -> &str {
        DOOR_ID
    }

    fn texture(&self, _neighbours: Neighbours) -> Texture {
        self.texture.clone()
    }
}

/// Opens its gate, once, when the player uses it.
struct LeverTile {
    off: Texture,
    on: Texture,
    gate: TilePosition,
    pulled: bool,
}

impl Interactable for LeverTile {
    fn on_player_interact(&mut self, ctx: &mut RoomContext<'_>, key: &Keybind) -> CallbackResult {
        if self.pulled || *key != Keybind::USE {
            return Ok(());
        }
        self.pulled = true;
        debug!(gate = %self.gate, "lever_pulled");
        ctx.set_tile(TileLayer::Wall, self.gate, Box::new(EmptyTile));
        ctx.emit(RoomEvent::Toast {
            text: "Something rumbled in the distance.".to_string(),
            steps: LEVER_TOAST_STEPS,
        });
        Ok(())
    }
}

impl Tile for LeverTile {
    fn id(&self) -> &str {
        LEVER_ID
    }

    fn texture(&self, _neighbours: Neighbours) -> Texture {
        if self.pulled {
            self.on.clone()
        } else {
            self.off.clone()
        }
    }
}

struct GateTile {
    texture: Texture,
}

impl Interactable for GateTile {
    fn on_entity_hit(
        &mut self,
        ctx: &mut RoomContext<'_>,
        entity: &EntityInfo,
        _direction: Direction,
    ) -> CallbackResult {
        if entity.is_player {
            ctx.emit(RoomEvent::Toast {
                text: "The gate won't budge.".to_string(),
                steps: GATE_TOAST_STEPS,
            });
        }
        Ok(())
    }
}

impl Tile for GateTile {
    fn id(&self) -> &str {
        GATE_ID
    }

    fn texture(&self, _neighbours: Neighbours) -> Texture {
        self.texture.clone()
    }

    fn is_passable(&self) -> bool {
        false
    }
}

/// Hurts anything mortal standing on it, every step.
struct SpikesTile {
    texture: Texture,
}

impl Interactable for SpikesTile {
    fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
        if entity.health.is_some() {
            ctx.damage(entity.handle, SPIKE_DAMAGE_PER_STEP);
        }
        Ok(())
    }
}

impl Tile for SpikesTile {
    fn id(&self) -> &str {
        SPIKES_ID
    }

    fn texture(&self, _neighbours: Neighbours) -> Texture {
        self.texture.clone()
    }
}

#[cfg(test)]
mod tests {
    use engine::world::{Entity, Mortal, Room, MAX_PLAYER_HEALTH};
    use serde_json::{json, Value};

    use super::*;

    fn registries() -> Registries {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut textures = TextureCache::new(temp.path());
        let mut registries = Registries::new();
        register(&mut registries, &mut textures);
        registries
    }

    fn build(registries: &Registries, layer: TileLayer, id: &str, context: Value) -> Box<dyn Tile> {
        let Value::Object(context) = context else {
            panic!("context must be an object");
        };
        registries
            .tiles(layer)
            .build(id, TilePosition::new(0, 0), &context)
            .expect("registered")
            .expect("builds")
    }

    fn room() -> Room {
        Room::new("test", 4, 4, Position::new(0.5, 0.5)).expect("room")
    }

    #[test]
    fn door_moves_player_out_and_requests_room_change() {
        let registries = registries();
        let mut room = room();
        let door = build(
            &registries,
            TileLayer::Floor,
            DOOR_ID,
            json!({"target": "hall", "exitX": 2.5, "exitY": 2.5}),
        );
        room.set_tile(TileLayer::Floor, TilePosition::new(0, 0), Some(door))
            .expect("in bounds");

        let events = room.step(&[]);
        assert!(events.contains(&RoomEvent::ChangeRoom {
            room_id: "hall".to_string()
        }));
        assert_eq!(room.player().position(), Position::new(2.5, 2.5));
    }

    #[test]
    fn door_without_target_fails_to_build() {
        let registries = registries();
        let Value::Object(context) = json!({"exitX": 1.0, "exitY": 1.0}) else {
            unreachable!()
        };
        let result = registries
            .floor_tiles
            .build(DOOR_ID, TilePosition::new(0, 0), &context)
            .expect("registered");
        assert!(result.is_err());
    }

    #[test]
    fn lever_opens_gate_once() {
        let registries = registries();
        let mut room = room();
        let lever = build(
            &registries,
            TileLayer::Floor,
            LEVER_ID,
            json!({"gateX": 2, "gateY": 0}),
        );
        let gate = build(&registries, TileLayer::Wall, GATE_ID, json!({}));
        room.set_tile(TileLayer::Floor, TilePosition::new(0, 0), Some(lever))
            .expect("in bounds");
        room.set_tile(TileLayer::Wall, TilePosition::new(2, 0), Some(gate))
            .expect("in bounds");

        let events = room.step(&[Keybind::NORTH]);
        assert!(events.is_empty());
        assert_eq!(room.wall_tile(TilePosition::new(2, 0)).map(|tile| tile.id()), Some(GATE_ID));

        let events = room.step(&[Keybind::USE]);
        assert_eq!(events.len(), 1);
        assert!(room
            .wall_tile(TilePosition::new(2, 0))
            .is_some_and(|tile| tile.is_passable()));
        assert!(room.step(&[Keybind::USE]).is_empty());
    }

    #[test]
    fn spikes_wear_down_the_player() {
        let registries = registries();
        let mut room = room();
        let spikes = build(&registries, TileLayer::Floor, SPIKES_ID, json!({}));
        room.set_tile(TileLayer::Floor, TilePosition::new(0, 0), Some(spikes))
            .expect("in bounds");

        room.step(&[]);
        room.step(&[]);
        assert_eq!(
            room.player().mob().health(),
            MAX_PLAYER_HEALTH - 2.0 * SPIKE_DAMAGE_PER_STEP
        );
    }
}
