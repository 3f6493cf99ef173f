use tracing::{debug, error, info, warn};

use crate::content::{ContentError, Level};
use crate::gui::{GuiComponent, GuiLevelIntro, GuiLookAndFeel, WorldGui};
use crate::keybind::Keybind;
use crate::render::{Color, PixelAndTextGrid};
use crate::world::{Accelerable, Direction, Mortal, Room, RoomEvent};

use super::scene::{Scene, SceneCommand};
use super::STEPS_PER_SECOND;

/// Acceleration applied to the player per fired movement keybind.
pub const PLAYER_MOVE_ACCELERATION: f64 = 0.25;
/// Steps the death toast stays up before the death command is issued.
pub const DEATH_DELAY_STEPS: u32 = STEPS_PER_SECOND * 2;

pub type LevelFactory = Box<dyn Fn() -> Result<Level, ContentError> + Send>;
pub type LaterTask = Box<dyn FnOnce(&mut WorldScene) + Send>;

const MOVEMENT: [(Keybind, Direction); 4] = [
    (Keybind::NORTH, Direction::North),
    (Keybind::SOUTH, Direction::South),
    (Keybind::WEST, Direction::West),
    (Keybind::EAST, Direction::East),
];

struct Scheduled {
    steps_left: u32,
    task: LaterTask,
}

struct LoadedWorld {
    level: Level,
    current_room: String,
    gui: WorldGui,
    intro: Option<GuiLevelIntro>,
}

/// Plays one level: the intro card, then the current room with the world GUI on top.
///
/// The level is rebuilt from its factory on every `load`, so a hard reset restarts it.
pub struct WorldScene {
    factory: LevelFactory,
    look: GuiLookAndFeel,
    on_player_death: SceneCommand,
    play_intro: bool,
    world: Option<LoadedWorld>,
    load_failed: bool,
    scheduled: Vec<Scheduled>,
    requested: Option<SceneCommand>,
}

impl WorldScene {
    pub fn new(factory: LevelFactory, look: GuiLookAndFeel, on_player_death: SceneCommand) -> Self {
        Self {
            factory,
            look,
            on_player_death,
            play_intro: true,
            world: None,
            load_failed: false,
            scheduled: Vec::new(),
            requested: None,
        }
    }

    pub fn without_intro(mut self) -> Self {
        self.play_intro = false;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.world.is_some()
    }

    pub fn in_intro(&self) -> bool {
        self.world.as_ref().is_some_and(|world| world.intro.is_some())
    }

    pub fn level(&self) -> Option<&Level> {
        self.world.as_ref().map(|world| &world.level)
    }

    pub fn current_room_id(&self) -> Option<&str> {
        self.world.as_ref().map(|world| world.current_room.as_str())
    }

    pub fn current_room(&self) -> Option<&Room> {
        let world = self.world.as_ref()?;
        world.level.room(&world.current_room)
    }

    pub fn current_room_mut(&mut self) -> Option<&mut Room> {
        let world = self.world.as_mut()?;
        world.level.room_mut(&world.current_room)
    }

    pub fn gui(&self) -> Option<&WorldGui> {
        self.world.as_ref().map(|world| &world.gui)
    }

    pub fn gui_mut(&mut self) -> Option<&mut WorldGui> {
        self.world.as_mut().map(|world| &mut world.gui)
    }

    /// Runs `task` at the start of the step `delay_steps` steps from now. A delay of zero
    /// is treated as one.
    pub fn run_later(&mut self, delay_steps: u32, task: LaterTask) {
        self.scheduled.push(Scheduled {
            steps_left: delay_steps.max(1),
            task,
        });
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduled.len()
    }

    /// Makes the next `update` return `command`.
    pub fn request(&mut self, command: SceneCommand) {
        self.requested = Some(command);
    }

    /// Switches rooms immediately. Returns false, leaving the room unchanged, if the level
    /// has no such room.
    pub fn change_room(&mut self, room_id: &str) -> bool {
        let Some(world) = self.world.as_mut() else {
            return false;
        };
        if world.level.room(room_id).is_none() {
            warn!(level = %world.level.id, room = room_id, "change_room_unknown_target");
            return false;
        }
        info!(from = %world.current_room, to = room_id, "room_changed");
        world.current_room = room_id.to_string();
        true
    }

    fn run_due_tasks(&mut self) {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.scheduled.len() {
            let entry = &mut self.scheduled[index];
            entry.steps_left -= 1;
            if entry.steps_left == 0 {
                due.push(self.scheduled.remove(index).task);
            } else {
                index += 1;
            }
        }
        // Tasks may schedule more work; that lands in `self.scheduled` for later steps.
        for task in due {
            task(self);
        }
    }

    fn step_world(&mut self, fired: &[Keybind]) -> Vec<RoomEvent> {
        let Some(world) = self.world.as_mut() else {
            return Vec::new();
        };

        if let Some(intro) = &mut world.intro {
            intro.advance();
            if intro.is_finished() {
                world.intro = None;
                debug!(level = %world.level.id, "level_intro_finished");
            }
        }
        let in_world = world.intro.is_none();

        let room_keys: &[Keybind] = if world.gui.has_focus() {
            for key in fired {
                if let Err(error) = world.gui.handle_input(key) {
                    warn!(key = key.id(), error = %error, "world_gui_input_failed");
                }
            }
            &[]
        } else if in_world {
            fired
        } else {
            &[]
        };

        let Some(room) = world.level.room_mut(&world.current_room) else {
            return Vec::new();
        };
        if in_world {
            let player = room.player_mut().mob_mut();
            for (keybind, direction) in &MOVEMENT {
                if room_keys.contains(keybind) {
                    player.accelerate(*direction, PLAYER_MOVE_ACCELERATION);
                }
            }
        }
        let events = room.step(room_keys);

        let player = room.player().mob();
        let fraction = if player.max_health() > 0.0 {
            player.health() / player.max_health()
        } else {
            0.0
        };
        world.gui.tick();
        world.gui.set_health(fraction);
        events
    }

    fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::ChangeRoom { room_id } => {
                self.run_later(
                    1,
                    Box::new(move |scene: &mut WorldScene| {
                        scene.change_room(&room_id);
                    }),
                );
            }
            RoomEvent::ShowDialogue { name, text } => {
                if let Some(gui) = self.gui_mut() {
                    if let Err(error) = gui.show_dialogue(&name, &text) {
                        warn!(error = %error, "world_gui_dialogue_failed");
                    }
                }
            }
            RoomEvent::Toast { text, steps } => {
                if let Some(gui) = self.gui_mut() {
                    if let Err(error) = gui.toast(&text, steps) {
                        warn!(error = %error, "world_gui_toast_failed");
                    }
                }
            }
            RoomEvent::PlayerDied => {
                info!(room = self.current_room_id().unwrap_or_default(), "player_died");
                if let Some(gui) = self.gui_mut() {
                    if let Err(error) = gui.toast("You died!", DEATH_DELAY_STEPS) {
                        warn!(error = %error, "world_gui_toast_failed");
                    }
                }
                let command = self.on_player_death;
                self.run_later(
                    DEATH_DELAY_STEPS,
                    Box::new(move |scene: &mut WorldScene| scene.request(command)),
                );
            }
            RoomEvent::Custom(name) => {
                debug!(event = %name, "room_custom_event");
            }
        }
    }
}

impl Scene for WorldScene {
    fn load(&mut self) {
        self.scheduled.clear();
        self.requested = None;
        let level = match (self.factory)() {
            Ok(level) => level,
            Err(error) => {
                error!(error = %error, "level_load_failed");
                self.load_failed = true;
                return;
            }
        };
        let gui = match WorldGui::new(self.look) {
            Ok(gui) => gui,
            Err(error) => {
                error!(error = %error, "world_gui_build_failed");
                self.load_failed = true;
                return;
            }
        };
        let intro = self.play_intro.then(|| {
            GuiLevelIntro::new(
                &level.title,
                &level.world,
                &level.level,
                level.intro_background,
                level.intro_foreground,
            )
        });
        info!(level = %level.id, room = level.initial_room(), "world_loaded");
        self.load_failed = false;
        self.world = Some(LoadedWorld {
            current_room: level.initial_room().to_string(),
            level,
            gui,
            intro,
        });
    }

    fn update(&mut self, fired: &[Keybind]) -> SceneCommand {
        if self.load_failed {
            return SceneCommand::Quit;
        }
        self.run_due_tasks();
        for event in self.step_world(fired) {
            self.handle_event(event);
        }
        self.requested.take().unwrap_or(SceneCommand::None)
    }

    fn render(&mut self, target: &mut PixelAndTextGrid) {
        let Some(world) = self.world.as_mut() else {
            target.fill(Color::BLACK);
            return;
        };
        match world.level.room(&world.current_room) {
            Some(room) => room.render(target),
            None => target.fill(Color::BLACK),
        }
        world.gui.render(target);
        if let Some(intro) = &mut world.intro {
            intro.render(target);
        }
    }

    fn unload(&mut self) {
        self.world = None;
        self.scheduled.clear();
        self.requested = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::app::scene::SceneKey;
    use crate::content::{build_level, LevelSpec, Registries};
    use crate::world::{
        Area, CallbackResult, Entity, EntityInfo, Hitbox, Hitboxed, Interactable, RoomContext,
    };

    const TITLE: SceneKey = SceneKey("title");

    /// Emits a fixed event whenever the player stands in it.
    struct Trigger {
        hitbox: Hitbox,
        event: RoomEvent,
    }

    impl Interactable for Trigger {
        fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
            if entity.is_player {
                ctx.emit(self.event.clone());
            }
            Ok(())
        }
    }

    impl Hitboxed for Trigger {
        fn hitbox(&self) -> Hitbox {
            self.hitbox
        }
    }

    impl Area for Trigger {
        fn id(&self) -> &str {
            "test.trigger"
        }
    }

    /// Deals lethal damage to the player on contact.
    struct Spikes {
        hitbox: Hitbox,
    }

    impl Interactable for Spikes {
        fn on_entity_step(&mut self, ctx: &mut RoomContext<'_>, entity: &EntityInfo) -> CallbackResult {
            if entity.is_player {
                ctx.damage(entity.handle, 1000.0);
            }
            Ok(())
        }
    }

    impl Hitboxed for Spikes {
        fn hitbox(&self) -> Hitbox {
            self.hitbox
        }
    }

    impl Area for Spikes {
        fn id(&self) -> &str {
            "test.spikes"
        }
    }

    fn registries() -> Registries {
        let mut registries = Registries::new();
        registries.areas.register("test.exit", |hitbox, _| {
            Ok(Box::new(Trigger {
                hitbox,
                event: RoomEvent::ChangeRoom {
                    room_id: "next".to_string(),
                },
            }) as Box<dyn Area>)
        });
        registries.areas.register("test.sign", |hitbox, _| {
            Ok(Box::new(Trigger {
                hitbox,
                event: RoomEvent::ShowDialogue {
                    name: "Sign".to_string(),
                    text: "Hi".to_string(),
                },
            }) as Box<dyn Area>)
        });
        registries
            .areas
            .register("test.spikes", |hitbox, _| Ok(Box::new(Spikes { hitbox }) as Box<dyn Area>));
        registries
    }

    fn level_json(area: &str) -> String {
        format!(
            r#"{{
                "versionId": 1,
                "levelId": "test.level",
                "world": "1",
                "level": "1",
                "title": "Test",
                "initialRoom": "start",
                "rooms": [
                    {{
                        "roomId": "start",
                        "width": 6,
                        "height": 3,
                        "initialX": 1.5,
                        "initialY": 1.5,
                        "floorTiles": [[null, null, null, null, null, null], [null, null, null, null, null, null], [null, null, null, null, null, null]],
                        "wallTiles": [[null, null, null, null, null, null], [null, null, null, null, null, null], [null, null, null, null, null, null]],
                        "areas": [{{"areaId": "{area}", "hitbox": {{"x": 0, "y": 0, "w": 3, "h": 3}}}}]
                    }},
                    {{
                        "roomId": "next",
                        "width": 1,
                        "height": 1,
                        "floorTiles": [[null]],
                        "wallTiles": [[null]]
                    }}
                ]
            }}"#
        )
    }

    fn factory(area: &'static str) -> LevelFactory {
        Box::new(move || {
            let spec: LevelSpec =
                serde_json::from_str(&level_json(area)).expect("level spec parses");
            build_level(Path::new("test.blvl"), spec, &registries())
        })
    }

    fn loaded(area: &'static str) -> WorldScene {
        let mut scene = WorldScene::new(
            factory(area),
            GuiLookAndFeel::default(),
            SceneCommand::HardResetTo(TITLE),
        )
        .without_intro();
        scene.load();
        scene
    }

    #[test]
    fn run_later_fires_after_the_requested_steps() {
        let mut scene = loaded("test.none");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        scene.run_later(
            2,
            Box::new(move |_: &mut WorldScene| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        scene.update(&[]);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        scene.update(&[]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scene.pending_tasks(), 0);
    }

    #[test]
    fn tasks_can_schedule_more_tasks() {
        let mut scene = loaded("test.none");
        let order = Arc::new(Mutex::new(Vec::new()));
        let outer = Arc::clone(&order);
        scene.run_later(
            1,
            Box::new(move |scene: &mut WorldScene| {
                outer.lock().expect("order").push("outer");
                let inner = Arc::clone(&outer);
                scene.run_later(
                    1,
                    Box::new(move |_: &mut WorldScene| inner.lock().expect("order").push("inner")),
                );
            }),
        );

        scene.update(&[]);
        assert_eq!(*order.lock().expect("order"), vec!["outer"]);
        scene.update(&[]);
        assert_eq!(*order.lock().expect("order"), vec!["outer", "inner"]);
    }

    #[test]
    fn movement_keys_push_the_player() {
        let mut scene = loaded("test.none");
        let start = scene.current_room().expect("room").player().position();
        scene.update(&[Keybind::EAST]);
        let room = scene.current_room().expect("room");
        assert!(room.player().position().x > start.x);
        assert_eq!(room.player().mob().direction(), Direction::East);
    }

    #[test]
    fn change_room_is_deferred_by_one_step() {
        let mut scene = loaded("test.exit");
        scene.update(&[]);
        assert_eq!(scene.current_room_id(), Some("start"));
        scene.update(&[]);
        assert_eq!(scene.current_room_id(), Some("next"));
        assert!(!scene.change_room("nowhere"));
        assert_eq!(scene.current_room_id(), Some("next"));
    }

    #[test]
    fn open_dialogue_takes_the_keys() {
        let mut scene = loaded("test.sign");
        scene.update(&[]);
        assert!(scene.gui().expect("gui").has_focus());

        let before = scene.current_room().expect("room").player().position();
        scene.update(&[Keybind::EAST]);
        assert_eq!(scene.current_room().expect("room").player().position(), before);

        scene.update(&[Keybind::USE]);
        scene.update(&[Keybind::USE]);
        // The sign re-opens while the player still stands in it.
        assert_eq!(scene.gui().expect("gui").dialogue_text(), Some("Hi"));
    }

    #[test]
    fn player_death_issues_the_death_command() {
        let mut scene = loaded("test.spikes");
        assert_eq!(scene.update(&[]), SceneCommand::None);
        assert_eq!(scene.gui().expect("gui").toast_text(), Some("You died!"));
        assert_eq!(scene.gui().expect("gui").health(), Some(0.0));

        let mut command = SceneCommand::None;
        for _ in 0..DEATH_DELAY_STEPS {
            command = scene.update(&[]);
            if command != SceneCommand::None {
                break;
            }
        }
        assert_eq!(command, SceneCommand::HardResetTo(TITLE));
    }

    #[test]
    fn intro_holds_the_player_then_finishes() {
        let mut scene = WorldScene::new(
            factory("test.none"),
            GuiLookAndFeel::default(),
            SceneCommand::Quit,
        );
        scene.load();
        assert!(scene.in_intro());
        let start = scene.current_room().expect("room").player().position();
        scene.update(&[Keybind::EAST]);
        assert_eq!(scene.current_room().expect("room").player().position(), start);

        for _ in 0..crate::gui::LEVEL_INTRO_STEPS {
            scene.update(&[]);
        }
        assert!(!scene.in_intro());
        let mut target = PixelAndTextGrid::new(32, 32);
        scene.render(&mut target);
    }

    #[test]
    fn failed_load_quits() {
        let mut scene = WorldScene::new(
            Box::new(|| Err(ContentError::NoRooms { path: "x.blvl".into() })),
            GuiLookAndFeel::default(),
            SceneCommand::Quit,
        );
        scene.load();
        assert!(!scene.is_loaded());
        assert_eq!(scene.update(&[]), SceneCommand::Quit);
    }
}
