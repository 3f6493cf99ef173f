use engine::gui::{
    ComponentId, DialogOption, Factors, GuiComponent, GuiConstraints, GuiError, GuiImage,
    GuiListDialog, GuiLookAndFeel, GuiParent, GuiText, Offsets,
};
use engine::{Color, Keybind, PixelAndTextGrid, Scene, SceneCommand, Texture, TILE_HEIGHT, TILE_WIDTH};
use tracing::{debug, info};

use crate::app::WORLD;

const GAME_TITLE: &str = "Bosstrove's Revenge";
const START_OPTION: &str = "start";
const QUIT_OPTION: &str = "quit";
const BACKGROUND: Color = Color::rgb(20, 12, 28);
const TITLE_COLOR: Color = Color::YELLOW;
const MENU_WIDTH: i32 = 24;
const MENU_HEIGHT: i32 = 12;
const CENTERED: Factors = Factors {
    x: 0.5,
    y: 0.5,
    width: 0.0,
    height: 0.0,
};

/// Start/quit menu shown before the world.
pub(crate) struct TitleScene {
    root: GuiParent,
    menu: ComponentId,
}

impl TitleScene {
    /// `emblem` is drawn above the title, one tile large.
    pub(crate) fn new(emblem: Texture) -> Result<Self, GuiError> {
        let look = GuiLookAndFeel {
            panel_background: Color::DARK_GRAY,
            panel_border: Color::GRAY,
            ..GuiLookAndFeel::default()
        };
        let dialog = GuiListDialog::new(
            vec![
                DialogOption::new("Start", START_OPTION),
                DialogOption::new("Quit", QUIT_OPTION),
            ],
            look,
        );

        let mut root = GuiParent::new();
        root.add(
            GuiText::colored(GAME_TITLE, Color::TRANSPARENT, TITLE_COLOR),
            GuiConstraints::centered_text(GAME_TITLE, 1, 0, -12, 1),
        );
        let (tile_w, tile_h) = (TILE_WIDTH as i32, TILE_HEIGHT as i32);
        let emblem_constraints = GuiConstraints::new(
            CENTERED,
            Offsets {
                x: -tile_w / 2,
                y: -26,
                width: tile_w,
                height: tile_h,
            },
            1,
        )?;
        root.add(GuiImage::new(emblem), emblem_constraints);
        let menu_constraints = GuiConstraints::new(
            CENTERED,
            Offsets {
                x: -MENU_WIDTH / 2,
                y: 0,
                width: MENU_WIDTH,
                height: MENU_HEIGHT,
            },
            1,
        )?;
        let menu = root.add(dialog, menu_constraints);
        root.set_focus(Some(menu))?;
        Ok(Self { root, menu })
    }

    fn chosen(&mut self) -> Option<String> {
        let dialog = self.root.child_mut::<GuiListDialog>(self.menu)?;
        let index = dialog.take_choice()?;
        dialog.options().get(index).map(|option| option.value.clone())
    }
}

impl Scene for TitleScene {
    fn load(&mut self) {
        if let Some(dialog) = self.root.child_mut::<GuiListDialog>(self.menu) {
            dialog.set_selected(0);
        }
        info!("title_loaded");
    }

    fn update(&mut self, fired: &[Keybind]) -> SceneCommand {
        for key in fired {
            self.root.on_input(key);
            let Some(choice) = self.chosen() else {
                continue;
            };
            debug!(choice = %choice, "title_choice");
            match choice.as_str() {
                START_OPTION => return SceneCommand::HardResetTo(WORLD),
                QUIT_OPTION => return SceneCommand::Quit,
                _ => {}
            }
        }
        SceneCommand::None
    }

    fn render(&mut self, target: &mut PixelAndTextGrid) {
        target.fill(BACKGROUND);
        self.root.render(target);
    }
}
