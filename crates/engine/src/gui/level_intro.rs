use crate::render::{overlay, Color, PixelAndTextGrid, TextCell, RESET_CHAR};

use super::{GuiComponent, GuiConstraints, GuiPanel, GuiText};

/// Steps the intro card takes to slide off screen.
pub const LEVEL_INTRO_STEPS: u32 = 30;

/// Full-screen title card ("World 1 | Level 2") that slides out to the right as it
/// advances.
pub struct GuiLevelIntro {
    panel: GuiPanel,
    background: Color,
    timer: u32,
}

impl GuiLevelIntro {
    pub fn new(title: &str, world: &str, level: &str, background: Color, foreground: Color) -> Self {
        let mut panel = GuiPanel::new(background, Color::TRANSPARENT, 0);
        let number = format!("World {world} | Level {level}");
        panel.children_mut().add(
            GuiText::colored(title, Color::TRANSPARENT, foreground),
            GuiConstraints::centered_text(title, 1, 0, -3, 1),
        );
        panel.children_mut().add(
            GuiText::colored(number.as_str(), Color::TRANSPARENT, foreground),
            GuiConstraints::centered_text(&number, 1, 0, 3, 1),
        );
        Self {
            panel,
            background,
            timer: 0,
        }
    }

    pub fn advance(&mut self) {
        if self.timer < LEVEL_INTRO_STEPS {
            self.timer += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.timer >= LEVEL_INTRO_STEPS
    }

    /// Eased slide-out progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let t = f64::from(self.timer) / f64::from(LEVEL_INTRO_STEPS);
        t * t * t
    }
}

impl GuiComponent for GuiLevelIntro {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        let mut card = PixelAndTextGrid::new(target.width(), target.height());
        self.panel.render(&mut card);

        // Blank text cells so text underneath the card does not show through.
        let blank = TextCell::new(' ', self.background, self.background);
        for row in 0..card.text_rows() as i32 {
            for x in 0..card.width() as i32 {
                if card.text_cell(x, row).is_some_and(|cell| cell.ch == RESET_CHAR) {
                    card.set_text_cell(x, row, blank);
                }
            }
        }

        let shift = (f64::from(target.width()) * self.progress()).round() as i32;
        overlay(&card, target, shift, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_covers_then_slides_away() {
        let mut intro = GuiLevelIntro::new("Caves", "1", "2", Color::BLUE, Color::WHITE);
        let mut target = PixelAndTextGrid::new(40, 20);
        target.fill(Color::RED);
        intro.render(&mut target);
        assert_eq!(target.pixel(0, 0), Some(Color::BLUE));
        assert_eq!(target.pixel(39, 19), Some(Color::BLUE));

        for _ in 0..LEVEL_INTRO_STEPS + 5 {
            intro.advance();
        }
        assert!(intro.is_finished());
        assert_eq!(intro.progress(), 1.0);

        let mut target = PixelAndTextGrid::new(40, 20);
        target.fill(Color::RED);
        intro.render(&mut target);
        assert_eq!(target.pixel(0, 0), Some(Color::RED));
    }

    #[test]
    fn title_is_centred() {
        let mut intro = GuiLevelIntro::new("Caves", "1", "2", Color::BLACK, Color::WHITE);
        let mut target = PixelAndTextGrid::new(40, 20);
        intro.render(&mut target);
        // x = 20 - 5/2, pixel y = 10 - 3 - 1
        let cell = target.cell(18, 6).expect("in bounds");
        assert_eq!(cell.ch, 'C');
        assert_eq!(cell.fg, Color::WHITE);
    }
}
