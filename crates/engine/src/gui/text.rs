use crate::render::{Color, PixelAndTextGrid, TextCell};

use super::GuiComponent;

/// Text drawn into the character layer, one row per two pixel rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiText {
    text: String,
    background: Color,
    foreground: Color,
    word_wrap: bool,
}

impl GuiText {
    /// Black text on a transparent background, word-wrapped.
    pub fn new(text: impl Into<String>) -> Self {
        Self::colored(text, Color::TRANSPARENT, Color::BLACK)
    }

    pub fn colored(text: impl Into<String>, background: Color, foreground: Color) -> Self {
        Self {
            text: text.into(),
            background,
            foreground,
            word_wrap: true,
        }
    }

    pub fn with_word_wrap(mut self, word_wrap: bool) -> Self {
        self.word_wrap = word_wrap;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn set_colors(&mut self, background: Color, foreground: Color) {
        self.background = background;
        self.foreground = foreground;
    }

    pub fn lines(&self, width: usize) -> Vec<String> {
        if self.word_wrap {
            wrap_text(&self.text, width)
        } else {
            hard_wrap(&self.text, width)
        }
    }
}

impl GuiComponent for GuiText {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        let rows = target.text_rows() as usize;
        for (row, line) in self.lines(target.width() as usize).iter().take(rows).enumerate() {
            for (x, ch) in line.chars().enumerate() {
                target.set_text_cell(
                    x as i32,
                    row as i32,
                    TextCell::new(ch, self.foreground, self.background),
                );
            }
        }
    }
}

/// Greedy word wrap to `width` columns. Explicit newlines start a new line; words wider
/// than a line are split with a trailing hyphen.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            let line_len = line.chars().count();
            if word_len > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let mut chars: Vec<char> = word.chars().collect();
                while chars.len() > width {
                    let take = if width > 1 { width - 1 } else { 1 };
                    let mut piece: String = chars.drain(..take).collect();
                    if width > 1 {
                        piece.push('-');
                    }
                    lines.push(piece);
                }
                line = chars.into_iter().collect();
            } else if line.is_empty() {
                line.push_str(word);
            } else if line_len + 1 + word_len <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    lines
}

fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    text.split('\n')
        .flat_map(|paragraph| {
            let chars: Vec<char> = paragraph.chars().collect();
            if chars.is_empty() {
                vec![String::new()]
            } else {
                chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text("a\nb c", 10), vec!["a", "b c"]);
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        assert_eq!(wrap_text("abcdefgh xy", 4), vec!["abc-", "def-", "gh", "xy"]);
    }

    #[test]
    fn renders_rows_into_text_layer_and_truncates() {
        let mut text = GuiText::colored("one two three", Color::BLACK, Color::WHITE);
        let mut target = PixelAndTextGrid::new(5, 4);
        text.render(&mut target);

        assert_eq!(target.text_cell(0, 0).map(|cell| cell.ch), Some('o'));
        assert_eq!(target.text_cell(0, 1).map(|cell| cell.ch), Some('t'));
        assert_eq!(target.text_cell(2, 1).map(|cell| cell.ch), Some('o'));
        assert_eq!(target.text_cell(0, 1).map(|cell| cell.fg), Some(Color::WHITE));
        assert_eq!(target.text_rows(), 2);
    }

    #[test]
    fn hard_wrap_ignores_words() {
        let text = GuiText::new("abcdef").with_word_wrap(false);
        assert_eq!(text.lines(4), vec!["abcd", "ef"]);
    }
}
