use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use crate::ui::theme::Theme;

const MASK_CHAR: char = '●';

/// Single-line text field with a cursor (SSID, password)
#[derive(Debug, Clone)]
pub struct TextInput {
    pub label: String,
    input: String,
    /// Cursor position in chars
    cursor: usize,
    pub masked: bool,
}

impl TextInput {
    pub fn new(label: &str, masked: bool) -> Self {
        Self {
            label: label.to_string(),
            input: String::new(),
            cursor: 0,
            masked,
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.input.insert(idx, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.input.remove(idx);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.char_count() {
            let idx = self.byte_index(self.cursor);
            self.input.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn value(&self) -> &str {
        &self.input
    }

    pub fn toggle_mask(&mut self) {
        self.masked = !self.masked;
    }

    /// Text as shown on screen
    pub fn display(&self) -> String {
        if self.masked {
            MASK_CHAR.to_string().repeat(self.char_count())
        } else {
            self.input.clone()
        }
    }

    /// The part of the shown text that fits in `width` columns with the
    /// cursor in view, and the cursor's column inside it. Scrolls only once
    /// the cursor would fall past the last column.
    pub fn window(&self, width: u16) -> (String, u16) {
        let width = usize::from(width);
        let shown: Vec<char> = self.display().chars().collect();
        let columns =
            |chars: &[char]| -> usize { chars.iter().map(|c| c.width().unwrap_or(0)).sum() };

        let mut start = 0;
        while start < self.cursor && columns(&shown[start..self.cursor]) >= width {
            start += 1;
        }

        let mut used = 0;
        let visible = shown[start..]
            .iter()
            .take_while(|c| {
                used += c.width().unwrap_or(0);
                used <= width
            })
            .collect();
        (visible, columns(&shown[start..self.cursor]) as u16)
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.label),
                if focused { theme.style_accent_bold() } else { theme.style_dim() },
            ))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(theme.style_border(focused));

        let inner = block.inner(area);
        let (visible, cursor) = self.window(inner.width);
        let text = Paragraph::new(Line::from(Span::styled(visible, theme.style_default())))
            .block(block);
        f.render_widget(text, area);

        if focused && inner.width > 0 {
            f.set_cursor_position((inner.x + cursor, inner.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::new("SSID", false);
        text.chars().for_each(|c| input.insert_char(c));
        input
    }

    #[test]
    fn edits_at_cursor() {
        let mut input = typed("UNS 5G");
        input.move_left();
        input.move_left();
        input.insert_char('W');
        assert_eq!(input.value(), "UNS W5G");

        input.move_start();
        input.delete_forward();
        assert_eq!(input.value(), "NS W5G");

        input.move_end();
        input.delete_char();
        assert_eq!(input.value(), "NS W5");

        input.move_start();
        input.delete_char();
        assert_eq!(input.value(), "NS W5");
    }

    #[test]
    fn multibyte_characters() {
        let mut input = typed("카페wifi");
        input.move_start();
        input.move_right();
        input.delete_forward();
        assert_eq!(input.value(), "카wifi");
        // Wide char occupies two columns
        assert_eq!(input.window(20), ("카wifi".to_string(), 2));
    }

    #[test]
    fn long_text_scrolls_to_keep_cursor_visible() {
        let mut input = typed("abcdefghij");
        // Cursor sits on the last column, after the newest characters
        assert_eq!(input.window(5), ("ghij".to_string(), 4));

        input.move_start();
        assert_eq!(input.window(5), ("abcde".to_string(), 0));

        let wide = typed("카페카페");
        assert_eq!(wide.window(5), ("카페".to_string(), 4));
    }

    #[test]
    fn masked_text_scrolls_too() {
        let mut input = TextInput::new("Password", true);
        "correct horse battery".chars().for_each(|c| input.insert_char(c));
        let (visible, cursor) = input.window(8);
        assert_eq!(visible, "●".repeat(7));
        assert_eq!(cursor, 7);
    }

    #[test]
    fn masked_display() {
        let mut input = TextInput::new("Password", true);
        "qqqqwwww".chars().for_each(|c| input.insert_char(c));
        assert_eq!(input.display(), "●●●●●●●●");
        assert_eq!(input.value(), "qqqqwwww");
        input.toggle_mask();
        assert_eq!(input.display(), "qqqqwwww");
    }
}
