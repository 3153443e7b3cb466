use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Single-line text input. The cursor is a character index so editing stays
/// correct for multi-byte text (Korean input, pasted URLs with unicode).
/// Masked mode renders bullets instead of the value, for the API credential.
#[derive(Debug, Clone)]
pub struct InputField {
    pub value: String,
    cursor: usize,
    pub placeholder: String,
    pub label: String,
    pub focused: bool,
    pub masked: bool,
}

impl InputField {
    pub fn new(label: &str, placeholder: &str) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            placeholder: placeholder.to_string(),
            label: label.to_string(),
            focused: false,
            masked: false,
        }
    }

    pub fn masked(label: &str, placeholder: &str) -> Self {
        Self {
            masked: true,
            ..Self::new(label, placeholder)
        }
    }

    fn byte_offset(value: &str, char_index: usize) -> usize {
        value
            .char_indices()
            .nth(char_index)
            .map(|(at, _)| at)
            .unwrap_or(value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                let at = Self::byte_offset(&self.value, self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = Self::byte_offset(&self.value, self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.char_len() {
                    let at = Self::byte_offset(&self.value, self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                true
            }
            KeyCode::Right => {
                if self.cursor < self.char_len() {
                    self.cursor += 1;
                }
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.char_len();
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.label.as_str())
            .border_style(if self.focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            });

        let display = if self.masked {
            "•".repeat(self.char_len())
        } else {
            self.value.clone()
        };

        let text = if display.is_empty() && !self.focused {
            Line::from(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            ))
        } else if self.focused {
            let at = Self::byte_offset(&display, self.cursor);
            let (before, after) = display.split_at(at);
            Line::from(vec![
                Span::raw(before.to_string()),
                Span::styled("│", Style::default().fg(Color::Yellow)),
                Span::raw(after.to_string()),
            ])
        } else {
            Line::from(Span::raw(display))
        };

        let paragraph = Paragraph::new(text).block(block);
        f.render_widget(paragraph, area);
    }

    pub fn is_valid(&self) -> bool {
        !self.value.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Take the current value, leaving the field empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    /// Replace the value, placing the cursor at the end.
    pub fn set_value(&mut self, value: String) {
        self.cursor = value.chars().count();
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(field: &mut InputField, code: KeyCode) {
        field.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn edits_multibyte_text_on_char_boundaries() {
        let mut field = InputField::new("Test", "");
        for c in "아침운동".chars() {
            press(&mut field, KeyCode::Char(c));
        }
        press(&mut field, KeyCode::Left);
        press(&mut field, KeyCode::Backspace);
        assert_eq!(field.value, "아침동");

        press(&mut field, KeyCode::Char('운'));
        assert_eq!(field.value, "아침운동");
    }

    #[test]
    fn take_clears_the_field() {
        let mut field = InputField::new("Test", "");
        press(&mut field, KeyCode::Char('x'));
        assert_eq!(field.take(), "x");
        assert!(field.value.is_empty());
    }
}
