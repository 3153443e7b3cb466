use crate::core::storage::{FileEntry, FileType};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub struct FileList {
    pub items: Vec<FileEntry>,
    pub state: ListState,
    pub selected_items: Vec<bool>,
}

impl FileList {
    pub fn new(items: Vec<FileEntry>) -> Self {
        let selected_items = vec![false; items.len()];
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }

        Self {
            items,
            state,
            selected_items,
        }
    }

    pub fn update_items(&mut self, items: Vec<FileEntry>) {
        self.selected_items = vec![false; items.len()];
        self.items = items;
        let selection = if self.items.is_empty() { None } else { Some(0) };
        self.state.select(selection);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.previous();
                true
            }
            KeyCode::Down => {
                self.next();
                true
            }
            KeyCode::Home => {
                if !self.items.is_empty() {
                    self.state.select(Some(0));
                }
                true
            }
            KeyCode::End => {
                if !self.items.is_empty() {
                    self.state.select(Some(self.items.len() - 1));
                }
                true
            }
            KeyCode::Char(' ') => {
                self.toggle_selected();
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.previous();
                true
            }
            MouseEventKind::ScrollDown => {
                self.next();
                true
            }
            _ => false,
        }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let next = match self.state.selected() {
            Some(at) => (at + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.state.select(Some(next));
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let previous = self.state.selected().unwrap_or(0).saturating_sub(1);
        self.state.select(Some(previous));
    }

    fn toggle_selected(&mut self) {
        if let Some(at) = self.state.selected()
            && at < self.selected_items.len()
        {
            self.selected_items[at] = !self.selected_items[at];
        }
    }

    pub fn get_selected(&self) -> Option<&FileEntry> {
        self.state.selected().and_then(|at| self.items.get(at))
    }

    /// Multi-selected entries, or the highlighted one when nothing is marked.
    pub fn get_selected_items(&self) -> Vec<FileEntry> {
        let marked: Vec<FileEntry> = self
            .items
            .iter()
            .zip(&self.selected_items)
            .filter(|(_, marked)| **marked)
            .map(|(item, _)| item.clone())
            .collect();

        if marked.is_empty() {
            self.get_selected().cloned().into_iter().collect()
        } else {
            marked
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        let name_width = area.width.saturating_sub(34) as usize;

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if self.selected_items.get(i).copied().unwrap_or(false) {
                    "▪"
                } else {
                    " "
                };

                let type_color = match entry.file_type {
                    FileType::Report => Color::Cyan,
                    FileType::Plan => Color::Green,
                    FileType::Calendar => Color::Magenta,
                };

                let modified: DateTime<Local> = entry.modified.into();

                let line = Line::from(vec![
                    Span::raw(format!("{marker} ")),
                    Span::styled(
                        format!("{:<9}", entry.file_type.label()),
                        Style::default().fg(type_color),
                    ),
                    Span::raw(fit_width(&entry.name, name_width)),
                    Span::styled(
                        format!("  {}", modified.format("%Y-%m-%d %H:%M")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);

                ListItem::new(line)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(list, area, &mut self.state);
    }
}

/// Pad or truncate to a display width, so columns line up even when names
/// carry wide characters.
fn fit_width(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    if text.width() <= width {
        let padding = width - text.width();
        return format!("{text}{}", " ".repeat(padding));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    let padding = width.saturating_sub(used + 1);
    out.push_str(&" ".repeat(padding));
    out
}

#[cfg(test)]
mod tests {
    use super::fit_width;

    #[test]
    fn short_names_are_padded_to_width() {
        assert_eq!(fit_width("plan.json", 12), "plan.json   ");
    }

    #[test]
    fn long_names_truncate_with_ellipsis() {
        let fitted = fit_width("coaching_20260807_213000.md", 10);
        assert!(fitted.starts_with("coaching_"));
        assert!(fitted.contains('…'));
    }
}
