use super::RenderError;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Pending,
    Selected(usize),
    Cancelled,
}

/// Single-choice list driven by arrow keys, vim keys, or item numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub title: String,
    pub items: Vec<String>,
    pub selected: usize,
}

fn is_cancel(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

impl MenuState {
    pub fn new(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            items,
            selected: 0,
        }
    }

    pub fn move_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn move_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(self.items.len() - 1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuAction {
        if key.kind == KeyEventKind::Release {
            return MenuAction::Pending;
        }
        if is_cancel(&key) {
            return MenuAction::Cancelled;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_prev(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.move_next(),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.items.len().saturating_sub(1),
            KeyCode::Enter if !self.items.is_empty() => {
                return MenuAction::Selected(self.selected);
            }
            KeyCode::Esc | KeyCode::Char('q') => return MenuAction::Cancelled,
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                if index < self.items.len() {
                    self.selected = index;
                    return MenuAction::Selected(index);
                }
            }
            _ => {}
        }
        MenuAction::Pending
    }

    /// Rows needed to draw the menu with its border and hint line.
    pub fn height(&self) -> u16 {
        u16::try_from(self.items.len())
            .unwrap_or(u16::MAX - 3)
            .saturating_add(3)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let mut items = Vec::with_capacity(self.items.len());
        for (idx, label) in self.items.iter().enumerate() {
            let marker = if idx == self.selected { ">" } else { " " };
            let mut item = ListItem::new(Line::from(Span::raw(format!(
                "{marker} {}. {label}",
                idx + 1
            ))));
            if idx == self.selected {
                item = item.style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );
            }
            items.push(item);
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        block.render(area, buf);

        let list_height = inner.height.saturating_sub(1);
        List::new(items).render(Rect::new(inner.x, inner.y, inner.width, list_height), buf);
        if inner.height > 0 {
            Paragraph::new("↑/↓ move, Enter select, Esc cancel")
                .style(Style::default().fg(Color::DarkGray))
                .render(
                    Rect::new(inner.x, inner.y + list_height, inner.width, 1),
                    buf,
                );
        }
    }

    /// Numbered listing used when the terminal is not interactive.
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{}:", self.title)];
        lines.extend(
            self.items
                .iter()
                .enumerate()
                .map(|(idx, item)| format!("  {}. {item}", idx + 1)),
        );
        lines
    }

    /// Parses a 1-based item number typed on a plain terminal.
    pub fn select_by_number(&self, raw: &str) -> Result<usize, RenderError> {
        let trimmed = raw.trim();
        match trimmed.parse::<usize>() {
            Ok(number) if (1..=self.items.len()).contains(&number) => Ok(number - 1),
            _ => Err(RenderError::InvalidSelection(trimmed.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Pending,
    Submitted(String),
    Cancelled,
}

/// One-line text prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub prompt: String,
    pub value: String,
}

impl TextInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            value: String::new(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        if key.kind == KeyEventKind::Release {
            return InputAction::Pending;
        }
        if is_cancel(&key) {
            return InputAction::Cancelled;
        }
        match key.code {
            KeyCode::Enter => return InputAction::Submitted(std::mem::take(&mut self.value)),
            KeyCode::Esc => return InputAction::Cancelled,
            KeyCode::Backspace => {
                self.value.pop();
            }
            KeyCode::Char(ch) => self.value.push(ch),
            _ => {}
        }
        InputAction::Pending
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.prompt));
        Paragraph::new(Line::from(format!("> {}", self.value)))
            .block(block)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::buffer_lines;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn menu() -> MenuState {
        MenuState::new(
            "Next",
            vec![
                "Continue".to_string(),
                "Inject".to_string(),
                "Abort".to_string(),
            ],
        )
    }

    #[test]
    fn arrow_keys_wrap_around_the_list() {
        let mut menu = menu();
        assert_eq!(menu.handle_key(key_event(KeyCode::Up)), MenuAction::Pending);
        assert_eq!(menu.selected, 2);
        menu.handle_key(key_event(KeyCode::Down));
        assert_eq!(menu.selected, 0);
        menu.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(
            menu.handle_key(key_event(KeyCode::Enter)),
            MenuAction::Selected(1)
        );
    }

    #[test]
    fn digits_select_directly_and_escape_cancels() {
        let mut menu = menu();
        assert_eq!(
            menu.handle_key(key_event(KeyCode::Char('3'))),
            MenuAction::Selected(2)
        );
        assert_eq!(
            menu.handle_key(key_event(KeyCode::Char('9'))),
            MenuAction::Pending
        );
        assert_eq!(menu.handle_key(key_event(KeyCode::Esc)), MenuAction::Cancelled);
        assert_eq!(
            menu.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            MenuAction::Cancelled
        );
    }

    #[test]
    fn empty_menu_never_selects() {
        let mut menu = MenuState::new("Models", Vec::new());
        menu.handle_key(key_event(KeyCode::Down));
        assert_eq!(menu.handle_key(key_event(KeyCode::Enter)), MenuAction::Pending);
    }

    #[test]
    fn plain_selection_parses_one_based_numbers() {
        let menu = menu();
        assert_eq!(menu.select_by_number(" 2\n").expect("valid"), 1);
        assert!(matches!(
            menu.select_by_number("0"),
            Err(RenderError::InvalidSelection(_))
        ));
        assert!(menu.select_by_number("abc").is_err());
        assert_eq!(menu.plain_lines()[3], "  3. Abort");
    }

    #[test]
    fn render_marks_selected_item() {
        let mut menu = menu();
        menu.selected = 1;
        let mut buffer = Buffer::empty(Rect::new(0, 0, 40, menu.height()));
        menu.render(buffer.area, &mut buffer);
        let lines = buffer_lines(&buffer);
        assert!(lines[0].contains("Next"));
        assert!(lines[1].contains("  1. Continue"));
        assert!(lines[2].contains("> 2. Inject"));
        assert!(lines[4].contains("Enter select"));
    }

    #[test]
    fn text_input_collects_characters_until_enter() {
        let mut input = TextInput::new("System message");
        for ch in "hey!".chars() {
            input.handle_key(key_event(KeyCode::Char(ch)));
        }
        input.handle_key(key_event(KeyCode::Backspace));
        assert_eq!(
            input.handle_key(key_event(KeyCode::Enter)),
            InputAction::Submitted("hey".to_string())
        );
        assert!(input.value.is_empty());
    }
}
