use super::wrap::{buffer_lines, wrapped_paragraph, wrapped_rows};
use crate::conversation::HistoryEntry;
use crate::persistence::{AgentSlot, Chat, ChatMessage};
use crate::shared::ChatRole;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Widget};

pub const AGENT_1_COLOR: Color = Color::Cyan;
pub const AGENT_2_COLOR: Color = Color::Green;
pub const SYSTEM_COLOR: Color = Color::Yellow;

const MIN_BUBBLE_WIDTH: u16 = 12;
const BORDER_SIZE: u16 = 2;

/// One message drawn as a bordered, titled panel. Agent 1 sits on the right,
/// agent 2 on the left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubble {
    pub slot: AgentSlot,
    pub role: ChatRole,
    pub title: String,
    pub content: String,
}

impl ChatBubble {
    pub fn new(
        slot: AgentSlot,
        role: ChatRole,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            role,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn from_message(slot: AgentSlot, message: &ChatMessage) -> Self {
        let title = match message.role {
            ChatRole::System => "system".to_string(),
            _ => message.actor().to_string(),
        };
        Self::new(slot, message.role, title, message.content.clone())
    }

    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self::from_message(entry.slot, &entry.message)
    }

    /// Empty assistant bubble for a response that is about to stream in.
    pub fn for_sender(slot: AgentSlot, sender: &Chat) -> Self {
        Self::new(
            slot,
            ChatRole::Assistant,
            sender.default_model.clone(),
            String::new(),
        )
    }

    pub fn push_str(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }

    pub fn color(&self) -> Color {
        if self.role.is_system() {
            return SYSTEM_COLOR;
        }
        match self.slot {
            AgentSlot::One => AGENT_1_COLOR,
            AgentSlot::Two => AGENT_2_COLOR,
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self.slot {
            AgentSlot::One => Alignment::Right,
            AgentSlot::Two => Alignment::Left,
        }
    }

    /// Horizontal slot of the bubble inside `area`.
    pub fn placement(&self, area: Rect, width_percent: u16) -> Rect {
        let scaled = (u32::from(area.width) * u32::from(width_percent) / 100) as u16;
        let width = scaled.max(MIN_BUBBLE_WIDTH).min(area.width);
        let x = match self.slot {
            AgentSlot::One => area.x + area.width - width,
            AgentSlot::Two => area.x,
        };
        Rect::new(x, area.y, width, area.height)
    }

    fn text_width(&self, area_width: u16, width_percent: u16) -> u16 {
        let bubble = self.placement(Rect::new(0, 0, area_width, 1), width_percent);
        bubble.width.saturating_sub(BORDER_SIZE)
    }

    /// Rows needed to show the whole content, borders included.
    pub fn height(&self, area_width: u16, width_percent: u16) -> u16 {
        let text_width = self.text_width(area_width, width_percent);
        wrapped_rows(&wrapped_paragraph(&self.content), text_width).saturating_add(BORDER_SIZE)
    }

    /// Draws the bubble into `area`. When the content is taller than the
    /// area, the newest rows stay visible.
    pub fn render(&self, area: Rect, buf: &mut Buffer, width_percent: u16) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let bubble_area = self.placement(area, width_percent);
        let color = self.color();
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_alignment(self.alignment())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let inner = block.inner(bubble_area);
        block.render(bubble_area, buf);

        let paragraph = wrapped_paragraph(&self.content);
        let skip = wrapped_rows(&paragraph, inner.width).saturating_sub(inner.height);
        paragraph
            .alignment(self.alignment())
            .style(Style::default().fg(color))
            .scroll((skip, 0))
            .render(inner, buf);
    }
}

/// Renders bubbles off-screen and returns the plain text rows.
pub fn render_bubbles_to_lines(
    bubbles: &[ChatBubble],
    width: u16,
    width_percent: u16,
) -> Vec<String> {
    let mut out = Vec::new();
    for bubble in bubbles {
        let height = bubble.height(width, width_percent);
        let mut buffer = Buffer::empty(Rect::new(0, 0, width, height));
        bubble.render(buffer.area, &mut buffer, width_percent);
        out.extend(buffer_lines(&buffer));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: i64, role: ChatRole, model: Option<&str>, content: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            chat_id,
            role,
            content: content.to_string(),
            model: model.map(str::to_string),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn agent_one_is_right_aligned_and_agent_two_left() {
        let area = Rect::new(0, 0, 100, 5);
        let one = ChatBubble::new(AgentSlot::One, ChatRole::Assistant, "m1", "hi");
        let two = ChatBubble::new(AgentSlot::Two, ChatRole::Assistant, "m2", "hi");

        assert_eq!(one.placement(area, 60), Rect::new(40, 0, 60, 5));
        assert_eq!(two.placement(area, 60), Rect::new(0, 0, 60, 5));
        assert_eq!(one.alignment(), Alignment::Right);
        assert_eq!(two.alignment(), Alignment::Left);
    }

    #[test]
    fn system_messages_use_their_own_color_on_either_side() {
        let system = ChatBubble::from_message(
            AgentSlot::One,
            &message(1, ChatRole::System, None, "be terse"),
        );
        assert_eq!(system.title, "system");
        assert_eq!(system.color(), SYSTEM_COLOR);

        let assistant = ChatBubble::from_message(
            AgentSlot::Two,
            &message(2, ChatRole::Assistant, Some("m2"), "hello"),
        );
        assert_eq!(assistant.title, "m2");
        assert_eq!(assistant.color(), AGENT_2_COLOR);
    }

    #[test]
    fn height_counts_wrapped_rows_and_borders() {
        let bubble = ChatBubble::new(
            AgentSlot::Two,
            ChatRole::Assistant,
            "m2",
            "first\nabcdefghijklmn",
        );
        // 50% of 24 columns is 12, leaving 10 columns of text.
        assert_eq!(bubble.height(24, 50), 5);
        let lines = render_bubbles_to_lines(&[bubble], 24, 50);
        assert_eq!(lines[1], "│first     │");
        assert_eq!(lines[2], "│abcdefghij│");
        assert_eq!(lines[3], "│klmn      │");
    }

    #[test]
    fn rendered_rows_place_bubbles_on_their_side() {
        let bubbles = vec![
            ChatBubble::new(AgentSlot::One, ChatRole::Assistant, "m1", "right"),
            ChatBubble::new(AgentSlot::Two, ChatRole::Assistant, "m2", "left"),
        ];
        let lines = render_bubbles_to_lines(&bubbles, 40, 50);
        assert_eq!(lines.len(), 6);

        assert!(lines[0].starts_with(&" ".repeat(20)));
        assert!(lines[0].contains("m1"));
        assert!(lines[1].ends_with("right│"));

        assert!(lines[3].starts_with('┌'));
        assert!(lines[3].contains("m2"));
        assert!(lines[4].starts_with("│left"));
    }

    #[test]
    fn render_keeps_newest_rows_when_area_is_short() {
        let bubble = ChatBubble::new(
            AgentSlot::Two,
            ChatRole::Assistant,
            "m2",
            "alpha\nbeta\ngamma\ndelta",
        );
        let mut buffer = Buffer::empty(Rect::new(0, 0, 20, 4));
        bubble.render(buffer.area, &mut buffer, 100);
        let lines = buffer_lines(&buffer);
        assert!(lines[1].contains("gamma"));
        assert!(lines[2].contains("delta"));
        assert!(!lines.iter().any(|line| line.contains("alpha")));
    }

    #[test]
    fn wide_characters_wrap_on_columns_without_losing_text() {
        let content = "日本語のテキストはここで折り返す必要がありますので最後まで";
        let bubble = ChatBubble::new(AgentSlot::Two, ChatRole::Assistant, "m2", content);
        // 50% of 40 columns leaves 18 columns, nine symbols per row.
        let lines = render_bubbles_to_lines(&[bubble], 40, 50);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "│日本語のテキストは│");
        let shown = lines[1..lines.len() - 1]
            .iter()
            .map(|line| line.trim_matches(|ch: char| ch == '│' || ch == ' '))
            .collect::<String>();
        assert_eq!(shown, content);
    }

    #[test]
    fn indentation_survives_rendering() {
        let bubble = ChatBubble::new(
            AgentSlot::Two,
            ChatRole::Assistant,
            "m2",
            "fn main() {\n    let x = 1;\n}",
        );
        let lines = render_bubbles_to_lines(&[bubble], 40, 100);
        assert!(lines[2].starts_with("│    let x = 1;"));
    }
}
