use ratatui::buffer::Buffer;
use ratatui::text::{Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

/// Paragraph that wraps on terminal columns and keeps indentation and
/// repeated spaces. Trailing blank lines are dropped.
pub fn wrapped_paragraph(text: &str) -> Paragraph<'static> {
    Paragraph::new(Text::from(text.trim_end().to_string())).wrap(Wrap { trim: false })
}

/// Rows `paragraph` occupies at `width` columns. Never less than one.
pub fn wrapped_rows(paragraph: &Paragraph<'_>, width: u16) -> u16 {
    let rows = paragraph.line_count(width.max(1)).max(1);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Plain-text rows of a rendered buffer, trailing blanks removed. The cells
/// hidden behind a double-width symbol are skipped.
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let width = usize::from(buffer.area.width.max(1));
    buffer
        .content
        .chunks(width)
        .map(|row| {
            let mut line = String::new();
            let mut hidden = 0;
            for cell in row {
                if hidden > 0 {
                    hidden -= 1;
                    continue;
                }
                let symbol = cell.symbol();
                hidden = Span::raw(symbol).width().saturating_sub(1);
                line.push_str(symbol);
            }
            line.trim_end().to_string()
        })
        .collect()
}
