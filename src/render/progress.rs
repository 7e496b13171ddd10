use crate::ollama::PullProgress;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Gauge, Widget};

/// Placeholder length used until the server reports a byte total.
pub const DEFAULT_PROGRESS_LENGTH: u64 = 1000;

/// Download gauge state. Events carrying byte counts move the gauge to that
/// position; status-only events nudge it forward by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    pub model: String,
    pub current: u64,
    pub length: u64,
    pub status: String,
}

impl DownloadProgress {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            current: 0,
            length: DEFAULT_PROGRESS_LENGTH,
            status: String::new(),
        }
    }

    /// Applies one pull event and returns how far the gauge advanced.
    pub fn apply(&mut self, event: &PullProgress) -> u64 {
        self.status = event.status.clone();
        let previous = self.current;
        match event.completed {
            Some(completed) => {
                if let Some(total) = event.total.filter(|total| *total > 0) {
                    self.length = total;
                }
                self.current = completed.min(self.length);
            }
            None => {
                self.current = self.current.saturating_add(1).min(self.length);
            }
        }
        self.current.saturating_sub(previous)
    }

    pub fn ratio(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        (self.current as f64 / self.length as f64).clamp(0.0, 1.0)
    }

    pub fn label(&self) -> String {
        let percent = (self.ratio() * 100.0).round() as u64;
        if self.status.is_empty() {
            format!("{percent}%")
        } else {
            format!("{percent}% {}", self.status)
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Downloading model {}... ", self.model)),
            )
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(self.ratio())
            .label(self.label())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: &str, total: Option<u64>, completed: Option<u64>) -> PullProgress {
        PullProgress {
            status: status.to_string(),
            digest: None,
            total,
            completed,
        }
    }

    #[test]
    fn status_only_events_advance_by_one() {
        let mut progress = DownloadProgress::new("m1");
        assert_eq!(progress.apply(&event("pulling manifest", None, None)), 1);
        assert_eq!(progress.apply(&event("pulling manifest", None, None)), 1);
        assert_eq!(progress.current, 2);
        assert_eq!(progress.length, DEFAULT_PROGRESS_LENGTH);
        assert_eq!(progress.label(), "0% pulling manifest");
    }

    #[test]
    fn byte_counts_replace_length_and_position() {
        let mut progress = DownloadProgress::new("m1");
        progress.apply(&event("pulling manifest", None, None));
        assert_eq!(progress.apply(&event("pulling abc", Some(400), Some(100))), 99);
        assert_eq!(progress.length, 400);
        assert_eq!(progress.ratio(), 0.25);
        assert_eq!(progress.label(), "25% pulling abc");
    }

    #[test]
    fn new_layer_restarting_counts_never_underflows() {
        let mut progress = DownloadProgress::new("m1");
        progress.apply(&event("pulling a", Some(100), Some(100)));
        assert_eq!(progress.apply(&event("pulling b", Some(50), Some(5))), 0);
        assert_eq!(progress.current, 5);
        assert_eq!(progress.length, 50);
    }

    #[test]
    fn gauge_renders_title_and_label() {
        let mut progress = DownloadProgress::new("m1");
        progress.apply(&event("success", Some(10), Some(10)));
        let mut buffer = Buffer::empty(Rect::new(0, 0, 40, 3));
        progress.render(buffer.area, &mut buffer);
        let lines = crate::render::buffer_lines(&buffer);
        assert!(lines[0].contains("Downloading model m1"));
        assert!(lines[1].contains("100% success"));
    }
}
