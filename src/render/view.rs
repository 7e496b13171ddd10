use super::bubble::{render_bubbles_to_lines, ChatBubble};
use super::menu::{InputAction, MenuAction, MenuState, TextInput};
use super::progress::DownloadProgress;
use super::wrap::{wrapped_paragraph, wrapped_rows};
use super::RenderError;
use crate::config::Settings;
use crate::ollama::PullProgress;
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui::{Terminal, TerminalOptions, Viewport};
use std::io::{self, BufRead, IsTerminal, Stdout, Write};
use std::time::{Duration, Instant};

/// Rows reserved below the scrollback for live content.
pub const VIEWPORT_HEIGHT: u16 = 12;
/// Column count used when output is not a terminal.
pub const PLAIN_WIDTH: u16 = 80;

type InlineTerminal = Terminal<CrosstermBackend<Stdout>>;

enum Surface {
    Terminal(InlineTerminal),
    Plain {
        out: Box<dyn Write>,
        input: Box<dyn BufRead>,
    },
}

struct LiveStream {
    bubble: ChatBubble,
    last_draw: Option<Instant>,
}

/// Output surface for chat bubbles, menus, and progress. Finished content
/// scrolls up above an inline viewport; live content redraws inside it.
pub struct ChatView {
    surface: Surface,
    width_percent: u16,
    refresh_interval: Duration,
    stream: Option<LiveStream>,
    progress: Option<DownloadProgress>,
}

impl ChatView {
    /// Uses the terminal when both stdin and stdout are attached to one.
    pub fn detect(settings: &Settings) -> Result<Self, RenderError> {
        if io::stdout().is_terminal() && io::stdin().is_terminal() {
            let terminal = Terminal::with_options(
                CrosstermBackend::new(io::stdout()),
                TerminalOptions {
                    viewport: Viewport::Inline(VIEWPORT_HEIGHT),
                },
            )?;
            return Ok(Self::with_surface(Surface::Terminal(terminal), settings));
        }
        Ok(Self::plain(
            Box::new(io::stdout()),
            Box::new(io::stdin().lock()),
            settings,
        ))
    }

    pub fn plain(out: Box<dyn Write>, input: Box<dyn BufRead>, settings: &Settings) -> Self {
        Self::with_surface(Surface::Plain { out, input }, settings)
    }

    fn with_surface(surface: Surface, settings: &Settings) -> Self {
        Self {
            surface,
            width_percent: settings.bubble_width_percent,
            refresh_interval: settings.refresh_interval(),
            stream: None,
            progress: None,
        }
    }

    fn width(&self) -> Result<u16, RenderError> {
        match &self.surface {
            Surface::Terminal(terminal) => Ok(terminal.size()?.width),
            Surface::Plain { .. } => Ok(PLAIN_WIDTH),
        }
    }

    pub fn show_bubble(&mut self, bubble: &ChatBubble) -> Result<(), RenderError> {
        let width = self.width()?;
        let width_percent = self.width_percent;
        match &mut self.surface {
            Surface::Terminal(terminal) => {
                let height = bubble.height(width, width_percent);
                terminal.insert_before(height, |buf| {
                    bubble.render(buf.area, buf, width_percent);
                })?;
            }
            Surface::Plain { out, .. } => {
                for line in render_bubbles_to_lines(std::slice::from_ref(bubble), width, width_percent)
                {
                    writeln!(out, "{line}")?;
                }
                out.flush()?;
            }
        }
        Ok(())
    }

    pub fn show_text(&mut self, text: &str) -> Result<(), RenderError> {
        let width = self.width()?;
        match &mut self.surface {
            Surface::Terminal(terminal) => {
                let paragraph = wrapped_paragraph(text);
                let height = wrapped_rows(&paragraph, width);
                terminal.insert_before(height, |buf| {
                    paragraph.render(buf.area, buf);
                })?;
            }
            Surface::Plain { out, .. } => {
                writeln!(out, "{text}")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    /// Starts a bubble that grows as fragments arrive.
    pub fn begin_stream(&mut self, bubble: ChatBubble) -> Result<(), RenderError> {
        self.stream = Some(LiveStream {
            bubble,
            last_draw: None,
        });
        self.draw_stream(true)
    }

    pub fn push_fragment(&mut self, fragment: &str) -> Result<(), RenderError> {
        if let Some(stream) = self.stream.as_mut() {
            stream.bubble.push_str(fragment);
        }
        self.draw_stream(false)
    }

    /// Moves the completed bubble into the scrollback.
    pub fn finish_stream(&mut self) -> Result<Option<ChatBubble>, RenderError> {
        let Some(stream) = self.stream.take() else {
            return Ok(None);
        };
        self.clear_viewport()?;
        self.show_bubble(&stream.bubble)?;
        Ok(Some(stream.bubble))
    }

    /// Drops a stream that failed part way.
    pub fn abandon_stream(&mut self) -> Result<(), RenderError> {
        if self.stream.take().is_some() {
            self.clear_viewport()?;
        }
        Ok(())
    }

    fn draw_stream(&mut self, force: bool) -> Result<(), RenderError> {
        let width_percent = self.width_percent;
        let refresh_interval = self.refresh_interval;
        let (Surface::Terminal(terminal), Some(stream)) = (&mut self.surface, self.stream.as_mut())
        else {
            return Ok(());
        };
        let due = stream
            .last_draw
            .map_or(true, |last| last.elapsed() >= refresh_interval);
        if !force && !due {
            return Ok(());
        }
        let bubble = &stream.bubble;
        terminal.draw(|frame| {
            let area = frame.area();
            bubble.render(area, frame.buffer_mut(), width_percent);
        })?;
        stream.last_draw = Some(Instant::now());
        Ok(())
    }

    fn clear_viewport(&mut self) -> Result<(), RenderError> {
        if let Surface::Terminal(terminal) = &mut self.surface {
            terminal.clear()?;
        }
        Ok(())
    }

    /// Returns the chosen index, or `None` when the operator cancels.
    pub fn select(&mut self, mut menu: MenuState) -> Result<Option<usize>, RenderError> {
        if menu.items.is_empty() {
            return Ok(None);
        }
        match &mut self.surface {
            Surface::Terminal(terminal) => {
                enable_raw_mode()?;
                let result = select_in_terminal(terminal, &mut menu);
                disable_raw_mode()?;
                terminal.clear()?;
                result
            }
            Surface::Plain { out, input } => {
                for line in menu.plain_lines() {
                    writeln!(out, "{line}")?;
                }
                loop {
                    write!(out, "Select [1-{}]: ", menu.items.len())?;
                    out.flush()?;
                    let mut raw = String::new();
                    if input.read_line(&mut raw)? == 0 {
                        writeln!(out)?;
                        return Ok(None);
                    }
                    match menu.select_by_number(&raw) {
                        Ok(index) => return Ok(Some(index)),
                        Err(err) => writeln!(out, "{err}")?,
                    }
                }
            }
        }
    }

    /// Reads one line of text, or `None` when the operator cancels.
    pub fn prompt_text(&mut self, prompt: &str) -> Result<Option<String>, RenderError> {
        let mut text_input = TextInput::new(prompt);
        match &mut self.surface {
            Surface::Terminal(terminal) => {
                enable_raw_mode()?;
                let result = prompt_in_terminal(terminal, &mut text_input);
                disable_raw_mode()?;
                terminal.clear()?;
                result
            }
            Surface::Plain { out, input } => {
                write!(out, "{prompt}: ")?;
                out.flush()?;
                let mut raw = String::new();
                if input.read_line(&mut raw)? == 0 {
                    writeln!(out)?;
                    return Ok(None);
                }
                Ok(Some(raw.trim_end_matches(['\r', '\n']).to_string()))
            }
        }
    }

    pub fn begin_progress(&mut self, model: &str) -> Result<(), RenderError> {
        let progress = DownloadProgress::new(model);
        if let Surface::Plain { out, .. } = &mut self.surface {
            writeln!(out, "Downloading model {model}...")?;
            out.flush()?;
        }
        self.progress = Some(progress);
        self.draw_progress()
    }

    pub fn update_progress(&mut self, event: &PullProgress) -> Result<(), RenderError> {
        let Some(progress) = self.progress.as_mut() else {
            return Ok(());
        };
        let previous_status = progress.status.clone();
        progress.apply(event);
        if let Surface::Plain { out, .. } = &mut self.surface {
            if progress.status != previous_status && !progress.status.is_empty() {
                writeln!(out, "  {}", progress.status)?;
                out.flush()?;
            }
        }
        self.draw_progress()
    }

    pub fn finish_progress(&mut self) -> Result<Option<DownloadProgress>, RenderError> {
        let progress = self.progress.take();
        self.clear_viewport()?;
        Ok(progress)
    }

    fn draw_progress(&mut self) -> Result<(), RenderError> {
        let (Surface::Terminal(terminal), Some(progress)) = (&mut self.surface, self.progress.as_ref())
        else {
            return Ok(());
        };
        terminal.draw(|frame| {
            let area = frame.area();
            let gauge_area = Rect::new(area.x, area.y, area.width, area.height.min(3));
            progress.render(gauge_area, frame.buffer_mut());
        })?;
        Ok(())
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        if let Surface::Terminal(terminal) = &mut self.surface {
            let _ = terminal.clear();
            let _ = terminal.show_cursor();
            let _ = disable_raw_mode();
        }
    }
}

fn next_key() -> Result<Option<crossterm::event::KeyEvent>, RenderError> {
    match event::read()? {
        Event::Key(key) => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn select_in_terminal(
    terminal: &mut InlineTerminal,
    menu: &mut MenuState,
) -> Result<Option<usize>, RenderError> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            let height = menu.height().min(area.height);
            menu.render(Rect::new(area.x, area.y, area.width, height), frame.buffer_mut());
        })?;
        let Some(key) = next_key()? else {
            continue;
        };
        match menu.handle_key(key) {
            MenuAction::Pending => {}
            MenuAction::Selected(index) => return Ok(Some(index)),
            MenuAction::Cancelled => return Ok(None),
        }
    }
}

fn prompt_in_terminal(
    terminal: &mut InlineTerminal,
    text_input: &mut TextInput,
) -> Result<Option<String>, RenderError> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            text_input.render(
                Rect::new(area.x, area.y, area.width, area.height.min(3)),
                frame.buffer_mut(),
            );
        })?;
        let Some(key) = next_key()? else {
            continue;
        };
        match text_input.handle_key(key) {
            InputAction::Pending => {}
            InputAction::Submitted(value) => return Ok(Some(value)),
            InputAction::Cancelled => return Ok(None),
        }
    }
}
