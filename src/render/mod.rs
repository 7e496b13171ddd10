//! Terminal presentation: chat bubbles, menus, download gauges, and the
//! inline view that hosts them.

pub mod bubble;
pub mod error;
pub mod menu;
pub mod progress;
pub mod view;
pub mod wrap;

pub use bubble::{
    render_bubbles_to_lines, ChatBubble, AGENT_1_COLOR, AGENT_2_COLOR, SYSTEM_COLOR,
};
pub use error::RenderError;
pub use menu::{InputAction, MenuAction, MenuState, TextInput};
pub use progress::{DownloadProgress, DEFAULT_PROGRESS_LENGTH};
pub use view::{ChatView, PLAIN_WIDTH, VIEWPORT_HEIGHT};
pub use wrap::{buffer_lines, wrapped_paragraph, wrapped_rows};
