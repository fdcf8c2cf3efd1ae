mod audio;
mod backend;
mod chat_state;
mod document;
mod message;
mod slash_commands;
mod stream_event;

pub use audio::*;
pub use backend::*;
pub use chat_state::*;
pub use document::*;
pub use message::*;
pub use slash_commands::*;
pub use stream_event::*;
