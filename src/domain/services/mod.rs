mod chat;
mod chat_session;
mod documents;
mod frame_decoder;
mod recording;
mod router;

pub use chat::*;
pub use chat_session::*;
pub use documents::*;
pub use frame_decoder::*;
pub use recording::*;
pub use router::*;
