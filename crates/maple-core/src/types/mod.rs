pub mod locale;
pub mod message;

pub use locale::{Language, ParseTagError, Region};
pub use message::{derive_title, new_message_id, Message, MessageId, Sender, TITLE_MAX_CHARS};
