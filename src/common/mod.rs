pub mod commands;
pub mod events;
pub mod types;

pub use commands::HubCommand;
pub use events::{HubEvent, HubStatus};
pub use types::{ChatMessage, ChatRoom, MessageKind, NewMessage, ParticipantKind, MAX_MESSAGE_LEN};
