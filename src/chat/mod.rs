mod dispatcher;
mod envelope;
mod error;
mod message;
mod notice;
mod store;
mod transport;

#[cfg(test)]
pub mod testing;

pub use dispatcher::{MessageDispatcher, PendingSend, SendOutcome};
pub use envelope::EnvelopeShape;
pub use message::{AttachmentFile, Sender};
pub use notice::{Notice, NoticeLevel};
pub use store::ConversationStore;
pub use transport::{AuthHeader, HttpTransport};
