//! Client library for an AI real-estate assistant backend.
//!
//! The crate is built around [`session::SessionManager`], which owns the
//! conversation log, the server-issued conversation id and a single
//! [`session::SessionStatus`]. Requests go through the
//! [`backend::AssistantBackend`] trait; [`backend::HttpBackend`] speaks the
//! `/ask` and `/ask-voice` endpoints. Voice input is captured through the
//! [`capture::AudioCapture`] trait.
//!
//! ```no_run
//! use std::sync::Arc;
//! use estate_chat::{backend::HttpBackend, session::SessionManager};
//!
//! # async fn demo() -> Result<(), estate_chat::error::AssistantError> {
//! let backend = HttpBackend::new("http://localhost:8989", Some(30))?;
//! let mut session = SessionManager::new(Arc::new(backend));
//! session.send_text("Show me 2-bedroom apartments in Dubai Marina").await;
//! for message in session.state().messages() {
//!     println!("{}", message.text());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod capture;
pub mod error;
pub mod listing;
pub mod session;

pub use backend::{AssistantBackend, HttpBackend};
pub use error::AssistantError;
pub use listing::PropertyListing;
pub use session::{
    ConversationId, Message, MessageId, Role, SendOutcome, SessionManager, SessionState,
    SessionStatus,
};
