//! Conversation context management.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ContextWindow`] | Bounded FIFO of recent messages fed to the LLM |
//! | [`ConversationContexts`] | Per-session records, transcript persistence |
//! | [`summary`] | Hand-over summaries and key points |

pub mod store;
pub mod summary;
pub mod window;

pub use store::{ContextSnapshot, ConversationContext, ConversationContexts, SessionScope};
pub use window::ContextWindow;
