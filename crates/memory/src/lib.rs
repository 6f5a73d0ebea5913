//! Storage backends for Tierline.
//!
//! Reference implementations of the persistence seams defined in
//! `tierline-core`: knowledge search, transcripts, escalations, the human
//! roster, and agent profiles.

pub mod agents;
pub mod escalations;
pub mod in_memory;
pub mod knowledge_base;
pub mod roster;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use agents::StaticAgentDirectory;
pub use escalations::InMemoryEscalationStore;
pub use in_memory::InMemoryTranscript;
pub use knowledge_base::{InMemoryKnowledgeBase, KnowledgeDocument};
pub use roster::InMemoryRoster;
pub use vector::{cosine_similarity, lexical_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTranscript;
