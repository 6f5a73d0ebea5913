//! System-prompt construction.

pub mod assembler;
pub mod guidelines;

pub use assembler::{PromptAssembler, PromptInput, ToolReport};
pub use guidelines::IndustryGuidelines;
