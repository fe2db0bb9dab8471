//! External inference collaborator.
//!
//! Everything the rest of the crate knows about the remote multimodal
//! completion service lives behind the [`InferenceClient`] trait: one
//! operation, `complete(messages) -> text`. The production implementation
//! speaks the OpenAI chat-completions wire format; tests substitute scripted
//! doubles through the same seam.

pub mod client;
pub mod message;
pub mod prompt;

pub use client::{InferenceClient, InferenceError, OpenAiClient};
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent};
