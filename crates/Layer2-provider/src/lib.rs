//! # helm-provider
//!
//! Model-completion client abstraction for Helm.
//!
//! ## Features
//! - Conversation data model (`Message`, `Block`)
//! - Streaming client trait (`ModelClient`) with text / tool call / done events
//! - Tool definitions sent to the model
//! - Deterministic `ScriptedClient` for tests and offline runs

pub mod error;
pub mod message;
pub mod scripted;
pub mod tool_def;
pub mod r#trait;

// Core traits and types
pub use message::{Block, Message, MessageRole, ToolCall};
pub use r#trait::{CompletionStream, ModelClient, StreamEvent, TokenUsage};
pub use tool_def::{ToolDef, ToolParameters};

// Error
pub use error::ProviderError;

// Client implementations
pub use scripted::{ScriptedClient, ScriptedReply, ScriptedToolCall};
