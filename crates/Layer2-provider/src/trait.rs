//! Model-completion client trait and stream types

use crate::error::ProviderError;
use crate::{Message, ToolCall, ToolDef};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Events emitted during streaming
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text content delta
    Text(String),

    /// Tool call completed
    ToolCall(ToolCall),

    /// Token usage update
    Usage(TokenUsage),

    /// Stream completed
    Done,

    /// Error occurred; no further events follow
    Error(ProviderError),
}

/// Token usage reported by the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Boxed completion stream
pub type CompletionStream<'a> = Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>;

/// Streaming model-completion client
///
/// Implement this trait to plug a model provider into the runtime.
/// Dropping the returned stream cancels the request.
pub trait ModelClient: Send + Sync {
    /// Client name (for logs)
    fn name(&self) -> &str;

    /// Send the conversation and get a streaming response
    ///
    /// The stream yields text deltas and complete tool calls in the order the
    /// model produced them, then `Done`. A transport failure is reported as a
    /// final `Error` event.
    fn stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDef>,
        system_prompt: Option<String>,
    ) -> CompletionStream<'_>;
}
