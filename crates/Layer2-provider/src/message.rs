//! Conversation data model
//!
//! A `Message` is an ordered list of `Block`s tagged with a role.
//! The ordered list of messages is the conversation history.

use chrono::{DateTime, Utc};
use helm_foundation::ImageData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A typed unit of message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Plain text
    Text { text: String },

    /// Image payload
    Image { image: ImageData },

    /// Tool invocation requested by the model
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },

    /// Result of a tool invocation
    ToolResult {
        tool_use_id: String,
        content: Value,
        #[serde(default)]
        is_error: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        images: Vec<ImageData>,
    },
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Successful tool result
    pub fn tool_result(tool_use_id: impl Into<String>, content: Value, images: Vec<ImageData>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: false,
            images,
        }
    }

    /// Failed tool result
    pub fn tool_error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: Value::String(message.into()),
            is_error: true,
            images: Vec::new(),
        }
    }

    pub fn as_tool_use(&self) -> Option<ToolCall> {
        match self {
            Self::ToolUse { id, name, input } => Some(ToolCall::new(id, name, input.clone())),
            _ => None,
        }
    }
}

impl From<ToolCall> for Block {
    fn from(call: ToolCall) -> Self {
        Self::ToolUse {
            id: call.id,
            name: call.name,
            input: call.arguments,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Role of this message
    pub role: MessageRole,

    /// Ordered content blocks
    pub content: Vec<Block>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: Vec<Block>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, vec![Block::text(text)])
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![Block::text(text)])
    }

    /// Create an assistant message
    pub fn assistant(blocks: Vec<Block>) -> Self {
        Self::new(MessageRole::Assistant, blocks)
    }

    /// Create a user-role message carrying tool results
    pub fn tool_results(results: Vec<Block>) -> Self {
        Self::new(MessageRole::User, results)
    }

    /// Concatenated text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                Block::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool invocations in order
    pub fn tool_uses(&self) -> Vec<ToolCall> {
        self.content.iter().filter_map(Block::as_tool_use).collect()
    }

    /// IDs of tool results in order
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|b| match b {
                Block::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content.iter().any(|b| matches!(b, Block::ToolUse { .. }))
    }
}

/// A tool call requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments as JSON
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}
