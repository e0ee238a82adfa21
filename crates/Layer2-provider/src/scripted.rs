//! Deterministic scripted model client
//!
//! Replays a queue of pre-written replies instead of talking to a model.
//! Used by the runtime tests and the headless CLI; contains no transport logic.

use crate::error::ProviderError;
use crate::r#trait::{CompletionStream, ModelClient, StreamEvent, TokenUsage};
use crate::{Message, ToolCall, ToolDef};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Client name
pub const SCRIPTED_CLIENT_NAME: &str = "scripted";

/// One scripted model reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedReply {
    /// Text streamed word by word
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Tool calls emitted after the text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ScriptedToolCall>,

    /// Fail with a stream error after the text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Never finish after the text (until the stream is dropped)
    #[serde(default)]
    pub hang: bool,

    /// Delay before each text chunk
    #[serde(default)]
    pub chunk_delay_ms: u64,
}

/// Scripted tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedToolCall {
    /// Invocation ID (generated when missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl ScriptedReply {
    /// Final text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Single tool call
    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self::default().with_tool_call(name, arguments)
    }

    /// Stream failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: Value) -> Self {
        self.tool_calls.push(ScriptedToolCall {
            id: None,
            name: name.into(),
            arguments,
        });
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn with_chunk_delay(mut self, ms: u64) -> Self {
        self.chunk_delay_ms = ms;
        self
    }
}

/// Split text into word chunks that concatenate back to the input
fn chunks(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(String::from).collect()
}

/// Scripted model client
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Parse a JSON array of replies
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let replies: Vec<ScriptedReply> = serde_json::from_str(json)?;
        Ok(Self::new(replies))
    }

    /// Queue another reply
    pub fn push(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Histories received so far, one per request
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        SCRIPTED_CLIENT_NAME
    }

    fn stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDef>,
        _system_prompt: Option<String>,
    ) -> CompletionStream<'_> {
        let request_index = {
            let mut requests = self.requests.lock();
            requests.push(messages);
            requests.len()
        };
        let reply = self.replies.lock().pop_front();
        debug!(request = request_index, tools = tools.len(), "Scripted request");

        Box::pin(async_stream::stream! {
            let reply = match reply {
                Some(r) => r,
                None => {
                    yield StreamEvent::Error(ProviderError::InvalidResponse(
                        "script exhausted".to_string(),
                    ));
                    return;
                }
            };

            let mut output_words = 0u32;
            if let Some(text) = &reply.text {
                for chunk in chunks(text) {
                    if reply.chunk_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(reply.chunk_delay_ms)).await;
                    }
                    output_words += 1;
                    yield StreamEvent::Text(chunk);
                }
            }

            for (i, call) in reply.tool_calls.iter().enumerate() {
                let id = call
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("call_{}_{}", request_index, i));
                yield StreamEvent::ToolCall(ToolCall::new(id, call.name.clone(), call.arguments.clone()));
            }

            if let Some(error) = reply.error {
                yield StreamEvent::Error(ProviderError::StreamError(error));
                return;
            }

            if reply.hang {
                futures::future::pending::<()>().await;
            }

            yield StreamEvent::Usage(TokenUsage::new(0, output_words));
            yield StreamEvent::Done;
        })
    }
}
