//! Conversation history
//!
//! 순서가 있는 Message 목록. 턴 도중에는 append만 허용되고,
//! 통째로 바꾸는 것은 load/clear 뿐입니다.

use helm_provider::{Message, MessageRole};
use std::collections::HashSet;

/// 대화 히스토리
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 결과가 붙지 않은 tool_use ID 목록
    ///
    /// tool_use를 가진 assistant 메시지 바로 다음 user 메시지에
    /// 같은 ID의 tool_result가 정확히 하나씩 있어야 합니다.
    pub fn unmatched_tool_uses(&self) -> Vec<String> {
        let mut unmatched = Vec::new();

        for (idx, message) in self.messages.iter().enumerate() {
            if message.role != MessageRole::Assistant || !message.has_tool_uses() {
                continue;
            }

            let results: Vec<&str> = match self.messages.get(idx + 1) {
                Some(next) if next.role == MessageRole::User => next.tool_result_ids(),
                _ => Vec::new(),
            };

            for call in message.tool_uses() {
                if results.iter().filter(|id| **id == call.id).count() != 1 {
                    unmatched.push(call.id);
                }
            }
        }

        unmatched
    }

    /// 모델 호출 전에 지켜져야 하는 조건
    pub fn is_consistent(&self) -> bool {
        self.unmatched_tool_uses().is_empty() && !self.has_duplicate_tool_use_ids()
    }

    fn has_duplicate_tool_use_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.messages
            .iter()
            .flat_map(|m| m.tool_uses())
            .any(|call| !seen.insert(call.id))
    }
}

impl From<Vec<Message>> for History {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}
