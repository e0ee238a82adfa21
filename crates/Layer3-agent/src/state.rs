//! Turn state machine
//!
//! ```text
//! Idle ──> Streaming ──> ToolPending ──> Streaming ──> ... ──> Completing ──> Idle
//!              │              │
//!              └──────────────┴──> Aborted ──> Idle
//! ```

use serde::Serialize;
use std::fmt;

/// 턴 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// 진행 중인 턴 없음
    #[default]
    Idle,

    /// 모델 응답 스트리밍 중
    Streaming,

    /// 도구 호출 처리 중 (확인 대기 포함)
    ToolPending,

    /// 최종 응답 확정 중
    Completing,

    /// 중단됨
    Aborted,
}

impl TurnState {
    /// 턴이 진행 중인지
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// 허용된 전이인지
    pub fn can_transition_to(&self, next: TurnState) -> bool {
        use TurnState::*;
        match (self, next) {
            (Idle, Streaming) => true,
            (Streaming, ToolPending | Completing) => true,
            (ToolPending, Streaming) => true,
            // 실패는 어느 활성 상태에서든 Idle로
            (Streaming | ToolPending | Completing | Aborted, Idle) => true,
            (Streaming | ToolPending, Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::ToolPending => "tool_pending",
            Self::Completing => "completing",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
