//! Runtime events delivered through the Broadcast Hub

use helm_foundation::{HubEvent, PendingConfirmation};
use helm_provider::Message;
use serde::Serialize;

/// 런타임 이벤트
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum RuntimeEvent {
    /// 모델 스트림 텍스트 조각
    StreamToken(String),

    /// 전체 히스토리 스냅샷
    HistoryUpdate(Vec<Message>),

    /// 사람의 확인이 필요한 도구 호출
    ConfirmRequest(PendingConfirmation),

    /// 턴 완료
    Done,

    /// 턴 실패 (히스토리는 턴 시작 전으로 복원됨)
    Error(String),

    /// 턴 중단 (히스토리는 턴 시작 전으로 복원됨)
    Aborted,
}

impl RuntimeEvent {
    /// 턴을 끝내는 이벤트인지
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_) | Self::Aborted)
    }
}

impl HubEvent for RuntimeEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::StreamToken(_) => "stream-token",
            Self::HistoryUpdate(_) => "history-update",
            Self::ConfirmRequest(_) => "confirm-request",
            Self::Done => "done",
            Self::Error(_) => "error",
            Self::Aborted => "aborted",
        }
    }
}
