//! Confirmation Broker - 대기 중인 확인 요청 관리
//!
//! Turn Loop가 `register`로 대기 채널을 만들고, 런타임의
//! `confirm_response`가 `resolve`로 정확히 하나를 해소합니다.

use helm_foundation::{ConfirmDecision, ConfirmationId, PendingConfirmation};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// 확인 응답 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// 대기 중인 요청을 해소함
    Resolved,

    /// 해당 ID의 요청이 없음 (이미 처리됐거나 턴이 끝남)
    Unknown,
}

struct Waiting {
    pending: PendingConfirmation,
    sender: oneshot::Sender<ConfirmDecision>,
}

/// 확인 요청 브로커
#[derive(Default)]
pub struct ConfirmationBroker {
    waiting: Mutex<HashMap<ConfirmationId, Waiting>>,
}

impl ConfirmationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 확인 요청 등록, 결정을 받을 채널 반환
    pub fn register(&self, pending: PendingConfirmation) -> oneshot::Receiver<ConfirmDecision> {
        let (sender, receiver) = oneshot::channel();
        debug!(id = %pending.id, tool = %pending.tool_name, "Awaiting confirmation");
        self.waiting
            .lock()
            .insert(pending.id.clone(), Waiting { pending, sender });
        receiver
    }

    /// 결정 전달
    pub fn resolve(&self, id: &ConfirmationId, decision: ConfirmDecision) -> ConfirmOutcome {
        let Some(waiting) = self.waiting.lock().remove(id) else {
            warn!(id = %id, "Confirmation response for unknown request");
            return ConfirmOutcome::Unknown;
        };

        debug!(id = %id, tool = %waiting.pending.tool_name, ?decision, "Confirmation resolved");
        if waiting.sender.send(decision).is_err() {
            // 대기하던 쪽이 이미 사라짐 (취소된 턴)
            return ConfirmOutcome::Unknown;
        }
        ConfirmOutcome::Resolved
    }

    /// 대기 중인 요청 목록
    pub fn pending(&self) -> Vec<PendingConfirmation> {
        self.waiting
            .lock()
            .values()
            .map(|w| w.pending.clone())
            .collect()
    }

    pub fn is_waiting(&self, id: &ConfirmationId) -> bool {
        self.waiting.lock().contains_key(id)
    }

    /// 모든 요청 폐기 (턴 종료 시)
    pub fn cancel_all(&self) -> usize {
        let mut waiting = self.waiting.lock();
        let count = waiting.len();
        waiting.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(tool: &str) -> PendingConfirmation {
        PendingConfirmation {
            id: ConfirmationId::new(),
            tool_use_id: "call_1".into(),
            tool_name: tool.into(),
            description: format!("{}: .", tool),
            arguments: json!({"path": "."}),
            path: Some("/work".into()),
        }
    }

    #[tokio::test]
    async fn test_resolve_exactly_once() {
        let broker = ConfirmationBroker::new();
        let request = pending("list_dir");
        let id = request.id.clone();
        let rx = broker.register(request);

        assert!(broker.is_waiting(&id));
        assert_eq!(
            broker.resolve(&id, ConfirmDecision::Approve { remember: false }),
            ConfirmOutcome::Resolved
        );
        assert_eq!(rx.await.unwrap(), ConfirmDecision::Approve { remember: false });

        assert_eq!(broker.resolve(&id, ConfirmDecision::Deny), ConfirmOutcome::Unknown);
    }

    #[test]
    fn test_unknown_id() {
        let broker = ConfirmationBroker::new();
        let _rx = broker.register(pending("bash"));
        assert_eq!(
            broker.resolve(&ConfirmationId::from("nope"), ConfirmDecision::Deny),
            ConfirmOutcome::Unknown
        );
        assert_eq!(broker.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_all_drops_waiters() {
        let broker = ConfirmationBroker::new();
        let rx = broker.register(pending("write_file"));

        assert_eq!(broker.cancel_all(), 1);
        assert!(rx.await.is_err());
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_receiver_gone() {
        let broker = ConfirmationBroker::new();
        let request = pending("bash");
        let id = request.id.clone();
        drop(broker.register(request));

        assert_eq!(broker.resolve(&id, ConfirmDecision::Deny), ConfirmOutcome::Unknown);
    }
}
