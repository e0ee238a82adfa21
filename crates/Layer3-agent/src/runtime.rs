//! Agent Runtime - 외부 표면(CLI, UI)이 사용하는 진입점
//!
//! 정식 히스토리를 소유하고, 한 번에 하나의 턴만 실행합니다.
//! 턴은 히스토리 사본에서 동작하며 완료되었을 때만 반영되고,
//! 중단되거나 실패하면 턴 시작 전 히스토리가 그대로 남습니다.
//!
//! ```text
//! send_message ──► TurnLoop (spawned) ──► finish ──► persist ──► TurnHandle
//!      │                  │
//!      │                  └── ConfirmRequest ──► confirm_response
//!      └── Busy (턴 진행 중)
//! ```

use crate::confirm::{ConfirmOutcome, ConfirmationBroker};
use crate::error::RuntimeError;
use crate::event::RuntimeEvent;
use crate::history::History;
use crate::session::SessionStore;
use crate::state::TurnState;
use crate::turn::{TurnContext, TurnLoop, TurnOutcome, TurnResult};
use futures::FutureExt;
use helm_core::{ToolExecutor, ToolRegistry};
use helm_foundation::{
    BroadcastHub, CancellationToken, ConfirmDecision, ConfirmationId, MemoryPermissionStore,
    Observer, ObserverId, ObserverReceiver, PendingConfirmation, PermissionGate, PermissionStore,
    Result, RuntimeConfig,
};
use helm_provider::{Message, ModelClient};
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ============================================================================
// TurnHandle
// ============================================================================

/// 실행 중인 턴의 핸들
///
/// 턴은 핸들을 버려도 계속 진행됩니다.
#[derive(Debug, Clone)]
pub struct TurnHandle {
    id: Uuid,
    done: watch::Receiver<Option<TurnOutcome>>,
}

impl TurnHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 끝났으면 결과, 아니면 None
    pub fn outcome(&self) -> Option<TurnOutcome> {
        self.done.borrow().clone()
    }

    /// 턴이 끝날 때까지 대기 (히스토리 반영과 저장까지 끝난 뒤 반환)
    pub async fn wait(mut self) -> TurnOutcome {
        wait_done(&mut self.done).await
    }
}

async fn wait_done(done: &mut watch::Receiver<Option<TurnOutcome>>) -> TurnOutcome {
    match done.wait_for(|outcome| outcome.is_some()).await {
        Ok(outcome) => outcome
            .clone()
            .unwrap_or_else(|| TurnOutcome::Failed("turn ended without an outcome".to_string())),
        Err(_) => TurnOutcome::Failed("turn task ended unexpectedly".to_string()),
    }
}

// ============================================================================
// Runtime State
// ============================================================================

struct ActiveTurn {
    id: Uuid,
    cancel: CancellationToken,
    done: watch::Receiver<Option<TurnOutcome>>,
}

struct RuntimeState {
    history: History,
    active: Option<ActiveTurn>,
}

struct RuntimeInner {
    turn_loop: TurnLoop,
    gate: Arc<PermissionGate>,
    sessions: Option<Arc<dyn SessionStore>>,
    session_id: String,
    state: Mutex<RuntimeState>,
    /// 저장 순서 보장 (항상 최신 히스토리를 씀)
    persist_lock: tokio::sync::Mutex<()>,
}

impl RuntimeInner {
    fn hub(&self) -> &Arc<BroadcastHub<RuntimeEvent>> {
        self.turn_loop.hub()
    }

    fn broker(&self) -> &Arc<ConfirmationBroker> {
        self.turn_loop.broker()
    }

    async fn drive(
        self: Arc<Self>,
        mut ctx: TurnContext,
        done: watch::Sender<Option<TurnOutcome>>,
    ) {
        let turn_id = ctx.id;
        let result = match AssertUnwindSafe(self.turn_loop.run(&mut ctx))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(turn = %turn_id, "Turn loop panicked");
                TurnResult::Failed("internal error while running the turn".to_string())
            }
        };

        let outcome = self.finish(turn_id, result);
        self.persist().await;
        let _ = done.send(Some(outcome));
    }

    /// 턴 결과 반영 (정식 히스토리 갱신, 종료 이벤트 발행, Idle 복귀)
    fn finish(&self, turn_id: Uuid, result: TurnResult) -> TurnOutcome {
        let outcome = TurnOutcome::from(&result);
        let mut state = self.state.lock();

        match result {
            TurnResult::Completed(history) => {
                state.history = history;
                self.hub()
                    .publish(RuntimeEvent::HistoryUpdate(state.history.to_vec()));
                self.hub().publish(RuntimeEvent::Done);
            }
            // 정식 히스토리는 턴 동안 건드리지 않았으므로 그대로가 롤백 결과
            TurnResult::Aborted => {
                self.hub().publish(RuntimeEvent::Aborted);
                self.hub()
                    .publish(RuntimeEvent::HistoryUpdate(state.history.to_vec()));
            }
            TurnResult::Failed(message) => {
                self.hub().publish(RuntimeEvent::Error(message));
                self.hub()
                    .publish(RuntimeEvent::HistoryUpdate(state.history.to_vec()));
            }
        }

        let dropped = self.broker().cancel_all();
        if dropped > 0 {
            debug!(turn = %turn_id, dropped, "Discarded unanswered confirmations");
        }

        if state.active.as_ref().map(|a| a.id) == Some(turn_id) {
            state.active = None;
        }
        self.turn_loop.transition(TurnState::Idle);

        info!(turn = %turn_id, ?outcome, messages = state.history.len(), "Turn finished");
        outcome
    }

    async fn persist(&self) {
        let Some(store) = &self.sessions else {
            return;
        };

        let _guard = self.persist_lock.lock().await;
        let messages = self.state.lock().history.to_vec();
        if let Err(e) = store.save(&self.session_id, &messages).await {
            warn!(session = %self.session_id, error = %e, "Failed to save session");
        }
    }
}

// ============================================================================
// AgentRuntime
// ============================================================================

/// Agent Runtime
///
/// 복제 비용이 싸며, 복제본은 같은 런타임을 가리킵니다.
#[derive(Clone)]
pub struct AgentRuntime {
    inner: Arc<RuntimeInner>,
}

impl AgentRuntime {
    pub fn builder(client: Arc<dyn ModelClient>) -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new(client)
    }

    // ========================================================================
    // 턴 제어
    // ========================================================================

    /// 사용자 메시지로 새 턴 시작
    ///
    /// 턴이 진행 중이면 `Busy`를 반환하고 아무것도 바꾸지 않습니다.
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn send_message(
        &self,
        content: impl Into<String>,
    ) -> std::result::Result<TurnHandle, RuntimeError> {
        let (ctx, done_tx, handle) = {
            let mut state = self.inner.state.lock();
            if state.active.is_some() {
                debug!("Message rejected, turn in progress");
                return Err(RuntimeError::Busy);
            }

            let mut working = state.history.clone();
            working.push(Message::user(content));

            let cancel = CancellationToken::new();
            let ctx = TurnContext::new(working, cancel.clone());
            let (done_tx, done_rx) = watch::channel(None);

            state.active = Some(ActiveTurn {
                id: ctx.id,
                cancel,
                done: done_rx.clone(),
            });
            self.inner
                .hub()
                .publish(RuntimeEvent::HistoryUpdate(ctx.history.to_vec()));

            let handle = TurnHandle {
                id: ctx.id,
                done: done_rx,
            };
            (ctx, done_tx, handle)
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.drive(ctx, done_tx));
        Ok(handle)
    }

    /// 진행 중인 턴 취소
    ///
    /// 턴이 Idle로 돌아올 때까지 기다립니다. 턴이 없으면 아무 일도 하지 않고
    /// `false`를 반환합니다. 여러 번 호출해도 안전합니다.
    pub async fn abort(&self) -> bool {
        let active = {
            let state = self.inner.state.lock();
            state
                .active
                .as_ref()
                .map(|a| (a.id, a.cancel.clone(), a.done.clone()))
        };

        let Some((turn_id, cancel, mut done)) = active else {
            debug!("Abort requested with no active turn");
            return false;
        };

        info!(turn = %turn_id, "Abort requested");
        cancel.cancel();
        wait_done(&mut done).await;
        true
    }

    /// 확인 요청에 대한 사람의 응답
    ///
    /// 알 수 없는 ID(이미 처리됨, 턴 종료 등)는 무시하고 `Unknown`을 반환합니다.
    pub fn confirm_response(
        &self,
        id: &ConfirmationId,
        approved: bool,
        remember: bool,
    ) -> ConfirmOutcome {
        self.inner
            .broker()
            .resolve(id, ConfirmDecision::from_response(approved, remember))
    }

    // ========================================================================
    // 히스토리
    // ========================================================================

    /// 히스토리 교체 (세션 복원 등)
    pub async fn load_history(
        &self,
        messages: Vec<Message>,
    ) -> std::result::Result<(), RuntimeError> {
        {
            let mut state = self.inner.state.lock();
            if state.active.is_some() {
                return Err(RuntimeError::TurnActive);
            }
            state.history = History::from(messages);
            self.inner
                .hub()
                .publish(RuntimeEvent::HistoryUpdate(state.history.to_vec()));
        }
        self.inner.persist().await;
        Ok(())
    }

    /// 히스토리 비우기
    pub async fn clear_history(&self) -> std::result::Result<(), RuntimeError> {
        self.load_history(Vec::new()).await
    }

    /// 정식 히스토리 (턴 진행 중에는 턴 시작 전 내용)
    pub fn history(&self) -> Vec<Message> {
        self.inner.state.lock().history.to_vec()
    }

    // ========================================================================
    // Observer
    // ========================================================================

    pub fn attach_observer(&self, observer: Arc<dyn Observer<RuntimeEvent>>) -> ObserverId {
        self.inner.hub().attach(observer)
    }

    /// 채널로 이벤트 수신
    pub fn subscribe(
        &self,
        name: impl Into<String>,
    ) -> (ObserverId, ObserverReceiver<RuntimeEvent>) {
        self.inner.hub().subscribe(name)
    }

    /// 등록되지 않은 ID면 false
    pub fn detach_observer(&self, id: ObserverId) -> bool {
        self.inner.hub().detach(id)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn state(&self) -> TurnState {
        self.inner.turn_loop.state()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.state.lock().active.is_some()
    }

    pub fn pending_confirmations(&self) -> Vec<PendingConfirmation> {
        self.inner.broker().pending()
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.inner.gate
    }

    pub fn hub(&self) -> &Arc<BroadcastHub<RuntimeEvent>> {
        self.inner.hub()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Agent Runtime 빌더
pub struct AgentRuntimeBuilder {
    client: Arc<dyn ModelClient>,
    config: RuntimeConfig,
    registry: Option<Arc<ToolRegistry>>,
    permission_store: Option<Arc<dyn PermissionStore>>,
    sessions: Option<Arc<dyn SessionStore>>,
    session_id: Option<String>,
    history: Vec<Message>,
}

impl AgentRuntimeBuilder {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            config: RuntimeConfig::default(),
            registry: None,
            permission_store: None,
            sessions: None,
            session_id: None,
            history: Vec::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// 도구 레지스트리 (기본: 내장 도구)
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 권한 기록 저장소 (기본: 메모리)
    pub fn permission_store(mut self, store: Arc<dyn PermissionStore>) -> Self {
        self.permission_store = Some(store);
        self
    }

    /// 세션 저장소와 세션 ID
    pub fn session(mut self, store: Arc<dyn SessionStore>, session_id: impl Into<String>) -> Self {
        self.sessions = Some(store);
        self.session_id = Some(session_id.into());
        self
    }

    /// 초기 히스토리
    pub fn history(mut self, messages: Vec<Message>) -> Self {
        self.history = messages;
        self
    }

    pub fn build(self) -> Result<AgentRuntime> {
        let working_dir: PathBuf = self.config.resolve_working_dir()?;

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::with_builtins(&self.config)));
        let tool_count = registry.len();
        let executor = Arc::new(ToolExecutor::new(registry, working_dir.clone()));

        let store = self
            .permission_store
            .unwrap_or_else(|| Arc::new(MemoryPermissionStore::new()));
        let gate = Arc::new(
            PermissionGate::new(store, working_dir)
                .with_auto_approve_tools(self.config.auto_approve_tools.iter().cloned())
                .with_denied_tools(self.config.denied_tools.iter().cloned()),
        );

        let turn_loop = TurnLoop::new(
            self.client,
            executor,
            Arc::clone(&gate),
            Arc::new(BroadcastHub::new()),
            Arc::new(ConfirmationBroker::new()),
        )
        .with_system_prompt(self.config.system_prompt.clone())
        .with_max_tool_rounds(self.config.tool_round_limit());

        let session_id = self
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        debug!(session = %session_id, tools = tool_count, "Runtime ready");

        Ok(AgentRuntime {
            inner: Arc::new(RuntimeInner {
                turn_loop,
                gate,
                sessions: self.sessions,
                session_id,
                state: Mutex::new(RuntimeState {
                    history: History::from(self.history),
                    active: None,
                }),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }
}
