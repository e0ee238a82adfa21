//! Turn Loop - 한 턴의 상태 머신
//!
//! 히스토리를 모델에 보내고, 스트림을 소비하고, 요청된 도구를 실행한 뒤
//! 결과를 붙여 다시 모델을 호출합니다. 최종 답변이 나오거나 중단될 때까지 반복합니다.
//!
//! 턴은 히스토리의 사본(`TurnContext::history`)에서만 작업합니다.
//! 정식 히스토리에 반영할지 버릴지는 런타임이 `TurnResult`를 보고 결정합니다.

use crate::confirm::ConfirmationBroker;
use crate::event::RuntimeEvent;
use crate::history::History;
use crate::state::TurnState;
use futures::future::join_all;
use futures::StreamExt;
use helm_core::ToolExecutor;
use helm_foundation::{
    BroadcastHub, CancellationToken, ConfirmDecision, GateDecision, PendingConfirmation,
    PermissionGate, PermissionSnapshot, ToolError,
};
use helm_provider::{Block, Message, ModelClient, ProviderError, StreamEvent, ToolCall, ToolDef};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 사용자가 거부한 도구 호출의 결과
pub const USER_DENIED: &str = "user denied";

/// 정책으로 거부된 도구 호출의 결과
pub const DENIED_BY_POLICY: &str = "denied by policy";

// ============================================================================
// TurnContext
// ============================================================================

/// 턴 하나의 임시 상태
///
/// Turn Loop가 턴 동안 독점하고, 턴이 끝나면 버려집니다.
#[derive(Debug)]
pub struct TurnContext {
    /// 턴 ID (로그용)
    pub id: Uuid,

    /// 턴 전체의 취소 토큰
    pub cancel: CancellationToken,

    /// 작업용 히스토리 사본
    pub history: History,

    /// 턴 시작 시점의 권한 기록
    pub permissions: PermissionSnapshot,

    /// 아직 블록으로 닫히지 않은 텍스트 조각
    pub accumulator: String,

    /// 현재 응답의 블록 (스트림에 나온 순서)
    pub blocks: Vec<Block>,

    /// 실행 중인 tool_use ID
    pub in_flight: HashSet<String>,

    /// 완료한 도구 라운드 수
    pub rounds: u32,
}

impl TurnContext {
    pub fn new(history: History, cancel: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel,
            history,
            permissions: PermissionSnapshot::default(),
            accumulator: String::new(),
            blocks: Vec::new(),
            in_flight: HashSet::new(),
            rounds: 0,
        }
    }

    fn reset_response(&mut self) {
        self.accumulator.clear();
        self.blocks.clear();
    }

    /// 열린 텍스트를 블록으로 닫음
    fn close_text(&mut self) {
        if !self.accumulator.is_empty() {
            self.blocks.push(Block::text(std::mem::take(&mut self.accumulator)));
        }
    }

    fn push_tool_call(&mut self, call: ToolCall) {
        self.close_text();
        self.blocks.push(Block::from(call));
    }

    /// 현재 응답의 도구 호출 (블록 순서)
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.blocks.iter().filter_map(Block::as_tool_use).collect()
    }

    /// 현재 응답을 assistant 메시지로 꺼냄
    ///
    /// 빈 응답도 빈 텍스트 블록 하나로 남겨 턴이 항상 assistant 메시지로 끝나게 합니다.
    fn take_response(&mut self) -> Message {
        self.close_text();
        let mut blocks = std::mem::take(&mut self.blocks);
        if blocks.is_empty() {
            blocks.push(Block::text(""));
        }
        Message::assistant(blocks)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Turn Loop 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub enum TurnResult {
    /// 최종 답변까지 완료, 반영할 히스토리
    Completed(History),

    /// 취소됨
    Aborted,

    /// 모델 오류 등으로 실패
    Failed(String),
}

/// 턴의 최종 결과 (`TurnHandle::wait`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Aborted,
    Failed(String),
}

impl From<&TurnResult> for TurnOutcome {
    fn from(result: &TurnResult) -> Self {
        match result {
            TurnResult::Completed(_) => Self::Completed,
            TurnResult::Aborted => Self::Aborted,
            TurnResult::Failed(message) => Self::Failed(message.clone()),
        }
    }
}

enum StreamFailure {
    Cancelled,
    Provider(ProviderError),
}

/// 도구 호출 하나의 처리 계획 (게이트 분류 결과)
enum ToolPlan {
    Run,
    Reject(String),
    Ask {
        pending: PendingConfirmation,
        decision: oneshot::Receiver<ConfirmDecision>,
    },
}

// ============================================================================
// TurnLoop
// ============================================================================

/// Turn Loop
pub struct TurnLoop {
    client: Arc<dyn ModelClient>,
    executor: Arc<ToolExecutor>,
    gate: Arc<PermissionGate>,
    hub: Arc<BroadcastHub<RuntimeEvent>>,
    broker: Arc<ConfirmationBroker>,
    system_prompt: Option<String>,
    max_tool_rounds: Option<u32>,
    state: Mutex<TurnState>,
}

impl TurnLoop {
    pub fn new(
        client: Arc<dyn ModelClient>,
        executor: Arc<ToolExecutor>,
        gate: Arc<PermissionGate>,
        hub: Arc<BroadcastHub<RuntimeEvent>>,
        broker: Arc<ConfirmationBroker>,
    ) -> Self {
        Self {
            client,
            executor,
            gate,
            hub,
            broker,
            system_prompt: None,
            max_tool_rounds: None,
            state: Mutex::new(TurnState::Idle),
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// 도구 라운드 상한 (None이면 무제한)
    pub fn with_max_tool_rounds(mut self, limit: Option<u32>) -> Self {
        self.max_tool_rounds = limit;
        self
    }

    pub fn state(&self) -> TurnState {
        *self.state.lock()
    }

    pub fn hub(&self) -> &Arc<BroadcastHub<RuntimeEvent>> {
        &self.hub
    }

    pub fn broker(&self) -> &Arc<ConfirmationBroker> {
        &self.broker
    }

    pub(crate) fn transition(&self, next: TurnState) {
        let mut state = self.state.lock();
        if !state.can_transition_to(next) {
            warn!(from = %*state, to = %next, "Unexpected turn state transition");
        }
        debug!(from = %*state, to = %next, "Turn state");
        *state = next;
    }

    fn publish_history(&self, history: &History) {
        self.hub.publish(RuntimeEvent::HistoryUpdate(history.to_vec()));
    }

    /// 턴 실행
    pub async fn run(&self, ctx: &mut TurnContext) -> TurnResult {
        info!(turn = %ctx.id, messages = ctx.history.len(), "Turn started");
        self.transition(TurnState::Streaming);

        let snapshot = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return self.aborted(ctx),
            snapshot = self.gate.snapshot() => snapshot,
        };
        ctx.permissions = snapshot.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read permission records, asking for everything");
            PermissionSnapshot::default()
        });

        let tools = self.executor.registry().definitions();

        loop {
            if !ctx.history.is_consistent() {
                let unmatched = ctx.history.unmatched_tool_uses();
                warn!(turn = %ctx.id, ?unmatched, "History has unanswered tool calls");
                return TurnResult::Failed(
                    "history has tool calls without exactly one result".to_string(),
                );
            }

            ctx.reset_response();
            match self.stream_response(ctx, tools.clone()).await {
                Ok(()) => {}
                Err(StreamFailure::Cancelled) => return self.aborted(ctx),
                Err(StreamFailure::Provider(e)) => {
                    warn!(turn = %ctx.id, error = %e, "Model stream failed");
                    return TurnResult::Failed(e.to_string());
                }
            }

            if ctx.cancel.is_cancelled() {
                return self.aborted(ctx);
            }

            let calls = ctx.tool_calls();

            // 도구 호출 없음 → 완료
            if calls.is_empty() {
                self.transition(TurnState::Completing);
                let reply = ctx.take_response();
                ctx.history.push(reply);
                info!(turn = %ctx.id, rounds = ctx.rounds, "Turn completed");
                return TurnResult::Completed(std::mem::take(&mut ctx.history));
            }

            ctx.rounds += 1;
            if let Some(limit) = self.max_tool_rounds {
                if ctx.rounds > limit {
                    warn!(turn = %ctx.id, limit, "Tool round limit reached");
                    return TurnResult::Failed(format!("tool round limit ({}) reached", limit));
                }
            }

            let reply = ctx.take_response();
            ctx.history.push(reply);
            self.publish_history(&ctx.history);

            self.transition(TurnState::ToolPending);
            let results = self.run_tools(ctx, &calls).await;

            if ctx.cancel.is_cancelled() {
                return self.aborted(ctx);
            }

            ctx.history.push(Message::tool_results(results));
            self.publish_history(&ctx.history);
            self.transition(TurnState::Streaming);
        }
    }

    fn aborted(&self, ctx: &TurnContext) -> TurnResult {
        info!(turn = %ctx.id, in_flight = ctx.in_flight.len(), "Turn aborted");
        self.transition(TurnState::Aborted);
        TurnResult::Aborted
    }

    /// 모델 스트림 소비
    ///
    /// 텍스트 조각은 누적하면서 바로 브로드캐스트합니다.
    /// 도구 호출이 오면 그 앞의 텍스트는 별도 블록으로 닫힙니다.
    /// 취소 시 스트림은 drop 되어 닫힙니다.
    async fn stream_response(
        &self,
        ctx: &mut TurnContext,
        tools: Vec<ToolDef>,
    ) -> Result<(), StreamFailure> {
        let mut stream = self
            .client
            .stream(ctx.history.to_vec(), tools, self.system_prompt.clone());

        loop {
            let event = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(StreamFailure::Cancelled),
                event = stream.next() => event,
            };

            match event {
                Some(StreamEvent::Text(text)) => {
                    ctx.accumulator.push_str(&text);
                    self.hub.publish(RuntimeEvent::StreamToken(text));
                }
                Some(StreamEvent::ToolCall(call)) => {
                    debug!(turn = %ctx.id, tool = %call.name, id = %call.id, "Tool call requested");
                    ctx.push_tool_call(call);
                }
                Some(StreamEvent::Usage(usage)) => {
                    debug!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "Token usage"
                    );
                }
                Some(StreamEvent::Error(e)) => return Err(StreamFailure::Provider(e)),
                Some(StreamEvent::Done) | None => return Ok(()),
            }
        }
    }

    /// 도구 배치 실행
    ///
    /// 게이트 분류와 확인 요청 발행은 호출 순서대로 먼저 끝내고,
    /// 실행은 동시에 진행합니다. 결과는 tool_use 순서와 같습니다.
    async fn run_tools(&self, ctx: &mut TurnContext, calls: &[ToolCall]) -> Vec<Block> {
        let registry = self.executor.registry();

        let mut plans = Vec::with_capacity(calls.len());
        for call in calls {
            let plan = match registry.get(&call.name) {
                // 알 수 없는 도구는 실행기가 실패로 보고
                None => ToolPlan::Run,
                Some(tool) => {
                    match self
                        .gate
                        .classify(&ctx.permissions, tool.as_ref(), &call.id, &call.arguments)
                    {
                        GateDecision::Allow => ToolPlan::Run,
                        GateDecision::Deny { reason } => {
                            debug!(tool = %call.name, %reason, "Tool call rejected");
                            ToolPlan::Reject(DENIED_BY_POLICY.to_string())
                        }
                        GateDecision::Ask(pending) => {
                            let decision = self.broker.register(pending.clone());
                            self.hub.publish(RuntimeEvent::ConfirmRequest(pending.clone()));
                            ToolPlan::Ask { pending, decision }
                        }
                    }
                }
            };
            plans.push(plan);
        }

        ctx.in_flight = calls.iter().map(|c| c.id.clone()).collect();
        let cancel = ctx.cancel.clone();
        let results = join_all(
            calls
                .iter()
                .zip(plans)
                .map(|(call, plan)| self.resolve_call(call, plan, &cancel)),
        )
        .await;
        ctx.in_flight.clear();

        results
    }

    async fn resolve_call(
        &self,
        call: &ToolCall,
        plan: ToolPlan,
        cancel: &CancellationToken,
    ) -> Block {
        match plan {
            ToolPlan::Run => self.execute(call, cancel).await,
            ToolPlan::Reject(message) => Block::tool_error(&call.id, message),
            ToolPlan::Ask { pending, decision } => {
                let decision = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    received = decision => received.ok(),
                };

                match decision {
                    None => Block::tool_error(&call.id, ToolError::Cancelled.to_string()),
                    Some(ConfirmDecision::Deny) => Block::tool_error(&call.id, USER_DENIED),
                    Some(ConfirmDecision::Approve { remember }) => {
                        if remember {
                            if let Err(e) = self.gate.remember(&pending).await {
                                warn!(tool = %pending.tool_name, error = %e, "Failed to store permission");
                            }
                        }
                        self.execute(call, cancel).await
                    }
                }
            }
        }
    }

    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> Block {
        let token = cancel.child_token();
        match self
            .executor
            .execute(&call.name, &call.id, call.arguments.clone(), &token)
            .await
        {
            Ok(output) => Block::tool_result(&call.id, output.content, output.images),
            Err(e) => {
                debug!(tool = %call.name, error = %e, "Tool call failed");
                Block::tool_error(&call.id, e.to_string())
            }
        }
    }
}
