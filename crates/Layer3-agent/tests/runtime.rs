//! Agent Runtime 통합 테스트
//!
//! ScriptedClient로 모델 응답을 고정하고, 구독 채널로 이벤트 순서를 확인합니다.

use async_trait::async_trait;
use helm_agent::{
    AgentRuntime, ConfirmOutcome, MemorySessionStore, RuntimeError, RuntimeEvent, SessionStore,
    TurnOutcome, TurnState, DENIED_BY_POLICY, USER_DENIED,
};
use helm_foundation::{
    ConfirmationId, MemoryPermissionStore, Observer, ObserverReceiver, PendingConfirmation,
    PermissionStore, RuntimeConfig,
};
use helm_provider::{
    Block, CompletionStream, Message, MessageRole, ModelClient, ScriptedClient, ScriptedReply,
    StreamEvent, ToolCall, ToolDef,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Helpers
// ============================================================================

fn config(dir: &Path) -> RuntimeConfig {
    RuntimeConfig::default().with_working_dir(dir)
}

fn runtime(client: &Arc<ScriptedClient>, config: RuntimeConfig) -> AgentRuntime {
    AgentRuntime::builder(client.clone())
        .config(config)
        .build()
        .unwrap()
}

async fn next_event(rx: &mut ObserverReceiver<RuntimeEvent>) -> RuntimeEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("hub closed")
}

async fn next_confirm(rx: &mut ObserverReceiver<RuntimeEvent>) -> PendingConfirmation {
    loop {
        if let RuntimeEvent::ConfirmRequest(pending) = next_event(rx).await {
            return pending;
        }
    }
}

/// 종료 이벤트까지 수집 (종료 이벤트 포함)
async fn until_terminal(rx: &mut ObserverReceiver<RuntimeEvent>) -> Vec<RuntimeEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

fn tokens(events: &[RuntimeEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RuntimeEvent::StreamToken(t) => Some(t.clone()),
            _ => None,
        })
        .collect()
}

/// 스트림 이벤트를 그대로 재생하는 클라이언트 (요청마다 한 묶음)
struct EventClient {
    replies: Mutex<VecDeque<Vec<StreamEvent>>>,
}

impl EventClient {
    fn new(replies: impl IntoIterator<Item = Vec<StreamEvent>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }
}

impl ModelClient for EventClient {
    fn name(&self) -> &str {
        "events"
    }

    fn stream(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<ToolDef>,
        _system_prompt: Option<String>,
    ) -> CompletionStream<'_> {
        let events = self.replies.lock().pop_front().unwrap_or_default();
        Box::pin(futures::stream::iter(events))
    }
}

fn tool_result(message: &Message) -> (String, Value, bool) {
    match &message.content[0] {
        Block::ToolResult {
            tool_use_id,
            content,
            is_error,
            ..
        } => (tool_use_id.clone(), content.clone(), *is_error),
        other => panic!("expected tool result, got {:?}", other),
    }
}

// ============================================================================
// 기본 턴
// ============================================================================

#[tokio::test]
async fn test_text_turn_streams_and_commits() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::text("Hello there friend")]));
    let rt = runtime(&client, config(dir.path()));
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("hi").unwrap();
    assert_eq!(handle.wait().await, TurnOutcome::Completed);

    let events = until_terminal(&mut rx).await;
    assert!(matches!(&events[0], RuntimeEvent::HistoryUpdate(h) if h.len() == 1));
    assert_eq!(tokens(&events).concat(), "Hello there friend");
    assert!(matches!(&events[events.len() - 2], RuntimeEvent::HistoryUpdate(h) if h.len() == 2));
    assert_eq!(events.last(), Some(&RuntimeEvent::Done));

    let history = rt.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text(), "hi");
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].text(), "Hello there friend");
    assert_eq!(rt.state(), TurnState::Idle);
    assert!(!rt.is_busy());
}

#[tokio::test]
async fn test_model_sees_full_history() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::text("first"),
        ScriptedReply::text("second"),
    ]));
    let rt = runtime(&client, config(dir.path()));

    rt.send_message("one").unwrap().wait().await;
    rt.send_message("two").unwrap().wait().await;

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].len(), 1);
    assert_eq!(requests[1].len(), 3);
    assert_eq!(requests[1][2].text(), "two");
    assert_eq!(rt.history().len(), 4);
}

// ============================================================================
// 확인 요청
// ============================================================================

#[tokio::test]
async fn test_confirm_without_remember_asks_again() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("list_dir", json!({"path": "."})),
        ScriptedReply::text("listed"),
        ScriptedReply::tool_call("list_dir", json!({"path": "."})),
        ScriptedReply::text("gave up"),
    ]));
    let rt = runtime(&client, config(dir.path()));
    let (_, mut rx) = rt.subscribe("test");

    // 첫 턴: 승인
    let handle = rt.send_message("list files").unwrap();
    let pending = next_confirm(&mut rx).await;
    assert_eq!(pending.tool_name, "list_dir");
    assert_eq!(pending.tool_use_id, "call_1_0");
    assert_eq!(rt.state(), TurnState::ToolPending);
    assert_eq!(rt.pending_confirmations().len(), 1);
    assert_eq!(
        rt.confirm_response(&pending.id, true, false),
        ConfirmOutcome::Resolved
    );
    assert_eq!(handle.wait().await, TurnOutcome::Completed);

    let history = rt.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[1].tool_uses()[0].name, "list_dir");
    let (id, content, is_error) = tool_result(&history[2]);
    assert_eq!(id, "call_1_0");
    assert!(!is_error);
    assert_eq!(content["entries"], json!(["a.txt"]));
    assert_eq!(history[3].text(), "listed");

    // 두 번째 턴: 기억하지 않았으므로 다시 묻고, 이번엔 거부
    until_terminal(&mut rx).await;
    let handle = rt.send_message("again").unwrap();
    let pending = next_confirm(&mut rx).await;
    assert_eq!(pending.tool_use_id, "call_3_0");
    rt.confirm_response(&pending.id, false, true);
    assert_eq!(handle.wait().await, TurnOutcome::Completed);

    let history = rt.history();
    assert_eq!(history.len(), 8);
    let (_, content, is_error) = tool_result(&history[6]);
    assert!(is_error);
    assert_eq!(content, json!(USER_DENIED));
    assert_eq!(history[7].text(), "gave up");
}

#[tokio::test]
async fn test_remember_skips_later_confirmation() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("x").display().to_string();
    let store = Arc::new(MemoryPermissionStore::new());
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("write_file", json!({"path": target, "content": "one"})),
        ScriptedReply::text("written"),
        ScriptedReply::tool_call("write_file", json!({"path": target, "content": "two"})),
        ScriptedReply::text("rewritten"),
    ]));
    let rt = AgentRuntime::builder(client.clone())
        .config(config(dir.path()))
        .permission_store(store.clone())
        .build()
        .unwrap();
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("write it").unwrap();
    let pending = next_confirm(&mut rx).await;
    assert_eq!(pending.path.as_deref(), Some(target.as_str()));
    rt.confirm_response(&pending.id, true, true);
    assert_eq!(handle.wait().await, TurnOutcome::Completed);
    until_terminal(&mut rx).await;

    let records = store.get_permissions().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool, "write_file");

    // 같은 도구/경로는 묻지 않음
    let handle = rt.send_message("write it again").unwrap();
    assert_eq!(handle.wait().await, TurnOutcome::Completed);
    let events = until_terminal(&mut rx).await;
    assert!(!events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::ConfirmRequest(_))));
    assert_eq!(std::fs::read_to_string(dir.path().join("x")).unwrap(), "two");
}

#[tokio::test]
async fn test_remember_does_not_cover_calls_in_same_batch() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("same.txt").display().to_string();
    let store = Arc::new(MemoryPermissionStore::new());
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("write_file", json!({"path": target, "content": "one"}))
            .with_tool_call("write_file", json!({"path": target, "content": "two"})),
        ScriptedReply::text("done"),
    ]));
    let rt = AgentRuntime::builder(client.clone())
        .config(config(dir.path()))
        .permission_store(store.clone())
        .build()
        .unwrap();
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("write twice").unwrap();
    let first = next_confirm(&mut rx).await;
    let second = next_confirm(&mut rx).await;
    assert_eq!(first.tool_use_id, "call_1_0");
    assert_eq!(second.tool_use_id, "call_1_1");

    // 첫 번째를 기억해도 같은 배치의 두 번째는 여전히 대기
    rt.confirm_response(&first.id, true, true);
    assert_eq!(rt.pending_confirmations().len(), 1);
    assert_eq!(rt.pending_confirmations()[0].id, second.id);
    assert_eq!(
        rt.confirm_response(&second.id, false, false),
        ConfirmOutcome::Resolved
    );
    assert_eq!(handle.wait().await, TurnOutcome::Completed);

    let history = rt.history();
    assert_eq!(history[2].tool_result_ids(), vec!["call_1_0", "call_1_1"]);
    match &history[2].content[..] {
        [Block::ToolResult {
            is_error: false, ..
        }, Block::ToolResult {
            content,
            is_error: true,
            ..
        }] => assert_eq!(content, &json!(USER_DENIED)),
        other => panic!("unexpected results: {:?}", other),
    }
    assert_eq!(store.get_permissions().await.unwrap().len(), 1);
    assert_eq!(std::fs::read_to_string(dir.path().join("same.txt")).unwrap(), "one");
}

#[tokio::test]
async fn test_unknown_confirmation_is_ignored() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([]));
    let rt = runtime(&client, config(dir.path()));

    let outcome = rt.confirm_response(&ConfirmationId::from("nope"), true, true);
    assert_eq!(outcome, ConfirmOutcome::Unknown);
    assert!(!rt.is_busy());
    assert!(rt.history().is_empty());
}

#[tokio::test]
async fn test_policy_and_unknown_tools() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("bash", json!({"command": "echo hi"}))
            .with_tool_call("no_such_tool", json!({})),
        ScriptedReply::text("ok"),
    ]));
    let rt = runtime(&client, config(dir.path()).with_denied_tool("bash"));
    let (_, mut rx) = rt.subscribe("test");

    assert_eq!(
        rt.send_message("go").unwrap().wait().await,
        TurnOutcome::Completed
    );
    let events = until_terminal(&mut rx).await;
    assert!(!events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::ConfirmRequest(_))));

    let history = rt.history();
    let results = &history[2];
    assert_eq!(results.tool_result_ids(), vec!["call_1_0", "call_1_1"]);
    match &results.content[..] {
        [Block::ToolResult {
            content: denied,
            is_error: true,
            ..
        }, Block::ToolResult {
            content: unknown,
            is_error: true,
            ..
        }] => {
            assert_eq!(denied, &json!(DENIED_BY_POLICY));
            assert_eq!(unknown, &json!("Execution failed: Unknown tool: no_such_tool"));
        }
        other => panic!("unexpected results: {:?}", other),
    }
}

#[tokio::test]
async fn test_parallel_results_keep_call_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    std::fs::write(dir.path().join("b.txt"), "beta").unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("read_file", json!({"path": "a.txt"}))
            .with_tool_call("read_file", json!({"path": "b.txt"}))
            .with_text("reading both"),
        ScriptedReply::text("done"),
    ]));
    let rt = runtime(&client, config(dir.path()));

    rt.send_message("read").unwrap().wait().await;

    let history = rt.history();
    assert_eq!(history[1].text(), "reading both");
    assert_eq!(history[1].tool_uses().len(), 2);
    assert_eq!(history[2].tool_result_ids(), vec!["call_1_0", "call_1_1"]);
}

#[tokio::test]
async fn test_text_around_tool_call_keeps_stream_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    let client = Arc::new(EventClient::new([
        vec![
            StreamEvent::Text("before ".into()),
            StreamEvent::ToolCall(ToolCall::new("t1", "read_file", json!({"path": "a.txt"}))),
            StreamEvent::Text("after".into()),
            StreamEvent::Done,
        ],
        vec![StreamEvent::Text("done".into()), StreamEvent::Done],
    ]));
    let rt = AgentRuntime::builder(client)
        .config(config(dir.path()))
        .build()
        .unwrap();
    let (_, mut rx) = rt.subscribe("test");

    assert_eq!(
        rt.send_message("read").unwrap().wait().await,
        TurnOutcome::Completed
    );
    let events = until_terminal(&mut rx).await;
    assert_eq!(tokens(&events), vec!["before ", "after", "done"]);

    let history = rt.history();
    assert_eq!(history.len(), 4);
    match &history[1].content[..] {
        [Block::Text { text: first }, Block::ToolUse { id, name, .. }, Block::Text { text: second }] => {
            assert_eq!(first, "before ");
            assert_eq!((id.as_str(), name.as_str()), ("t1", "read_file"));
            assert_eq!(second, "after");
        }
        other => panic!("unexpected assistant blocks: {:?}", other),
    }
    let (id, content, is_error) = tool_result(&history[2]);
    assert_eq!(id, "t1");
    assert!(!is_error);
    assert!(content.to_string().contains("alpha"));
    assert_eq!(history[3].text(), "done");
}

#[tokio::test]
async fn test_empty_reply_commits_empty_text_block() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::default(),
        ScriptedReply::text("second"),
    ]));
    let rt = runtime(&client, config(dir.path()));

    assert_eq!(
        rt.send_message("say nothing").unwrap().wait().await,
        TurnOutcome::Completed
    );
    let history = rt.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].content, vec![Block::text("")]);

    // 다음 요청에서도 user/assistant가 번갈아 나옴
    rt.send_message("now talk").unwrap().wait().await;
    let roles: Vec<_> = client.requests()[1].iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
}

// ============================================================================
// 동시성, 취소, 롤백
// ============================================================================

#[tokio::test]
async fn test_busy_then_abort_then_send() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::text("slow").hanging()]));
    let rt = runtime(&client, config(dir.path()));

    let handle = rt.send_message("first").unwrap();
    assert!(rt.is_busy());
    assert_eq!(rt.send_message("second").unwrap_err(), RuntimeError::Busy);
    assert_eq!(
        rt.load_history(vec![Message::user("x")]).await.unwrap_err(),
        RuntimeError::TurnActive
    );
    assert_eq!(rt.clear_history().await.unwrap_err(), RuntimeError::TurnActive);

    assert!(rt.abort().await);
    assert_eq!(handle.wait().await, TurnOutcome::Aborted);
    assert!(rt.history().is_empty());
    assert_eq!(rt.state(), TurnState::Idle);

    // 두 번째 abort는 아무 일도 하지 않음
    assert!(!rt.abort().await);

    client.push(ScriptedReply::text("ok"));
    assert_eq!(
        rt.send_message("third").unwrap().wait().await,
        TurnOutcome::Completed
    );
    let history = rt.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text(), "third");
}

#[tokio::test]
async fn test_abort_mid_stream_restores_history() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::text("partial answer").hanging(),
    ]));
    let rt = runtime(&client, config(dir.path()));
    let before = vec![
        Message::user("earlier"),
        Message::assistant(vec![Block::text("reply")]),
    ];
    rt.load_history(before.clone()).await.unwrap();
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("new question").unwrap();
    loop {
        if let RuntimeEvent::StreamToken(_) = next_event(&mut rx).await {
            break;
        }
    }
    assert!(rt.abort().await);
    assert_eq!(handle.wait().await, TurnOutcome::Aborted);

    let events = until_terminal(&mut rx).await;
    assert_eq!(events.last(), Some(&RuntimeEvent::Aborted));
    assert_eq!(next_event(&mut rx).await, RuntimeEvent::HistoryUpdate(before.clone()));
    assert_eq!(rt.history(), before);
}

#[tokio::test]
async fn test_abort_while_awaiting_confirmation() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::tool_call(
        "write_file",
        json!({"path": "out.txt", "content": "data"}),
    )]));
    let rt = runtime(&client, config(dir.path()));
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("write").unwrap();
    let pending = next_confirm(&mut rx).await;
    assert!(rt.abort().await);
    assert_eq!(handle.wait().await, TurnOutcome::Aborted);

    assert!(rt.pending_confirmations().is_empty());
    assert_eq!(
        rt.confirm_response(&pending.id, true, false),
        ConfirmOutcome::Unknown
    );
    assert!(rt.history().is_empty());
    assert!(!dir.path().join("out.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_abort_while_tool_runs_kills_it() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::tool_call(
        "bash",
        json!({"command": "sleep 1; touch marker"}),
    )]));
    let rt = runtime(&client, config(dir.path()).with_auto_approve_tool("bash"));
    let (_, mut rx) = rt.subscribe("test");

    let handle = rt.send_message("run it").unwrap();
    // tool_use가 히스토리에 올라온 뒤 실행이 시작됨
    loop {
        if let RuntimeEvent::HistoryUpdate(h) = next_event(&mut rx).await {
            if h.len() == 2 {
                break;
            }
        }
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(rt.state(), TurnState::ToolPending);

    assert!(rt.abort().await);
    assert_eq!(handle.wait().await, TurnOutcome::Aborted);
    assert!(rt.history().is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!dir.path().join("marker").exists());
    assert_eq!(client.remaining(), 0);
}

#[tokio::test]
async fn test_provider_error_after_tool_round_rolls_back() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("read_file", json!({"path": "a.txt"})),
        ScriptedReply::failure("boom"),
    ]));
    let rt = runtime(&client, config(dir.path()));
    let (_, mut rx) = rt.subscribe("test");

    let outcome = rt.send_message("read").unwrap().wait().await;
    assert_eq!(outcome, TurnOutcome::Failed("Stream error: boom".to_string()));

    let events = until_terminal(&mut rx).await;
    assert_eq!(
        events.last(),
        Some(&RuntimeEvent::Error("Stream error: boom".to_string()))
    );
    // 턴 도중에는 도구 결과까지 보였지만 최종적으로는 빈 히스토리로 복원
    assert!(events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::HistoryUpdate(h) if h.len() == 3)));
    assert_eq!(next_event(&mut rx).await, RuntimeEvent::HistoryUpdate(vec![]));
    assert!(rt.history().is_empty());
}

#[tokio::test]
async fn test_tool_round_limit() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::tool_call("read_file", json!({"path": "missing.txt"})),
        ScriptedReply::tool_call("read_file", json!({"path": "missing.txt"})),
        ScriptedReply::text("never"),
    ]));
    let rt = runtime(&client, config(dir.path()).with_max_tool_rounds(1));

    let outcome = rt.send_message("loop").unwrap().wait().await;
    assert_eq!(
        outcome,
        TurnOutcome::Failed("tool round limit (1) reached".to_string())
    );
    assert!(rt.history().is_empty());
    assert_eq!(client.remaining(), 1);
}

#[tokio::test]
async fn test_inconsistent_history_fails_turn() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::text("unused")]));
    let rt = runtime(&client, config(dir.path()));

    let broken = vec![
        Message::user("hi"),
        Message::assistant(vec![Block::ToolUse {
            id: "dangling".into(),
            name: "read_file".into(),
            input: json!({}),
        }]),
    ];
    rt.load_history(broken.clone()).await.unwrap();

    let outcome = rt.send_message("next").unwrap().wait().await;
    assert!(matches!(outcome, TurnOutcome::Failed(_)));
    assert_eq!(rt.history(), broken);
    assert!(client.requests().is_empty());
}

// ============================================================================
// Observer
// ============================================================================

#[tokio::test]
async fn test_observers_see_identical_streams() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::text("one two three four").with_chunk_delay(1),
    ]));
    let rt = runtime(&client, config(dir.path()));
    let (_, mut a) = rt.subscribe("a");
    let (_, mut b) = rt.subscribe("b");

    rt.send_message("count").unwrap().wait().await;

    let a_events = until_terminal(&mut a).await;
    let b_events = until_terminal(&mut b).await;
    assert_eq!(tokens(&a_events), vec!["one ", "two ", "three ", "four"]);
    assert_eq!(a_events, b_events);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<RuntimeEvent>>,
}

#[async_trait]
impl Observer<RuntimeEvent> for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn on_event(&self, event: &RuntimeEvent) {
        self.events.lock().push(event.clone());
    }
}

#[tokio::test]
async fn test_attach_detach_and_late_observer() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::text("first"),
        ScriptedReply::text("second"),
    ]));
    let rt = runtime(&client, config(dir.path()));

    rt.send_message("before").unwrap().wait().await;

    // 늦게 붙은 Observer는 이전 이벤트를 받지 않음
    let recorder = Arc::new(Recorder::default());
    let id = rt.attach_observer(recorder.clone());
    rt.send_message("after").unwrap().wait().await;

    timeout(WAIT, async {
        while !recorder.events.lock().contains(&RuntimeEvent::Done) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let events = recorder.events.lock().clone();
    assert_eq!(tokens(&events), vec!["second"]);
    assert!(matches!(&events[0], RuntimeEvent::HistoryUpdate(h) if h.len() == 3));

    assert!(rt.detach_observer(id));
    assert!(!rt.detach_observer(id));
}

// ============================================================================
// 히스토리 저장
// ============================================================================

#[tokio::test]
async fn test_history_is_persisted() {
    let dir = TempDir::new().unwrap();
    let sessions = Arc::new(MemorySessionStore::new());
    let client = Arc::new(ScriptedClient::new([
        ScriptedReply::text("kept"),
        ScriptedReply::failure("lost"),
    ]));
    let rt = AgentRuntime::builder(client.clone())
        .config(config(dir.path()))
        .session(sessions.clone(), "main")
        .build()
        .unwrap();
    assert_eq!(rt.session_id(), "main");

    rt.send_message("hello").unwrap().wait().await;
    let saved = sessions.load("main").await.unwrap().unwrap();
    assert_eq!(saved, rt.history());
    assert_eq!(saved.len(), 2);

    // 실패한 턴은 저장 내용을 바꾸지 않음
    rt.send_message("again").unwrap().wait().await;
    assert_eq!(sessions.load("main").await.unwrap().unwrap(), saved);

    rt.clear_history().await.unwrap();
    assert!(sessions.load("main").await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_builder_restores_history() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([ScriptedReply::text("welcome back")]));
    let previous = vec![
        Message::user("hi"),
        Message::assistant(vec![Block::text("hello")]),
    ];
    let rt = AgentRuntime::builder(client.clone())
        .config(config(dir.path()))
        .history(previous.clone())
        .build()
        .unwrap();
    assert_eq!(rt.history(), previous);

    rt.send_message("still there?").unwrap().wait().await;
    assert_eq!(client.requests()[0].len(), 3);
    assert_eq!(rt.history().len(), 4);
}
