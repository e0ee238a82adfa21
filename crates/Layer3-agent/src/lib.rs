//! helm-agent: Agent Runtime
//!
//! Layer3 - 대화 한 턴을 끝까지 진행시키는 런타임
//!
//! # 주요 모듈
//!
//! - `runtime`: AgentRuntime (외부 표면의 진입점), TurnHandle
//! - `turn`: Turn Loop (스트리밍 → 도구 → 재호출)
//! - `state`: 턴 상태 머신 (Idle, Streaming, ToolPending, Completing, Aborted)
//! - `confirm`: 확인 요청 브로커
//! - `history`: 대화 히스토리
//! - `session`: 히스토리 저장소 (memory, json)
//! - `event`: Observer에게 전달되는 이벤트
//!
//! # 사용 예시
//!
//! ```ignore
//! use helm_agent::{AgentRuntime, RuntimeEvent};
//!
//! let runtime = AgentRuntime::builder(client).config(config).build()?;
//! let (_, mut events) = runtime.subscribe("console");
//!
//! let turn = runtime.send_message("list the files here")?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         RuntimeEvent::StreamToken(text) => print!("{}", text),
//!         RuntimeEvent::ConfirmRequest(pending) => {
//!             runtime.confirm_response(&pending.id, true, false);
//!         }
//!         event if event.is_terminal() => break,
//!         _ => {}
//!     }
//! }
//! turn.wait().await;
//! ```

pub mod confirm;
pub mod error;
pub mod event;
pub mod history;
pub mod runtime;
pub mod session;
pub mod state;
pub mod turn;

pub use confirm::{ConfirmOutcome, ConfirmationBroker};
pub use error::RuntimeError;
pub use event::RuntimeEvent;
pub use history::History;
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, TurnHandle};
pub use session::{JsonSessionStore, MemorySessionStore, SessionStore};
pub use state::TurnState;
pub use turn::{TurnContext, TurnLoop, TurnOutcome, TurnResult, DENIED_BY_POLICY, USER_DENIED};
