//! Permission system for Helm
//!
//! - `types`: 권한 기록, 확인 요청, Gate 결정 타입
//! - `store`: 권한 기록 저장소 (PermissionStore, Memory/Json 구현)
//! - `gate`: 도구 호출 분류 (PermissionGate)
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! let store = Arc::new(JsonPermissionStore::global()?);
//! let gate = PermissionGate::new(store, working_dir);
//!
//! let snapshot = gate.snapshot().await?;
//! match gate.classify(&snapshot, tool.as_ref(), &call.id, &call.arguments) {
//!     GateDecision::Allow => { /* 실행 */ }
//!     GateDecision::Deny { reason } => { /* 실패 결과 */ }
//!     GateDecision::Ask(pending) => { /* 확인 요청 */ }
//! }
//! ```

mod gate;
mod store;
mod types;

// Gate (allow / deny / ask)
pub use gate::{normalize_path, PermissionGate, PermissionSnapshot};

// Store (외부 저장소 인터페이스)
pub use store::{
    JsonPermissionStore, MemoryPermissionStore, PermissionSettings, PermissionStore,
    PERMISSIONS_FILE,
};

// Types
pub use types::{
    ConfirmDecision, ConfirmationId, GateDecision, PendingConfirmation, PermissionRecord,
};
