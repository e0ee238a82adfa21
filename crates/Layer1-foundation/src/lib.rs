//! # helm-foundation
//!
//! Foundation layer for Helm:
//! - Core: 도구 Trait 정의 (Tool, ToolContext, ToolOutput, ToolError)
//! - Permission: 권한 기록 저장소 + Permission Gate (Allow/Ask/Deny)
//! - Event: Broadcast Hub (Observer별 독립 큐)
//! - Storage: JsonStore (범용)
//! - Config: 런타임 설정 (RuntimeConfig)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Tool Registry (Layer2-core)                            │
//! │  ├── Builtin Tools (read_file, list_dir, bash...)       │
//! │  ├── Skill Tools                                        │
//! │  └── MCP Tools                                          │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          Permission Gate (Allow/Ask/Deny)               │
//! │                     │                                   │
//! │          ┌─────────┴─────────┐                         │
//! │          ▼                   ▼                         │
//! │   PermissionStore      BroadcastHub                     │
//! │   (memory, json)       (observers)                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod event;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (도구 Trait 및 타입)
// ============================================================================
pub use core::{ImageData, Tool, ToolContext, ToolError, ToolMeta, ToolOutput};

// ============================================================================
// Permission
// ============================================================================
pub use permission::{
    normalize_path, ConfirmDecision, ConfirmationId, GateDecision, JsonPermissionStore,
    MemoryPermissionStore, PendingConfirmation, PermissionGate, PermissionRecord,
    PermissionSnapshot, PermissionStore,
};

// ============================================================================
// Event
// ============================================================================
pub use event::{BroadcastHub, HubEvent, Observer, ObserverId, ObserverReceiver};

// ============================================================================
// Storage & Config
// ============================================================================
pub use config::{McpServerConfig, RuntimeConfig};
pub use storage::JsonStore;

// Re-export for downstream crates
pub use tokio_util::sync::CancellationToken;
