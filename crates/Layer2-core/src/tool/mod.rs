//! Tool System - Agent가 사용하는 도구 시스템
//!
//! Layer1의 Tool trait을 구현하고, ToolRegistry로 도구를 관리합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolRegistry                                                │
//! │  ├── register(tool) - 도구 등록                              │
//! │  ├── get(name) - 도구 조회                                   │
//! │  └── definitions() - 모델에 전달할 ToolDef                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolExecutor                                                │
//! │  ├── validate_arguments() - 스키마 검증                      │
//! │  └── execute() - 취소 토큰과 함께 실행                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools                                               │
//! │  ├── ReadTool / ListTool / WriteTool                         │
//! │  └── BashTool                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod builtin;
mod context;
mod executor;
mod registry;

pub use context::RuntimeContext;
pub use executor::{validate_arguments, ToolExecutor};
pub use registry::ToolRegistry;
