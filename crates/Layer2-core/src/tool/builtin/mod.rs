//! Builtin Tools - 내장 도구들
//!
//! ## 도구 목록
//!
//! ### 파일시스템 (Filesystem)
//! - `read_file` - 파일 읽기 (줄 번호, 이미지 첨부). 읽기 전용이라 확인 없이 실행
//! - `list_dir` - 디렉토리 목록
//! - `write_file` - 파일 쓰기 (생성 또는 덮어쓰기)
//!
//! ### 실행 (Execute)
//! - `bash` - Shell 명령 실행

// Filesystem tools
pub mod list;
pub mod read;
pub mod write;

// Execute tools
pub mod bash;

pub use bash::BashTool;
pub use list::ListTool;
pub use read::ReadTool;
pub use write::WriteTool;

use helm_foundation::{RuntimeConfig, Tool};
use std::sync::Arc;

/// 모든 builtin 도구 인스턴스 생성
pub fn all_tools(config: &RuntimeConfig) -> Vec<Arc<dyn Tool>> {
    vec![
        // Filesystem
        Arc::new(ReadTool::new()) as Arc<dyn Tool>,
        Arc::new(ListTool::new()),
        Arc::new(WriteTool::new()),
        // Execute
        Arc::new(BashTool::from_config(config)),
    ]
}
