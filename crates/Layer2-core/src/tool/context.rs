//! Tool Context - 도구 실행 컨텍스트
//!
//! Layer1 `ToolContext` trait 구현. 호출마다 새로 만들어지며
//! 작업 디렉토리, 호출 ID, 취소 토큰을 전달합니다.

use helm_foundation::{CancellationToken, ToolContext};
use std::path::{Path, PathBuf};

/// 런타임 도구 컨텍스트
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    working_dir: PathBuf,
    call_id: String,
    cancel: CancellationToken,
}

impl RuntimeContext {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        call_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            call_id: call_id.into(),
            cancel,
        }
    }
}

impl ToolContext for RuntimeContext {
    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn call_id(&self) -> &str {
        &self.call_id
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
