//! Tool trait 정의
//!
//! 모든 도구(builtin, skill, MCP)는 `Tool`을 구현하고 ToolRegistry에 등록됩니다.

use super::types::{ToolError, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;

// ============================================================================
// ToolMeta
// ============================================================================

/// 도구 메타데이터
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// 도구 이름 (고유 식별자)
    pub name: String,
    /// 표시 이름
    pub display_name: String,
    /// 설명
    pub description: String,
    /// 카테고리 (filesystem, execute, skill, mcp 등)
    pub category: String,
    /// 부작용 없는 도구 (읽기/조회 전용) - Permission Gate가 항상 허용
    pub read_only: bool,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
            read_only: false,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

// ============================================================================
// Tool Trait
// ============================================================================

/// 도구 trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// 도구 이름
    fn name(&self) -> &str;

    /// 메타데이터
    fn meta(&self) -> ToolMeta;

    /// 인자 JSON 스키마 (`{"type":"object","properties":...,"required":[...]}`)
    fn schema(&self) -> Value;

    /// 도구 실행
    ///
    /// 취소는 `context.cancellation()`으로 전달됩니다. 실행기는 토큰이
    /// 취소되면 future를 drop 하므로, 오래 걸리는 작업은 drop 시 정리되어야 합니다.
    async fn execute(&self, input: Value, context: &dyn ToolContext)
        -> Result<ToolOutput, ToolError>;

    /// 권한 대상 경로
    ///
    /// 경로 단위로 권한을 기억하는 도구는 인자에서 대상 경로를 꺼내 반환합니다.
    /// `None`이면 도구 전체(wildcard) 단위로 기억됩니다.
    fn permission_path(&self, _input: &Value) -> Option<String> {
        None
    }

    /// 확인 요청에 표시할 설명
    fn describe(&self, input: &Value) -> String {
        match self.permission_path(input) {
            Some(path) => format!("{}: {}", self.name(), path),
            None => format!("{} {}", self.name(), input),
        }
    }
}

// ============================================================================
// ToolContext
// ============================================================================

/// 도구 실행 컨텍스트
///
/// Layer2-core의 `RuntimeContext`가 구현합니다.
pub trait ToolContext: Send + Sync {
    /// 현재 작업 디렉토리
    fn working_dir(&self) -> &Path;

    /// 호출 ID (tool_use id)
    fn call_id(&self) -> &str;

    /// 취소 토큰
    fn cancellation(&self) -> &CancellationToken;

    /// 상대 경로를 작업 디렉토리 기준으로 해석
    fn resolve_path(&self, path: &str) -> std::path::PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.working_dir().join(p)
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
