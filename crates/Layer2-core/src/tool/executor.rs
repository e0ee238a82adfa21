//! Tool Executor - 단일 도구 호출 실행
//!
//! 인자 검증 → 실행 → 결과 반환. 취소 토큰이 발동하면
//! 도구 future를 drop 하고 즉시 `Cancelled`를 반환합니다.

use super::context::RuntimeContext;
use super::registry::ToolRegistry;
use helm_foundation::{CancellationToken, ToolError, ToolOutput};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// 도구 실행기
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    working_dir: PathBuf,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            working_dir: working_dir.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// 도구 실행
    pub async fn execute(
        &self,
        name: &str,
        call_id: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::failed(format!("Unknown tool: {}", name)))?;

        validate_arguments(&tool.schema(), &arguments)?;

        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let ctx = RuntimeContext::new(&self.working_dir, call_id, cancel.clone());
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
            r = tool.execute(arguments, &ctx) => r,
        };

        debug!(
            tool = name,
            call_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Tool executed"
        );
        result
    }
}

// ============================================================================
// Argument validation
// ============================================================================

/// JSON 스키마 기반 인자 검증
///
/// 객체 여부, required 필드, 선언된 프로퍼티의 기본 타입만 검사합니다.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), ToolError> {
    let args = arguments
        .as_object()
        .ok_or_else(|| ToolError::invalid("arguments must be a JSON object"))?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            match args.get(field) {
                None | Some(Value::Null) => {
                    return Err(ToolError::invalid(format!("missing required field '{}'", field)))
                }
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(expected) = properties.get(key).and_then(|p| p.get("type")) else {
            continue;
        };

        let ok = match expected {
            Value::String(t) => type_matches(t, value),
            Value::Array(types) => types
                .iter()
                .filter_map(|t| t.as_str())
                .any(|t| type_matches(t, value)),
            _ => true,
        };

        if !ok {
            return Err(ToolError::invalid(format!(
                "field '{}' must be of type {}",
                key, expected
            )));
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

// ============================================================================
// 테스트
// ============================================================================
