//! Write Tool - 파일 쓰기 도구
//!
//! 파일을 생성하거나 덮어씁니다. 상위 디렉토리가 없으면 만듭니다.

use async_trait::async_trait;
use helm_foundation::{Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};

/// Write 도구 입력
#[derive(Debug, Deserialize)]
pub struct WriteInput {
    /// 파일 경로
    pub path: String,

    /// 파일 내용
    pub content: String,
}

/// Write 도구
pub struct WriteTool;

impl WriteTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "write_file";
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Write File")
            .description("Create or overwrite a file with the given content")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Full file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn permission_path(&self, input: &Value) -> Option<String> {
        input.get("path")?.as_str().map(String::from)
    }

    async fn execute(
        &self,
        input: Value,
        context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let parsed: WriteInput = serde_json::from_value(input)
            .map_err(|e| ToolError::invalid(format!("Invalid input: {}", e)))?;
        let path = context.resolve_path(&parsed.path);

        if path.is_dir() {
            return Err(ToolError::failed(format!(
                "Path is a directory: {}",
                parsed.path
            )));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let existed = path.exists();
        tokio::fs::write(&path, parsed.content.as_bytes()).await?;

        Ok(ToolOutput::json(json!({
            "path": path.display().to_string(),
            "bytes": parsed.content.len(),
            "created": !existed,
        })))
    }
}
