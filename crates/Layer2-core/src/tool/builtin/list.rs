//! List Tool - 디렉토리 목록 도구

use async_trait::async_trait;
use helm_foundation::{Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};

/// List 도구 입력
#[derive(Debug, Deserialize)]
pub struct ListInput {
    /// 디렉토리 경로 (기본: 작업 디렉토리)
    #[serde(default = "default_path")]
    pub path: String,

    /// 숨김 파일 포함 여부
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_path() -> String {
    ".".to_string()
}

/// List 도구
pub struct ListTool;

impl ListTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "list_dir";

    /// 최대 항목 수
    const MAX_ENTRIES: usize = 1000;
}

impl Default for ListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("List Directory")
            .description("List the entries of a directory. Directories end with '/'.")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list (default: working directory)"
                },
                "include_hidden": {
                    "type": "boolean",
                    "description": "Include entries starting with '.'"
                }
            }
        })
    }

    fn permission_path(&self, input: &Value) -> Option<String> {
        Some(
            input
                .get("path")
                .and_then(|p| p.as_str())
                .unwrap_or(".")
                .to_string(),
        )
    }

    async fn execute(
        &self,
        input: Value,
        context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let parsed: ListInput = serde_json::from_value(input)
            .map_err(|e| ToolError::invalid(format!("Invalid input: {}", e)))?;
        let dir = context.resolve_path(&parsed.path);

        if !dir.is_dir() {
            return Err(ToolError::failed(format!(
                "Not a directory: {}",
                parsed.path
            )));
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !parsed.include_hidden && name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push(if is_dir { format!("{}/", name) } else { name });
        }
        entries.sort();

        let truncated = entries.len() > Self::MAX_ENTRIES;
        entries.truncate(Self::MAX_ENTRIES);

        Ok(ToolOutput::json(json!({
            "path": dir.display().to_string(),
            "entries": entries,
            "truncated": truncated,
        })))
    }
}
