//! Read Tool - 파일 읽기 도구
//!
//! 파일 내용을 읽어서 반환합니다.
//! - 줄 번호 포함 (cat -n 스타일)
//! - offset/limit 지원 (대용량 파일 처리)
//! - 이미지 파일은 첨부 이미지로 반환

use async_trait::async_trait;
use helm_foundation::{ImageData, Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

/// Read 도구 입력
#[derive(Debug, Deserialize)]
pub struct ReadInput {
    /// 파일 경로 (상대 경로는 작업 디렉토리 기준)
    pub path: String,

    /// 시작 줄 번호 (1-based)
    #[serde(default)]
    pub offset: Option<usize>,

    /// 최대 읽을 줄 수 (기본: 2000)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Read 도구
pub struct ReadTool;

impl ReadTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "read_file";

    /// 기본 줄 제한
    const DEFAULT_LIMIT: usize = 2000;

    /// 최대 줄 길이 (이 이상은 잘림)
    const MAX_LINE_LENGTH: usize = 2000;

    /// 줄 번호 포맷: "   123→내용"
    fn number_lines(content: &str, offset: usize, limit: usize) -> String {
        let start = offset.max(1);
        let mut output = String::new();

        for (idx, line) in content.lines().enumerate().skip(start - 1).take(limit) {
            let line = if line.len() > Self::MAX_LINE_LENGTH {
                let mut cut = Self::MAX_LINE_LENGTH;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}... [truncated]", &line[..cut])
            } else {
                line.to_string()
            };
            output.push_str(&format!("{:>6}→{}\n", idx + 1, line));
        }

        output
    }

    fn image_media_type(path: &Path) -> Option<&'static str> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(ImageData::media_type_for_extension)
    }
}

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read File")
            .description("Read a file with line numbers. Images are returned as attachments.")
            .category("filesystem")
            .read_only(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to read"
                },
                "offset": {
                    "type": "integer",
                    "description": "Start line number (1-based)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum lines to read (default: 2000)"
                }
            },
            "required": ["path"]
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
        let parsed: ReadInput = serde_json::from_value(input)
            .map_err(|e| ToolError::invalid(format!("Invalid input: {}", e)))?;
        let path = context.resolve_path(&parsed.path);

        if !path.exists() {
            return Err(ToolError::failed(format!("File not found: {}", parsed.path)));
        }
        if path.is_dir() {
            return Err(ToolError::failed(format!(
                "Cannot read directory: {}. Use list_dir instead.",
                parsed.path
            )));
        }

        if let Some(media_type) = Self::image_media_type(&path) {
            let data = tokio::fs::read(&path).await?;
            let size = data.len();
            return Ok(ToolOutput::json(json!({
                "path": path.display().to_string(),
                "mediaType": media_type,
                "bytes": size,
            }))
            .with_image(ImageData::new(media_type, data)));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read file: {}", e)))?;
        let numbered = Self::number_lines(
            &content,
            parsed.offset.unwrap_or(1),
            parsed.limit.unwrap_or(Self::DEFAULT_LIMIT),
        );

        if numbered.is_empty() {
            Ok(ToolOutput::text("[Empty file]"))
        } else {
            Ok(ToolOutput::text(numbered))
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
