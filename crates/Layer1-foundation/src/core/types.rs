//! 도구 실행 결과 타입

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 이미지 데이터 (바이너리 + media type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// MIME 타입 (예: "image/png")
    pub media_type: String,
    /// 원본 바이트
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// 확장자로 이미지 MIME 타입 추정
    pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            _ => None,
        }
    }
}

/// 도구 실행 성공 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// 도구별 구조화된 결과
    pub content: Value,
    /// 첨부 이미지
    pub images: Vec<ImageData>,
}

impl ToolOutput {
    /// 텍스트 결과
    pub fn text(text: impl Into<String>) -> Self {
        Self::json(Value::String(text.into()))
    }

    /// 구조화된 결과
    pub fn json(content: Value) -> Self {
        Self {
            content,
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: ImageData) -> Self {
        self.images.push(image);
        self
    }
}

/// 도구 실행 실패
///
/// 모두 모델에게 tool_result 실패 데이터로 전달되며, 턴을 중단시키지 않습니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        Self::ExecutionFailed(e.to_string())
    }
}

impl From<crate::Error> for ToolError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::InvalidInput(msg) => Self::InvalidArguments(msg),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}
