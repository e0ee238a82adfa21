//! Provider-specific error types
//!
//! ProviderError는 모델 클라이언트 관련 세부 에러를 관리합니다.
//! 턴 루프는 이 에러를 받으면 재시도 없이 턴을 실패로 끝냅니다.

use thiserror::Error;

/// Errors that can occur while streaming a completion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network error (connection failed, DNS, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from the model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Streaming error
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}
