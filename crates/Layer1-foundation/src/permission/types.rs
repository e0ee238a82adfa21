//! Permission 타입

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 기억된 허용 기록
///
/// `(tool, path)` 형태이며 `path`가 `None`이면 도구 전체(wildcard)를 허용합니다.
/// `path`는 정규화된 절대 경로이거나 `dir/**` 패턴입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    /// 도구 이름 (예: "bash", "write_file")
    pub tool: String,

    /// 경로 또는 패턴
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl PermissionRecord {
    pub fn new(tool: impl Into<String>, path: Option<String>) -> Self {
        Self {
            tool: tool.into(),
            path,
        }
    }

    /// 도구 전체 허용
    pub fn wildcard(tool: impl Into<String>) -> Self {
        Self::new(tool, None)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.path.as_deref(), None | Some("*") | Some("**"))
    }
}

impl fmt::Display for PermissionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}({})", self.tool, path),
            None => write!(f, "{}(*)", self.tool),
        }
    }
}

/// 확인 요청 상관 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationId(String);

impl ConfirmationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConfirmationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConfirmationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConfirmationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 사람의 결정을 기다리는 도구 호출
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirmation {
    /// 상관 ID
    pub id: ConfirmationId,

    /// tool_use ID
    pub tool_use_id: String,

    /// 도구 이름
    pub tool_name: String,

    /// 사람이 읽을 설명
    pub description: String,

    /// 원본 인자
    pub arguments: Value,

    /// 정규화된 권한 대상 경로 (remember 시 기록됨)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl PendingConfirmation {
    /// remember 결정 시 저장할 기록
    pub fn to_record(&self) -> PermissionRecord {
        PermissionRecord::new(self.tool_name.clone(), self.path.clone())
    }
}

/// Permission Gate 분류 결과
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// 바로 실행
    Allow,

    /// 정책에 의해 거부
    Deny { reason: String },

    /// 사람에게 확인 요청
    Ask(PendingConfirmation),
}

impl GateDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// 사람의 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Approve { remember: bool },
    Deny,
}

impl ConfirmDecision {
    pub fn from_response(approved: bool, remember: bool) -> Self {
        if approved {
            Self::Approve { remember }
        } else {
            // remember-deny는 없음
            Self::Deny
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }
}
