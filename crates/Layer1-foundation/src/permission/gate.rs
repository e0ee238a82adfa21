//! Permission Gate
//!
//! 도구 호출마다 allow / deny / ask를 결정합니다.
//! 권한 기록에 대한 쓰기는 이 모듈을 통해서만 이루어집니다.

use super::store::PermissionStore;
use super::types::{ConfirmationId, GateDecision, PendingConfirmation, PermissionRecord};
use crate::core::Tool;
use crate::Result;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// PermissionSnapshot
// ============================================================================

/// 턴 시작 시점의 권한 기록
///
/// 한 턴 안에서는 이 스냅샷만 사용하므로, 같은 턴의 remember 결정은
/// 다음 턴부터 반영됩니다.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    records: Vec<PermissionRecord>,
}

impl PermissionSnapshot {
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 매칭되는 기록 찾기
    ///
    /// 순서: 정확한 경로 → 디렉토리 패턴 → wildcard
    pub fn find(&self, tool: &str, path: Option<&str>) -> Option<&PermissionRecord> {
        let for_tool = || self.records.iter().filter(move |r| r.tool == tool);

        if let Some(path) = path {
            if let Some(exact) = for_tool().find(|r| r.path.as_deref() == Some(path)) {
                return Some(exact);
            }
            if let Some(pattern) = for_tool().find(|r| {
                r.path
                    .as_deref()
                    .is_some_and(|p| !r.is_wildcard() && pattern_matches(p, path))
            }) {
                return Some(pattern);
            }
        }

        for_tool().find(|r| r.is_wildcard())
    }
}

/// 디렉토리 패턴 매칭 (`dir/**`, `dir/*`)
fn pattern_matches(pattern: &str, value: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return value
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'));
    }
    if let Some(prefix) = pattern.strip_suffix("/*") {
        return value
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'));
    }
    pattern == value
}

/// 경로 정규화 (작업 디렉토리 기준 절대 경로, `.`/`..` 제거)
///
/// 파일 시스템에 접근하지 않는 순수 문자열 처리입니다.
pub fn normalize_path(working_dir: &Path, raw: &str) -> String {
    let joined = if Path::new(raw).is_absolute() {
        PathBuf::from(raw)
    } else {
        working_dir.join(raw)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}

// ============================================================================
// PermissionGate
// ============================================================================

/// Permission Gate
pub struct PermissionGate {
    store: Arc<dyn PermissionStore>,
    working_dir: PathBuf,
    auto_approve_tools: HashSet<String>,
    denied_tools: HashSet<String>,
}

impl PermissionGate {
    pub fn new(store: Arc<dyn PermissionStore>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            working_dir: working_dir.into(),
            auto_approve_tools: HashSet::new(),
            denied_tools: HashSet::new(),
        }
    }

    /// 항상 허용할 도구
    pub fn with_auto_approve_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.auto_approve_tools.extend(tools);
        self
    }

    /// 항상 거부할 도구
    pub fn with_denied_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.denied_tools.extend(tools);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// 현재 권한 기록 스냅샷
    pub async fn snapshot(&self) -> Result<PermissionSnapshot> {
        Ok(PermissionSnapshot::new(self.store.get_permissions().await?))
    }

    /// 도구 호출 분류
    pub fn classify(
        &self,
        snapshot: &PermissionSnapshot,
        tool: &dyn Tool,
        tool_use_id: &str,
        arguments: &Value,
    ) -> GateDecision {
        let name = tool.name();

        // 1. Deny list
        if self.denied_tools.contains(name) {
            debug!(tool = name, "Tool denied by policy");
            return GateDecision::Deny {
                reason: format!("Tool '{}' is denied by policy", name),
            };
        }

        // 2. 부작용 없는 도구 / auto-approve
        if tool.meta().read_only || self.auto_approve_tools.contains(name) {
            return GateDecision::Allow;
        }

        // 3. 기억된 기록
        let path = tool
            .permission_path(arguments)
            .map(|raw| normalize_path(&self.working_dir, &raw));
        if let Some(record) = snapshot.find(name, path.as_deref()) {
            debug!(tool = name, record = %record, "Allowed by permission record");
            return GateDecision::Allow;
        }

        // 4. 확인 요청
        GateDecision::Ask(PendingConfirmation {
            id: ConfirmationId::new(),
            tool_use_id: tool_use_id.to_string(),
            tool_name: name.to_string(),
            description: tool.describe(arguments),
            arguments: arguments.clone(),
            path,
        })
    }

    /// remember 승인 기록
    pub async fn remember(&self, pending: &PendingConfirmation) -> Result<()> {
        let record = pending.to_record();
        info!(record = %record, "Remembering permission");
        self.store
            .add_permission(&record.tool, record.path.as_deref())
            .await
    }

    /// 기록 제거
    pub async fn revoke(&self, tool: &str, path: Option<&str>) -> Result<()> {
        self.store.remove_permission(tool, path).await
    }

    /// 모든 기록 제거
    pub async fn reset(&self) -> Result<()> {
        self.store.clear_permissions().await
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ToolContext, ToolError, ToolMeta, ToolOutput};
    use crate::permission::MemoryPermissionStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeTool {
        name: &'static str,
        read_only: bool,
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        fn meta(&self) -> ToolMeta {
            ToolMeta::new(self.name).read_only(self.read_only)
        }

        fn schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(
            &self,
            _input: Value,
            _context: &dyn ToolContext,
        ) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("ok"))
        }

        fn permission_path(&self, input: &Value) -> Option<String> {
            input.get("path").and_then(|p| p.as_str()).map(String::from)
        }
    }

    fn write_tool() -> FakeTool {
        FakeTool {
            name: "write_file",
            read_only: false,
        }
    }

    fn gate(store: Arc<MemoryPermissionStore>) -> PermissionGate {
        PermissionGate::new(store, "/work")
    }

    #[test]
    fn test_normalize_path() {
        let wd = Path::new("/work/project");
        assert_eq!(normalize_path(wd, "."), "/work/project");
        assert_eq!(normalize_path(wd, "src/../a.txt"), "/work/project/a.txt");
        assert_eq!(normalize_path(wd, "/tmp/./x"), "/tmp/x");
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("/work/**", "/work/a/b.rs"));
        assert!(!pattern_matches("/work/**", "/workspace/a"));
        assert!(pattern_matches("/work/*", "/work/a.rs"));
        assert!(!pattern_matches("/work/*", "/work/a/b.rs"));
        assert!(pattern_matches("/tmp/x", "/tmp/x"));
    }

    #[tokio::test]
    async fn test_read_only_always_allowed() {
        let gate = gate(Arc::new(MemoryPermissionStore::new()));
        let snapshot = gate.snapshot().await.unwrap();
        let tool = FakeTool {
            name: "read_file",
            read_only: true,
        };

        let decision = gate.classify(&snapshot, &tool, "t1", &json!({"path": "a"}));
        assert!(decision.is_allow());
    }

    #[tokio::test]
    async fn test_ask_without_record() {
        let gate = gate(Arc::new(MemoryPermissionStore::new()));
        let snapshot = gate.snapshot().await.unwrap();

        match gate.classify(&snapshot, &write_tool(), "t1", &json!({"path": "out.txt"})) {
            GateDecision::Ask(pending) => {
                assert_eq!(pending.tool_name, "write_file");
                assert_eq!(pending.tool_use_id, "t1");
                assert_eq!(pending.path.as_deref(), Some("/work/out.txt"));
                assert_eq!(pending.description, "write_file: out.txt");
            }
            other => panic!("expected ask, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exact_and_wildcard_records() {
        let store = Arc::new(MemoryPermissionStore::with_records([
            PermissionRecord::new("write_file", Some("/tmp/x".into())),
            PermissionRecord::wildcard("bash"),
        ]));
        let gate = gate(store);
        let snapshot = gate.snapshot().await.unwrap();
        let bash = FakeTool {
            name: "bash",
            read_only: false,
        };

        assert!(gate
            .classify(&snapshot, &write_tool(), "t1", &json!({"path": "/tmp/x"}))
            .is_allow());
        assert!(!gate
            .classify(&snapshot, &write_tool(), "t2", &json!({"path": "/tmp/y"}))
            .is_allow());
        assert!(gate
            .classify(&snapshot, &bash, "t3", &json!({"command": "ls"}))
            .is_allow());
    }

    #[tokio::test]
    async fn test_directory_pattern_record() {
        let store = Arc::new(MemoryPermissionStore::with_records([PermissionRecord::new(
            "write_file",
            Some("/work/out/**".into()),
        )]));
        let gate = gate(store);
        let snapshot = gate.snapshot().await.unwrap();

        assert!(gate
            .classify(&snapshot, &write_tool(), "t1", &json!({"path": "out/a/b.txt"}))
            .is_allow());
        assert!(!gate
            .classify(&snapshot, &write_tool(), "t2", &json!({"path": "src/a.txt"}))
            .is_allow());
    }

    #[tokio::test]
    async fn test_deny_and_auto_approve() {
        let gate = gate(Arc::new(MemoryPermissionStore::new()))
            .with_denied_tools(vec!["bash".to_string()])
            .with_auto_approve_tools(vec!["write_file".to_string()]);
        let snapshot = gate.snapshot().await.unwrap();
        let bash = FakeTool {
            name: "bash",
            read_only: false,
        };

        assert!(matches!(
            gate.classify(&snapshot, &bash, "t1", &json!({})),
            GateDecision::Deny { .. }
        ));
        assert!(gate
            .classify(&snapshot, &write_tool(), "t2", &json!({"path": "x"}))
            .is_allow());
    }

    #[tokio::test]
    async fn test_remember_affects_next_snapshot_only() {
        let store = Arc::new(MemoryPermissionStore::new());
        let gate = gate(store.clone());
        let before = gate.snapshot().await.unwrap();
        let args = json!({"path": "/tmp/x"});

        let pending = match gate.classify(&before, &write_tool(), "t1", &args) {
            GateDecision::Ask(p) => p,
            other => panic!("expected ask, got {:?}", other),
        };
        gate.remember(&pending).await.unwrap();

        // 기존 스냅샷은 그대로
        assert!(!gate.classify(&before, &write_tool(), "t2", &args).is_allow());

        let after = gate.snapshot().await.unwrap();
        assert!(gate.classify(&after, &write_tool(), "t3", &args).is_allow());

        gate.reset().await.unwrap();
        assert!(gate.snapshot().await.unwrap().is_empty());
    }
}
