//! Tool Registry - 도구 등록 및 관리
//!
//! 런타임이 사용하는 모든 도구(builtin, skill, MCP)를 관리합니다.
//! 초기화 시점에 채워지고, 이후에는 읽기 전용으로 공유됩니다.
//!
//! ```ignore
//! let mut registry = ToolRegistry::with_builtins(&config);
//! registry.register_all(skill_tools(skills));
//! registry.add_mcp_tools("fs", mcp_tools);
//!
//! let defs = registry.definitions();   // 모델에 전달
//! ```

use super::builtin;
use helm_foundation::{RuntimeConfig, Tool};
use helm_provider::ToolDef;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 도구 레지스트리
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Builtin 도구들을 포함한 레지스트리 생성
    pub fn with_builtins(config: &RuntimeConfig) -> Self {
        let mut registry = Self::new();
        registry.register_all(builtin::all_tools(config));
        registry
    }

    /// 도구 등록 (같은 이름이면 교체)
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replaced existing tool registration");
        } else {
            debug!(tool = %name, "Registered tool");
        }
    }

    /// 여러 도구 한번에 등록
    pub fn register_all(&mut self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// 도구 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 모든 도구 이름 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 모델에 전달할 도구 정의
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools
            .values()
            .map(|tool| ToolDef::from_schema(tool.name(), tool.meta().description, &tool.schema()))
            .collect()
    }

    // ========================================================================
    // MCP Tool Integration
    // ========================================================================

    /// MCP 서버의 도구들 추가
    ///
    /// 어댑터가 이미 `mcp_{server}_{tool}` 이름을 갖고 있어야 합니다.
    pub fn add_mcp_tools(&mut self, server_name: &str, tools: Vec<Arc<dyn Tool>>) {
        let count = tools.len();
        self.register_all(tools);
        info!(server = server_name, count, "Added MCP tools");
    }

    /// 특정 MCP 서버의 도구들 제거
    pub fn remove_mcp_tools(&mut self, server_name: &str) -> usize {
        let prefix = format!("mcp_{}_", server_name);
        let before = self.tools.len();
        self.tools.retain(|name, _| !name.starts_with(&prefix));
        before - self.tools.len()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_builtins() {
        let registry = ToolRegistry::with_builtins(&RuntimeConfig::default());

        assert_eq!(
            registry.names(),
            vec!["bash", "list_dir", "read_file", "write_file"]
        );
        assert!(registry.get("read_file").unwrap().meta().read_only);
        assert!(!registry.get("list_dir").unwrap().meta().read_only);
    }

    #[test]
    fn test_definitions_follow_schema() {
        let registry = ToolRegistry::with_builtins(&RuntimeConfig::default());
        let defs = registry.definitions();

        let bash = defs.iter().find(|d| d.name == "bash").unwrap();
        assert_eq!(bash.parameters.required, vec!["command"]);
        assert!(!bash.description.is_empty());
    }

    #[test]
    fn test_remove_mcp_tools() {
        let mut registry = ToolRegistry::with_builtins(&RuntimeConfig::default());
        assert_eq!(registry.remove_mcp_tools("fs"), 0);
        assert_eq!(registry.len(), 4);
    }
}
