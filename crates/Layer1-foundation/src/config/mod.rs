//! Config - 런타임 설정
//!
//! `runtime.json`을 글로벌(~/.config/helm) → 프로젝트(.helm) 순서로 병합합니다.
//! 나중에 읽은 값이 우선합니다.

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// 설정 파일명
pub const RUNTIME_CONFIG_FILE: &str = "runtime.json";

/// 기본 tool round 상한
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 25;

/// 기본 도구 타임아웃 (초)
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// RuntimeConfig
// ============================================================================

/// 에이전트 런타임 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// 한 턴의 Streaming ↔ ToolPending 반복 상한 (0 = 무제한)
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// 시스템 프롬프트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// 작업 디렉토리 (없으면 현재 디렉토리)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// 항상 허용할 도구
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto_approve_tools: Vec<String>,

    /// 항상 거부할 도구
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_tools: Vec<String>,

    /// 스킬 디렉토리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_dir: Option<PathBuf>,

    /// bash 도구 기본 타임아웃 (초)
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// 외부 도구 서버 (MCP, stdio)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
}

fn default_max_tool_rounds() -> u32 {
    DEFAULT_MAX_TOOL_ROUNDS
}

fn default_tool_timeout_secs() -> u64 {
    DEFAULT_TOOL_TIMEOUT_SECS
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: None,
            working_dir: None,
            auto_approve_tools: Vec::new(),
            denied_tools: Vec::new(),
            skills_dir: None,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            mcp_servers: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<RuntimeConfig>(RUNTIME_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        let project = JsonStore::current_project()?;
        if let Some(project_config) = project.load_optional::<RuntimeConfig>(RUNTIME_CONFIG_FILE)? {
            config.merge(project_config);
        }

        Ok(config)
    }

    /// 특정 저장소에서 로드 (없으면 기본값)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .load_optional::<RuntimeConfig>(RUNTIME_CONFIG_FILE)?
            .unwrap_or_default())
    }

    /// 저장
    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(RUNTIME_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: RuntimeConfig) {
        if other.max_tool_rounds != DEFAULT_MAX_TOOL_ROUNDS {
            self.max_tool_rounds = other.max_tool_rounds;
        }
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt;
        }
        if other.working_dir.is_some() {
            self.working_dir = other.working_dir;
        }
        if other.skills_dir.is_some() {
            self.skills_dir = other.skills_dir;
        }
        if other.tool_timeout_secs != DEFAULT_TOOL_TIMEOUT_SECS {
            self.tool_timeout_secs = other.tool_timeout_secs;
        }

        for tool in other.auto_approve_tools {
            if !self.auto_approve_tools.contains(&tool) {
                self.auto_approve_tools.push(tool);
            }
        }
        for tool in other.denied_tools {
            if !self.denied_tools.contains(&tool) {
                self.denied_tools.push(tool);
            }
        }
        self.mcp_servers.extend(other.mcp_servers);
    }

    /// 작업 디렉토리 (설정값 또는 현재 디렉토리)
    pub fn resolve_working_dir(&self) -> Result<PathBuf> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// round 상한 (0이면 None)
    pub fn tool_round_limit(&self) -> Option<u32> {
        (self.max_tool_rounds > 0).then_some(self.max_tool_rounds)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_skills_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skills_dir = Some(dir.into());
        self
    }

    pub fn with_auto_approve_tool(mut self, tool: impl Into<String>) -> Self {
        self.auto_approve_tools.push(tool.into());
        self
    }

    pub fn with_denied_tool(mut self, tool: impl Into<String>) -> Self {
        self.denied_tools.push(tool.into());
        self
    }

    pub fn with_mcp_server(mut self, name: impl Into<String>, server: McpServerConfig) -> Self {
        self.mcp_servers.insert(name.into(), server);
        self
    }
}

// ============================================================================
// MCP Server Config
// ============================================================================

/// 외부 도구 서버 설정 (stdio)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    /// 실행 명령어
    pub command: String,

    /// 명령어 인자
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// 환경 변수
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl McpServerConfig {
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            enabled: true,
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(config.tool_round_limit(), Some(DEFAULT_MAX_TOOL_ROUNDS));
        assert_eq!(
            RuntimeConfig::new().with_max_tool_rounds(0).tool_round_limit(),
            None
        );
    }

    #[test]
    fn test_parse_camel_case() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{
                "maxToolRounds": 5,
                "autoApproveTools": ["list_dir"],
                "mcpServers": {"fs": {"command": "mcp-fs", "args": ["--root", "/"]}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_tool_rounds, 5);
        assert_eq!(config.auto_approve_tools, vec!["list_dir"]);
        assert_eq!(config.tool_timeout_secs, DEFAULT_TOOL_TIMEOUT_SECS);
        let fs = &config.mcp_servers["fs"];
        assert!(fs.enabled);
        assert_eq!(fs.args, vec!["--root", "/"]);
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = RuntimeConfig::new()
            .with_system_prompt("base")
            .with_denied_tool("bash");
        let other = RuntimeConfig::new()
            .with_max_tool_rounds(3)
            .with_system_prompt("project")
            .with_denied_tool("bash")
            .with_mcp_server("fs", McpServerConfig::stdio("mcp-fs"));

        base.merge(other);
        assert_eq!(base.max_tool_rounds, 3);
        assert_eq!(base.system_prompt.as_deref(), Some("project"));
        assert_eq!(base.denied_tools, vec!["bash"]);
        assert!(base.mcp_servers.contains_key("fs"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        assert_eq!(
            RuntimeConfig::load_from(&store).unwrap().max_tool_rounds,
            DEFAULT_MAX_TOOL_ROUNDS
        );

        RuntimeConfig::new()
            .with_max_tool_rounds(7)
            .with_working_dir("/work")
            .save_to(&store)
            .unwrap();
        let loaded = RuntimeConfig::load_from(&store).unwrap();
        assert_eq!(loaded.max_tool_rounds, 7);
        assert_eq!(loaded.resolve_working_dir().unwrap(), PathBuf::from("/work"));
    }
}
