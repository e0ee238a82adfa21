//! helm-core: 도구 레이어
//!
//! Layer2 - Agent가 호출하는 도구와 그 실행기
//!
//! # 주요 모듈
//!
//! - `tool`: ToolRegistry, ToolExecutor, Builtin 도구들
//! - `skill`: SKILL.md 기반 Skill과 `list_skills`/`load_skill` 도구
//! - `mcp`: MCP (Model Context Protocol) stdio 클라이언트와 도구 어댑터
//!
//! # 사용 예시
//!
//! ```ignore
//! use helm_core::{McpManager, SkillLoader, ToolExecutor, ToolRegistry, skill_tools};
//!
//! let mut registry = ToolRegistry::with_builtins(&config);
//! if let Some(dir) = &config.skills_dir {
//!     registry.register_all(skill_tools(SkillLoader::new(dir)));
//! }
//!
//! let mcp = McpManager::connect_all(&config.mcp_servers).await;
//! mcp.register_tools(&mut registry);
//!
//! let executor = ToolExecutor::new(Arc::new(registry), working_dir);
//! let output = executor.execute("read_file", "call_1", json!({"path": "README.md"}), &token).await?;
//! ```

pub mod mcp;
pub mod skill;
pub mod tool;

// Re-exports: Tool
pub use tool::builtin::{self, BashTool, ListTool, ReadTool, WriteTool};
pub use tool::{validate_arguments, RuntimeContext, ToolExecutor, ToolRegistry};

// Re-exports: Skill
pub use skill::{skill_tools, ListSkillsTool, LoadSkillTool, Skill, SkillConfig, SkillLoader};

// Re-exports: MCP
pub use mcp::{
    McpClient, McpContent, McpManager, McpTool, McpToolAdapter, McpToolResult, McpTransport,
    StdioTransport,
};
