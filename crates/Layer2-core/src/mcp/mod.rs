//! MCP (Model Context Protocol) - 외부 도구 서버 연동
//!
//! stdio로 실행한 MCP 서버의 도구를 `mcp_<server>_<tool>` 이름으로
//! ToolRegistry에 등록합니다.
//!
//! ```text
//! McpManager ── connect_all(config.mcp_servers)
//!   └── McpClient (server별)
//!         ├── StdioTransport (JSON-RPC 2.0, 줄 단위)
//!         └── tools() ──> McpToolAdapter (Tool trait)
//! ```

mod adapter;
mod client;
mod manager;
mod transport;
mod types;

pub use adapter::McpToolAdapter;
pub use client::{McpClient, MCP_PROTOCOL_VERSION};
pub use manager::McpManager;
pub use transport::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpTransport, StdioTransport};
pub use types::{McpContent, McpTool, McpToolResult};
