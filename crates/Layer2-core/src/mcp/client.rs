//! MCP Client - MCP 서버 클라이언트
//!
//! initialize 핸드셰이크, 도구 목록 조회, 도구 호출을 담당합니다.

use super::transport::{McpTransport, StdioTransport};
use super::types::{McpTool, McpToolResult};
use helm_foundation::{Error, McpServerConfig, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// MCP 프로토콜 버전
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<McpTool>,
}

/// MCP 클라이언트
pub struct McpClient {
    name: String,
    transport: Arc<dyn McpTransport>,
    tools: RwLock<Vec<McpTool>>,
    server_info: RwLock<Option<Value>>,
}

impl McpClient {
    /// stdio 서버 실행 후 연결
    pub async fn connect(name: impl Into<String>, config: &McpServerConfig) -> Result<Self> {
        let transport = StdioTransport::spawn(config).await?;
        Self::with_transport(name, Arc::new(transport)).await
    }

    /// 주어진 transport로 핸드셰이크 및 도구 목록 조회
    pub async fn with_transport(
        name: impl Into<String>,
        transport: Arc<dyn McpTransport>,
    ) -> Result<Self> {
        let client = Self {
            name: name.into(),
            transport,
            tools: RwLock::new(Vec::new()),
            server_info: RwLock::new(None),
        };

        if let Err(e) = client.initialize().await {
            let _ = client.transport.close().await;
            return Err(e);
        }

        // 도구 목록 실패는 치명적이지 않음
        if let Err(e) = client.refresh_tools().await {
            warn!(server = %client.name, error = %e, "Failed to list MCP tools");
        }

        info!(
            server = %client.name,
            tools = client.tools.read().len(),
            "Connected to MCP server"
        );
        Ok(client)
    }

    /// 서버 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// initialize 응답의 serverInfo
    pub fn server_info(&self) -> Option<Value> {
        self.server_info.read().clone()
    }

    /// 캐시된 도구 목록
    pub fn tools(&self) -> Vec<McpTool> {
        self.tools.read().clone()
    }

    async fn initialize(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": {
                "name": "helm",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });

        let result = self
            .transport
            .request("initialize", Some(params))
            .await
            .map_err(|e| Error::McpConnection(format!("initialize failed: {}", e)))?;

        *self.server_info.write() = result.get("serverInfo").cloned();
        self.transport.notify("notifications/initialized", None).await
    }

    /// tools/list 재조회
    pub async fn refresh_tools(&self) -> Result<usize> {
        let result = self.transport.request("tools/list", None).await?;
        let parsed: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| Error::Mcp(format!("invalid tools/list response: {}", e)))?;

        let count = parsed.tools.len();
        *self.tools.write() = parsed.tools;
        Ok(count)
    }

    /// tools/call
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> Result<McpToolResult> {
        if !self.is_connected() {
            return Err(Error::McpConnection(format!(
                "MCP server '{}' is not connected",
                self.name
            )));
        }

        let result = self
            .transport
            .request("tools/call", Some(json!({"name": tool, "arguments": arguments})))
            .await?;

        serde_json::from_value(result)
            .map_err(|e| Error::Mcp(format!("invalid tools/call response: {}", e)))
    }

    /// 연결 종료
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }
}

// ============================================================================
// 테스트
// ============================================================================
