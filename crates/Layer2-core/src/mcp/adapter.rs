//! MCP Tool Adapter - MCP 도구를 Tool trait으로 변환

use super::client::McpClient;
use super::types::McpTool;
use async_trait::async_trait;
use helm_foundation::{Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde_json::Value;
use std::sync::Arc;

/// MCP 도구 어댑터
///
/// 이름은 `mcp_<server>_<tool>` 형식이며 항상 확인 대상입니다.
pub struct McpToolAdapter {
    full_name: String,
    server_name: String,
    mcp_tool: McpTool,
    client: Arc<McpClient>,
}

impl McpToolAdapter {
    pub fn new(client: Arc<McpClient>, mcp_tool: McpTool) -> Self {
        let server_name = client.name().to_string();
        Self {
            full_name: Self::tool_name(&server_name, &mcp_tool.name),
            server_name,
            mcp_tool,
            client,
        }
    }

    /// 레지스트리에 등록될 이름
    pub fn tool_name(server: &str, tool: &str) -> String {
        format!("mcp_{}_{}", server, tool)
    }

    /// 서버 쪽 원래 도구 이름
    pub fn remote_name(&self) -> &str {
        &self.mcp_tool.name
    }

    /// 클라이언트의 모든 도구를 어댑터로 변환
    pub fn all(client: &Arc<McpClient>) -> Vec<Arc<dyn Tool>> {
        client
            .tools()
            .into_iter()
            .map(|tool| Arc::new(Self::new(client.clone(), tool)) as Arc<dyn Tool>)
            .collect()
    }
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn name(&self) -> &str {
        &self.full_name
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(&self.full_name)
            .display_name(format!("{} ({})", self.mcp_tool.name, self.server_name))
            .description(
                self.mcp_tool
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("MCP tool from {}", self.server_name)),
            )
            .category("mcp")
    }

    fn schema(&self) -> Value {
        self.mcp_tool.input_schema.clone()
    }

    async fn execute(
        &self,
        input: Value,
        _context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let result = self.client.call_tool(&self.mcp_tool.name, input).await?;

        if result.is_error {
            let text = result.text();
            Err(ToolError::failed(if text.is_empty() {
                "MCP tool error".to_string()
            } else {
                text
            }))
        } else {
            Ok(ToolOutput::text(result.text()))
        }
    }
}
