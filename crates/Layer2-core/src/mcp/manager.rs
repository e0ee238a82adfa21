//! MCP Manager - 설정된 모든 MCP 서버 관리

use super::adapter::McpToolAdapter;
use super::client::McpClient;
use crate::tool::ToolRegistry;
use helm_foundation::McpServerConfig;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MCP 서버 매니저
#[derive(Default)]
pub struct McpManager {
    clients: BTreeMap<String, Arc<McpClient>>,
}

impl McpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정된 서버 모두 연결
    ///
    /// 비활성화된 서버는 건너뛰고, 연결에 실패한 서버는 경고만 남깁니다.
    pub async fn connect_all(servers: &BTreeMap<String, McpServerConfig>) -> Self {
        let mut manager = Self::new();

        for (name, config) in servers {
            if !config.enabled {
                debug!(server = %name, "MCP server disabled");
                continue;
            }

            match McpClient::connect(name.clone(), config).await {
                Ok(client) => manager.add_client(Arc::new(client)),
                Err(e) => warn!(server = %name, error = %e, "Skipping MCP server"),
            }
        }

        info!(connected = manager.clients.len(), configured = servers.len(), "MCP servers ready");
        manager
    }

    /// 연결된 클라이언트 추가
    pub fn add_client(&mut self, client: Arc<McpClient>) {
        self.clients.insert(client.name().to_string(), client);
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.clients.keys().map(|s| s.as_str()).collect()
    }

    pub fn client(&self, name: &str) -> Option<Arc<McpClient>> {
        self.clients.get(name).cloned()
    }

    /// 모든 서버의 도구를 레지스트리에 등록
    pub fn register_tools(&self, registry: &mut ToolRegistry) -> usize {
        let mut total = 0;
        for (name, client) in &self.clients {
            let tools = McpToolAdapter::all(client);
            total += tools.len();
            registry.add_mcp_tools(name, tools);
        }
        total
    }

    /// 모든 연결 종료
    pub async fn shutdown(&self) {
        for (name, client) in &self.clients {
            if let Err(e) = client.close().await {
                warn!(server = %name, error = %e, "Failed to close MCP server");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::tests::FakeTransport;

    #[tokio::test]
    async fn test_connect_all_skips_failures() {
        let mut servers = BTreeMap::new();
        servers.insert(
            "broken".to_string(),
            McpServerConfig::stdio("definitely-not-a-real-mcp-server-binary"),
        );
        let mut disabled = McpServerConfig::stdio("also-not-real");
        disabled.enabled = false;
        servers.insert("off".to_string(), disabled);

        let manager = McpManager::connect_all(&servers).await;
        assert!(manager.server_names().is_empty());
    }

    #[tokio::test]
    async fn test_register_tools() {
        let client = McpClient::with_transport("docs", Arc::new(FakeTransport::new()))
            .await
            .unwrap();
        let mut manager = McpManager::new();
        manager.add_client(Arc::new(client));

        let mut registry = ToolRegistry::new();
        assert_eq!(manager.register_tools(&mut registry), 1);
        assert!(registry.contains("mcp_docs_echo"));

        assert_eq!(registry.remove_mcp_tools("docs"), 1);
        manager.shutdown().await;
        assert!(!manager.client("docs").unwrap().is_connected());
    }
}
