//! MCP Transport - 전송 계층 구현
//!
//! 로컬 프로세스의 stdin/stdout으로 줄 단위 JSON-RPC 2.0 메시지를 주고받습니다.

use async_trait::async_trait;
use helm_foundation::{Error, McpServerConfig, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// 요청 응답 대기 시간
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC 2.0 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// 알림 (id 없음, 응답 없음)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::Mcp(format!("{} ({})", error.message, error.code))),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// JSON-RPC 에러
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP Transport trait
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// 요청 전송 및 응답 수신
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// 알림 전송 (응답 없음)
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// 연결 종료
    async fn close(&self) -> Result<()>;

    /// 연결 상태 확인
    fn is_connected(&self) -> bool;
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Stdio Transport - 프로세스 기반 통신
pub struct StdioTransport {
    request_id: AtomicU64,
    child: tokio::sync::Mutex<Option<Child>>,
    stdin_tx: mpsc::Sender<String>,
    pending: PendingMap,
    connected: Arc<AtomicBool>,
}

impl StdioTransport {
    /// 프로세스 시작 및 reader/writer task 생성
    pub async fn spawn(config: &McpServerConfig) -> Result<Self> {
        info!(command = %config.command, args = ?config.args, "Spawning MCP process");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::McpConnection(format!("Failed to spawn '{}': {}", config.command, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::McpConnection("Failed to capture stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::McpConnection("Failed to capture stdout".into()))?;

        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        // stdin writer task
        let connected_for_writer = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(msg) = stdin_rx.recv().await {
                let written = async {
                    stdin.write_all(msg.as_bytes()).await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    error!(error = %e, "Failed to write to MCP stdin");
                    connected_for_writer.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        // stdout reader task
        let pending_for_reader = Arc::clone(&pending);
        let connected_for_reader = Arc::clone(&connected);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<JsonRpcResponse>(&line) {
                    Ok(response) => {
                        let sender = response.id.and_then(|id| pending_for_reader.lock().remove(&id));
                        if let Some(sender) = sender {
                            let _ = sender.send(response);
                        }
                    }
                    Err(e) => debug!(error = %e, "Ignoring non-response MCP line"),
                }
            }
            connected_for_reader.store(false, Ordering::SeqCst);
            // 대기 중인 요청은 sender drop으로 실패 처리됨
            pending_for_reader.lock().clear();
            debug!("MCP stdout reader finished");
        });

        Ok(Self {
            request_id: AtomicU64::new(1),
            child: tokio::sync::Mutex::new(Some(child)),
            stdin_tx,
            pending,
            connected,
        })
    }

    async fn send_line(&self, message: &JsonRpcRequest) -> Result<()> {
        let line = serde_json::to_string(message)?;
        self.stdin_tx
            .send(format!("{}\n", line))
            .await
            .map_err(|_| Error::McpConnection("MCP stdin closed".into()))
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::McpConnection("MCP transport not connected".into()));
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if let Err(e) = self.send_line(&JsonRpcRequest::new(id, method, params)).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(Error::McpConnection("MCP server closed the connection".into()))
            }
            Err(_) => {
                self.pending.lock().remove(&id);
                return Err(Error::Timeout(format!("MCP request '{}'", method)));
            }
        };

        response.into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::McpConnection("MCP transport not connected".into()));
        }
        self.send_line(&JsonRpcRequest::notification(method, params)).await
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
