//! Bash Tool - Shell 명령 실행 도구
//!
//! Shell 명령을 실행합니다.
//! - 타임아웃 지원 (설정값 기본, 입력으로 재정의)
//! - 작업 디렉토리에서 실행
//! - 취소되거나 타임아웃되면 프로세스 종료 (kill_on_drop)

use async_trait::async_trait;
use helm_foundation::{RuntimeConfig, Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Bash 도구 입력
#[derive(Debug, Deserialize)]
pub struct BashInput {
    /// 실행할 명령어
    pub command: String,

    /// 타임아웃 (밀리초, 최대: 600000 = 10분)
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Bash 도구
pub struct BashTool {
    default_timeout_ms: u64,
}

impl BashTool {
    pub fn new(default_timeout_ms: u64) -> Self {
        Self { default_timeout_ms }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.tool_timeout_secs.saturating_mul(1000))
    }

    /// 도구 이름
    pub const NAME: &'static str = "bash";

    /// 최대 타임아웃 (10분)
    const MAX_TIMEOUT_MS: u64 = 600_000;

    /// 최대 출력 크기 (30KB)
    const MAX_OUTPUT_SIZE: usize = 30_000;

    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }

    /// stdout + "[stderr]" 섹션 조합, 크기 제한 적용
    fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
        let stdout = String::from_utf8_lossy(stdout);
        let stderr = String::from_utf8_lossy(stderr);

        let mut output = String::new();
        if !stdout.is_empty() {
            output.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("[stderr]\n");
            output.push_str(&stderr);
        }

        if output.len() > Self::MAX_OUTPUT_SIZE {
            let mut cut = Self::MAX_OUTPUT_SIZE;
            while !output.is_char_boundary(cut) {
                cut -= 1;
            }
            output.truncate(cut);
            output.push_str("\n... [output truncated]");
        }
        output
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Bash")
            .description("Execute a shell command in the working directory and return its output")
            .category("execute")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Optional timeout in milliseconds (max 600000)"
                }
            },
            "required": ["command"]
        })
    }

    fn describe(&self, input: &Value) -> String {
        match input.get("command").and_then(|c| c.as_str()) {
            Some(command) => format!("{}: {}", Self::NAME, command),
            None => format!("{} {}", Self::NAME, input),
        }
    }

    async fn execute(
        &self,
        input: Value,
        context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let parsed: BashInput = serde_json::from_value(input)
            .map_err(|e| ToolError::invalid(format!("Invalid input: {}", e)))?;

        if parsed.command.trim().is_empty() {
            return Err(ToolError::invalid("Command cannot be empty"));
        }

        let timeout_ms = parsed
            .timeout
            .unwrap_or(self.default_timeout_ms)
            .min(Self::MAX_TIMEOUT_MS);

        let mut cmd = Self::shell_command(&parsed.command);
        cmd.current_dir(context.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| ToolError::failed(format!("Failed to spawn process: {}", e)))?;

        let output = match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ToolError::failed(format!("Process error: {}", e))),
            Err(_) => {
                return Err(ToolError::failed(format!(
                    "Command timed out after {} ms",
                    timeout_ms
                )))
            }
        };

        let combined = Self::combine_output(&output.stdout, &output.stderr);

        if output.status.success() {
            if combined.is_empty() {
                Ok(ToolOutput::text("[Command completed successfully with no output]"))
            } else {
                Ok(ToolOutput::text(combined))
            }
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            if combined.is_empty() {
                Err(ToolError::failed(format!(
                    "Command failed with exit code {}",
                    exit_code
                )))
            } else {
                Err(ToolError::failed(format!("Exit code {}\n{}", exit_code, combined)))
            }
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
