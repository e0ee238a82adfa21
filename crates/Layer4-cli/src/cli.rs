//! Non-interactive CLI mode
//!
//! 프롬프트 하나를 보내고, 이벤트를 콘솔에 출력하며, 확인 요청에는
//! stdin(y/n/a) 또는 `--yes`로 응답합니다. Ctrl-C는 턴을 중단합니다
//! (확인 입력을 기다리는 중에도).

use anyhow::Context;
use helm_agent::{AgentRuntime, JsonSessionStore, RuntimeEvent, SessionStore, TurnOutcome};
use helm_core::{skill_tools, McpManager, SkillLoader, ToolRegistry};
use helm_foundation::{JsonPermissionStore, PendingConfirmation, RuntimeConfig};
use helm_provider::{Block, Message, ScriptedClient};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

pub struct RunOptions {
    pub config: RuntimeConfig,
    pub prompt: String,
    pub replies: PathBuf,
    pub session: Option<String>,
    pub auto_approve: bool,
}

/// Run a single prompt in non-interactive mode
pub async fn run_once(options: RunOptions) -> anyhow::Result<()> {
    let script = std::fs::read_to_string(&options.replies)
        .with_context(|| format!("Failed to read replies from {}", options.replies.display()))?;
    let client = Arc::new(ScriptedClient::from_json(&script).context("Invalid replies file")?);

    // 도구: builtin + skills + MCP
    let mut registry = ToolRegistry::with_builtins(&options.config);
    if let Some(dir) = &options.config.skills_dir {
        registry.register_all(skill_tools(SkillLoader::new(dir)));
    }
    let mcp = McpManager::connect_all(&options.config.mcp_servers).await;
    let mcp_tools = mcp.register_tools(&mut registry);
    tracing::debug!(tools = registry.len(), mcp_tools, "Registry ready");

    let mut builder = AgentRuntime::builder(client)
        .config(options.config)
        .registry(Arc::new(registry))
        .permission_store(Arc::new(JsonPermissionStore::global()?));

    if let Some(id) = &options.session {
        let sessions = Arc::new(JsonSessionStore::global()?);
        if let Some(messages) = sessions.load(id).await? {
            println!("Continuing session {} ({} messages)", id, messages.len());
            builder = builder.history(messages);
        }
        builder = builder.session(sessions, id.clone());
    }

    let runtime = builder.build()?;
    let (_, mut events) = runtime.subscribe("console");
    let turn = runtime.send_message(options.prompt)?;

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                runtime.abort().await;
                continue;
            }
            event = events.recv() => event,
        };

        let Some(event) = event else { break };
        match event {
            RuntimeEvent::StreamToken(text) => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            RuntimeEvent::HistoryUpdate(history) => {
                if let Some(last) = history.last() {
                    print_tool_results(last);
                }
            }
            RuntimeEvent::ConfirmRequest(pending) => {
                let answer = if options.auto_approve {
                    Some((true, false))
                } else {
                    unless_interrupted(ask(&pending), tokio::signal::ctrl_c()).await?
                };
                match answer {
                    Some((approved, remember)) => {
                        runtime.confirm_response(&pending.id, approved, remember);
                    }
                    None => {
                        eprintln!();
                        runtime.abort().await;
                    }
                }
            }
            RuntimeEvent::Done => {
                println!();
                break;
            }
            RuntimeEvent::Error(_) | RuntimeEvent::Aborted => break,
        }
    }

    let outcome = turn.wait().await;
    mcp.shutdown().await;

    match outcome {
        TurnOutcome::Completed => Ok(()),
        TurnOutcome::Aborted => anyhow::bail!("Turn aborted"),
        TurnOutcome::Failed(message) => anyhow::bail!("Turn failed: {}", message),
    }
}

/// 도구 결과 메시지면 호출별 상태 출력
fn print_tool_results(message: &Message) {
    for block in &message.content {
        if let Block::ToolResult {
            tool_use_id,
            content,
            is_error,
            ..
        } = block
        {
            let status = if *is_error { "✗" } else { "✓" };
            let text = match content.as_str() {
                Some(s) => s.to_string(),
                None => content.to_string(),
            };
            println!("\n[{}] {} {}", tool_use_id, status, truncate(&text, 100));
        }
    }
}

async fn ask(pending: &PendingConfirmation) -> anyhow::Result<(bool, bool)> {
    eprint!(
        "\n[confirm] {} (y = yes, n = no, a = always): ",
        pending.description
    );
    std::io::stderr().flush()?;

    // 분리된 스레드: 중단 후 종료할 때 런타임이 read_line을 기다리지 않음
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = tx.send(std::io::stdin().read_line(&mut line).map(|_| line));
    });
    let line = rx.await.context("stdin reader stopped")??;

    Ok(parse_answer(&line))
}

/// 답을 기다리다 중단 신호가 먼저 오면 None
async fn unless_interrupted<T, I>(
    answer: impl Future<Output = anyhow::Result<T>>,
    interrupt: impl Future<Output = I>,
) -> anyhow::Result<Option<T>> {
    tokio::select! {
        _ = interrupt => Ok(None),
        answer = answer => answer.map(Some),
    }
}

/// (approved, remember)
fn parse_answer(input: &str) -> (bool, bool) {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => (true, false),
        "a" | "always" => (true, true),
        _ => (false, false),
    }
}

/// Truncate a string for display
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
