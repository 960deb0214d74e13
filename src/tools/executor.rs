//! 工具执行器
//!
//! 持有 ToolRegistry 与统一超时，execute(tool_name, args) 在超时内调用工具，
//! 超时或失败时转为 AgentError（ToolTimeout / ToolExecutionFailed）；每次调用输出结构化审计日志（JSON）。
//! 超时由引擎侧统一施加，与工具自身行为无关。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::{Tool, ToolRegistry};

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 按名解析工具；未注册返回 None
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.resolve(name)
    }

    /// 渲染注册表的可用工具清单，供引擎拼入系统与规划指令
    pub fn prompt_section(&self) -> String {
        self.registry.to_prompt_section()
    }

    /// 执行指定工具；超时返回 ToolTimeout，工具返回 Err 则转为 ToolExecutionFailed；输出 JSON 审计日志
    pub async fn execute(
        &self,
        tool_name: &str,
        args: serde_json::Value,
    ) -> Result<String, AgentError> {
        let tool = self
            .registry
            .resolve(tool_name)
            .ok_or_else(|| AgentError::ToolExecutionFailed(format!("unknown tool {tool_name}")))?;

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, tool.execute(args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(AgentError::ToolExecutionFailed(e)),
            Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
        }
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
