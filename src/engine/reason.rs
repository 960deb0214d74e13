//! 推理阶段：调用模型产出下一条 assistant 消息
//!
//! 首次进入时把系统指令（含可用工具清单）插到对话最前面（按 System 角色扫描判断，
//! 只发生一次），然后提交完整对话快照。回复文本中的 JSON 工具调用被解析为结构化请求挂到消息上。
//! attempts 仅在本阶段加 1；transient 模型错误重试一次，再失败升级为任务 failed。

use std::sync::Arc;

use crate::conversation::{Message, ToolRequest};
use crate::core::AgentError;
use crate::engine::AgentState;
use crate::llm::{invoke_with_retry, LlmClient};

/// 推理阶段；system_directive 为拼好工具清单的完整系统消息文本
pub struct ReasonStage {
    llm: Arc<dyn LlmClient>,
    system_directive: String,
}

impl ReasonStage {
    pub fn new(llm: Arc<dyn LlmClient>, system_directive: String) -> Self {
        Self {
            llm,
            system_directive,
        }
    }

    pub async fn run(&self, state: &mut AgentState) -> Result<(), AgentError> {
        state.conversation.ensure_system(&self.system_directive);

        let snapshot = state.conversation.snapshot();
        let output = invoke_with_retry(self.llm.as_ref(), &snapshot).await?;

        let tool_calls = parse_tool_requests(&output);
        if tool_calls.is_empty() {
            state.conversation.push(Message::assistant(output));
        } else {
            tracing::debug!(count = tool_calls.len(), "assistant requested tool calls");
            state
                .conversation
                .push(Message::assistant_with_tools(output, tool_calls));
        }

        state.attempts += 1;
        Ok(())
    }
}

/// 从模型输出中尽力提取工具调用请求
///
/// 支持 ```json 围栏、裸 JSON 对象（单个调用）与 JSON 数组（多个调用，保持顺序）。
/// 提取失败或 tool 字段为空时视为普通回复，不报错。
pub fn parse_tool_requests(output: &str) -> Vec<ToolRequest> {
    let trimmed = output.trim();

    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let inner = rest
            .find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim());
        return parse_candidate(inner);
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if end > start {
            let parsed = parse_candidate(&trimmed[start..=end]);
            if !parsed.is_empty() {
                return parsed;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return parse_candidate(&trimmed[start..=end]);
        }
    }

    Vec::new()
}

fn parse_candidate(json_str: &str) -> Vec<ToolRequest> {
    if let Ok(single) = serde_json::from_str::<ToolRequest>(json_str) {
        if single.tool.is_empty() {
            return Vec::new();
        }
        return vec![single];
    }

    if let Ok(many) = serde_json::from_str::<Vec<ToolRequest>>(json_str) {
        return many.into_iter().filter(|t| !t.tool.is_empty()).collect();
    }

    Vec::new()
}
