//! 工具调度：执行最后一条 assistant 消息携带的工具调用
//!
//! 严格按请求顺序执行并回写结果（模型下一轮按序阅读）。未注册的工具不抛错，
//! 而是写回 {"error": "unknown tool <name>"} 负载，让模型自行调整；
//! 执行异常与超时同样以错误负载吸收。本阶段不触碰 plan 与 attempts。

use std::sync::Arc;

use crate::conversation::{Message, Role, ToolRequest};
use crate::engine::AgentState;
use crate::tools::ToolExecutor;

/// 工具调度阶段
pub struct ToolDispatcher {
    executor: Arc<ToolExecutor>,
}

impl ToolDispatcher {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run(&self, state: &mut AgentState) {
        let requests: Vec<ToolRequest> = match state.conversation.last() {
            Some(m) if m.role == Role::Assistant => m.tool_calls.clone(),
            _ => Vec::new(),
        };

        for request in requests {
            let payload = self.dispatch_one(&request).await;
            state.conversation.push(Message::tool(payload));
        }
    }

    /// 单个调用：解析失败/执行失败/超时都折叠为 JSON 负载字符串
    async fn dispatch_one(&self, request: &ToolRequest) -> String {
        if self.executor.resolve(&request.tool).is_none() {
            tracing::warn!(tool = %request.tool, "unknown tool requested");
            return serde_json::json!({
                "error": format!("unknown tool {}", request.tool)
            })
            .to_string();
        }

        match self.executor.execute(&request.tool, request.args.clone()).await {
            Ok(result) => serde_json::json!({
                "tool": request.tool,
                "result": result,
            })
            .to_string(),
            Err(e) => serde_json::json!({
                "tool": request.tool,
                "error": e.to_string(),
            })
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::Value;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "uppercases the text arg"
        }

        async fn execute(&self, args: Value) -> Result<String, String> {
            args.get("text")
                .and_then(Value::as_str)
                .map(|s| s.to_uppercase())
                .ok_or_else(|| "missing text".to_string())
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(UpperTool);
        ToolDispatcher::new(Arc::new(ToolExecutor::new(registry, 30)))
    }

    #[tokio::test]
    async fn test_results_in_request_order() {
        let mut state = AgentState::new("t1", "示例任务");
        state.conversation.push(Message::assistant_with_tools(
            "两个调用",
            vec![
                ToolRequest {
                    tool: "upper".into(),
                    args: serde_json::json!({"text": "a"}),
                },
                ToolRequest {
                    tool: "upper".into(),
                    args: serde_json::json!({"text": "b"}),
                },
            ],
        ));
        dispatcher().run(&mut state).await;

        let messages = state.conversation.messages();
        let tail: Vec<&Message> = messages.iter().rev().take(2).rev().collect();
        assert!(tail[0].content.contains("\"A\""));
        assert!(tail[1].content.contains("\"B\""));
        assert!(tail.iter().all(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn test_unknown_tool_absorbed_as_error_payload() {
        let mut state = AgentState::new("t1", "示例任务");
        state.conversation.push(Message::assistant_with_tools(
            "调用不存在的工具",
            vec![ToolRequest {
                tool: "foo".into(),
                args: Value::Null,
            }],
        ));
        dispatcher().run(&mut state).await;

        let last = state.conversation.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert!(last.content.contains("unknown tool foo"));
    }

    #[tokio::test]
    async fn test_tool_failure_absorbed() {
        let mut state = AgentState::new("t1", "示例任务");
        state.conversation.push(Message::assistant_with_tools(
            "缺参数",
            vec![ToolRequest {
                tool: "upper".into(),
                args: Value::Null,
            }],
        ));
        dispatcher().run(&mut state).await;

        let last = state.conversation.last().unwrap();
        assert!(last.content.contains("error"));
    }
}
