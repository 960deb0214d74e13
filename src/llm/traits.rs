//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：给定有序对话历史，返回下一条回复文本。
//! 后端由配置选择，引擎侧不做任何同步/特定后端假设。

use async_trait::async_trait;

use crate::conversation::Message;
use crate::core::AgentError;

/// 模型调用错误；transient=true 表示可重试（网络抖动、限流等）
#[derive(Debug, Clone)]
pub struct ModelError {
    pub message: String,
    pub transient: bool,
}

impl ModelError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: true }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: false }
    }
}

impl From<ModelError> for AgentError {
    fn from(e: ModelError) -> Self {
        AgentError::ModelInvocation { message: e.message, transient: e.transient }
    }
}

/// LLM 客户端 trait：无状态的请求/响应能力，必须可被多个并发执行安全共享
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError>;
}

/// 调用模型，transient 错误重试一次后升级；非 transient 错误立即升级。
/// 推理阶段的重试边界，Planner / Reflector 共用同一策略。
pub async fn invoke_with_retry(
    llm: &dyn LlmClient,
    messages: &[Message],
) -> Result<String, AgentError> {
    match llm.complete(messages).await {
        Ok(output) => Ok(output),
        Err(e) if e.transient => {
            tracing::warn!(error = %e.message, "transient model error, retrying once");
            llm.complete(messages).await.map_err(AgentError::from)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[tokio::test]
    async fn test_transient_error_retried_once() {
        let llm = ScriptedLlmClient::new(vec![
            Err(ModelError::transient("blip")),
            Ok("recovered".to_string()),
        ]);
        let out = invoke_with_retry(&llm, &[]).await.unwrap();
        assert_eq!(out, "recovered");
    }

    #[tokio::test]
    async fn test_second_transient_failure_escalates() {
        let llm = ScriptedLlmClient::new(vec![
            Err(ModelError::transient("blip")),
            Err(ModelError::transient("blip again")),
        ]);
        let err = invoke_with_retry(&llm, &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::ModelInvocation { .. }));
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let llm = ScriptedLlmClient::new(vec![
            Err(ModelError::fatal("bad api key")),
            Ok("should not be reached".to_string()),
        ]);
        let err = invoke_with_retry(&llm, &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::ModelInvocation { transient: false, .. }));
        assert_eq!(llm.remaining(), 1);
    }
}
