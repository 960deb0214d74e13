//! Reflector：周期性自我批评
//!
//! 追加反思指令、提交模型、把批评写回对话，并在 reflections 中记录
//! {attempt, content, timestamp}。是否轮到反思由路由判断（节奏 + 幂等保护）；
//! 本阶段不增加 attempts，推理阶段才计数。

use std::sync::Arc;

use chrono::Utc;

use crate::conversation::Message;
use crate::core::AgentError;
use crate::engine::prompts::REFLECTION_DIRECTIVE;
use crate::engine::{AgentState, Reflection};
use crate::llm::{invoke_with_retry, LlmClient};

/// 反思阶段
pub struct Reflector {
    llm: Arc<dyn LlmClient>,
}

impl Reflector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn run(&self, state: &mut AgentState) -> Result<(), AgentError> {
        state.conversation.push(Message::user(REFLECTION_DIRECTIVE));

        let snapshot = state.conversation.snapshot();
        let critique = invoke_with_retry(self.llm.as_ref(), &snapshot).await?;
        state.conversation.push(Message::assistant(critique.clone()));

        state.reflections.push(Reflection {
            attempt: state.attempts,
            content: critique,
            timestamp: Utc::now(),
        });
        tracing::debug!(
            task_id = %state.task_id,
            attempt = state.attempts,
            "reflection recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[tokio::test]
    async fn test_reflection_recorded_without_attempt_increment() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![Ok("计划合理，继续执行".into())]));
        let reflector = Reflector::new(llm);
        let mut state = AgentState::new("t1", "示例任务");
        state.attempts = 3;

        reflector.run(&mut state).await.unwrap();

        assert_eq!(state.attempts, 3);
        assert_eq!(state.reflections.len(), 1);
        assert_eq!(state.reflections[0].attempt, 3);
        let messages = state.conversation.messages();
        assert!(messages[messages.len() - 2]
            .content
            .contains(REFLECTION_DIRECTIVE));
    }
}
