//! Mock LLM 客户端（用于测试，无需 API）
//!
//! MockLlmClient 固定返回一条完成标志回复，便于本地跑通整个执行循环；
//! ScriptedLlmClient 按脚本顺序吐出预设回复/错误，用于覆盖各条路由分支。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::conversation::Message;
use crate::llm::{LlmClient, ModelError};

/// Mock 客户端：对任何输入都回复完成标志
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let last = messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!("已收到:「{last}」。任务已完成。"))
    }
}

/// 脚本化客户端：按顺序消费预设回复；脚本耗尽后返回不可恢复错误
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
}

impl ScriptedLlmClient {
    pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    /// 剩余未消费的脚本条数
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String, ModelError> {
        let next = self
            .script
            .lock()
            .map_err(|_| ModelError::fatal("script lock poisoned"))?
            .pop_front();
        next.unwrap_or_else(|| Err(ModelError::fatal("script exhausted")))
    }
}
