//! LLM 层：模型客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::OpenAiClient;
pub use traits::{invoke_with_retry, LlmClient, ModelError};

use crate::config::AppConfig;

/// 按配置创建模型客户端；provider=mock 用于本地验证流程
pub fn create_client_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    match cfg.llm.provider.as_str() {
        "mock" => Arc::new(MockLlmClient),
        _ => Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            None,
        )),
    }
}
