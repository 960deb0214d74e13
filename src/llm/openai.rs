//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 DeepSeek、OpenAI、自建代理等。
//! 网络层错误视为 transient（推理阶段会重试一次），API 层错误视为不可恢复。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::conversation::{Message, Role};
use crate::llm::{LlmClient, ModelError};

/// OpenAI 兼容客户端：持有 Client 与 model 名，complete 时转 Message 为 API 格式并取首条 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    /// 工具结果以 user 消息传输（文本协议，不绑定 function-calling 接口）
    fn to_openai_messages(&self, messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::Tool => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(format!("Tool result: {}", m.content))
                        .build()
                        .unwrap(),
                ),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages))
            .build()
            .map_err(|e| ModelError::fatal(format!("request build failed: {e}")))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| match e {
                OpenAIError::Reqwest(inner) => {
                    ModelError::transient(format!("network error: {inner}"))
                }
                other => ModelError::fatal(other.to_string()),
            })?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ModelError::fatal("empty completion".to_string()))
    }
}
