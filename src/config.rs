//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `STEWARD__*` 覆盖
//! （双下划线表示嵌套，如 `STEWARD__LLM__PROVIDER=mock`）。

use serde::Deserialize;

use crate::core::AgentError;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentSection,
    pub llm: LlmSection,
}

/// [agent] 段：执行边界
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 工具调用统一超时（秒）
    pub tool_timeout_secs: u64,
    /// 单个执行的 wall-clock 截止时间（秒），0 表示不设截止
    pub deadline_secs: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
            deadline_secs: 0,
        }
    }
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai（兼容端点）/ mock
    pub provider: String,
    pub model: String,
    /// OpenAI 兼容端点地址；留空用官方端点
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4-turbo".to_string(),
            base_url: None,
        }
    }
}

/// 加载配置；文件缺失时用默认值，环境变量仍然生效
pub fn load_config(path: Option<&str>) -> Result<AppConfig, AgentError> {
    let path = path.unwrap_or("config/default.toml");
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("STEWARD").separator("__"))
        .build()
        .map_err(|e| AgentError::ConfigError(e.to_string()))?;

    settings
        .try_deserialize()
        .map_err(|e| AgentError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.agent.tool_timeout_secs, 30);
        assert_eq!(cfg.agent.deadline_secs, 0);
        assert_eq!(cfg.llm.provider, "openai");
    }
}
