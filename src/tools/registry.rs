//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找。
//! 注册表构建后只读，可被多个并发执行安全共享。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；Err 为工具自身的失败说明，不中断执行循环
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// 按名解析；未注册返回 None（由调度器转为错误负载写回对话）
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 渲染可用工具清单（名称、描述与参数 schema），按名称排序后拼入指令文本，
    /// 让模型知道有哪些工具以及参数怎么填
    pub fn to_prompt_section(&self) -> String {
        let mut names = self.tool_names();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.tools.get(&name).cloned())
            .map(|tool| {
                format!(
                    "- {}: {}\n  参数 schema: {}",
                    tool.name(),
                    tool.description(),
                    tool.parameters_schema()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
