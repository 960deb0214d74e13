//! 知识库工具：检索与保存
//!
//! search_knowledge_base / save_to_knowledge_base，都是对 KnowledgeStore 的薄封装。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::KnowledgeStore;
use crate::tools::Tool;

/// 搜索知识库获取相关信息
pub struct SearchKnowledgeTool {
    store: Arc<dyn KnowledgeStore>,
}

impl SearchKnowledgeTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "搜索知识库获取相关信息。参数: {\"query\": \"关键词\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "检索关键词" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or("missing required arg: query")?;
        let hits = self.store.search(query).await;
        if hits.is_empty() {
            Ok(format!("知识库中没有关于'{query}'的记录"))
        } else {
            Ok(hits.join("\n"))
        }
    }
}

/// 将信息保存到知识库
pub struct SaveKnowledgeTool {
    store: Arc<dyn KnowledgeStore>,
}

impl SaveKnowledgeTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveKnowledgeTool {
    fn name(&self) -> &str {
        "save_to_knowledge_base"
    }

    fn description(&self) -> &str {
        "将信息保存到知识库。参数: {\"key\": \"主题\", \"content\": \"内容\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "主题键名" },
                "content": { "type": "string", "description": "要保存的内容" }
            },
            "required": ["key", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let key = args
            .get("key")
            .and_then(Value::as_str)
            .ok_or("missing required arg: key")?;
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .ok_or("missing required arg: content")?;
        self.store.save(key, content).await;
        Ok(format!("信息已保存到知识库，键名: {key}"))
    }
}
