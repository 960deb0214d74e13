//! 知识库 trait 与内存实现
//!
//! 以查询/主题为键的自由文本片段，作为众多工具之一被模型使用。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// 知识库：按关键词检索与写入
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// 检索与 query 相关的片段（子串匹配），无命中时返回空列表
    async fn search(&self, query: &str) -> Vec<String>;

    /// 以 key 为主题写入一段内容，覆盖同名条目
    async fn save(&self, key: &str, content: &str);
}

/// 内存知识库
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn search(&self, query: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(key, content)| key.contains(query) || content.contains(query))
            .map(|(key, content)| format!("[{key}] {content}"))
            .collect()
    }

    async fn save(&self, key: &str, content: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), content.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_search() {
        let store = InMemoryKnowledgeStore::new();
        store.save("周报格式", "标题、进展、风险三段式").await;
        let hits = store.search("周报").await;
        assert_eq!(hits.len(), 1);
        assert!(hits[0].contains("三段式"));
        assert!(store.search("不存在的主题").await.is_empty());
    }
}
