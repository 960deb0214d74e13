//! 任务存储 trait 与内存实现
//!
//! 引擎侧只需要 get_task / set_status 两个操作；set_status 对同一任务串行化写入
//! （内存实现用 RwLock 保证），避免并发重试时丢失更新。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::AgentError;
use crate::engine::{TaskInfo, TaskStatus};

/// 任务存储：读取任务元数据、写回终态
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_task(&self, task_id: &str) -> Result<TaskInfo, AgentError>;

    /// 写回任务状态与最终结果（result 为完成产出或人类可读的错误说明）
    async fn set_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        result: Option<String>,
    ) -> Result<(), AgentError>;
}

#[derive(Debug, Clone)]
struct TaskRecord {
    info: TaskInfo,
    status: TaskStatus,
    result: Option<String>,
}

/// 内存任务存储（测试与单进程部署用）
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个任务，返回其 ID（未提供则生成 task_<uuid>）
    pub async fn insert(&self, mut info: TaskInfo) -> String {
        if info.id.is_empty() {
            info.id = format!("task_{}", uuid::Uuid::new_v4());
        }
        let id = info.id.clone();
        self.tasks.write().await.insert(
            id.clone(),
            TaskRecord {
                info,
                status: TaskStatus::Pending,
                result: None,
            },
        );
        id
    }

    /// 读取最近一次写回的状态与结果
    pub async fn status(&self, task_id: &str) -> Option<(TaskStatus, Option<String>)> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .map(|r| (r.status, r.result.clone()))
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_task(&self, task_id: &str) -> Result<TaskInfo, AgentError> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .map(|r| r.info.clone())
            .ok_or_else(|| AgentError::TaskNotFound(task_id.to_string()))
    }

    async fn set_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        result: Option<String>,
    ) -> Result<(), AgentError> {
        let mut tasks = self.tasks.write().await;
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| AgentError::TaskNotFound(task_id.to_string()))?;
        record.status = status;
        record.result = result;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_set_status() {
        let store = InMemoryTaskStore::new();
        let id = store
            .insert(TaskInfo::new("整理周报", "收集本周进展并生成周报"))
            .await;
        let info = store.get_task(&id).await.unwrap();
        assert_eq!(info.title, "整理周报");

        store
            .set_status(&id, TaskStatus::Completed, Some("done".into()))
            .await
            .unwrap();
        let (status, result) = store.status(&id).await.unwrap();
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(result.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let store = InMemoryTaskStore::new();
        assert!(matches!(
            store.get_task("nope").await,
            Err(AgentError::TaskNotFound(_))
        ));
    }
}
