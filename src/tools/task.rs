//! 任务存储工具：查询详情与更新状态
//!
//! get_task_details / update_task_status，对 TaskStore 的薄封装。
//! 工具只触碰外部存储，不允许修改执行中的 plan / attempts。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::TaskStatus;
use crate::store::TaskStore;
use crate::tools::Tool;

/// 获取任务详细信息
pub struct GetTaskDetailsTool {
    store: Arc<dyn TaskStore>,
}

impl GetTaskDetailsTool {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetTaskDetailsTool {
    fn name(&self) -> &str {
        "get_task_details"
    }

    fn description(&self) -> &str {
        "获取任务详细信息。参数: {\"task_id\": \"任务ID\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "任务 ID" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let task_id = args
            .get("task_id")
            .and_then(Value::as_str)
            .ok_or("missing required arg: task_id")?;
        let info = self
            .store
            .get_task(task_id)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&info).map_err(|e| e.to_string())
    }
}

/// 更新任务状态
pub struct UpdateTaskStatusTool {
    store: Arc<dyn TaskStore>,
}

impl UpdateTaskStatusTool {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateTaskStatusTool {
    fn name(&self) -> &str {
        "update_task_status"
    }

    fn description(&self) -> &str {
        "更新任务状态。参数: {\"task_id\": \"任务ID\", \"status\": \"pending|running|completed|failed|canceled\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" },
                "status": {
                    "type": "string",
                    "enum": ["pending", "running", "completed", "failed", "canceled"]
                }
            },
            "required": ["task_id", "status"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let task_id = args
            .get("task_id")
            .and_then(Value::as_str)
            .ok_or("missing required arg: task_id")?;
        let status_str = args
            .get("status")
            .and_then(Value::as_str)
            .ok_or("missing required arg: status")?;
        let status = TaskStatus::parse(status_str)
            .ok_or_else(|| format!("unknown status: {status_str}"))?;
        self.store
            .set_status(task_id, status, None)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("任务 {task_id} 状态已更新为 {status_str}"))
    }
}
