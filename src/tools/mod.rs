//! 工具箱：trait、注册表、超时执行器与内置工具

pub mod executor;
pub mod knowledge;
pub mod registry;
pub mod sop;
pub mod task;

use std::sync::Arc;

pub use executor::ToolExecutor;
pub use knowledge::{SaveKnowledgeTool, SearchKnowledgeTool};
pub use registry::{Tool, ToolRegistry};
pub use sop::GetSopTemplateTool;
pub use task::{GetTaskDetailsTool, UpdateTaskStatusTool};

use crate::store::{KnowledgeStore, TaskStore};

/// 注册全部内置工具（知识库检索/保存、任务详情/状态、SOP 模板）
pub fn builtin_registry(
    task_store: Arc<dyn TaskStore>,
    knowledge_store: Arc<dyn KnowledgeStore>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SearchKnowledgeTool::new(knowledge_store.clone()));
    registry.register(SaveKnowledgeTool::new(knowledge_store));
    registry.register(GetTaskDetailsTool::new(task_store.clone()));
    registry.register(UpdateTaskStatusTool::new(task_store));
    registry.register(GetSopTemplateTool);
    registry
}
