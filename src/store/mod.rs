//! 外部协作方：任务存储与知识库
//!
//! 引擎只通过这两个 trait 与持久层交互；HTTP CRUD 层在引擎之外。

pub mod knowledge_store;
pub mod task_store;

pub use knowledge_store::{InMemoryKnowledgeStore, KnowledgeStore};
pub use task_store::{InMemoryTaskStore, TaskStore};
