//! Steward - 任务管家系统的智能体执行引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **conversation**: 只追加的对话日志（模型上下文的唯一来源）
//! - **core**: 错误类型
//! - **engine**: Agent 状态、路由、各执行阶段（Plan / Reason / Tools / Reflect）与主循环
//! - **llm**: 模型客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **scheduler**: 并发任务执行、取消、轮询与终态上报
//! - **store**: 外部协作方（任务存储 / 知识库）的 trait 与内存实现
//! - **tools**: 工具 trait、注册表、超时执行器与内置工具

pub mod config;
pub mod conversation;
pub mod core;
pub mod engine;
pub mod llm;
pub mod observability;
pub mod scheduler;
pub mod store;
pub mod tools;

pub use crate::core::AgentError;
pub use conversation::{ConversationLog, Message, Role, ToolRequest};
pub use engine::{AgentState, EngineOutcome, ExecutionEngine, TaskStatus};
pub use scheduler::Scheduler;
