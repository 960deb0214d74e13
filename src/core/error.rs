//! Agent 错误类型
//!
//! 阶段内可吸收的错误（工具失败）不出现在这里：它们以 tool 消息的形式写回对话，
//! 由模型自行调整。这里只定义需要引擎或上层处理的系统性错误。

use thiserror::Error;

/// Agent 运行过程中的系统性错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型调用失败；transient=true 时推理阶段会重试一次，再失败则任务 failed
    #[error("Model invocation failed: {message}")]
    ModelInvocation { message: String, transient: bool },

    /// 工具执行超时（执行器统一施加的超时，与工具自身行为无关）
    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 工具执行失败
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// 达到尝试次数上限仍未出现完成标志
    #[error("Iteration ceiling exceeded after {0} attempts")]
    IterationCeilingExceeded(u32),

    /// 超过任务级 wall-clock 截止时间
    #[error("Execution deadline exceeded for task {0}")]
    DeadlineExceeded(String),

    /// 调用方请求取消（与 failed 区分，便于调用方辨别主动停止）
    #[error("Cancellation requested for task {0}")]
    CancellationRequested(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// 同一任务已有在途执行（执行按任务 ID 串行化，不允许并发提交）
    #[error("Task already running: {0}")]
    TaskAlreadyRunning(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}
