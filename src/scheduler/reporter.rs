//! 任务终态上报与轮询快照
//!
//! 把引擎终态翻译为任务存储的状态词汇并写回；对外的失败说明始终携带任务 ID
//! 与人类可读的错误串，不透出原始异常负载。

use crate::core::AgentError;
use crate::engine::{EngineOutcome, Progress, TaskStatus, MAX_ATTEMPTS};
use crate::store::TaskStore;

/// 轮询返回：状态 + 可选进度提示（advisory，不构成契约）
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub task_id: String,
    pub status: TaskStatus,
    /// 0-100 的粗略进度，由 attempts / 计划长度推导
    pub progress_hint: Option<u8>,
}

/// 将引擎终态写回任务存储（含执行耗时日志）
pub async fn report(store: &dyn TaskStore, outcome: &EngineOutcome) -> Result<(), AgentError> {
    let payload = match outcome.status {
        TaskStatus::Completed => outcome.result.clone(),
        TaskStatus::Failed | TaskStatus::Canceled => Some(format!(
            "任务 {} 终态 {}: {}",
            outcome.task_id,
            outcome.status.as_str(),
            outcome.error.as_deref().unwrap_or("无详细说明"),
        )),
        _ => None,
    };

    tracing::info!(
        task_id = %outcome.task_id,
        status = outcome.status.as_str(),
        attempts = outcome.attempts,
        execution_secs = outcome.execution_secs,
        "task terminal status reported"
    );

    store
        .set_status(&outcome.task_id, outcome.status, payload)
        .await
}

/// 由进度快照推导粗略的完成百分比；运行中永不报 100
pub fn progress_hint(progress: &Progress) -> u8 {
    if progress.plan_steps == 0 {
        return 0;
    }
    let pct = (progress.attempts as u64 * 100) / (u64::from(MAX_ATTEMPTS) + 1);
    pct.min(99) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_hint_bounds() {
        assert_eq!(progress_hint(&Progress::default()), 0);
        let running = Progress {
            attempts: 5,
            plan_steps: 4,
            ..Progress::default()
        };
        let hint = progress_hint(&running);
        assert!(hint > 0 && hint < 100);
        let saturated = Progress {
            attempts: 50,
            plan_steps: 4,
            ..Progress::default()
        };
        assert_eq!(progress_hint(&saturated), 99);
    }
}
