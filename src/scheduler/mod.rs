//! 任务调度：并发执行、取消、轮询
//!
//! 每次提交生成一个独立的执行（fire-and-forget）：独占的 AgentState、专属的取消令牌、
//! 可选的 wall-clock 截止时间。并发执行之间只共享只读的工具执行器与无状态的模型客户端。
//! 执行按任务 ID 串行化：同一任务在途时拒绝再次提交。句柄只在在途期间存在，
//! 到达终态后由执行自身归档终态并摘除句柄，轮询与等待改走归档。
//! 不跨模型/工具调用持锁；句柄表与归档表的锁只在提交与查询的瞬间持有。

pub mod reporter;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use reporter::{progress_hint, report, StatusReport};

use crate::core::AgentError;
use crate::engine::{AgentState, EngineOutcome, ExecutionEngine, Progress, TaskStatus};
use crate::llm::LlmClient;
use crate::store::TaskStore;
use crate::tools::ToolExecutor;

/// 单个在途执行的句柄
struct ExecutionHandle {
    cancel: CancellationToken,
    progress: watch::Receiver<Progress>,
    join: Mutex<Option<JoinHandle<EngineOutcome>>>,
}

/// 任务调度器：提交、取消、轮询与等待
pub struct Scheduler {
    llm: Arc<dyn LlmClient>,
    task_store: Arc<dyn TaskStore>,
    executor: Arc<ToolExecutor>,
    deadline: Option<Duration>,
    /// 在途执行句柄；条目存在即表示该任务正在执行
    executions: Arc<RwLock<HashMap<String, Arc<ExecutionHandle>>>>,
    /// 已终态执行的归档（仅终态 EngineOutcome，不保留句柄）
    finished: Arc<RwLock<HashMap<String, EngineOutcome>>>,
}

impl Scheduler {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        task_store: Arc<dyn TaskStore>,
        executor: Arc<ToolExecutor>,
    ) -> Self {
        Self {
            llm,
            task_store,
            executor,
            deadline: None,
            executions: Arc::new(RwLock::new(HashMap::new())),
            finished: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 为所有后续提交设置统一的执行截止时间
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 提交任务执行（fire-and-forget）。任务不存在时报错；同一任务在途时拒绝，
    /// 避免两个引擎对同一任务 ID 竞争写回状态。终态后允许重新提交。
    pub async fn submit(&self, task_id: &str) -> Result<(), AgentError> {
        // 整个提交过程持句柄表写锁，与执行结束时的摘除串行化
        let mut executions = self.executions.write().await;
        if executions.contains_key(task_id) {
            return Err(AgentError::TaskAlreadyRunning(task_id.to_string()));
        }

        let info = self.task_store.get_task(task_id).await?;
        self.task_store
            .set_status(task_id, TaskStatus::Running, None)
            .await?;
        self.finished.write().await.remove(task_id);

        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(Progress::default());

        let mut engine = ExecutionEngine::new(
            self.llm.clone(),
            self.task_store.clone(),
            self.executor.clone(),
        )
        .with_cancel_token(cancel.clone())
        .with_progress_tx(progress_tx);
        if let Some(deadline) = self.deadline {
            engine = engine.with_deadline(deadline);
        }

        let store = self.task_store.clone();
        let executions_map = self.executions.clone();
        let finished = self.finished.clone();
        let id = task_id.to_string();
        let mut state = AgentState::new(task_id, &info.description);
        state.task_info = Some(info);

        let join = tokio::spawn(async move {
            let outcome = engine.run(&mut state).await;
            if let Err(e) = report(store.as_ref(), &outcome).await {
                tracing::error!(task_id = %outcome.task_id, error = %e, "status report failed");
            }
            // 先归档终态再摘句柄，轮询方在任一时刻都能看到两者之一
            finished.write().await.insert(id.clone(), outcome.clone());
            executions_map.write().await.remove(&id);
            outcome
        });

        executions.insert(
            task_id.to_string(),
            Arc::new(ExecutionHandle {
                cancel,
                progress: progress_rx,
                join: Mutex::new(Some(join)),
            }),
        );
        Ok(())
    }

    /// 请求取消在途执行；引擎在下一轮循环顶部观察到后转为 canceled。
    /// 已终态的任务取消为 no-op。
    pub async fn cancel(&self, task_id: &str) -> Result<(), AgentError> {
        if let Some(handle) = self.executions.read().await.get(task_id) {
            handle.cancel.cancel();
            return Ok(());
        }
        if self.finished.read().await.contains_key(task_id) {
            return Ok(());
        }
        Err(AgentError::TaskNotFound(task_id.to_string()))
    }

    /// 轮询任务状态：在途执行的最新快照，已终态的走归档；尚未提交的任务报 pending
    pub async fn status(&self, task_id: &str) -> Result<StatusReport, AgentError> {
        self.task_store.get_task(task_id).await?;

        if let Some(handle) = self.executions.read().await.get(task_id) {
            let progress = handle.progress.borrow().clone();
            return Ok(StatusReport {
                task_id: task_id.to_string(),
                status: progress.status,
                progress_hint: Some(progress_hint(&progress)),
            });
        }

        if let Some(outcome) = self.finished.read().await.get(task_id) {
            return Ok(StatusReport {
                task_id: task_id.to_string(),
                status: outcome.status,
                progress_hint: None,
            });
        }

        Ok(StatusReport {
            task_id: task_id.to_string(),
            status: TaskStatus::Pending,
            progress_hint: None,
        })
    }

    /// 等待某个执行结束并取回终态；执行已结束时返回归档的终态，
    /// 从未提交过的任务返回 None
    pub async fn wait(&self, task_id: &str) -> Option<EngineOutcome> {
        let handle = {
            let executions = self.executions.read().await;
            executions.get(task_id).cloned()
        };
        if let Some(handle) = handle {
            let join = handle.join.lock().await.take();
            if let Some(join) = join {
                if let Ok(outcome) = join.await {
                    return Some(outcome);
                }
            }
        }
        self.finished.read().await.get(task_id).cloned()
    }
}
