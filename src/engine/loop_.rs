//! 执行引擎主循环
//!
//! 循环体：查取消/截止 -> 路由 -> 执行阶段 -> 完成检测。取消只在每轮循环顶部观察
//! （不在阶段中途），命中后立即转为 canceled，最后一个完成的阶段之外没有半截副作用。
//! 完成检测独立于路由，在每次 Reason / Reflect 之后运行，可在反思中途直接终止。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;
use crate::engine::dispatch::ToolDispatcher;
use crate::engine::planner::Planner;
use crate::engine::reason::ReasonStage;
use crate::engine::reflector::Reflector;
use crate::engine::prompts::system_directive_with_tools;
use crate::engine::router::{completion, route, Completion, Stage};
use crate::engine::{AgentState, TaskStatus};
use crate::llm::LlmClient;
use crate::store::TaskStore;
use crate::tools::ToolExecutor;

/// 执行结束时的终态汇总，交给上报器翻译为任务存储的状态词汇
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    /// 完成时的最终产出（最近一条 assistant 消息）
    pub result: Option<String>,
    /// 失败/取消时的人类可读说明（不含原始异常负载）
    pub error: Option<String>,
    pub attempts: u32,
    pub execution_secs: f64,
}

/// 轮询用的进度快照（advisory，不构成契约）
#[derive(Debug, Clone)]
pub struct Progress {
    pub attempts: u32,
    pub plan_steps: usize,
    pub reflections: usize,
    pub status: TaskStatus,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            attempts: 0,
            plan_steps: 0,
            reflections: 0,
            status: TaskStatus::Pending,
        }
    }
}

/// 执行引擎：驱动单个任务执行的有界状态机
pub struct ExecutionEngine {
    planner: Planner,
    reason: ReasonStage,
    reflector: Reflector,
    dispatcher: ToolDispatcher,
    cancel_token: CancellationToken,
    deadline: Option<Duration>,
    progress_tx: Option<watch::Sender<Progress>>,
}

impl ExecutionEngine {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        task_store: Arc<dyn TaskStore>,
        executor: Arc<ToolExecutor>,
    ) -> Self {
        let tools_section = executor.prompt_section();
        Self {
            planner: Planner::new(llm.clone(), task_store, tools_section.clone()),
            reason: ReasonStage::new(llm.clone(), system_directive_with_tools(&tools_section)),
            reflector: Reflector::new(llm),
            dispatcher: ToolDispatcher::new(executor),
            cancel_token: CancellationToken::new(),
            deadline: None,
            progress_tx: None,
        }
    }

    /// 设置取消令牌（每个执行一个，调用方持另一端）
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// 设置 wall-clock 截止时间，超过时按 failed（超时）处理
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 设置进度推送端（供轮询方观察 attempts / 计划长度）
    pub fn with_progress_tx(mut self, tx: watch::Sender<Progress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// 驱动状态机直到终态；终态写回 state.status，之后不再有任何追加
    pub async fn run(&self, state: &mut AgentState) -> EngineOutcome {
        let started = Instant::now();

        loop {
            self.publish_progress(state);

            if self.cancel_token.is_cancelled() {
                tracing::info!(task_id = %state.task_id, "cancellation observed");
                return self.finish(
                    state,
                    started,
                    TaskStatus::Canceled,
                    Some(AgentError::CancellationRequested(state.task_id.clone()).to_string()),
                );
            }

            if let Some(deadline) = self.deadline {
                if started.elapsed() >= deadline {
                    tracing::warn!(task_id = %state.task_id, "execution deadline exceeded");
                    return self.finish(
                        state,
                        started,
                        TaskStatus::Failed,
                        Some(AgentError::DeadlineExceeded(state.task_id.clone()).to_string()),
                    );
                }
            }

            let stage = route(state);
            tracing::debug!(task_id = %state.task_id, ?stage, attempts = state.attempts, "stage");

            let stage_result = match stage {
                Stage::End => {
                    // 空对话：正常流程不可达（状态以任务指令开场）
                    return self.finish(
                        state,
                        started,
                        TaskStatus::Failed,
                        Some("conversation log is empty".to_string()),
                    );
                }
                Stage::Plan => self.planner.run(state).await,
                Stage::Reason => self.reason.run(state).await,
                Stage::Reflect => self.reflector.run(state).await,
                Stage::Tools => {
                    self.dispatcher.run(state).await;
                    Ok(())
                }
            };

            if let Err(e) = stage_result {
                tracing::error!(task_id = %state.task_id, error = %e, "stage failed");
                return self.finish(state, started, TaskStatus::Failed, Some(e.to_string()));
            }

            if matches!(stage, Stage::Reason | Stage::Reflect) {
                match completion(state) {
                    Some(Completion::Indicated) => {
                        return self.finish(state, started, TaskStatus::Completed, None);
                    }
                    Some(Completion::CeilingExceeded) => {
                        return self.finish(
                            state,
                            started,
                            TaskStatus::Failed,
                            Some(
                                AgentError::IterationCeilingExceeded(state.attempts).to_string(),
                            ),
                        );
                    }
                    None => {}
                }
            }
        }
    }

    fn publish_progress(&self, state: &AgentState) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(Progress {
                attempts: state.attempts,
                plan_steps: state.plan.as_ref().map(Vec::len).unwrap_or(0),
                reflections: state.reflections.len(),
                status: state.status,
            });
        }
    }

    fn finish(
        &self,
        state: &mut AgentState,
        started: Instant,
        status: TaskStatus,
        error: Option<String>,
    ) -> EngineOutcome {
        state.status = status;
        self.publish_progress(state);
        EngineOutcome {
            task_id: state.task_id.clone(),
            status,
            result: state.last_assistant_content().map(String::from),
            error,
            attempts: state.attempts,
            execution_secs: started.elapsed().as_secs_f64(),
        }
    }
}
