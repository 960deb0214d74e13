//! Planner：首次进入时合成结构化执行计划
//!
//! 从任务存储取元数据，拼规划指令、任务字段与可用工具清单发给模型，按行切分回复提取步骤，
//! 丢弃已知标题行；解析不到任何步骤时退化为单条兜底步骤（降级而非失败）。
//! plan 已存在时为 no-op，保证每个执行至多规划一次。

use std::sync::Arc;

use crate::conversation::Message;
use crate::core::AgentError;
use crate::engine::prompts::{PLANNING_DIRECTIVE, PLAN_HEADER_PREFIXES};
use crate::engine::{AgentState, PlanStep, StepStatus, TaskInfo};
use crate::llm::{invoke_with_retry, LlmClient};
use crate::store::TaskStore;

/// 规划阶段：取任务信息、生成计划、写入状态
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn TaskStore>,
    /// 可用工具清单（规划时模型需要知道有哪些工具可用）
    tools_section: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<dyn TaskStore>, tools_section: String) -> Self {
        Self {
            llm,
            store,
            tools_section,
        }
    }

    pub async fn run(&self, state: &mut AgentState) -> Result<(), AgentError> {
        if state.plan.is_some() {
            return Ok(());
        }

        let task_info = match &state.task_info {
            Some(info) => info.clone(),
            None => self.store.get_task(&state.task_id).await?,
        };

        let prompt = build_plan_prompt(&task_info, &self.tools_section);
        state.conversation.push(Message::user(prompt));

        let snapshot = state.conversation.snapshot();
        let response = invoke_with_retry(self.llm.as_ref(), &snapshot).await?;
        state.conversation.push(Message::assistant(response.clone()));

        let steps = parse_plan(&response);
        tracing::info!(
            task_id = %state.task_id,
            steps = steps.len(),
            "plan synthesized"
        );

        state.task_info = Some(task_info);
        state.plan = Some(steps);
        Ok(())
    }
}

fn build_plan_prompt(info: &TaskInfo, tools_section: &str) -> String {
    format!(
        "{PLANNING_DIRECTIVE}\n\n任务信息:\nID: {}\n标题: {}\n描述: {}\n优先级: {}\n截止日期: {}\n\n可用工具:\n{}",
        info.id,
        info.title,
        info.description,
        info.priority.as_deref().unwrap_or("未设置"),
        info.deadline.as_deref().unwrap_or("未设置"),
        tools_section,
    )
}

/// 尽力而为的计划提取：按行切分，丢弃空行与标题行；全部丢弃时退化为单条兜底步骤
pub fn parse_plan(response: &str) -> Vec<PlanStep> {
    let steps: Vec<PlanStep> = response
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !PLAN_HEADER_PREFIXES
                    .iter()
                    .any(|header| line.starts_with(header))
        })
        .enumerate()
        .map(|(i, line)| PlanStep {
            order: i + 1,
            description: format!("步骤{}: {}", i + 1, line),
            status: StepStatus::Pending,
        })
        .collect();

    if steps.is_empty() {
        tracing::warn!("plan response yielded no steps, degrading to a single catch-all step");
        vec![PlanStep {
            order: 1,
            description: "步骤1: 按任务描述执行并汇报结果".to_string(),
            status: StepStatus::Pending,
        }]
    } else {
        steps
    }
}
