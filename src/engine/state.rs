//! Agent 执行状态
//!
//! AgentState 由单个执行独占持有，只被引擎的阶段调用修改；并发执行之间不共享。
//! 不变量：attempts 单调递增；plan 每个执行至多创建一次；conversation 只追加；
//! 达到终态后不再有任何追加。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationLog, Message};

/// 任务状态（与任务存储的状态词汇一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

/// 任务元数据快照（由 Planner 设置一次）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl TaskInfo {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: description.into(),
            priority: None,
            deadline: None,
        }
    }
}

/// 计划步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Done,
}

/// 计划中的一步；序列创建后不重排、不增删，只有 status 可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub order: usize,
    pub description: String,
    pub status: StepStatus,
}

/// 一次自我反思记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub attempt: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// 单个任务执行的完整状态
#[derive(Debug, Clone)]
pub struct AgentState {
    /// 任务 ID，整个执行周期不变
    pub task_id: String,
    pub conversation: ConversationLog,
    pub task_info: Option<TaskInfo>,
    pub plan: Option<Vec<PlanStep>>,
    pub reflections: Vec<Reflection>,
    /// 推理阶段每执行一次加 1（规划与反思不计）
    pub attempts: u32,
    pub status: TaskStatus,
}

impl AgentState {
    /// 创建初始状态：对话以任务指令开场，attempts=0，无计划
    pub fn new(task_id: impl Into<String>, instruction: &str) -> Self {
        let task_id = task_id.into();
        let mut conversation = ConversationLog::new();
        conversation.push(Message::user(format!(
            "请执行以下任务: {instruction}. 任务ID: {task_id}"
        )));
        Self {
            task_id,
            conversation,
            task_info: None,
            plan: None,
            reflections: Vec::new(),
            attempts: 0,
            status: TaskStatus::Running,
        }
    }

    /// 最近一条 assistant 消息的文本（作为任务最终结果上报）
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.conversation
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == crate::conversation::Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
