//! 执行引擎：状态、路由、各阶段与主循环

pub mod dispatch;
pub mod loop_;
pub mod planner;
pub mod prompts;
pub mod reason;
pub mod reflector;
pub mod router;
pub mod state;

pub use dispatch::ToolDispatcher;
pub use loop_::{EngineOutcome, ExecutionEngine, Progress};
pub use planner::Planner;
pub use reason::{parse_tool_requests, ReasonStage};
pub use reflector::Reflector;
pub use router::{completion, route, Completion, Stage, MAX_ATTEMPTS, REFLECT_CADENCE};
pub use state::{AgentState, PlanStep, Reflection, StepStatus, TaskInfo, TaskStatus};
