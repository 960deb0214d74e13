//! 执行引擎集成测试
//!
//! 用脚本化的模型客户端驱动完整状态机，覆盖典型执行路径：
//! 一轮完成、未知工具恢复、尝试上限、取消、截止时间与工具结果顺序。

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use steward::conversation::{Message, Role};
use steward::core::AgentError;
use steward::engine::{AgentState, ExecutionEngine, TaskInfo, TaskStatus};
use steward::llm::{LlmClient, MockLlmClient, ModelError, ScriptedLlmClient};
use steward::scheduler::Scheduler;
use steward::store::{InMemoryKnowledgeStore, InMemoryTaskStore};
use steward::tools::{builtin_registry, ToolExecutor};

const PLAN_RESPONSE: &str = "任务目标\n执行步骤\n收集任务相关信息\n整理并输出结果";

struct Harness {
    llm: Arc<dyn LlmClient>,
    task_store: Arc<InMemoryTaskStore>,
    executor: Arc<ToolExecutor>,
    state: AgentState,
}

impl Harness {
    async fn scripted(script: Vec<Result<String, ModelError>>) -> Self {
        Self::with_llm(Arc::new(ScriptedLlmClient::new(script))).await
    }

    async fn with_llm(llm: Arc<dyn LlmClient>) -> Self {
        let task_store = Arc::new(InMemoryTaskStore::new());
        let knowledge_store = Arc::new(InMemoryKnowledgeStore::new());
        let task_id = task_store
            .insert(TaskInfo::new("集成测试任务", "执行一个用于测试的任务"))
            .await;
        let registry = builtin_registry(task_store.clone(), knowledge_store);
        let executor = Arc::new(ToolExecutor::new(registry, 30));
        let state = AgentState::new(task_id, "执行一个用于测试的任务");
        Self {
            llm,
            task_store,
            executor,
            state,
        }
    }

    fn engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(
            self.llm.clone(),
            self.task_store.clone(),
            self.executor.clone(),
        )
    }
}

/// 场景 1：无工具调用，首轮推理即给出完成标志 -> PLAN -> REASON -> END，attempts == 1
#[tokio::test]
async fn test_completes_on_first_reasoning_turn() {
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Ok("所有信息已整理。任务已完成。".to_string()),
    ])
    .await;

    let outcome = h.engine().run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.result.unwrap().contains("任务已完成"));
    assert_eq!(h.state.plan.as_ref().unwrap().len(), 2);
    assert_eq!(h.state.status, TaskStatus::Completed);
}

/// 系统指令与规划提示词携带可用工具清单：模型从第一次请求起就能看到注册的工具名与参数格式
#[tokio::test]
async fn test_prompts_list_registered_tools() {
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Ok("任务已完成。".to_string()),
    ])
    .await;

    h.engine().run(&mut h.state).await;

    let plan_prompt = &h.state.conversation.messages()[2];
    assert_eq!(plan_prompt.role, Role::User);
    assert!(plan_prompt.content.contains("可用工具"));
    assert!(plan_prompt.content.contains("get_sop_template"));

    let system = &h.state.conversation.messages()[0];
    assert_eq!(system.role, Role::System);
    for name in [
        "search_knowledge_base",
        "save_to_knowledge_base",
        "get_task_details",
        "update_task_status",
        "get_sop_template",
    ] {
        assert!(system.content.contains(name), "missing tool {name}");
    }
    assert!(system.content.contains("参数 schema"));
}

/// 场景 2：请求未注册的工具 foo -> 写回 unknown tool 错误负载，继续推理，不抛错
#[tokio::test]
async fn test_unknown_tool_keeps_loop_alive() {
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Ok(r#"{"tool": "foo", "args": {}}"#.to_string()),
        Ok("换个方式处理。任务已完成。".to_string()),
    ])
    .await;

    let outcome = h.engine().run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.attempts, 2);
    let unknown = h
        .state
        .conversation
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool result message missing");
    assert!(unknown.content.contains("unknown tool foo"));
}

/// 场景 3：模型永不给出完成标志 -> attempts 从 10 变为 11 时终止 failed
#[tokio::test]
async fn test_ceiling_terminates_as_failed() {
    // plan + 11 次推理 + attempts 为 3/6/9 时各一次反思
    let mut script = vec![Ok(PLAN_RESPONSE.to_string())];
    for i in 0..11 {
        script.push(Ok(format!("继续处理中，第{i}轮")));
        if matches!(i, 2 | 5 | 8) {
            script.push(Ok("反思：思路没问题，继续推进".to_string()));
        }
    }
    let mut h = Harness::scripted(script).await;

    let outcome = h.engine().run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Failed);
    assert_eq!(outcome.attempts, 11);
    assert!(outcome.error.unwrap().contains("11"));
    assert_eq!(h.state.reflections.len(), 3);
}

/// 在第 N 次模型调用后触发取消的包装客户端
struct CancellingClient {
    inner: ScriptedLlmClient,
    token: CancellationToken,
    cancel_after: u32,
    calls: AtomicU32,
}

#[async_trait]
impl LlmClient for CancellingClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let result = self.inner.complete(messages).await;
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.cancel_after {
            self.token.cancel();
        }
        result
    }
}

/// 场景 4：2 次尝试后请求取消 -> canceled，取消后不再追加消息，反思列表为空
#[tokio::test]
async fn test_cancellation_observed_at_loop_top() {
    let token = CancellationToken::new();
    let llm = Arc::new(CancellingClient {
        inner: ScriptedLlmClient::new(vec![
            Ok(PLAN_RESPONSE.to_string()),
            Ok("第一轮推理".to_string()),
            Ok("第二轮推理".to_string()),
        ]),
        token: token.clone(),
        cancel_after: 3, // plan + 2 次推理
        calls: AtomicU32::new(0),
    });
    let mut h = Harness::with_llm(llm).await;

    let outcome = h.engine().with_cancel_token(token).run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Canceled);
    assert_eq!(outcome.attempts, 2);
    assert!(h.state.reflections.is_empty());
    // 种子指令 + 规划问答 + 系统指令 + 两轮推理回复，取消后无新增
    assert_eq!(h.state.conversation.len(), 6);
    assert!(outcome.error.unwrap().contains(&outcome.task_id));
}

/// 截止时间在循环顶部检查：零截止时间下不执行任何阶段，failed 且错误为超时类
#[tokio::test]
async fn test_deadline_behaves_like_timeout_failure() {
    let mut h = Harness::scripted(vec![Ok(PLAN_RESPONSE.to_string())]).await;

    let outcome = h
        .engine()
        .with_deadline(Duration::ZERO)
        .run(&mut h.state)
        .await;

    assert_eq!(outcome.status, TaskStatus::Failed);
    assert!(outcome.error.unwrap().contains("deadline"));
    assert_eq!(outcome.attempts, 0);
}

/// 工具结果保持请求顺序：请求 [save, search] 则日志中先出现 save 结果再出现 search 结果
#[tokio::test]
async fn test_tool_results_preserve_request_order() {
    let calls = r#"[
        {"tool": "save_to_knowledge_base", "args": {"key": "周报格式", "content": "三段式"}},
        {"tool": "search_knowledge_base", "args": {"query": "周报格式"}}
    ]"#;
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Ok(calls.to_string()),
        Ok("知识库已更新。任务已完成。".to_string()),
    ])
    .await;

    let outcome = h.engine().run(&mut h.state).await;
    assert_eq!(outcome.status, TaskStatus::Completed);

    let tool_messages: Vec<&Message> = h
        .state
        .conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 2);
    assert!(tool_messages[0].content.contains("已保存到知识库"));
    assert!(tool_messages[1].content.contains("三段式"));
}

/// transient 模型错误在推理边界重试一次后继续执行
#[tokio::test]
async fn test_transient_model_error_recovered_in_reasoning() {
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Err(ModelError::transient("connection reset")),
        Ok("恢复正常。任务已完成。".to_string()),
    ])
    .await;

    let outcome = h.engine().run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.attempts, 1);
}

/// 不可恢复的模型错误立即升级为 failed，错误说明为人类可读文本
#[tokio::test]
async fn test_fatal_model_error_fails_task() {
    let mut h = Harness::scripted(vec![
        Ok(PLAN_RESPONSE.to_string()),
        Err(ModelError::fatal("invalid api key")),
    ])
    .await;

    let outcome = h.engine().run(&mut h.state).await;

    assert_eq!(outcome.status, TaskStatus::Failed);
    assert!(outcome.error.unwrap().contains("invalid api key"));
}

/// 调度器端到端：提交 -> 轮询 -> 等待终态 -> 存储中可见上报结果
#[tokio::test]
async fn test_scheduler_submit_and_report() {
    let task_store = Arc::new(InMemoryTaskStore::new());
    let knowledge_store = Arc::new(InMemoryKnowledgeStore::new());
    let registry = builtin_registry(task_store.clone(), knowledge_store);
    let executor = Arc::new(ToolExecutor::new(registry, 30));
    let scheduler = Scheduler::new(Arc::new(MockLlmClient), task_store.clone(), executor);

    let task_id = task_store
        .insert(TaskInfo::new("调度测试", "验证提交与上报"))
        .await;

    let before = scheduler.status(&task_id).await.unwrap();
    assert_eq!(before.status, TaskStatus::Pending);

    scheduler.submit(&task_id).await.unwrap();
    let outcome = scheduler.wait(&task_id).await.unwrap();
    assert_eq!(outcome.status, TaskStatus::Completed);

    let (stored, result) = task_store.status(&task_id).await.unwrap();
    assert_eq!(stored, TaskStatus::Completed);
    assert!(result.is_some());

    let after = scheduler.status(&task_id).await.unwrap();
    assert_eq!(after.status, TaskStatus::Completed);
}

/// 永不返回的客户端，保持执行在途
struct PendingClient;

#[async_trait]
impl LlmClient for PendingClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String, ModelError> {
        std::future::pending().await
    }
}

/// 同一任务在途时重复提交被拒绝，原执行句柄不被顶掉，仍可取消
#[tokio::test]
async fn test_duplicate_submit_rejected_while_running() {
    let task_store = Arc::new(InMemoryTaskStore::new());
    let registry = builtin_registry(task_store.clone(), Arc::new(InMemoryKnowledgeStore::new()));
    let executor = Arc::new(ToolExecutor::new(registry, 30));
    let scheduler = Scheduler::new(Arc::new(PendingClient), task_store.clone(), executor);

    let task_id = task_store
        .insert(TaskInfo::new("串行化测试", "同一任务不允许并发执行"))
        .await;

    scheduler.submit(&task_id).await.unwrap();
    let err = scheduler.submit(&task_id).await.unwrap_err();
    assert!(matches!(err, AgentError::TaskAlreadyRunning(_)));

    // 第一个执行的句柄仍然在手里
    scheduler.cancel(&task_id).await.unwrap();
}

/// 终态后句柄被摘除并归档：轮询与重复等待仍可见终态，且允许重新提交
#[tokio::test]
async fn test_terminal_outcome_archived_after_eviction() {
    let task_store = Arc::new(InMemoryTaskStore::new());
    let registry = builtin_registry(task_store.clone(), Arc::new(InMemoryKnowledgeStore::new()));
    let executor = Arc::new(ToolExecutor::new(registry, 30));
    let scheduler = Scheduler::new(Arc::new(MockLlmClient), task_store.clone(), executor);

    let task_id = task_store
        .insert(TaskInfo::new("归档测试", "验证终态归档与重新提交"))
        .await;

    scheduler.submit(&task_id).await.unwrap();
    let outcome = scheduler.wait(&task_id).await.unwrap();
    assert_eq!(outcome.status, TaskStatus::Completed);

    // 句柄已摘除，轮询与再次等待都走归档
    let report = scheduler.status(&task_id).await.unwrap();
    assert_eq!(report.status, TaskStatus::Completed);
    let archived = scheduler.wait(&task_id).await.unwrap();
    assert_eq!(archived.status, TaskStatus::Completed);

    // 终态后可重新提交
    scheduler.submit(&task_id).await.unwrap();
    assert!(scheduler.wait(&task_id).await.is_some());
}

/// 对不存在的任务取消与提交都报 TaskNotFound
#[tokio::test]
async fn test_scheduler_unknown_task() {
    let task_store = Arc::new(InMemoryTaskStore::new());
    let registry = builtin_registry(task_store.clone(), Arc::new(InMemoryKnowledgeStore::new()));
    let executor = Arc::new(ToolExecutor::new(registry, 30));
    let scheduler = Scheduler::new(Arc::new(MockLlmClient), task_store.clone(), executor);

    assert!(scheduler.cancel("missing").await.is_err());
    assert!(scheduler.submit("missing").await.is_err());
}
