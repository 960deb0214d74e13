//! Steward - 任务管家系统的智能体执行引擎
//!
//! 无头入口：从命令行读一条任务描述，登记到内存任务存储并提交执行，
//! 打印终态与结果。持久化后端与 HTTP 层由外部系统提供。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use steward::config::load_config;
use steward::engine::TaskInfo;
use steward::llm::create_client_from_config;
use steward::scheduler::Scheduler;
use steward::store::{InMemoryKnowledgeStore, InMemoryTaskStore};
use steward::tools::{builtin_registry, ToolExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    steward::observability::init();

    let description = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    if description.is_empty() {
        anyhow::bail!("usage: steward <任务描述>");
    }

    let cfg = load_config(None).context("Failed to load config")?;
    let llm = create_client_from_config(&cfg);

    let task_store = Arc::new(InMemoryTaskStore::new());
    let knowledge_store = Arc::new(InMemoryKnowledgeStore::new());
    let registry = builtin_registry(task_store.clone(), knowledge_store);
    let executor = Arc::new(ToolExecutor::new(registry, cfg.agent.tool_timeout_secs));

    let mut scheduler = Scheduler::new(llm, task_store.clone(), executor);
    if cfg.agent.deadline_secs > 0 {
        scheduler = scheduler.with_deadline(Duration::from_secs(cfg.agent.deadline_secs));
    }

    let task_id = task_store
        .insert(TaskInfo::new("命令行任务", &description))
        .await;
    scheduler
        .submit(&task_id)
        .await
        .context("Failed to submit task")?;

    let outcome = scheduler
        .wait(&task_id)
        .await
        .context("Execution handle lost")?;

    println!("任务 {} 终态: {}", outcome.task_id, outcome.status.as_str());
    println!("尝试次数: {}，耗时 {:.1}s", outcome.attempts, outcome.execution_secs);
    if let Some(result) = &outcome.result {
        println!("结果:\n{result}");
    }
    if let Some(error) = &outcome.error {
        println!("错误: {error}");
    }

    Ok(())
}
