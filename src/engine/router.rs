//! 路由与完成检测：两个独立的纯函数
//!
//! route 决定下一阶段（首条命中即返回）；completion 在每次 Reason / Reflect 之后
//! 独立运行，命中完成标志或越过尝试上限时可直接终止执行，哪怕正处于反思节奏中。
//! 两者由引擎主循环组合，不依赖任何工作流图库，便于单独测试。

use crate::conversation::{Message, Role};
use crate::engine::prompts::{COMPLETION_INDICATORS, REFLECTION_DIRECTIVE};
use crate::engine::AgentState;

/// 尝试次数硬上限；attempts 超过该值即终止
pub const MAX_ATTEMPTS: u32 = 10;
/// 反思节奏：每 N 次推理后反思一次
pub const REFLECT_CADENCE: u32 = 3;
/// 完成检测扫描的末尾消息条数
const COMPLETION_SCAN_WINDOW: usize = 3;

/// 下一阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Reason,
    Tools,
    Reflect,
    End,
}

/// 完成检测结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 最近消息中出现完成标志
    Indicated,
    /// 尝试次数越过上限
    CeilingExceeded,
}

/// 纯路由函数：按固定优先级决定下一阶段
pub fn route(state: &AgentState) -> Stage {
    let messages = state.conversation.messages();

    if messages.is_empty() {
        return Stage::End;
    }

    if state.plan.is_none() {
        return Stage::Plan;
    }

    if let Some(last) = messages.last() {
        if last.role == Role::Assistant && !last.tool_calls.is_empty() {
            return Stage::Tools;
        }
    }

    if state.attempts > 0
        && state.attempts % REFLECT_CADENCE == 0
        && !trailing_reflection_pair(messages)
    {
        return Stage::Reflect;
    }

    Stage::Reason
}

/// 独立完成检测：扫描最近 3 条消息的文本找完成标志；attempts 超上限也终止
pub fn completion(state: &AgentState) -> Option<Completion> {
    let messages = state.conversation.messages();
    let tail = messages.iter().rev().take(COMPLETION_SCAN_WINDOW);
    for msg in tail {
        for indicator in COMPLETION_INDICATORS {
            if msg.content.contains(indicator) {
                return Some(Completion::Indicated);
            }
        }
    }

    if state.attempts > MAX_ATTEMPTS {
        return Some(Completion::CeilingExceeded);
    }

    None
}

/// 最近两条消息是否已是一组反思交换（幂等保护：同一状态下重复询问路由不会二次反思）
fn trailing_reflection_pair(messages: &[Message]) -> bool {
    messages
        .iter()
        .rev()
        .take(2)
        .any(|m| m.role == Role::User && m.content.contains(REFLECTION_DIRECTIVE))
}
