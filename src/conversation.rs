//! 对话日志：只追加的有序消息序列
//!
//! 所有阶段只能向日志追加，不修改、不删除历史条目，保证喂给模型的上下文可完整复现，
//! 也便于事后审计。唯一的例外是 ensure_system：首次推理前把系统指令插到最前面，
//! 通过扫描 System 角色判断是否已插入，整个执行周期最多发生一次。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致；Tool 为工具结果回写）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// 模型请求的一次工具调用（名称 + JSON 参数）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// 单条消息；assistant 消息可携带若干工具调用请求
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolRequest>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_calls: Vec::new() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_calls: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_calls: Vec::new() }
    }

    /// 携带工具调用请求的 assistant 消息
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolRequest>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_calls }
    }

    /// 工具结果消息（content 为 JSON 负载或错误串）
    pub fn tool(content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into(), tool_calls: Vec::new() }
    }
}

/// 只追加的对话日志
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) 追加，永远成功
    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// 不可变快照，用于传给模型客户端（避免阶段中途看到并发修改）
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 若日志中没有 System 消息，则把系统指令插到最前面；已存在则不动。
    /// 判断依据是角色扫描而非计数器，对重复调用幂等。
    pub fn ensure_system(&mut self, directive: &str) {
        if !self.messages.iter().any(|m| m.role == Role::System) {
            self.messages.insert(0, Message::system(directive));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_system_inserts_once() {
        let mut log = ConversationLog::new();
        log.push(Message::user("hello"));
        log.ensure_system("directive");
        log.ensure_system("directive");
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].role, Role::System);
        assert_eq!(log.messages()[1].role, Role::User);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut log = ConversationLog::new();
        log.push(Message::user("a"));
        let snap = log.snapshot();
        log.push(Message::assistant("b"));
        assert_eq!(snap.len(), 1);
        assert_eq!(log.len(), 2);
    }
}
