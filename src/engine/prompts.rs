//! 固定指令与完成标志
//!
//! 系统指令、规划指令、反思指令均为常量；完成检测沿用原有的字面短语匹配
//! （已知薄弱点，保留以兼容既有模型措辞；替换为结构化信号只需改 COMPLETION_INDICATORS 一处）。

/// 系统指令：Agent 的角色与行事原则；与可用工具清单拼接后，首次推理前插入对话最前面
pub const SYSTEM_DIRECTIVE: &str = "你是任务管家系统中的智能任务执行Agent，具有反思和自我修正能力。你的职责是:
1. 分析和理解任务需求
2. 制定详细的执行计划
3. 按照SOP标准流程执行任务
4. 使用可用工具获取信息和执行操作
5. 在执行过程中进行反思和自我修正
6. 提供清晰的执行过程和结果

在执行任务时，请遵循以下原则:
- 先理解任务需求，再制定执行计划
- 需要信息时主动使用工具获取
- 保持逻辑清晰，步骤明确
- 定期反思执行过程，识别问题并修正
- 将有价值的经验保存到知识库

调用工具时只输出一个 JSON 对象: {\"tool\": \"工具名\", \"args\": {...}}；
需要多个工具时输出 JSON 数组。任务完成时在回复中明确说明「任务已完成」。";

/// 规划指令：与任务字段拼接后发给模型
pub const PLANNING_DIRECTIVE: &str = "请根据任务需求，制定详细的执行计划。计划应包括:
1. 任务目标
2. 执行步骤
3. 需要使用的工具
4. 可能遇到的问题及解决方案
5. 成功标准

请确保计划清晰、具体、可执行，每个步骤单独一行。";

/// 反思指令：周期性追加到对话，触发自我批评
pub const REFLECTION_DIRECTIVE: &str = "请对你刚才的执行过程进行反思，考虑以下几个方面:
1. 我的理解是否准确？
2. 我的计划是否合理？
3. 我的执行是否有效？
4. 我是否遗漏了重要信息？
5. 我是否犯了错误？如果是，错在哪里？
6. 我如何改进？

请提供具体的反思内容，并给出改进建议。";

/// 拼接系统指令与可用工具清单，形成完整的系统消息文本
pub fn system_directive_with_tools(tools_section: &str) -> String {
    format!("{SYSTEM_DIRECTIVE}\n\n可用工具:\n{tools_section}")
}

/// 完成标志短语：最近 3 条消息中命中任意一个即判定任务完成
pub const COMPLETION_INDICATORS: &[&str] = &[
    "任务已完成",
    "已完成所有步骤",
    "执行完毕",
    "任务执行成功",
    "Task completed",
    "All steps completed",
];

/// 计划解析时丢弃的标题行前缀
pub const PLAN_HEADER_PREFIXES: &[&str] = &["任务目标", "执行步骤", "目标", "Steps"];
