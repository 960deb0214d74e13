//! SOP 模板工具
//!
//! 返回标准作业流程模板，供模型按步骤执行任务时参考。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// 获取 SOP 模板
#[derive(Debug, Default)]
pub struct GetSopTemplateTool;

#[async_trait]
impl Tool for GetSopTemplateTool {
    fn name(&self) -> &str {
        "get_sop_template"
    }

    fn description(&self) -> &str {
        "获取SOP模板。参数: {\"sop_id\": \"模板ID\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sop_id": { "type": "string", "description": "SOP 模板 ID" }
            },
            "required": ["sop_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let sop_id = args
            .get("sop_id")
            .and_then(Value::as_str)
            .ok_or("missing required arg: sop_id")?;
        let template = serde_json::json!({
            "id": sop_id,
            "name": "标准任务执行流程",
            "steps": [
                { "order": 1, "description": "第一步: 分析任务需求" },
                { "order": 2, "description": "第二步: 制定执行计划" },
                { "order": 3, "description": "第三步: 执行任务" },
                { "order": 4, "description": "第四步: 验证结果" },
            ]
        });
        Ok(template.to_string())
    }
}
