//! Skill Tools - `list_skills`, `load_skill`

use super::loader::SkillLoader;
use async_trait::async_trait;
use helm_foundation::{Tool, ToolContext, ToolError, ToolMeta, ToolOutput};
use serde_json::{json, Value};
use std::sync::Arc;

/// Skill 도구 묶음 생성
pub fn skill_tools(loader: SkillLoader) -> Vec<Arc<dyn Tool>> {
    let loader = Arc::new(loader);
    vec![
        Arc::new(ListSkillsTool::new(loader.clone())) as Arc<dyn Tool>,
        Arc::new(LoadSkillTool::new(loader)),
    ]
}

// ============================================================================
// ListSkillsTool
// ============================================================================

pub struct ListSkillsTool {
    loader: Arc<SkillLoader>,
}

impl ListSkillsTool {
    pub const NAME: &'static str = "list_skills";

    pub fn new(loader: Arc<SkillLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl Tool for ListSkillsTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("List Skills")
            .description("List the available skills with their descriptions")
            .category("skill")
            .read_only(true)
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _input: Value,
        _context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let skills: Vec<Value> = self
            .loader
            .load_all()
            .into_iter()
            .map(|s| json!({"name": s.name, "description": s.description}))
            .collect();

        Ok(ToolOutput::json(json!({ "skills": skills })))
    }
}

// ============================================================================
// LoadSkillTool
// ============================================================================

pub struct LoadSkillTool {
    loader: Arc<SkillLoader>,
}

impl LoadSkillTool {
    pub const NAME: &'static str = "load_skill";

    pub fn new(loader: Arc<SkillLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl Tool for LoadSkillTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Load Skill")
            .description("Load the full instructions of a skill by name")
            .category("skill")
            .read_only(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Skill name from list_skills"}
            },
            "required": ["name"]
        })
    }

    async fn execute(
        &self,
        input: Value,
        _context: &dyn ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let name = input
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| ToolError::invalid("'name' must be a string"))?;

        let skill = self
            .loader
            .load_by_name(name)
            .ok_or_else(|| ToolError::failed(format!("Skill not found: {}", name)))?;

        Ok(ToolOutput::text(skill.instructions))
    }
}
