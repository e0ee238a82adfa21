//! Skill System - 파일 기반 Skill
//!
//! `<skills_dir>/<name>/SKILL.md` 파일을 읽어 모델이 사용할 수 있는 지침으로 제공합니다.
//!
//! ```text
//! skills/
//! ├── commit/
//! │   └── SKILL.md      # ---\nname: commit\ndescription: ...\n---\n본문
//! └── review/
//!     └── SKILL.md
//! ```
//!
//! 모델은 `list_skills`로 목록을 보고 `load_skill`로 본문을 가져옵니다.
//! 두 도구 모두 읽기 전용이라 확인 없이 실행됩니다.

mod loader;
mod tools;

pub use loader::{Skill, SkillConfig, SkillLoader};
pub use tools::{skill_tools, ListSkillsTool, LoadSkillTool};
