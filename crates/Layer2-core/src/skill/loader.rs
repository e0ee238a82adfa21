//! Skill Loader - SKILL.md 파싱 및 검색

use helm_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Skill 파일 이름
pub const SKILL_FILE: &str = "SKILL.md";

// ============================================================================
// SkillConfig - YAML frontmatter에서 파싱된 설정
// ============================================================================

/// SKILL.md의 YAML frontmatter 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Skill 이름 (비어 있으면 디렉토리 이름 사용)
    #[serde(default)]
    pub name: String,

    /// 설명
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Skill
// ============================================================================

/// SKILL.md 파일로부터 로드된 Skill
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Markdown body
    pub instructions: String,
    pub source_path: PathBuf,
}

impl Skill {
    /// SKILL.md 파일에서 Skill 생성
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path.to_path_buf())
    }

    /// 문자열에서 Skill 파싱
    pub fn parse(content: &str, source_path: PathBuf) -> Result<Self> {
        let (config, body) = parse_frontmatter(content)?;

        let name = if config.name.trim().is_empty() {
            source_path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::InvalidInput("Skill has no name".into()))?
        } else {
            config.name.trim().to_string()
        };

        Ok(Self {
            name,
            description: config.description.unwrap_or_default(),
            instructions: body,
            source_path,
        })
    }
}

// ============================================================================
// SkillLoader - Skill 로더
// ============================================================================

/// 파일 시스템에서 Skill을 검색하고 로드
#[derive(Debug, Clone)]
pub struct SkillLoader {
    root: PathBuf,
}

impl SkillLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 모든 Skill 로드 (이름순)
    ///
    /// 파싱에 실패한 Skill은 경고만 남기고 건너뜁니다.
    pub fn load_all(&self) -> Vec<Skill> {
        let mut skills = BTreeMap::new();

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.root.display(), error = %e, "No skills directory");
                return Vec::new();
            }
        };

        for entry in entries.flatten() {
            let skill_file = entry.path().join(SKILL_FILE);
            if !skill_file.is_file() {
                continue;
            }

            match Skill::from_file(&skill_file) {
                Ok(skill) => {
                    if skills.contains_key(&skill.name) {
                        warn!(skill = %skill.name, "Duplicate skill name, keeping first");
                        continue;
                    }
                    info!(skill = %skill.name, path = %skill_file.display(), "Loaded skill");
                    skills.insert(skill.name.clone(), skill);
                }
                Err(e) => {
                    warn!(path = %skill_file.display(), error = %e, "Failed to load skill");
                }
            }
        }

        skills.into_values().collect()
    }

    /// 특정 이름의 Skill 로드
    pub fn load_by_name(&self, name: &str) -> Option<Skill> {
        let direct = self.root.join(name).join(SKILL_FILE);
        if direct.is_file() {
            match Skill::from_file(&direct) {
                Ok(skill) if skill.name == name => return Some(skill),
                Ok(_) => {}
                Err(e) => warn!(skill = name, error = %e, "Failed to load skill"),
            }
        }

        // frontmatter 이름이 디렉토리 이름과 다른 경우
        self.load_all().into_iter().find(|s| s.name == name)
    }
}

// ============================================================================
// Frontmatter 파서
// ============================================================================

/// YAML frontmatter와 body를 분리
fn parse_frontmatter(content: &str) -> Result<(SkillConfig, String)> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.is_empty() || lines[0].trim() != "---" {
        return Ok((SkillConfig::default(), content.trim().to_string()));
    }

    let end_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == "---")
        .map(|(i, _)| i)
        .ok_or_else(|| Error::InvalidInput("Invalid SKILL.md: unclosed frontmatter".into()))?;

    let yaml_content = lines[1..end_idx].join("\n");
    let config: SkillConfig = if yaml_content.trim().is_empty() {
        SkillConfig::default()
    } else {
        serde_yaml::from_str(&yaml_content)
            .map_err(|e| Error::InvalidInput(format!("Invalid YAML frontmatter: {}", e)))?
    };

    let body = lines[(end_idx + 1)..].join("\n").trim().to_string();

    Ok((config, body))
}

// ============================================================================
// 테스트
// ============================================================================
