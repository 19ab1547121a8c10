//! LLM skill extraction from resume text. Never fails: any problem with the
//! model or its output yields an empty list.

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{LlmClient, ModelTask};
use crate::models::skill::Skill;
use crate::resumes::prompts::{skill_extraction_prompt, SKILL_EXTRACTION_ROLE};

const UNKNOWN_SKILL: &str = "Unknown Skill";
const DEFAULT_CONFIDENCE: f64 = 0.8;

pub async fn extract_resume_skills(llm: &LlmClient, resume_text: &str) -> Vec<Skill> {
    let prompt = skill_extraction_prompt(resume_text);
    let system = system_prompt(SKILL_EXTRACTION_ROLE);

    match llm
        .call_json::<Value>(ModelTask::SkillExtraction, &system, &prompt)
        .await
    {
        Ok(value) => {
            let skills = skills_from_response(&value);
            debug!("Extracted {} skills from resume", skills.len());
            skills
        }
        Err(e) => {
            warn!("Resume skill extraction failed: {e}");
            Vec::new()
        }
    }
}

/// Normalizes the model's array. Anything that is not an array is empty.
fn skills_from_response(value: &Value) -> Vec<Skill> {
    let Some(entries) = value.as_array() else {
        warn!("Skill extraction response is not an array");
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| {
            let mut skill = Skill::from_llm_entry(entry, UNKNOWN_SKILL);
            skill.confidence.get_or_insert(DEFAULT_CONFIDENCE);
            skill
        })
        .collect()
}
