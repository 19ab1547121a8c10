//! Required/preferred skill extraction from a job description.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::jobs::prompts::{job_skills_prompt, JOB_SKILLS_ROLE};
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{LlmClient, ModelTask};
use crate::models::skill::Skill;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedJobSkills {
    pub required: Vec<Skill>,
    pub preferred: Vec<Skill>,
}

/// Asks the model for both skill lists. Any failure, or a response missing
/// either list, yields two empty lists.
pub async fn extract_job_skills(llm: &LlmClient, description: &str) -> ExtractedJobSkills {
    let prompt = job_skills_prompt(description);
    let system = system_prompt(JOB_SKILLS_ROLE);

    let response = match llm
        .call_json::<Value>(ModelTask::SkillExtraction, &system, &prompt)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            warn!("Job skill extraction failed: {e}");
            return ExtractedJobSkills::default();
        }
    };

    match skills_from_response(&response) {
        Some(skills) => {
            debug!(
                "Extracted {} required / {} preferred skills",
                skills.required.len(),
                skills.preferred.len()
            );
            skills
        }
        None => {
            warn!("Job skill extraction returned an invalid shape");
            ExtractedJobSkills::default()
        }
    }
}

fn skills_from_response(value: &Value) -> Option<ExtractedJobSkills> {
    let list = |key: &str| -> Option<Vec<Skill>> {
        let entries = value.get(key)?.as_array()?;
        Some(
            entries
                .iter()
                .map(|entry| Skill::from_llm_entry(entry, ""))
                .collect(),
        )
    };

    Some(ExtractedJobSkills {
        required: list("required")?,
        preferred: list("preferred")?,
    })
}
