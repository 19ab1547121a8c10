//! Skill names a learning resource teaches, as judged by the model.

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::prompts::{system_prompt, JSON_ONLY_FOOTER};
use crate::llm_client::{LlmClient, ModelTask};

pub const RESOURCE_SKILLS_ROLE: &str = "You are an expert at analyzing learning resources and extracting technical skills. Return only a valid JSON array of skill names.";

/// Placeholders: `{title}`, `{type}`, `{description}`.
const RESOURCE_SKILLS_TEMPLATE: &str = r#"You are an expert at analyzing learning resources and extracting relevant technical skills.

Given the following learning resource information, extract all technical skills that someone would learn from this resource.

Title: {title}
Type: {type}
Description: {description}

Please return a JSON array of skill names (strings only). Focus on technical skills, programming languages, frameworks, tools, and technologies.

Example format:
["JavaScript", "React", "Node.js", "MongoDB", "REST APIs"]

"#;

pub fn resource_skills_prompt(title: &str, resource_type: &str, description: &str) -> String {
    RESOURCE_SKILLS_TEMPLATE
        .replace("{title}", title)
        .replace("{type}", resource_type)
        .replace("{description}", description)
        + JSON_ONLY_FOOTER
}

/// Returns `[]` when the call fails or the reply is not an array of strings.
pub async fn extract_resource_skills(
    llm: &LlmClient,
    title: &str,
    description: &str,
    resource_type: &str,
) -> Vec<String> {
    let prompt = resource_skills_prompt(title, resource_type, description);
    let system = system_prompt(RESOURCE_SKILLS_ROLE);

    let value = match llm
        .call_json::<Value>(ModelTask::SkillExtraction, &system, &prompt)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            warn!("Resource skill extraction failed: {e}");
            return Vec::new();
        }
    };

    match skill_names(&value) {
        Some(names) => {
            debug!("Extracted {} skills from resource '{title}'", names.len());
            names
        }
        None => {
            warn!("Resource skill extraction returned an invalid shape");
            Vec::new()
        }
    }
}

/// All-or-nothing: one non-string entry invalidates the whole reply.
fn skill_names(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|entry| entry.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_array_accepted() {
        assert_eq!(
            skill_names(&json!(["Rust", "Tokio"])),
            Some(vec!["Rust".to_string(), "Tokio".to_string()])
        );
        assert_eq!(skill_names(&json!([])), Some(vec![]));
    }

    #[test]
    fn test_mixed_or_non_array_rejected() {
        assert!(skill_names(&json!(["Rust", 3])).is_none());
        assert!(skill_names(&json!({"skills": ["Rust"]})).is_none());
    }

    #[test]
    fn test_prompt_fields() {
        let prompt = resource_skills_prompt("Rust Book", "book", "Ownership and lifetimes");
        assert!(prompt.contains("Title: Rust Book"));
        assert!(prompt.contains("Type: book"));
        assert!(prompt.contains("Description: Ownership and lifetimes"));
    }
}
