// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing instruction appended to every structured-output prompt.
pub const JSON_ONLY_FOOTER: &str = "Only return valid JSON, no additional text.";

/// Category names the models may assign, in display form.
pub const CATEGORY_CHOICES: &str = "Programming Languages, Frameworks & Libraries, Databases, \
    Cloud Platforms, DevOps & Tools, Soft Skills, Design & UX, Data Science & ML, \
    Mobile Development, Web Technologies, Security, Testing & QA";

/// Builds a system prompt from a role sentence plus the JSON-only rules.
pub fn system_prompt(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::SkillCategory;

    #[test]
    fn test_category_choices_match_known_categories() {
        for category in SkillCategory::ALL
            .into_iter()
            .filter(|c| *c != SkillCategory::Other)
        {
            assert!(
                CATEGORY_CHOICES.contains(category.display_name()),
                "missing {category}"
            );
        }
    }

    #[test]
    fn test_system_prompt_keeps_role_first() {
        let prompt = system_prompt("You are a career advisor.");
        assert!(prompt.starts_with("You are a career advisor."));
        assert!(prompt.contains("valid JSON only"));
    }
}
