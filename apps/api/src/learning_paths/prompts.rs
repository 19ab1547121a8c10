use crate::llm_client::prompts::JSON_ONLY_FOOTER;

pub const LEARNING_PATH_ROLE: &str =
    "You are an expert career development advisor. Create personalized learning paths.";

/// Placeholder: `{skill_gaps}` (JSON array).
const LEARNING_PATH_TEMPLATE: &str = r#"You are an expert at creating personalized learning paths for skill development.

Skill gaps to address: {skill_gaps}

Create a learning path with resources and timeline. Return JSON:
{
  "resources": [
    {
      "title": "resource title",
      "type": "course|book|video|article|project",
      "url": "resource url",
      "difficulty": "beginner|intermediate|advanced",
      "estimatedHours": 20,
      "cost": "free|paid|freemium"
    }
  ],
  "estimatedTimeline": 16,
  "priorityOrder": ["skill1", "skill2"],
  "learningStrategy": "Focus on high-priority skills first, then build foundational knowledge"
}

"#;

/// `preferences` is the caller's free-form JSON, appended verbatim when given.
pub fn learning_path_prompt(skill_gaps: &str, preferences: Option<&str>) -> String {
    let mut prompt = LEARNING_PATH_TEMPLATE.replace("{skill_gaps}", skill_gaps);
    if let Some(preferences) = preferences {
        prompt.push_str("Learner preferences: ");
        prompt.push_str(preferences);
        prompt.push_str("\n\n");
    }
    prompt + JSON_ONLY_FOOTER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_are_optional() {
        let without = learning_path_prompt("[]", None);
        assert!(!without.contains("Learner preferences"));
        assert!(without.ends_with(JSON_ONLY_FOOTER));

        let with = learning_path_prompt("[]", Some(r#"{"budget":"free"}"#));
        assert!(with.contains(r#"Learner preferences: {"budget":"free"}"#));
    }
}
