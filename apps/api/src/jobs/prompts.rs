use crate::llm_client::prompts::{CATEGORY_CHOICES, JSON_ONLY_FOOTER};

pub const JOB_SKILLS_ROLE: &str =
    "You are an expert at analyzing job descriptions and extracting technical skills.";

/// Placeholders: `{categories}`, `{description}`.
const JOB_SKILLS_TEMPLATE: &str = r#"You are an expert at analyzing job descriptions and extracting technical skills.

Given the following job description, extract all technical skills and categorize them as either required or preferred.

Job description:
{description}

Please return a JSON object in this format:
{
  "required": [
    {
      "name": "skill name",
      "category": "category from: {categories}",
      "level": "beginner|intermediate|advanced|expert"
    }
  ],
  "preferred": [
    {
      "name": "skill name",
      "category": "category",
      "level": "beginner|intermediate|advanced|expert"
    }
  ]
}

"#;

pub fn job_skills_prompt(description: &str) -> String {
    JOB_SKILLS_TEMPLATE
        .replace("{categories}", CATEGORY_CHOICES)
        .replace("{description}", description)
        + JSON_ONLY_FOOTER
}
