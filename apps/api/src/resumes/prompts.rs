use crate::llm_client::prompts::{CATEGORY_CHOICES, JSON_ONLY_FOOTER};

pub const SKILL_EXTRACTION_ROLE: &str = "You are an expert at analyzing resumes and extracting \
    technical skills. Return only a valid JSON array of skills.";

/// Placeholders: `{categories}`, `{resume_text}`.
const SKILL_EXTRACTION_TEMPLATE: &str = r#"You are an expert at analyzing resumes and extracting technical skills.

Given the following resume text, extract all technical skills and categorize them. For each skill, determine the appropriate level (beginner, intermediate, advanced, expert) based on context clues.

Resume text:
{resume_text}

Please return a JSON array of skills in this format:
[
  {
    "name": "skill name",
    "category": "category from: {categories}",
    "level": "beginner|intermediate|advanced|expert",
    "confidence": 0.95
  }
]

"#;

pub fn skill_extraction_prompt(resume_text: &str) -> String {
    // Categories first so resume text containing "{categories}" is left alone.
    SKILL_EXTRACTION_TEMPLATE
        .replace("{categories}", CATEGORY_CHOICES)
        .replace("{resume_text}", resume_text)
        + JSON_ONLY_FOOTER
}
