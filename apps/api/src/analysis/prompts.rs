use crate::llm_client::prompts::JSON_ONLY_FOOTER;

pub const GAP_ANALYSIS_ROLE: &str =
    "You are an expert at analyzing skill gaps and providing career development advice.";

pub const INSIGHTS_ROLE: &str = "You are an expert career advisor.";

/// Placeholders: `{current_skills}`, `{required_skills}` (JSON arrays).
const GAP_ANALYSIS_TEMPLATE: &str = r#"You are an expert at analyzing skill gaps between current skills and job requirements.

Current skills: {current_skills}
Required skills: {required_skills}

Analyze the gaps and return a JSON object with:
{
  "skillGaps": [
    {
      "skill": "skill name",
      "currentLevel": "beginner|intermediate|advanced|expert",
      "requiredLevel": "beginner|intermediate|advanced|expert",
      "gap": "none|small|medium|large",
      "priority": "low|medium|high"
    }
  ],
  "overallGap": "small|medium|large",
  "recommendedFocus": ["skill1", "skill2"],
  "estimatedTimeToClose": 12
}

"#;

/// Placeholder: `{skills}` (JSON array).
const INSIGHTS_TEMPLATE: &str = r#"Analyze the following skills and provide insights:

Skills: {skills}

Provide insights in JSON format:
{
  "strengths": ["skill1", "skill2"],
  "weaknesses": ["skill1", "skill2"],
  "recommendations": ["recommendation1", "recommendation2"],
  "marketDemand": "high|medium|low",
  "growthAreas": ["area1", "area2"]
}

"#;

pub fn gap_analysis_prompt(current_skills: &str, required_skills: &str) -> String {
    GAP_ANALYSIS_TEMPLATE
        .replace("{current_skills}", current_skills)
        .replace("{required_skills}", required_skills)
        + JSON_ONLY_FOOTER
}

pub fn insights_prompt(skills: &str) -> String {
    INSIGHTS_TEMPLATE.replace("{skills}", skills) + JSON_ONLY_FOOTER
}
