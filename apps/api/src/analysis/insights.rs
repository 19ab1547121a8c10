//! Career insights over every skill a user has on file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::prompts::{insights_prompt, INSIGHTS_ROLE};
use crate::analysis::scoring::group_by_category;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{LlmClient, ModelTask};
use crate::models::skill::Skill;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillInsights {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default = "default_market_demand")]
    pub market_demand: String,
    #[serde(default)]
    pub growth_areas: Vec<String>,
}

fn default_market_demand() -> String {
    "medium".to_string()
}

impl Default for SkillInsights {
    fn default() -> Self {
        Self {
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendations: Vec::new(),
            market_demand: default_market_demand(),
            growth_areas: Vec::new(),
        }
    }
}

/// Asks the model for insights. Falls back to the neutral default on any
/// failure.
pub async fn generate_insights(llm: &LlmClient, skills: &[Skill]) -> SkillInsights {
    let skills_json = match serde_json::to_string(skills) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not serialize skills for insights: {e}");
            return SkillInsights::default();
        }
    };

    let prompt = insights_prompt(&skills_json);
    let system = system_prompt(INSIGHTS_ROLE);

    match llm
        .call_json::<SkillInsights>(ModelTask::GapAnalysis, &system, &prompt)
        .await
    {
        Ok(insights) => insights,
        Err(e) => {
            warn!("AI insights generation failed: {e}");
            SkillInsights::default()
        }
    }
}

/// Number of skills per category display name.
pub fn category_counts(skills: &[Skill]) -> BTreeMap<&'static str, usize> {
    group_by_category(skills)
        .into_iter()
        .map(|(category, members)| (category.display_name(), members.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::{SkillCategory, SkillLevel};
    use serde_json::json;

    #[test]
    fn test_partial_response_fills_defaults() {
        let insights: SkillInsights =
            serde_json::from_value(json!({"strengths": ["Rust"]})).unwrap();

        assert_eq!(insights.strengths, vec!["Rust"]);
        assert!(insights.weaknesses.is_empty());
        assert_eq!(insights.market_demand, "medium");
    }

    #[test]
    fn test_fallback_is_neutral() {
        let value = serde_json::to_value(SkillInsights::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "strengths": [],
                "weaknesses": [],
                "recommendations": [],
                "marketDemand": "medium",
                "growthAreas": []
            })
        );
    }

    #[test]
    fn test_category_counts() {
        let skills = vec![
            Skill::new("Rust", SkillCategory::ProgrammingLanguages, SkillLevel::Expert),
            Skill::new("Go", SkillCategory::ProgrammingLanguages, SkillLevel::Beginner),
            Skill::new("Postgres", SkillCategory::Databases, SkillLevel::Advanced),
        ];

        let counts = category_counts(&skills);

        assert_eq!(
            counts.get(SkillCategory::ProgrammingLanguages.display_name()),
            Some(&2)
        );
        assert_eq!(counts.get(SkillCategory::Databases.display_name()), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_empty_skills_have_no_categories() {
        assert!(category_counts(&[]).is_empty());
    }
}
