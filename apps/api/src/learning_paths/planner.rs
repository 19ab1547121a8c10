//! Learning plan generation: LLM plan with lenient normalization, plus a
//! deterministic fallback built from the gaps themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::scoring::sort_by_priority;
use crate::learning_paths::prompts::{learning_path_prompt, LEARNING_PATH_ROLE};
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{LlmClient, ModelTask};
use crate::models::gap::{GapSize, Priority, SkillGap};
use crate::models::learning::PlannedResource;
use crate::models::skill::SkillLevel;

pub const DEFAULT_TIMELINE_WEEKS: u32 = 12;
const DEFAULT_RESOURCE_HOURS: u32 = 10;
const WEEKS_PER_SKILL: f64 = 3.0;
const FALLBACK_STRATEGY: &str =
    "Focus on high-priority skills first, then build foundational knowledge";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlan {
    pub resources: Vec<PlannedResource>,
    pub estimated_timeline: u32,
    pub priority_order: Vec<String>,
    pub learning_strategy: String,
}

impl LearningPlan {
    /// Timeline stored on the row; zero becomes the default.
    pub fn stored_timeline(&self) -> i32 {
        let weeks = if self.estimated_timeline == 0 {
            DEFAULT_TIMELINE_WEEKS
        } else {
            self.estimated_timeline
        };
        i32::try_from(weeks).unwrap_or(i32::MAX)
    }

    /// Priority order stored on the row; empty becomes the gap skill ids.
    pub fn stored_priority_order(&self, gaps: &[SkillGap]) -> Vec<String> {
        if self.priority_order.is_empty() {
            gaps.iter().map(|gap| gap.skill.id.clone()).collect()
        } else {
            self.priority_order.clone()
        }
    }
}

fn new_resource_id() -> String {
    format!("resource_{}", Uuid::new_v4().simple())
}

// ────────────────────────────────────────────────────────────────────────────
// LLM plan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    #[serde(default)]
    resources: Vec<Value>,
    #[serde(default)]
    estimated_timeline: Option<Value>,
    #[serde(default)]
    priority_order: Option<Vec<String>>,
    #[serde(default)]
    learning_strategy: Option<String>,
}

fn text_or(entry: &Value, key: &str, default: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Positive whole number from a JSON number, rounded.
fn positive_count(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32)
}

fn normalize_resource(entry: &Value) -> PlannedResource {
    PlannedResource {
        id: new_resource_id(),
        title: text_or(entry, "title", ""),
        resource_type: text_or(entry, "type", "course"),
        url: text_or(entry, "url", ""),
        difficulty: text_or(entry, "difficulty", "beginner"),
        estimated_hours: positive_count(entry.get("estimatedHours"))
            .unwrap_or(DEFAULT_RESOURCE_HOURS),
        cost: text_or(entry, "cost", "free"),
    }
}

impl RawPlan {
    fn normalize(self) -> LearningPlan {
        LearningPlan {
            resources: self.resources.iter().map(normalize_resource).collect(),
            estimated_timeline: positive_count(self.estimated_timeline.as_ref())
                .unwrap_or(DEFAULT_TIMELINE_WEEKS),
            priority_order: self.priority_order.unwrap_or_default(),
            learning_strategy: self.learning_strategy.unwrap_or_default(),
        }
    }
}

/// Asks the model for a plan; any failure yields `fallback_plan`.
pub async fn generate_plan(
    llm: &LlmClient,
    gaps: &[SkillGap],
    preferences: Option<&Value>,
) -> LearningPlan {
    let gaps_json = match serde_json::to_string(gaps) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not serialize skill gaps for learning path: {e}");
            return fallback_plan(gaps);
        }
    };
    let preferences_json = preferences
        .filter(|value| !value.is_null())
        .map(Value::to_string);

    let prompt = learning_path_prompt(&gaps_json, preferences_json.as_deref());
    let system = system_prompt(LEARNING_PATH_ROLE);

    match llm
        .call_json::<RawPlan>(ModelTask::LearningPath, &system, &prompt)
        .await
    {
        Ok(raw) => {
            let plan = raw.normalize();
            debug!("AI learning path with {} resources", plan.resources.len());
            plan
        }
        Err(e) => {
            warn!("AI learning path generation failed, using fallback plan: {e}");
            fallback_plan(gaps)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback plan
// ────────────────────────────────────────────────────────────────────────────

/// Lowercase, whitespace runs collapsed to `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn fallback_difficulty(current: SkillLevel) -> &'static str {
    match current {
        SkillLevel::Expert => "advanced",
        other => other.as_str(),
    }
}

fn fallback_hours(gap: GapSize) -> u32 {
    match gap {
        GapSize::Large => 20,
        GapSize::Medium => 12,
        _ => 6,
    }
}

/// One free course per gap, highest priority first, three weeks per skill.
pub fn fallback_plan(gaps: &[SkillGap]) -> LearningPlan {
    let mut ordered = gaps.to_vec();
    sort_by_priority(&mut ordered);

    let resources = ordered
        .iter()
        .map(|gap| PlannedResource {
            id: new_resource_id(),
            title: format!("Learn {}", gap.skill.name),
            resource_type: "course".to_string(),
            url: format!("https://example.com/learn/{}", slugify(&gap.skill.name)),
            difficulty: fallback_difficulty(gap.current_level).to_string(),
            estimated_hours: fallback_hours(gap.gap),
            cost: "free".to_string(),
        })
        .collect();

    LearningPlan {
        resources,
        estimated_timeline: (ordered.len() as f64 * WEEKS_PER_SKILL).ceil() as u32,
        priority_order: ordered.iter().map(|gap| gap.skill.id.clone()).collect(),
        learning_strategy: FALLBACK_STRATEGY.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendations
// ────────────────────────────────────────────────────────────────────────────

const MAX_NEXT_STEPS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub next_steps: Vec<String>,
    pub trending_skills: Vec<&'static str>,
    pub learning_tips: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_focus: Option<Vec<String>>,
}

/// Next steps from the high-priority gaps of recent analyses, newest first.
/// With no analyses at all the caller gets starter advice.
pub fn recommendations(recent: &[Vec<SkillGap>]) -> Recommendations {
    if recent.is_empty() {
        return Recommendations {
            next_steps: vec!["Upload your resume to get started".to_string()],
            trending_skills: vec!["JavaScript", "Python", "React", "AWS"],
            learning_tips: vec!["Focus on one skill at a time", "Build projects to practice"],
            skill_focus: None,
        };
    }

    let focus: Vec<String> = recent
        .iter()
        .flatten()
        .filter(|gap| gap.priority == Priority::High)
        .map(|gap| gap.skill.name.clone())
        .take(MAX_NEXT_STEPS)
        .collect();

    let mut next_steps: Vec<String> = focus
        .iter()
        .map(|name| format!("Focus on improving {name}"))
        .collect();
    if next_steps.is_empty() {
        next_steps.push(
            "Great job! Consider learning new technologies to stay competitive".to_string(),
        );
    }

    Recommendations {
        next_steps,
        trending_skills: vec!["JavaScript", "Python", "React", "AWS", "Docker", "Kubernetes"],
        learning_tips: vec![
            "Practice with real projects",
            "Join online communities",
            "Follow industry leaders",
            "Set specific learning goals",
        ],
        skill_focus: Some(focus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::{Skill, SkillCategory};
    use serde_json::json;

    fn gap(name: &str, current: SkillLevel, size: GapSize, priority: Priority) -> SkillGap {
        SkillGap {
            skill: Skill::new(name, SkillCategory::Other, SkillLevel::Expert),
            current_level: current,
            required_level: SkillLevel::Expert,
            gap: size,
            priority,
        }
    }

    #[test]
    fn test_fallback_orders_by_priority() {
        let gaps = vec![
            gap("Sass", SkillLevel::Advanced, GapSize::Small, Priority::Low),
            gap("Rust Async", SkillLevel::Beginner, GapSize::Large, Priority::High),
            gap("SQL", SkillLevel::Intermediate, GapSize::Medium, Priority::Medium),
        ];

        let plan = fallback_plan(&gaps);

        let titles: Vec<&str> = plan.resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Learn Rust Async", "Learn SQL", "Learn Sass"]);
        assert_eq!(plan.resources[0].url, "https://example.com/learn/rust-async");
        assert_eq!(plan.resources[0].estimated_hours, 20);
        assert_eq!(plan.resources[1].estimated_hours, 12);
        assert_eq!(plan.resources[2].estimated_hours, 6);
        assert_eq!(plan.estimated_timeline, 9);
        assert_eq!(plan.priority_order[0], gaps[1].skill.id);
        assert!(plan.resources.iter().all(|r| r.cost == "free" && r.resource_type == "course"));
    }

    #[test]
    fn test_fallback_difficulty_caps_expert() {
        let plan = fallback_plan(&[gap("Go", SkillLevel::Expert, GapSize::Small, Priority::Low)]);
        assert_eq!(plan.resources[0].difficulty, "advanced");

        let plan = fallback_plan(&[gap("Go", SkillLevel::Beginner, GapSize::Small, Priority::Low)]);
        assert_eq!(plan.resources[0].difficulty, "beginner");
    }

    #[test]
    fn test_fallback_for_no_gaps_is_empty() {
        let plan = fallback_plan(&[]);
        assert!(plan.resources.is_empty());
        assert_eq!(plan.estimated_timeline, 0);
        assert_eq!(plan.stored_timeline(), 12);
    }

    #[test]
    fn test_raw_plan_defaults() {
        let raw: RawPlan = serde_json::from_value(json!({
            "resources": [{"title": "The Book", "estimatedHours": 0}, {}]
        }))
        .unwrap();

        let plan = raw.normalize();

        assert_eq!(plan.resources.len(), 2);
        assert_eq!(plan.resources[0].title, "The Book");
        assert_eq!(plan.resources[0].estimated_hours, 10);
        assert_eq!(plan.resources[1].resource_type, "course");
        assert_eq!(plan.resources[1].difficulty, "beginner");
        assert_eq!(plan.resources[1].cost, "free");
        assert_eq!(plan.estimated_timeline, 12);
        assert!(plan.priority_order.is_empty());
        assert_eq!(plan.learning_strategy, "");
    }

    #[test]
    fn test_stored_priority_order_falls_back_to_gap_ids() {
        let gaps = vec![gap("Go", SkillLevel::Beginner, GapSize::Small, Priority::Low)];
        let mut plan = fallback_plan(&[]);
        assert_eq!(plan.stored_priority_order(&gaps), vec![gaps[0].skill.id.clone()]);

        plan.priority_order = vec!["Go".into()];
        assert_eq!(plan.stored_priority_order(&gaps), vec!["Go".to_string()]);
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("Machine   Learning\tOps"), "machine-learning-ops");
    }

    #[test]
    fn test_recommendations_without_analyses() {
        let recs = recommendations(&[]);
        assert_eq!(recs.next_steps, vec!["Upload your resume to get started"]);
        assert!(recs.skill_focus.is_none());
    }

    #[test]
    fn test_recommendations_take_first_three_high_priority() {
        let recent = vec![
            vec![
                gap("Rust", SkillLevel::Beginner, GapSize::Large, Priority::High),
                gap("CSS", SkillLevel::Beginner, GapSize::Small, Priority::Low),
            ],
            vec![
                gap("Kafka", SkillLevel::Beginner, GapSize::Large, Priority::High),
                gap("K8s", SkillLevel::Beginner, GapSize::Large, Priority::High),
                gap("Go", SkillLevel::Beginner, GapSize::Large, Priority::High),
            ],
        ];

        let recs = recommendations(&recent);

        assert_eq!(
            recs.next_steps,
            vec!["Focus on improving Rust", "Focus on improving Kafka", "Focus on improving K8s"]
        );
        assert_eq!(recs.skill_focus.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_recommendations_with_no_high_priority_gaps() {
        let recent = vec![vec![gap("CSS", SkillLevel::Beginner, GapSize::Small, Priority::Low)]];
        let recs = recommendations(&recent);
        assert_eq!(
            recs.next_steps,
            vec!["Great job! Consider learning new technologies to stay competitive"]
        );
        assert_eq!(recs.skill_focus, Some(vec![]));
    }
}
