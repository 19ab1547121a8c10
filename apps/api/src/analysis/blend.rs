//! AI/manual blending. Merges an optional LLM gap analysis with the
//! deterministic one from `scoring`.
//!
//! The LLM sits behind the `GapAdvisor` trait so handlers and tests can swap
//! it out. `AppState` holds an `Arc<dyn GapAdvisor>`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::prompts::{gap_analysis_prompt, GAP_ANALYSIS_ROLE};
use crate::analysis::scoring::{self, MAX_RECOMMENDED_FOCUS};
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{LlmClient, ModelTask};
use crate::models::gap::{GapAnalysisResult, GapSize, OverallGap, Priority, SkillGap};
use crate::models::skill::{new_skill_id, Skill, SkillCategory, SkillLevel};

// ────────────────────────────────────────────────────────────────────────────
// Advisor output
// ────────────────────────────────────────────────────────────────────────────

/// A normalized AI analysis. Every aggregate is optional so the blend can
/// tell "not provided" apart from a real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiGapAnalysis {
    pub skill_gaps: Vec<SkillGap>,
    pub overall_gap: Option<OverallGap>,
    pub recommended_focus: Option<Vec<String>>,
    pub estimated_time_to_close: Option<u32>,
}

/// Shape the model is asked to produce. Everything is optional because the
/// model does not always honour the schema.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawGapAnalysis {
    skill_gaps: Option<Vec<RawSkillGap>>,
    overall_gap: Option<String>,
    recommended_focus: Option<Vec<String>>,
    estimated_time_to_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSkillGap {
    /// Usually a plain name, occasionally a skill object.
    skill: Option<Value>,
    current_level: Option<String>,
    required_level: Option<String>,
    gap: Option<String>,
    priority: Option<String>,
}

impl RawSkillGap {
    fn skill_name(&self) -> String {
        match &self.skill {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Object(fields)) => fields
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    fn normalize(self) -> SkillGap {
        let name = self.skill_name();
        let current_level = self
            .current_level
            .as_deref()
            .map(SkillLevel::from_lenient)
            .unwrap_or(SkillLevel::Beginner);
        let required_level = self
            .required_level
            .as_deref()
            .map(SkillLevel::from_lenient)
            .unwrap_or(SkillLevel::Intermediate);

        SkillGap {
            skill: Skill {
                id: if name.is_empty() {
                    new_skill_id()
                } else {
                    name.clone()
                },
                name,
                category: SkillCategory::Other,
                level: current_level,
                years_of_experience: None,
                confidence: None,
            },
            current_level,
            required_level,
            gap: self
                .gap
                .and_then(|g| g.parse().ok())
                .unwrap_or(GapSize::Medium),
            priority: self
                .priority
                .and_then(|p| p.parse().ok())
                .unwrap_or(Priority::Medium),
        }
    }
}

impl RawGapAnalysis {
    fn normalize(self) -> AiGapAnalysis {
        AiGapAnalysis {
            skill_gaps: self
                .skill_gaps
                .unwrap_or_default()
                .into_iter()
                .map(RawSkillGap::normalize)
                .collect(),
            overall_gap: self.overall_gap.and_then(|g| g.parse().ok()),
            recommended_focus: self.recommended_focus,
            estimated_time_to_close: self
                .estimated_time_to_close
                .filter(|w| w.is_finite() && *w > 0.0)
                .map(|w| w.round() as u32),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Source of AI gap analyses. Implementations never fail: anything unusable
/// is reported as `None` and the deterministic result takes over.
#[async_trait]
pub trait GapAdvisor: Send + Sync {
    async fn analyze(&self, current: &[Skill], targets: &[Skill]) -> Option<AiGapAnalysis>;
}

/// Default advisor backed by the chat-completion model for gap analysis.
pub struct LlmGapAdvisor {
    llm: LlmClient,
}

impl LlmGapAdvisor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GapAdvisor for LlmGapAdvisor {
    async fn analyze(&self, current: &[Skill], targets: &[Skill]) -> Option<AiGapAnalysis> {
        let (current_json, targets_json) =
            match (serde_json::to_string(current), serde_json::to_string(targets)) {
                (Ok(c), Ok(t)) => (c, t),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Could not serialize skills for AI gap analysis: {e}");
                    return None;
                }
            };

        let prompt = gap_analysis_prompt(&current_json, &targets_json);
        let system = system_prompt(GAP_ANALYSIS_ROLE);

        match self
            .llm
            .call_json::<RawGapAnalysis>(ModelTask::GapAnalysis, &system, &prompt)
            .await
        {
            Ok(raw) => {
                let analysis = raw.normalize();
                debug!(
                    "AI gap analysis returned {} gaps",
                    analysis.skill_gaps.len()
                );
                Some(analysis)
            }
            Err(e) => {
                warn!("AI gap analysis failed, falling back to computed gaps: {e}");
                None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blending
// ────────────────────────────────────────────────────────────────────────────

/// Picks the AI gap list when it is non-empty, otherwise the manual one.
/// Each aggregate comes from the AI when it supplied a usable value and is
/// otherwise computed over the gap list that was picked.
pub fn blend(ai: Option<AiGapAnalysis>, manual_gaps: Vec<SkillGap>) -> GapAnalysisResult {
    let Some(ai) = ai else {
        return scoring::summarize(manual_gaps);
    };

    let selected = if ai.skill_gaps.is_empty() {
        manual_gaps
    } else {
        ai.skill_gaps
    };
    let computed = scoring::summarize(selected);

    GapAnalysisResult {
        overall_gap: ai.overall_gap.unwrap_or(computed.overall_gap),
        recommended_focus: ai
            .recommended_focus
            .map(|mut focus| {
                focus.truncate(MAX_RECOMMENDED_FOCUS);
                focus
            })
            .unwrap_or(computed.recommended_focus),
        estimated_time_to_close: ai
            .estimated_time_to_close
            .filter(|weeks| *weeks > 0)
            .unwrap_or(computed.estimated_time_to_close),
        skill_gaps: computed.skill_gaps,
    }
}

/// Full analysis for one resume/job pair. Never fails.
pub async fn run_gap_analysis(
    advisor: &dyn GapAdvisor,
    current: &[Skill],
    required: &[Skill],
    preferred: &[Skill],
) -> GapAnalysisResult {
    let targets: Vec<Skill> = required.iter().chain(preferred).cloned().collect();
    let ai = advisor.analyze(current, &targets).await;
    let manual_gaps = scoring::compute_gaps(current, required, preferred);
    blend(ai, manual_gaps)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedAdvisor(Option<AiGapAnalysis>);

    #[async_trait]
    impl GapAdvisor for FixedAdvisor {
        async fn analyze(&self, _: &[Skill], _: &[Skill]) -> Option<AiGapAnalysis> {
            self.0.clone()
        }
    }

    /// Records the target list it was asked about.
    #[derive(Default)]
    struct RecordingAdvisor {
        targets: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GapAdvisor for RecordingAdvisor {
        async fn analyze(&self, _: &[Skill], targets: &[Skill]) -> Option<AiGapAnalysis> {
            if let Ok(mut seen) = self.targets.lock() {
                *seen = targets.iter().map(|s| s.name.clone()).collect();
            }
            None
        }
    }

    fn skill(name: &str, level: SkillLevel) -> Skill {
        Skill::new(name, SkillCategory::Other, level)
    }

    fn gap_of(name: &str, gap: GapSize, priority: Priority) -> SkillGap {
        SkillGap {
            skill: skill(name, SkillLevel::Advanced),
            current_level: SkillLevel::Beginner,
            required_level: SkillLevel::Advanced,
            gap,
            priority,
        }
    }

    fn parse_raw(value: Value) -> AiGapAnalysis {
        serde_json::from_value::<RawGapAnalysis>(value)
            .unwrap()
            .normalize()
    }

    #[test]
    fn test_without_ai_result_equals_scoring() {
        let manual = vec![
            gap_of("Python", GapSize::Medium, Priority::High),
            gap_of("Docker", GapSize::Large, Priority::High),
        ];
        assert_eq!(blend(None, manual.clone()), scoring::summarize(manual));
    }

    #[test]
    fn test_empty_ai_gaps_use_manual_list() {
        let manual = vec![gap_of("Kafka", GapSize::Large, Priority::High)];
        let ai = AiGapAnalysis {
            overall_gap: Some(OverallGap::Medium),
            ..Default::default()
        };

        let result = blend(Some(ai), manual.clone());

        assert_eq!(result.skill_gaps, manual);
        assert_eq!(result.overall_gap, OverallGap::Medium);
        assert_eq!(result.estimated_time_to_close, 12);
        assert_eq!(result.recommended_focus, vec!["Kafka"]);
    }

    #[test]
    fn test_missing_ai_aggregates_computed_over_ai_gaps() {
        let manual = vec![gap_of("Manual", GapSize::Large, Priority::High)];
        let ai = AiGapAnalysis {
            skill_gaps: vec![gap_of("FromAi", GapSize::Small, Priority::Medium)],
            ..Default::default()
        };

        let result = blend(Some(ai), manual);

        assert_eq!(result.skill_gaps.len(), 1);
        assert_eq!(result.skill_gaps[0].skill.name, "FromAi");
        assert_eq!(result.overall_gap, OverallGap::Medium);
        assert_eq!(result.estimated_time_to_close, 2);
        assert_eq!(result.recommended_focus, vec!["FromAi"]);
    }

    #[test]
    fn test_ai_aggregates_win_when_usable() {
        let ai = AiGapAnalysis {
            skill_gaps: vec![gap_of("Rust", GapSize::Large, Priority::High)],
            overall_gap: Some(OverallGap::Small),
            recommended_focus: Some(vec!["Ownership".to_string()]),
            estimated_time_to_close: Some(30),
        };

        let result = blend(Some(ai), vec![]);

        assert_eq!(result.overall_gap, OverallGap::Small);
        assert_eq!(result.recommended_focus, vec!["Ownership"]);
        assert_eq!(result.estimated_time_to_close, 30);
    }

    #[test]
    fn test_empty_ai_focus_is_kept_and_zero_weeks_ignored() {
        let ai = AiGapAnalysis {
            skill_gaps: vec![gap_of("Go", GapSize::Medium, Priority::High)],
            overall_gap: None,
            recommended_focus: Some(vec![]),
            estimated_time_to_close: Some(0),
        };

        let result = blend(Some(ai), vec![]);

        assert!(result.recommended_focus.is_empty());
        assert_eq!(result.estimated_time_to_close, 6);
    }

    #[test]
    fn test_missing_ai_focus_falls_back_to_selected_gaps() {
        let ai = AiGapAnalysis {
            recommended_focus: None,
            ..Default::default()
        };
        let manual = vec![gap_of("Rust", GapSize::Large, Priority::High)];

        let result = blend(Some(ai), manual);

        assert_eq!(result.recommended_focus, vec!["Rust"]);
    }

    #[test]
    fn test_ai_focus_is_capped() {
        let ai = AiGapAnalysis {
            recommended_focus: Some((0..9).map(|i| format!("s{i}")).collect()),
            ..Default::default()
        };
        let result = blend(Some(ai), vec![]);
        assert_eq!(result.recommended_focus.len(), MAX_RECOMMENDED_FOCUS);
    }

    #[test]
    fn test_raw_gap_defaults() {
        let analysis = parse_raw(json!({ "skillGaps": [{}] }));
        let gap = &analysis.skill_gaps[0];

        assert_eq!(gap.skill.name, "");
        assert!(gap.skill.id.starts_with("skill_"));
        assert_eq!(gap.skill.category, SkillCategory::Other);
        assert_eq!(gap.current_level, SkillLevel::Beginner);
        assert_eq!(gap.required_level, SkillLevel::Intermediate);
        assert_eq!(gap.gap, GapSize::Medium);
        assert_eq!(gap.priority, Priority::Medium);
        assert!(analysis.overall_gap.is_none());
        assert!(analysis.estimated_time_to_close.is_none());
    }

    #[test]
    fn test_raw_gap_uses_name_as_id_and_accepts_skill_objects() {
        let analysis = parse_raw(json!({
            "skillGaps": [
                {"skill": "Kubernetes", "currentLevel": "intermediate", "gap": "small", "priority": "high"},
                {"skill": {"name": "Terraform"}, "requiredLevel": "expert"}
            ],
            "overallGap": "LARGE",
            "estimatedTimeToClose": 8.4
        }));

        let k8s = &analysis.skill_gaps[0];
        assert_eq!(k8s.skill.id, "Kubernetes");
        assert_eq!(k8s.skill.level, SkillLevel::Intermediate);
        assert_eq!(k8s.gap, GapSize::Small);
        assert_eq!(k8s.priority, Priority::High);

        let terraform = &analysis.skill_gaps[1];
        assert_eq!(terraform.skill.name, "Terraform");
        assert_eq!(terraform.required_level, SkillLevel::Expert);

        assert_eq!(analysis.overall_gap, Some(OverallGap::Large));
        assert_eq!(analysis.estimated_time_to_close, Some(8));
    }

    #[test]
    fn test_raw_unknown_overall_gap_is_dropped() {
        let analysis = parse_raw(json!({"overallGap": "enormous", "estimatedTimeToClose": -3}));
        assert!(analysis.overall_gap.is_none());
        assert!(analysis.estimated_time_to_close.is_none());
    }

    #[tokio::test]
    async fn test_run_gap_analysis_falls_back_when_advisor_declines() {
        let advisor = FixedAdvisor(None);
        let current = vec![skill("Python", SkillLevel::Intermediate)];
        let required = vec![
            skill("Python", SkillLevel::Expert),
            skill("Docker", SkillLevel::Beginner),
        ];

        let result = run_gap_analysis(&advisor, &current, &required, &[]).await;

        assert_eq!(result.overall_gap, OverallGap::Large);
        assert_eq!(result.estimated_time_to_close, 11);
        assert_eq!(result.recommended_focus, vec!["Python", "Docker"]);
    }

    #[tokio::test]
    async fn test_run_gap_analysis_prefers_ai_gaps() {
        let advisor = FixedAdvisor(Some(AiGapAnalysis {
            skill_gaps: vec![gap_of("Docker", GapSize::Small, Priority::Low)],
            ..Default::default()
        }));
        let required = vec![skill("Docker", SkillLevel::Expert)];

        let result = run_gap_analysis(&advisor, &[], &required, &[]).await;

        assert_eq!(result.skill_gaps[0].gap, GapSize::Small);
        assert!(result.recommended_focus.is_empty());
        assert_eq!(result.overall_gap, OverallGap::Medium);
    }

    #[tokio::test]
    async fn test_advisor_sees_required_then_preferred() {
        let advisor = RecordingAdvisor::default();
        let required = vec![skill("Rust", SkillLevel::Expert)];
        let preferred = vec![skill("Nix", SkillLevel::Beginner)];

        run_gap_analysis(&advisor, &[], &required, &preferred).await;

        assert_eq!(*advisor.targets.lock().unwrap(), vec!["Rust", "Nix"]);
    }
}
