//! Skill gap scoring: the deterministic gap model used on its own and as the
//! fallback when the LLM analysis is missing or unusable.
//!
//! Pipeline for one analysis:
//! 1. `compute_gaps`: per target skill: gap size + priority (required first)
//! 2. `aggregate_overall_gap`: mean gap score → small / medium / large
//! 3. `estimate_weeks`: weighted max/mean of per-skill week estimates
//! 4. `select_focus`: top high/medium priority names, capped at 5
//!
//! Everything here is pure and total over the enum domains.

use std::collections::BTreeMap;

use crate::models::gap::{GapAnalysisResult, GapSize, OverallGap, Priority, SkillGap};
use crate::models::skill::{Skill, SkillCategory, SkillLevel};

/// Maximum number of skill names returned by `select_focus`.
pub const MAX_RECOMMENDED_FOCUS: usize = 5;

/// Weight of the slowest skill in the time estimate; the mean gets the rest.
const BOTTLENECK_WEIGHT: f64 = 0.6;
const PARALLEL_WEIGHT: f64 = 0.4;

// ────────────────────────────────────────────────────────────────────────────
// Per-skill classification
// ────────────────────────────────────────────────────────────────────────────

/// Maps a (current, required) level pair to a gap size by rank difference.
pub fn classify_gap(current: SkillLevel, required: SkillLevel) -> GapSize {
    let difference = i16::from(required.rank()) - i16::from(current.rank());
    match difference {
        d if d <= 0 => GapSize::None,
        1 => GapSize::Small,
        2 => GapSize::Medium,
        _ => GapSize::Large,
    }
}

/// Required skills escalate medium/large gaps to high; preferred skills never
/// rise above medium. No gap is always low.
pub fn assign_priority(gap: GapSize, is_required: bool) -> Priority {
    match (gap, is_required) {
        (GapSize::None, _) => Priority::Low,
        (GapSize::Large | GapSize::Medium, true) => Priority::High,
        (GapSize::Small, true) => Priority::Medium,
        (GapSize::Large | GapSize::Medium, false) => Priority::Medium,
        (GapSize::Small, false) => Priority::Low,
    }
}

/// Computes the gap list for `required ++ preferred` against `current`.
///
/// Skills are matched by case-insensitive name. A missing skill is a large,
/// high-priority gap at beginner level. Matched skills that already meet the
/// requirement are left out. Priorities are always assigned as if the target
/// were required, so preferred skills score the same as required ones.
pub fn compute_gaps(current: &[Skill], required: &[Skill], preferred: &[Skill]) -> Vec<SkillGap> {
    required
        .iter()
        .chain(preferred)
        .filter_map(|target| {
            let Some(held) = current.iter().find(|c| c.same_name(&target.name)) else {
                return Some(SkillGap {
                    skill: target.clone(),
                    current_level: SkillLevel::Beginner,
                    required_level: target.level,
                    gap: GapSize::Large,
                    priority: assign_priority(GapSize::Large, true),
                });
            };

            let gap = classify_gap(held.level, target.level);
            if gap == GapSize::None {
                return None;
            }

            Some(SkillGap {
                skill: target.clone(),
                current_level: held.level,
                required_level: target.level,
                gap,
                priority: assign_priority(gap, true),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregates
// ────────────────────────────────────────────────────────────────────────────

/// Mean gap score: < 1 small, < 2 medium, otherwise large. Empty input is small.
pub fn aggregate_overall_gap(gaps: &[SkillGap]) -> OverallGap {
    if gaps.is_empty() {
        return OverallGap::Small;
    }

    let total: u32 = gaps.iter().map(|g| g.gap.score()).sum();
    let mean = f64::from(total) / gaps.len() as f64;

    if mean < 1.0 {
        OverallGap::Small
    } else if mean < 2.0 {
        OverallGap::Medium
    } else {
        OverallGap::Large
    }
}

/// Weeks to close all gaps, assuming skills are partly learned in parallel:
/// `ceil(0.6 * max + 0.4 * mean)` over per-skill estimates. Empty input is 0.
pub fn estimate_weeks(gaps: &[SkillGap]) -> u32 {
    if gaps.is_empty() {
        return 0;
    }

    let estimates: Vec<u32> = gaps.iter().map(|g| g.gap.weeks()).collect();
    let max = estimates.iter().copied().max().unwrap_or(0);
    let mean = f64::from(estimates.iter().sum::<u32>()) / estimates.len() as f64;

    (BOTTLENECK_WEIGHT * f64::from(max) + PARALLEL_WEIGHT * mean).ceil() as u32
}

/// High-priority names then medium-priority names, each in input order,
/// truncated to `MAX_RECOMMENDED_FOCUS`.
pub fn select_focus(gaps: &[SkillGap]) -> Vec<String> {
    let with_priority = move |wanted: Priority| {
        gaps.iter()
            .filter(move |g| g.priority == wanted)
            .map(|g| g.skill.name.clone())
    };

    with_priority(Priority::High)
        .chain(with_priority(Priority::Medium))
        .take(MAX_RECOMMENDED_FOCUS)
        .collect()
}

/// Runs the full deterministic analysis.
pub fn analyze(current: &[Skill], required: &[Skill], preferred: &[Skill]) -> GapAnalysisResult {
    let skill_gaps = compute_gaps(current, required, preferred);
    summarize(skill_gaps)
}

/// Builds a result whose aggregates are all derived from `skill_gaps`.
pub fn summarize(skill_gaps: Vec<SkillGap>) -> GapAnalysisResult {
    GapAnalysisResult {
        overall_gap: aggregate_overall_gap(&skill_gaps),
        recommended_focus: select_focus(&skill_gaps),
        estimated_time_to_close: estimate_weeks(&skill_gaps),
        skill_gaps,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ordering and grouping helpers
// ────────────────────────────────────────────────────────────────────────────

/// Stable sort: priority descending, then gap size descending.
pub fn sort_by_priority(gaps: &mut [SkillGap]) {
    gaps.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.gap.cmp(&a.gap)));
}

pub fn group_by_category(skills: &[Skill]) -> BTreeMap<SkillCategory, Vec<Skill>> {
    let mut groups: BTreeMap<SkillCategory, Vec<Skill>> = BTreeMap::new();
    for skill in skills {
        groups.entry(skill.category).or_default().push(skill.clone());
    }
    groups
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, level: SkillLevel) -> Skill {
        Skill::new(name, SkillCategory::Other, level)
    }

    fn gap_of(name: &str, gap: GapSize, priority: Priority) -> SkillGap {
        SkillGap {
            skill: skill(name, SkillLevel::Expert),
            current_level: SkillLevel::Beginner,
            required_level: SkillLevel::Expert,
            gap,
            priority,
        }
    }

    #[test]
    fn test_equal_levels_have_no_gap() {
        for level in SkillLevel::ALL {
            assert_eq!(classify_gap(level, level), GapSize::None);
        }
    }

    #[test]
    fn test_exceeding_requirement_has_no_gap() {
        assert_eq!(
            classify_gap(SkillLevel::Expert, SkillLevel::Beginner),
            GapSize::None
        );
    }

    #[test]
    fn test_gap_sizes_by_rank_difference() {
        use SkillLevel::*;
        assert_eq!(classify_gap(Beginner, Intermediate), GapSize::Small);
        assert_eq!(classify_gap(Beginner, Advanced), GapSize::Medium);
        assert_eq!(classify_gap(Beginner, Expert), GapSize::Large);
        assert_eq!(classify_gap(Intermediate, Expert), GapSize::Medium);
    }

    #[test]
    fn test_gap_is_monotonic_in_required_level() {
        for current in SkillLevel::ALL {
            let gaps: Vec<GapSize> = SkillLevel::ALL
                .iter()
                .map(|required| classify_gap(current, *required))
                .collect();
            assert!(
                gaps.windows(2).all(|w| w[0] <= w[1]),
                "not monotonic for {current}: {gaps:?}"
            );
        }
    }

    #[test]
    fn test_no_gap_is_always_low_priority() {
        assert_eq!(assign_priority(GapSize::None, true), Priority::Low);
        assert_eq!(assign_priority(GapSize::None, false), Priority::Low);
    }

    #[test]
    fn test_required_priorities() {
        assert_eq!(assign_priority(GapSize::Large, true), Priority::High);
        assert_eq!(assign_priority(GapSize::Medium, true), Priority::High);
        assert_eq!(assign_priority(GapSize::Small, true), Priority::Medium);
    }

    #[test]
    fn test_preferred_priorities() {
        assert_eq!(assign_priority(GapSize::Large, false), Priority::Medium);
        assert_eq!(assign_priority(GapSize::Medium, false), Priority::Medium);
        assert_eq!(assign_priority(GapSize::Small, false), Priority::Low);
    }

    #[test]
    fn test_compute_gaps_never_emits_none() {
        let current = vec![
            skill("Rust", SkillLevel::Expert),
            skill("SQL", SkillLevel::Intermediate),
        ];
        let required = vec![
            skill("rust", SkillLevel::Advanced),
            skill("sql", SkillLevel::Advanced),
        ];
        let gaps = compute_gaps(&current, &required, &[]);
        assert_eq!(gaps.len(), 1);
        assert!(gaps.iter().all(|g| g.gap != GapSize::None));
        assert_eq!(gaps[0].skill.name, "sql");
    }

    #[test]
    fn test_missing_skill_is_large_high_from_beginner() {
        let gaps = compute_gaps(&[], &[skill("Kafka", SkillLevel::Intermediate)], &[]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap, GapSize::Large);
        assert_eq!(gaps[0].priority, Priority::High);
        assert_eq!(gaps[0].current_level, SkillLevel::Beginner);
        assert_eq!(gaps[0].required_level, SkillLevel::Intermediate);
    }

    #[test]
    fn test_missing_preferred_skill_scored_like_required() {
        let gaps = compute_gaps(&[], &[], &[skill("Terraform", SkillLevel::Beginner)]);
        assert_eq!(gaps[0].gap, GapSize::Large);
        assert_eq!(gaps[0].priority, Priority::High);
    }

    #[test]
    fn test_small_gap_on_preferred_skill_is_medium_priority() {
        let current = vec![skill("Docker", SkillLevel::Beginner)];
        let preferred = vec![skill("Docker", SkillLevel::Intermediate)];
        let gaps = compute_gaps(&current, &[], &preferred);
        assert_eq!(gaps[0].gap, GapSize::Small);
        assert_eq!(gaps[0].priority, Priority::Medium);
    }

    #[test]
    fn test_required_gaps_come_before_preferred() {
        let required = vec![skill("A", SkillLevel::Expert)];
        let preferred = vec![skill("B", SkillLevel::Expert)];
        let gaps = compute_gaps(&[], &required, &preferred);
        let names: Vec<&str> = gaps.iter().map(|g| g.skill.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_matching_ignores_category() {
        let current = vec![Skill::new(
            "React",
            SkillCategory::WebTechnologies,
            SkillLevel::Expert,
        )];
        let required = vec![Skill::new(
            "react",
            SkillCategory::FrameworksLibraries,
            SkillLevel::Expert,
        )];
        assert!(compute_gaps(&current, &required, &[]).is_empty());
    }

    #[test]
    fn test_overall_gap_empty_is_small() {
        assert_eq!(aggregate_overall_gap(&[]), OverallGap::Small);
    }

    #[test]
    fn test_overall_gap_thresholds() {
        let small = vec![gap_of("a", GapSize::Small, Priority::Medium)];
        assert_eq!(aggregate_overall_gap(&small), OverallGap::Medium);

        let mixed = vec![
            gap_of("a", GapSize::None, Priority::Low),
            gap_of("b", GapSize::Small, Priority::Medium),
        ];
        // mean 0.5
        assert_eq!(aggregate_overall_gap(&mixed), OverallGap::Small);

        let medium = vec![
            gap_of("a", GapSize::Small, Priority::Medium),
            gap_of("b", GapSize::Medium, Priority::High),
        ];
        // mean 1.5
        assert_eq!(aggregate_overall_gap(&medium), OverallGap::Medium);

        let large = vec![gap_of("a", GapSize::Medium, Priority::High)];
        assert_eq!(aggregate_overall_gap(&large), OverallGap::Large);
    }

    #[test]
    fn test_estimate_weeks_empty_is_zero() {
        assert_eq!(estimate_weeks(&[]), 0);
    }

    #[test]
    fn test_estimate_weeks_single_gap_equals_its_estimate() {
        for (gap, weeks) in [
            (GapSize::Small, 2),
            (GapSize::Medium, 6),
            (GapSize::Large, 12),
        ] {
            assert_eq!(estimate_weeks(&[gap_of("x", gap, Priority::High)]), weeks);
        }
    }

    #[test]
    fn test_estimate_weeks_weights_bottleneck() {
        let gaps = vec![
            gap_of("a", GapSize::Small, Priority::Medium),
            gap_of("b", GapSize::Small, Priority::Medium),
            gap_of("c", GapSize::Large, Priority::High),
        ];
        // max 12, mean 16/3 → 7.2 + 2.133.. = 9.33 → 10
        assert_eq!(estimate_weeks(&gaps), 10);
    }

    #[test]
    fn test_focus_orders_high_before_medium_and_skips_low() {
        let gaps = vec![
            gap_of("m1", GapSize::Small, Priority::Medium),
            gap_of("l1", GapSize::Small, Priority::Low),
            gap_of("h1", GapSize::Large, Priority::High),
            gap_of("h2", GapSize::Medium, Priority::High),
        ];
        assert_eq!(select_focus(&gaps), vec!["h1", "h2", "m1"]);
    }

    #[test]
    fn test_focus_capped_at_five() {
        let gaps: Vec<SkillGap> = (0..8)
            .map(|i| gap_of(&format!("s{i}"), GapSize::Large, Priority::High))
            .collect();
        let focus = select_focus(&gaps);
        assert_eq!(focus.len(), MAX_RECOMMENDED_FOCUS);
        assert_eq!(focus[0], "s0");
        assert_eq!(focus[4], "s4");
    }

    #[test]
    fn test_focus_with_only_low_priority_is_empty() {
        let gaps = vec![gap_of("l", GapSize::Small, Priority::Low)];
        assert!(select_focus(&gaps).is_empty());
    }

    #[test]
    fn test_scenario_python_and_docker() {
        let current = vec![skill("Python", SkillLevel::Intermediate)];
        let required = vec![
            skill("Python", SkillLevel::Expert),
            skill("Docker", SkillLevel::Beginner),
        ];

        let result = analyze(&current, &required, &[]);

        assert_eq!(result.skill_gaps.len(), 2);
        let python = &result.skill_gaps[0];
        assert_eq!(python.skill.name, "Python");
        assert_eq!(python.gap, GapSize::Medium);
        assert_eq!(python.priority, Priority::High);

        let docker = &result.skill_gaps[1];
        assert_eq!(docker.skill.name, "Docker");
        assert_eq!(docker.gap, GapSize::Large);
        assert_eq!(docker.priority, Priority::High);
        assert_eq!(docker.current_level, SkillLevel::Beginner);

        assert_eq!(result.overall_gap, OverallGap::Large);
        assert_eq!(result.estimated_time_to_close, 11);
        assert_eq!(result.recommended_focus, vec!["Python", "Docker"]);
    }

    #[test]
    fn test_scenario_full_match() {
        let current = vec![skill("Go", SkillLevel::Expert)];
        let required = vec![skill("Go", SkillLevel::Expert)];

        let result = analyze(&current, &required, &[]);

        assert!(result.skill_gaps.is_empty());
        assert_eq!(result.overall_gap, OverallGap::Small);
        assert_eq!(result.estimated_time_to_close, 0);
        assert!(result.recommended_focus.is_empty());
    }

    #[test]
    fn test_sort_by_priority_breaks_ties_on_gap() {
        let mut gaps = vec![
            gap_of("low", GapSize::Small, Priority::Low),
            gap_of("high-medium", GapSize::Medium, Priority::High),
            gap_of("high-large", GapSize::Large, Priority::High),
            gap_of("medium", GapSize::Small, Priority::Medium),
        ];
        sort_by_priority(&mut gaps);
        let names: Vec<&str> = gaps.iter().map(|g| g.skill.name.as_str()).collect();
        assert_eq!(names, vec!["high-large", "high-medium", "medium", "low"]);
    }

    #[test]
    fn test_group_by_category() {
        let skills = vec![
            Skill::new("Rust", SkillCategory::ProgrammingLanguages, SkillLevel::Expert),
            Skill::new("Postgres", SkillCategory::Databases, SkillLevel::Advanced),
            Skill::new("Go", SkillCategory::ProgrammingLanguages, SkillLevel::Beginner),
        ];
        let groups = group_by_category(&skills);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&SkillCategory::ProgrammingLanguages].len(), 2);
        assert_eq!(groups[&SkillCategory::Databases][0].name, "Postgres");
    }
}
