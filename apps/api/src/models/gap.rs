use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::skill::{Skill, SkillLevel};

/// Size of the deficiency between a current and a required level.
/// Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSize {
    None,
    Small,
    Medium,
    Large,
}

impl GapSize {
    /// Score used when averaging into an overall rating.
    pub fn score(self) -> u32 {
        match self {
            GapSize::None => 0,
            GapSize::Small => 1,
            GapSize::Medium => 2,
            GapSize::Large => 3,
        }
    }

    /// Per-skill remediation estimate in weeks.
    pub fn weeks(self) -> u32 {
        match self {
            GapSize::None => 0,
            GapSize::Small => 2,
            GapSize::Medium => 6,
            GapSize::Large => 12,
        }
    }
}

impl FromStr for GapSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(GapSize::None),
            "small" => Ok(GapSize::Small),
            "medium" => Ok(GapSize::Medium),
            "large" => Ok(GapSize::Large),
            other => Err(format!("unknown gap size '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Summary rating across all skill gaps of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallGap {
    Small,
    Medium,
    Large,
}

impl OverallGap {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallGap::Small => "small",
            OverallGap::Medium => "medium",
            OverallGap::Large => "large",
        }
    }
}

impl FromStr for OverallGap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(OverallGap::Small),
            "medium" => Ok(OverallGap::Medium),
            "large" => Ok(OverallGap::Large),
            other => Err(format!("unknown overall gap '{other}'")),
        }
    }
}

/// One target skill assessed against the caller's current skill set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill: Skill,
    pub current_level: SkillLevel,
    pub required_level: SkillLevel,
    pub gap: GapSize,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysisResult {
    pub skill_gaps: Vec<SkillGap>,
    pub overall_gap: OverallGap,
    pub recommended_focus: Vec<String>,
    pub estimated_time_to_close: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gap_size_order_is_severity() {
        assert!(GapSize::None < GapSize::Small);
        assert!(GapSize::Small < GapSize::Medium);
        assert!(GapSize::Medium < GapSize::Large);
    }

    #[test]
    fn test_gap_weeks_table() {
        assert_eq!(GapSize::None.weeks(), 0);
        assert_eq!(GapSize::Small.weeks(), 2);
        assert_eq!(GapSize::Medium.weeks(), 6);
        assert_eq!(GapSize::Large.weeks(), 12);
    }

    #[test]
    fn test_priority_parse_rejects_unknown() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_analysis_result_wire_names() {
        let result = GapAnalysisResult {
            skill_gaps: vec![],
            overall_gap: OverallGap::Small,
            recommended_focus: vec![],
            estimated_time_to_close: 0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "skillGaps": [],
                "overallGap": "small",
                "recommendedFocus": [],
                "estimatedTimeToClose": 0
            })
        );
    }
}
