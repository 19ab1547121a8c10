use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Ordinal proficiency. Ordering follows rank: beginner < intermediate < advanced < expert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 4] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ];

    /// beginner=1, intermediate=2, advanced=3, expert=4
    pub fn rank(self) -> u8 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }

    /// Parses a level, falling back to `Beginner` for anything unrecognised.
    pub fn from_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            other => Err(format!("unknown skill level '{other}'")),
        }
    }
}

// Skill records arrive from LLM output and loosely-typed JSON columns, so
// unknown or null levels collapse to beginner instead of failing the whole list.
impl<'de> Deserialize<'de> for SkillLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(SkillLevel::from_lenient).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SkillCategory {
    #[serde(rename = "Programming Languages")]
    ProgrammingLanguages,
    #[serde(rename = "Frameworks & Libraries")]
    FrameworksLibraries,
    #[serde(rename = "Databases")]
    Databases,
    #[serde(rename = "Cloud Platforms")]
    CloudPlatforms,
    #[serde(rename = "DevOps & Tools")]
    DevOpsTools,
    #[serde(rename = "Soft Skills")]
    SoftSkills,
    #[serde(rename = "Design & UX")]
    Design,
    #[serde(rename = "Data Science & ML")]
    DataScience,
    #[serde(rename = "Mobile Development")]
    Mobile,
    #[serde(rename = "Web Technologies")]
    WebTechnologies,
    #[serde(rename = "Security")]
    Security,
    #[serde(rename = "Testing & QA")]
    Testing,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 13] = [
        SkillCategory::ProgrammingLanguages,
        SkillCategory::FrameworksLibraries,
        SkillCategory::Databases,
        SkillCategory::CloudPlatforms,
        SkillCategory::DevOpsTools,
        SkillCategory::SoftSkills,
        SkillCategory::Design,
        SkillCategory::DataScience,
        SkillCategory::Mobile,
        SkillCategory::WebTechnologies,
        SkillCategory::Security,
        SkillCategory::Testing,
        SkillCategory::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SkillCategory::ProgrammingLanguages => "Programming Languages",
            SkillCategory::FrameworksLibraries => "Frameworks & Libraries",
            SkillCategory::Databases => "Databases",
            SkillCategory::CloudPlatforms => "Cloud Platforms",
            SkillCategory::DevOpsTools => "DevOps & Tools",
            SkillCategory::SoftSkills => "Soft Skills",
            SkillCategory::Design => "Design & UX",
            SkillCategory::DataScience => "Data Science & ML",
            SkillCategory::Mobile => "Mobile Development",
            SkillCategory::WebTechnologies => "Web Technologies",
            SkillCategory::Security => "Security",
            SkillCategory::Testing => "Testing & QA",
            SkillCategory::Other => "Other",
        }
    }

    /// Matches a display name case-insensitively; anything else is `Other`.
    pub fn from_lenient(raw: &str) -> Self {
        let wanted = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().to_lowercase() == wanted)
            .unwrap_or_default()
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for SkillCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw
            .as_str()
            .map(SkillCategory::from_lenient)
            .unwrap_or_default())
    }
}

/// `null` and missing strings read as empty.
fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named technical competency as stored in resume and job description skill lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default)]
    pub category: SkillCategory,
    #[serde(default)]
    pub level: SkillLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<f64>,
    /// Extraction confidence reported by the resume parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Skill {
    pub fn new(name: impl Into<String>, category: SkillCategory, level: SkillLevel) -> Self {
        Self {
            id: new_skill_id(),
            name: name.into(),
            category,
            level,
            years_of_experience: None,
            confidence: None,
        }
    }

    /// Builds a skill from one loosely-typed LLM entry. Always assigns a
    /// fresh id; unknown category and level fall back to their defaults.
    pub fn from_llm_entry(entry: &Value, fallback_name: &str) -> Self {
        let name = text_field(entry, "name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback_name);

        Self {
            id: new_skill_id(),
            name: name.to_string(),
            category: text_field(entry, "category")
                .map(SkillCategory::from_lenient)
                .unwrap_or_default(),
            level: text_field(entry, "level")
                .map(SkillLevel::from_lenient)
                .unwrap_or_default(),
            years_of_experience: entry.get("yearsOfExperience").and_then(Value::as_f64),
            confidence: entry.get("confidence").and_then(Value::as_f64),
        }
    }

    /// Case-insensitive name comparison. Category is ignored.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.to_lowercase() == other.to_lowercase()
    }
}

fn text_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

pub fn new_skill_id() -> String {
    format!("skill_{}", Uuid::new_v4().simple())
}
