// Skill gap analysis
// scoring:  deterministic per-skill gaps and aggregates
// blend:    optional LLM analysis merged with the deterministic one
// insights: career insights over all resume skills

pub mod blend;
pub mod handlers;
pub mod insights;
pub mod prompts;
pub mod scoring;

pub use blend::LlmGapAdvisor;
