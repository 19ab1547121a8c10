// Learning paths generated from skill gaps.
// The LLM plan is normalized field by field; when the call fails the
// planner builds one free course per gap instead.

pub mod handlers;
pub mod planner;
pub mod prompts;
