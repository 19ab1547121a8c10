// Job descriptions: CRUD, LLM extraction of required/preferred skills and
// resume comparison.

pub mod extract;
pub mod handlers;
pub mod prompts;

pub use handlers::fetch_job;
