// Resume intake: upload validation, text extraction, LLM skill extraction,
// object storage and persistence.
// PDF parsing is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod extract;
pub mod handlers;
pub mod prompts;
pub mod skills;

pub use handlers::fetch_resume;
