// Curated learning resource catalogue: CRUD with filtered pagination,
// lookups by skill and model-assisted skill tagging.

pub mod extract;
pub mod handlers;
