use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::analysis::blend::GapAdvisor;
use crate::auth::client::SupabaseAuth;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Backs the per-IP rate limiter.
    pub redis: RedisClient,
    pub storage: Storage,
    pub llm: LlmClient,
    pub auth: SupabaseAuth,
    /// Pluggable AI gap analysis. Default: `LlmGapAdvisor`.
    pub gap_advisor: Arc<dyn GapAdvisor>,
    pub config: Config,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::analysis::blend::AiGapAnalysis;
    use crate::models::skill::Skill;
    use async_trait::async_trait;

    struct NoAdvisor;

    #[async_trait]
    impl GapAdvisor for NoAdvisor {
        async fn analyze(&self, _: &[Skill], _: &[Skill]) -> Option<AiGapAnalysis> {
            None
        }
    }

    /// State whose clients all connect lazily, so building it needs no
    /// running services.
    pub(crate) fn offline_state() -> AppState {
        let config = crate::config::tests::test_config();
        AppState {
            db: crate::db::lazy_pool(&config.database_url).unwrap(),
            redis: RedisClient::open(config.redis_url.clone()).unwrap(),
            storage: Storage::offline(&config.storage),
            llm: LlmClient::new(config.llm.clone()).unwrap(),
            auth: SupabaseAuth::new(&config.supabase_url, &config.supabase_anon_key).unwrap(),
            gap_advisor: Arc::new(NoAdvisor),
            config,
        }
    }
}
