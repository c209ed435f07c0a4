use std::sync::Arc;

use crate::analytics::StatsService;
use crate::config::AppConfig;
use crate::leaderboard::LeaderboardCache;
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub stats: StatsService,
    pub leaderboard: Arc<LeaderboardCache>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        let stats = StatsService::new(Arc::clone(&store), config.analytics.clone());
        let leaderboard = Arc::new(LeaderboardCache::new(config.leaderboard.cache_ttl()));
        Self {
            store,
            stats,
            leaderboard,
            config: Arc::new(config),
        }
    }
}
