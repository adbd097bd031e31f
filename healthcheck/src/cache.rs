use std::time::Duration;

use chrono::Utc;
use connection::tablet_conn::{RealtimeStats, TabletType};
use topo::TabletAlias;

/// One tablet's most recently observed health (spec §4.2 "HealthResponse").
#[derive(Debug, Clone)]
pub struct TabletStats {
    pub alias: TabletAlias,
    pub cell: String,
    pub keyspace: String,
    pub shard: String,
    pub tablet_type: TabletType,
    pub serving: bool,
    pub tablet_externally_reparented_timestamp: i64,
    pub stats: RealtimeStats,
    pub last_update_ms: i64,
}

impl TabletStats {
    pub fn key(&self) -> (String, String, TabletType) {
        (self.keyspace.clone(), self.shard.clone(), self.tablet_type)
    }

    /// spec §4.2: "healthy iff serving AND health_error = "" AND last update
    /// within stream_timeout". Timeouts flip `serving` false without
    /// tearing down the stream — modeled here as a derived predicate rather
    /// than a stored bit, so staleness never needs a separate sweep to take
    /// effect.
    pub fn is_healthy(&self, now_ms: i64, stream_timeout: Duration) -> bool {
        self.serving && self.stats.health_error.is_empty() && !self.is_stale(now_ms, stream_timeout)
    }

    pub fn is_stale(&self, now_ms: i64, stream_timeout: Duration) -> bool {
        now_ms.saturating_sub(self.last_update_ms) > stream_timeout.as_millis() as i64
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
