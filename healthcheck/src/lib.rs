//! Tablet health cache (spec §4.2): a long-lived stream per tracked tablet
//! feeding a cache keyed by `(cell, keyspace, shard, type)`, with
//! master-arbitration-by-newest-timestamp when more than one tablet in a
//! shard claims to be master at once (spec S6).

pub mod cache;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use topo::TabletAlias;
use tracing::{info, instrument, warn};

pub use cache::TabletStats;
use cache::now_ms;
use connection::tablet_conn::{RealtimeStats, TabletConn, TabletType};

pub type Listener = Arc<dyn Fn(&TabletStats) + Send + Sync>;

/// `GetTabletStatsFromTarget`/`GetTabletStatsFromKeyspaceShard` key: every
/// tablet observed serving a given `(keyspace, shard, type)`.
type TargetKey = (String, String, TabletType);

pub struct HealthCheck {
    stream_timeout: Duration,
    by_alias: DashMap<TabletAlias, TabletStats>,
    by_target: DashMap<TargetKey, Vec<TabletAlias>>,
    tracked: DashMap<TabletAlias, JoinHandle<()>>,
    listeners: Mutex<Vec<Listener>>,
}

impl HealthCheck {
    pub fn new(stream_timeout: Duration) -> Arc<Self> {
        Arc::new(HealthCheck {
            stream_timeout,
            by_alias: DashMap::new(),
            by_target: DashMap::new(),
            tracked: DashMap::new(),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub async fn set_listener(&self, listener: Listener) {
        self.listeners.lock().await.push(listener);
    }

    /// `AddTablet(cell, name, tablet)` (spec §4.2): start a health stream;
    /// ignore duplicates by tablet map-key.
    #[instrument(skip(self, conn))]
    pub async fn add_tablet(self: &Arc<Self>, cell: &str, alias: TabletAlias, conn: Arc<dyn TabletConn>) {
        if self.tracked.contains_key(&alias) {
            return;
        }

        let stream = match conn.stream_health().await {
            Ok(s) => s,
            Err(e) => {
                warn!(%alias, error = %e, "failed to open StreamHealth");
                return;
            }
        };

        let this = self.clone();
        let cell = cell.to_string();
        let task_alias = alias.clone();
        let handle = tokio::spawn(async move { this.health_stream_loop(cell, task_alias, stream).await });
        self.tracked.insert(alias, handle);
    }

    /// `RemoveTablet(tablet)` (spec §4.2): close the stream; emit a final
    /// `down` event.
    #[instrument(skip(self))]
    pub async fn remove_tablet(&self, alias: &TabletAlias) {
        if let Some((_, handle)) = self.tracked.remove(alias) {
            handle.abort();
        }
        if let Some((_, mut stats)) = self.by_alias.remove(alias) {
            self.remove_from_target_bucket(&stats.key(), alias);
            stats.serving = false;
            stats.stats.health_error = "down".to_string();
            self.notify(&stats).await;
        }
    }

    /// `GetTabletStatsFromTarget(keyspace, shard, type)` (spec §4.2).
    pub fn get_tablet_stats_from_target(&self, keyspace: &str, shard: &str, ty: TabletType) -> Vec<TabletStats> {
        self.by_target
            .get(&(keyspace.to_string(), shard.to_string(), ty))
            .map(|aliases| aliases.iter().filter_map(|a| self.by_alias.get(a).map(|s| s.clone())).collect())
            .unwrap_or_default()
    }

    /// `GetTabletStatsFromKeyspaceShard` (spec §4.2): every type, for callers
    /// that want to inspect the whole shard (e.g. the reparent coordinator).
    pub fn get_tablet_stats_from_keyspace_shard(&self, keyspace: &str, shard: &str) -> Vec<TabletStats> {
        [TabletType::Master, TabletType::Replica, TabletType::Rdonly]
            .into_iter()
            .flat_map(|ty| self.get_tablet_stats_from_target(keyspace, shard, ty))
            .collect()
    }

    pub fn is_healthy(&self, stats: &TabletStats) -> bool {
        stats.is_healthy(now_ms(), self.stream_timeout)
    }

    /// healthy tablets for a target, for the Gateway's selection policy
    pub fn healthy_tablets(&self, keyspace: &str, shard: &str, ty: TabletType) -> Vec<TabletStats> {
        self.get_tablet_stats_from_target(keyspace, shard, ty)
            .into_iter()
            .filter(|s| self.is_healthy(s))
            .collect()
    }

    async fn health_stream_loop(
        self: Arc<Self>,
        cell: String,
        alias: TabletAlias,
        mut stream: tokio::sync::mpsc::Receiver<connection::tablet_conn::HealthResponse>,
    ) {
        while let Some(resp) = stream.recv().await {
            let incoming = TabletStats {
                alias: alias.clone(),
                cell: cell.clone(),
                keyspace: resp.target.keyspace.clone(),
                shard: resp.target.shard.clone(),
                tablet_type: into_tablet_type(resp.target.tablet_type),
                serving: resp.serving,
                tablet_externally_reparented_timestamp: resp.tablet_externally_reparented_timestamp,
                stats: resp.realtime_stats,
                last_update_ms: now_ms(),
            };
            self.apply_update(&alias, incoming).await;
        }
        info!(%alias, "health stream ended");
    }

    async fn apply_update(&self, alias: &TabletAlias, mut incoming: TabletStats) {
        // if the previously-seen type differs, decrement the old bucket and
        // increment the new one in a single atomic swap (spec §4.2)
        if let Some(old) = self.by_alias.get(alias) {
            if old.key() != incoming.key() {
                self.remove_from_target_bucket(&old.key(), alias);
            }
        }

        if incoming.tablet_type == TabletType::Master {
            self.arbitrate_master(&mut incoming);
        }

        let key = incoming.key();
        self.by_alias.insert(alias.clone(), incoming.clone());
        let mut bucket = self.by_target.entry(key).or_insert_with(Vec::new);
        if !bucket.contains(alias) {
            bucket.push(alias.clone());
        }
        drop(bucket);

        self.notify(&incoming).await;
    }

    /// spec S6: when multiple tablets in the same (keyspace,shard) report
    /// `type=master`, only the one with the newest
    /// `tablet_externally_reparented_timestamp` is trusted; older ones are
    /// demoted to `replica` in the cache (not on the tablet itself — they
    /// converge once reparent actually completes there).
    fn arbitrate_master(&self, incoming: &mut TabletStats) {
        let rivals: Vec<TabletAlias> = self
            .by_target
            .get(&(incoming.keyspace.clone(), incoming.shard.clone(), TabletType::Master))
            .map(|b| b.clone())
            .unwrap_or_default();

        for rival_alias in rivals {
            if let Some(mut rival) = self.by_alias.get_mut(&rival_alias) {
                if rival.tablet_externally_reparented_timestamp > incoming.tablet_externally_reparented_timestamp {
                    // an existing master outranks the incoming report;
                    // demote the incoming one instead of the rival
                    incoming.tablet_type = TabletType::Replica;
                    return;
                } else if rival.tablet_externally_reparented_timestamp
                    < incoming.tablet_externally_reparented_timestamp
                {
                    self.remove_from_target_bucket(
                        &(rival.keyspace.clone(), rival.shard.clone(), TabletType::Master),
                        &rival_alias,
                    );
                    rival.tablet_type = TabletType::Replica;
                    let key = rival.key();
                    drop(rival);
                    self.by_target.entry(key).or_insert_with(Vec::new).push(rival_alias);
                }
            }
        }
    }

    fn remove_from_target_bucket(&self, key: &TargetKey, alias: &TabletAlias) {
        if let Some(mut bucket) = self.by_target.get_mut(key) {
            bucket.retain(|a| a != alias);
        }
    }

    async fn notify(&self, stats: &TabletStats) {
        for l in self.listeners.lock().await.iter() {
            l(stats);
        }
    }
}

fn into_tablet_type(ty: connection::tablet_conn::TabletType) -> TabletType {
    match ty {
        connection::tablet_conn::TabletType::Master => TabletType::Master,
        connection::tablet_conn::TabletType::Replica => TabletType::Replica,
        connection::tablet_conn::TabletType::Rdonly => TabletType::Rdonly,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn alias(uid: u32) -> TabletAlias {
        TabletAlias { cell: "zone1".to_string(), uid }
    }

    #[tokio::test]
    async fn newer_master_timestamp_wins_arbitration() {
        let hc = HealthCheck::new(Duration::from_secs(60));

        hc.apply_update(&alias(1), TabletStats {
            alias: alias(1),
            cell: "zone1".to_string(),
            keyspace: "ks".to_string(),
            shard: "0".to_string(),
            tablet_type: TabletType::Master,
            serving: true,
            tablet_externally_reparented_timestamp: 100,
            stats: RealtimeStats::default(),
            last_update_ms: now_ms(),
        })
        .await;

        hc.apply_update(&alias(2), TabletStats {
            alias: alias(2),
            cell: "zone1".to_string(),
            keyspace: "ks".to_string(),
            shard: "0".to_string(),
            tablet_type: TabletType::Master,
            serving: true,
            tablet_externally_reparented_timestamp: 200,
            stats: RealtimeStats::default(),
            last_update_ms: now_ms(),
        })
        .await;

        let masters = hc.get_tablet_stats_from_target("ks", "0", TabletType::Master);
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].tablet_externally_reparented_timestamp, 200);

        let replicas = hc.get_tablet_stats_from_target("ks", "0", TabletType::Replica);
        assert_eq!(replicas.len(), 1);
        assert_eq!(replicas[0].tablet_externally_reparented_timestamp, 100);
    }

    #[tokio::test]
    async fn stale_update_is_unhealthy_without_changing_serving_flag() {
        let hc = HealthCheck::new(Duration::from_millis(1));
        hc.apply_update(&alias(1), TabletStats {
            alias: alias(1),
            cell: "zone1".to_string(),
            keyspace: "ks".to_string(),
            shard: "0".to_string(),
            tablet_type: TabletType::Replica,
            serving: true,
            tablet_externally_reparented_timestamp: 0,
            stats: RealtimeStats::default(),
            last_update_ms: 0,
        })
        .await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let stats = &hc.get_tablet_stats_from_target("ks", "0", TabletType::Replica)[0];
        assert!(stats.serving);
        assert!(!hc.is_healthy(stats));
    }
}
