//! Gateway (spec §4.3): given `(keyspace, shard, type)` and an operation,
//! pick one live tablet from `HealthCheck` and invoke its `TabletConn`,
//! retrying per the exact classification table in the design notes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::cancel::Deadline;
use common::err::code::{classify, RetryClass};
use common::err::decode_error::ReError;
use common::err::CResult;
use connection::tablet_conn::{QueryResult, TabletConn, TabletType};
use dashmap::DashMap;
use healthcheck::{HealthCheck, TabletStats};
use rand::Rng;
use topo::TabletAlias;
use tracing::{instrument, warn};

/// transaction pinning: once a session has a `transaction_id` on a tablet,
/// every subsequent call for that session must stay on the same tablet
/// (spec §4.3: "operations inside an existing transaction must not be
/// retried on a different tablet").
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub transaction_id: u64,
    pub pinned_tablet: Option<TabletAlias>,
}

impl CallContext {
    pub fn in_transaction(&self) -> bool {
        self.transaction_id != 0
    }
}

pub struct Gateway {
    healthcheck: Arc<HealthCheck>,
    conns: DashMap<TabletAlias, Arc<dyn TabletConn>>,
    retry_deadline: Duration,
}

impl Gateway {
    pub fn new(healthcheck: Arc<HealthCheck>, retry_deadline: Duration) -> Self {
        Gateway { healthcheck, conns: DashMap::new(), retry_deadline }
    }

    pub fn register_tablet(
        &self,
        alias: TabletAlias,
        _keyspace: &str,
        _shard: &str,
        _ty: TabletType,
        conn: Arc<dyn TabletConn>,
    ) {
        self.conns.insert(alias, conn);
    }

    /// filter to healthy tablets, then pick one weighted inversely by
    /// `cpu_usage` (spec §4.3: "plain random is acceptable" as a fallback
    /// when every candidate reports the same load). `TabletStats` carries
    /// its own alias, so the selected candidate's alias is read straight off
    /// the winning entry rather than reconstructed from it afterward.
    fn pick_tablet(&self, keyspace: &str, shard: &str, ty: TabletType) -> CResult<(TabletAlias, Arc<dyn TabletConn>)> {
        let healthy = self.healthcheck.healthy_tablets(keyspace, shard, ty);
        if healthy.is_empty() {
            return Err(ReError::Unavailable(format!("no healthy tablet for {}/{}/{:?}", keyspace, shard, ty)));
        }

        let candidates: Vec<(TabletStats, Arc<dyn TabletConn>)> = healthy
            .into_iter()
            .filter_map(|stats| self.conns.get(&stats.alias).map(|c| (stats, c.clone())))
            .collect();

        if candidates.is_empty() {
            return Err(ReError::Unavailable(format!("no registered connection for {}/{}/{:?}", keyspace, shard, ty)));
        }

        let weights: Vec<f64> = candidates.iter().map(|(s, _)| 1.0 / (s.stats.cpu_usage.max(0.01) + 0.01)).collect();
        let total: f64 = weights.iter().sum();
        let mut pick = rand::thread_rng().gen_range(0.0..total);
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                let (stats, conn) = &candidates[i];
                return Ok((stats.alias.clone(), conn.clone()));
            }
            pick -= w;
        }
        let (stats, conn) = candidates.last().expect("candidates is non-empty");
        Ok((stats.alias.clone(), conn.clone()))
    }

    /// `Execute` with the spec §4.3 retry table. Operations pinned to a
    /// transaction never reresolve to a different tablet.
    #[instrument(skip(self, ctx))]
    pub async fn execute(
        &self,
        keyspace: &str,
        shard: &str,
        ty: TabletType,
        sql: &str,
        ctx: &mut CallContext,
    ) -> CResult<QueryResult> {
        let deadline = Deadline::after(self.retry_deadline);

        loop {
            deadline.check()?;

            let (alias, conn) = if let Some(pinned) = &ctx.pinned_tablet {
                let conn = self
                    .conns
                    .get(pinned)
                    .map(|c| c.clone())
                    .ok_or_else(|| ReError::Internal(format!("pinned tablet {} has no connection", pinned)))?;
                (pinned.clone(), conn)
            } else {
                self.pick_tablet(keyspace, shard, ty)?
            };

            match conn.execute(sql, deadline.remaining().unwrap_or(Duration::from_secs(30))).await {
                Ok(result) => {
                    if ctx.in_transaction() {
                        ctx.pinned_tablet = Some(alias);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let decision = classify_for_retry(&e, ctx.in_transaction());
                    if !decision.retry {
                        return Err(e);
                    }
                    warn!(error = %e, tablet = %alias, "retrying after classified error");
                    if !decision.reresolve {
                        continue;
                    }
                    // reresolve means drop any stale pin and loop back to `pick_tablet`
                    if !ctx.in_transaction() {
                        ctx.pinned_tablet = None;
                    }
                }
            }
        }
    }

    /// `Begin`: picks a tablet and pins `ctx` to it for the rest of the
    /// transaction's lifetime (spec §4.5: a shard session carries the live
    /// `transaction_id` for that shard).
    #[instrument(skip(self, ctx))]
    pub async fn begin(&self, keyspace: &str, shard: &str, ty: TabletType, ctx: &mut CallContext) -> CResult<u64> {
        let deadline = Deadline::after(self.retry_deadline);

        loop {
            deadline.check()?;
            let (alias, conn) = self.pick_tablet(keyspace, shard, ty)?;

            match conn.begin(deadline.remaining().unwrap_or(Duration::from_secs(30))).await {
                Ok(transaction_id) => {
                    ctx.transaction_id = transaction_id;
                    ctx.pinned_tablet = Some(alias);
                    return Ok(transaction_id);
                }
                Err(e) => {
                    let decision = classify_for_retry(&e, false);
                    if !decision.retry {
                        return Err(e);
                    }
                    warn!(error = %e, tablet = %alias, "retrying Begin after classified error");
                }
            }
        }
    }

    /// `Commit`: never retried or reresolved — a commit must land on the
    /// exact tablet that holds the transaction.
    pub async fn commit(&self, ctx: &CallContext) -> CResult<()> {
        let conn = self.pinned_conn(ctx)?;
        conn.commit(ctx.transaction_id, self.retry_deadline).await
    }

    /// `Rollback`: same tablet-pinning requirement as `commit`.
    pub async fn rollback(&self, ctx: &CallContext) -> CResult<()> {
        let conn = self.pinned_conn(ctx)?;
        conn.rollback(ctx.transaction_id, self.retry_deadline).await
    }

    fn pinned_conn(&self, ctx: &CallContext) -> CResult<Arc<dyn TabletConn>> {
        let alias = ctx
            .pinned_tablet
            .as_ref()
            .ok_or_else(|| ReError::InvalidArgument("no pinned tablet for this transaction".to_string()))?;
        self.conns
            .get(alias)
            .map(|c| c.clone())
            .ok_or_else(|| ReError::Internal(format!("pinned tablet {} has no connection", alias)))
    }
}

#[derive(Debug, Clone, Copy)]
struct RetryDecision {
    retry: bool,
    reresolve: bool,
}

/// the exact retry-classification table (spec §4.3).
fn classify_for_retry(err: &ReError, in_transaction: bool) -> RetryDecision {
    if matches!(err, ReError::Timeout(_)) {
        return RetryDecision { retry: true, reresolve: true };
    }

    match classify(err.to_string().as_str()) {
        RetryClass::Retry => RetryDecision { retry: true, reresolve: true },
        RetryClass::Fatal => RetryDecision { retry: !in_transaction, reresolve: true },
        RetryClass::NotInTx => RetryDecision { retry: false, reresolve: false },
        RetryClass::TxPoolFull => RetryDecision { retry: false, reresolve: false },
        RetryClass::Application => RetryDecision { retry: false, reresolve: false },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transport_timeout_always_retries_and_reresolves() {
        let d = classify_for_retry(&ReError::Timeout("deadline exceeded".to_string()), true);
        assert!(d.retry);
        assert!(d.reresolve);
    }

    #[test]
    fn fatal_tagged_error_retries_outside_tx_only() {
        let outside = classify_for_retry(&ReError::Internal("fatal: primary gone".to_string()), false);
        assert!(outside.retry);

        let inside = classify_for_retry(&ReError::Internal("fatal: primary gone".to_string()), true);
        assert!(!inside.retry);
    }

    #[test]
    fn not_in_tx_and_tx_pool_full_never_retry() {
        assert!(!classify_for_retry(&ReError::Internal("not_in_tx: no active transaction".to_string()), false).retry);
        assert!(!classify_for_retry(&ReError::Internal("tx_pool_full: pool exhausted".to_string()), false).retry);
    }

    #[test]
    fn application_error_default_does_not_retry() {
        assert!(!classify_for_retry(&ReError::InvalidArgument("bad column".to_string()), false).retry);
    }
}
