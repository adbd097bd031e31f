//! Scatter-gather execution (spec §4.5): parallel per-shard dispatch over
//! the `Gateway`, transaction-session bookkeeping, best-effort multi-shard
//! commit, and the §7 error-aggregation rules.

pub mod session;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{instrument, warn};

use common::err::code::{classify, RetryClass};
use common::err::decode_error::ReError;
use common::err::CResult;
use connection::tablet_conn::QueryResult;
use gateway::Gateway;
use topo::TabletType;

pub use session::{Session, ShardSession};

/// one (shard, rewritten-SQL) pair the router produced for a single
/// `Execute` call (spec §4.4.1 Route output; this is what `ScatterGather`
/// actually consumes).
#[derive(Debug, Clone)]
pub struct ShardQuery {
    pub shard: String,
    pub sql: String,
}

pub struct ScatterGather {
    gateway: Arc<Gateway>,
}

impl ScatterGather {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        ScatterGather { gateway }
    }

    /// spec §4.5 `Execute`: for each shard, look up or create a shard
    /// session, `Begin` it if the outer session is in a transaction and
    /// this is the first touch, dispatch in parallel, and merge results.
    #[instrument(skip(self, queries, session))]
    pub async fn execute(
        &self,
        keyspace: &str,
        tablet_type: TabletType,
        queries: Vec<ShardQuery>,
        session: &mut Session,
        not_in_transaction: bool,
    ) -> CResult<QueryResult> {
        if session.in_transaction && session.poisoned {
            return Err(ReError::FailedPrecondition("session poisoned by a previous error".to_string()));
        }

        // ensure every shard this call touches has a session before
        // dispatching, so `Begin` failures surface before any query runs.
        for q in &queries {
            if session.find(keyspace, &q.shard).is_none() {
                let mut shard_session = ShardSession::new(keyspace, q.shard.clone(), tablet_type);
                if session.in_transaction && !not_in_transaction {
                    if let Err(e) = self.gateway.begin(keyspace, &q.shard, tablet_type, &mut shard_session.ctx).await {
                        if session.in_transaction {
                            session.poisoned = true;
                        }
                        return Err(e);
                    }
                }
                session.shard_sessions.push(shard_session);
            }
        }

        let futures = queries.iter().map(|q| {
            let shard_session = session.find(keyspace, &q.shard).expect("ensured above").clone();
            let gateway = self.gateway.clone();
            let keyspace = keyspace.to_string();
            let sql = q.sql.clone();
            async move {
                let mut ctx = shard_session.ctx;
                let result = gateway.execute(&keyspace, &shard_session.shard, tablet_type, &sql, &mut ctx).await;
                (shard_session.shard, ctx, result)
            }
        });

        let outcomes = join_all(futures).await;

        let mut merged: Option<QueryResult> = None;
        let mut errors = Vec::new();
        for (shard, ctx, result) in outcomes {
            if let Some(s) = session.find_mut(keyspace, &shard) {
                s.ctx = ctx;
            }
            match result {
                Ok(r) => merge_into(&mut merged, r)?,
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            if session.in_transaction {
                session.poisoned = true;
            }
            return Err(aggregate_errors(errors));
        }

        Ok(merged.unwrap_or_default())
    }

    /// spec §4.5 `Commit`: issues `Commit` to every shard session *in
    /// insertion order*. Best-effort — a late failure leaves earlier shards
    /// already committed and poisons the session.
    #[instrument(skip(self, session))]
    pub async fn commit(&self, session: &mut Session) -> CResult<()> {
        for shard_session in &session.shard_sessions {
            if let Err(e) = self.gateway.commit(&shard_session.ctx).await {
                session.poisoned = true;
                return Err(e);
            }
        }
        session.reset();
        Ok(())
    }

    /// spec §4.5 `Rollback`: issues `Rollback` to every shard session,
    /// ignoring individual failures (logged, not surfaced).
    #[instrument(skip(self, session))]
    pub async fn rollback(&self, session: &mut Session) {
        for shard_session in &session.shard_sessions {
            if let Err(e) = self.gateway.rollback(&shard_session.ctx).await {
                warn!(shard = %shard_session.shard, error = %e, "rollback failed on shard, continuing");
            }
        }
        session.reset();
    }
}

/// spec §4.5 "Merge results": concatenate rows; sum `rows_affected`; fields
/// differing across shards for the same statement is an internal error.
fn merge_into(acc: &mut Option<QueryResult>, next: QueryResult) -> CResult<()> {
    match acc {
        None => {
            *acc = Some(next);
            Ok(())
        }
        Some(existing) => {
            if existing.fields != next.fields {
                return Err(ReError::Internal("shard results disagree on fields for the same statement".to_string()));
            }
            existing.rows.extend(next.rows);
            existing.rows_affected += next.rows_affected;
            if next.insert_id != 0 {
                existing.insert_id = next.insert_id;
            }
            Ok(())
        }
    }
}

/// spec §7: aggregate per-shard errors into one surface error. Any
/// `fatal`/connection-class error makes the whole thing `UNAVAILABLE`; any
/// `not_in_tx` makes it `ABORTED`; otherwise the first application error is
/// returned verbatim.
fn aggregate_errors(errors: Vec<ReError>) -> ReError {
    let mut first_application: Option<ReError> = None;
    for e in &errors {
        if matches!(e, ReError::Unavailable(_) | ReError::Timeout(_) | ReError::ConnectionError(_)) {
            return ReError::Unavailable(format!("scatter-gather: {} shard(s) failed, first: {}", errors.len(), e));
        }
        if matches!(e, ReError::NotInTx(_)) || classify(e.to_string().as_str()) == RetryClass::NotInTx {
            return ReError::Aborted(format!("scatter-gather: {} shard(s) failed, first: {}", errors.len(), e));
        }
        if first_application.is_none() {
            first_application = Some(clone_error(e));
        }
    }
    first_application.unwrap_or_else(|| ReError::Internal("scatter-gather failed with no errors recorded".to_string()))
}

fn clone_error(e: &ReError) -> ReError {
    // `ReError` doesn't derive `Clone` (it wraps non-`Clone` std errors);
    // re-wrap by message for the cases scatter-gather actually surfaces.
    ReError::Error(e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use connection::tablet_conn::{HealthResponse, QueryResult as QR, Target, TabletConn};
    use healthcheck::HealthCheck;
    use std::time::Duration;
    use topo::TabletAlias;

    struct FakeConn {
        target: Target,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl TabletConn for FakeConn {
        fn target(&self) -> &Target {
            &self.target
        }

        async fn execute(&self, sql: &str, _deadline: Duration) -> CResult<QR> {
            if self.fail {
                return Err(ReError::Internal("boom".to_string()));
            }
            Ok(QR { fields: vec!["id".to_string()], rows: vec![], rows_affected: 1, insert_id: 0 })
        }

        async fn execute_batch(&self, _sqls: &[String], _deadline: Duration) -> CResult<Vec<QR>> {
            Ok(vec![])
        }

        async fn stream_execute(&self, _sql: &str, _deadline: Duration) -> CResult<tokio::sync::mpsc::Receiver<CResult<QR>>> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }

        async fn begin(&self, _deadline: Duration) -> CResult<u64> {
            Ok(1)
        }

        async fn commit(&self, _transaction_id: u64, _deadline: Duration) -> CResult<()> {
            Ok(())
        }

        async fn rollback(&self, _transaction_id: u64, _deadline: Duration) -> CResult<()> {
            Ok(())
        }

        async fn split_query(&self, _sql: &str, _num_splits: u32) -> CResult<Vec<String>> {
            Ok(vec![])
        }

        async fn stream_health(&self) -> CResult<tokio::sync::mpsc::Receiver<HealthResponse>> {
            // sends one `serving` report immediately, then stays open; the
            // healthcheck crate's per-tablet task picks this up on its next
            // poll and marks the tablet healthy.
            let (tx, rx) = tokio::sync::mpsc::channel(4);
            let target = self.target.clone();
            tx.send(HealthResponse {
                target: crate_target(&target),
                serving: true,
                tablet_externally_reparented_timestamp: 0,
                realtime_stats: Default::default(),
            })
            .await
            .ok();
            Ok(rx)
        }
    }

    fn crate_target(t: &Target) -> Target {
        Target { keyspace: t.keyspace.clone(), shard: t.shard.clone(), tablet_type: t.tablet_type }
    }

    async fn fixture() -> (Arc<Gateway>, Arc<HealthCheck>) {
        let hc = HealthCheck::new(Duration::from_secs(60));
        let gw = Arc::new(Gateway::new(hc.clone(), Duration::from_secs(5)));
        (gw, hc)
    }

    async fn register(gw: &Gateway, hc: &Arc<HealthCheck>, shard: &str, uid: u32, fail: bool) {
        let target = Target { keyspace: "ks".to_string(), shard: shard.to_string(), tablet_type: connection::tablet_conn::TabletType::Master };
        let conn: Arc<dyn TabletConn> = Arc::new(FakeConn { target, fail });
        let alias = TabletAlias { cell: "zone1".to_string(), uid };
        hc.add_tablet("zone1", alias.clone(), conn.clone()).await;
        gw.register_tablet(alias, "ks", shard, TabletType::Master, conn);
        // let the spawned health-stream task process the one queued report
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn rollback_issues_to_every_touched_shard_independent_of_outcome() {
        let (gw, hc) = fixture().await;
        register(&gw, &hc, "-80", 1, false).await;
        register(&gw, &hc, "80-", 2, false).await;

        let sg = ScatterGather::new(gw);
        let mut session = Session::begin();

        sg.execute(
            "ks",
            TabletType::Master,
            vec![ShardQuery { shard: "-80".to_string(), sql: "insert into t values (1)".to_string() }],
            &mut session,
            false,
        )
        .await
        .unwrap();

        sg.execute(
            "ks",
            TabletType::Master,
            vec![ShardQuery { shard: "80-".to_string(), sql: "insert into t values (2)".to_string() }],
            &mut session,
            false,
        )
        .await
        .unwrap();

        assert_eq!(session.shard_sessions.len(), 2);
        sg.rollback(&mut session).await;
        assert!(session.shard_sessions.is_empty());
    }

    #[tokio::test]
    async fn scatter_to_two_shards_merges_rows_affected() {
        let (gw, hc) = fixture().await;
        register(&gw, &hc, "-80", 1, false).await;
        register(&gw, &hc, "80-", 2, false).await;

        let sg = ScatterGather::new(gw);
        let mut session = Session::default();

        let result = sg
            .execute(
                "ks",
                TabletType::Master,
                vec![
                    ShardQuery { shard: "-80".to_string(), sql: "select * from t".to_string() },
                    ShardQuery { shard: "80-".to_string(), sql: "select * from t".to_string() },
                ],
                &mut session,
                true,
            )
            .await
            .unwrap();

        assert_eq!(result.rows_affected, 2);
    }

    #[tokio::test]
    async fn a_shard_error_poisons_an_in_transaction_session() {
        let (gw, hc) = fixture().await;
        register(&gw, &hc, "-80", 1, true).await;

        let sg = ScatterGather::new(gw);
        let mut session = Session::begin();

        let err = sg
            .execute(
                "ks",
                TabletType::Master,
                vec![ShardQuery { shard: "-80".to_string(), sql: "insert into t values (1)".to_string() }],
                &mut session,
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReError::Error(_)));
        assert!(session.poisoned);
    }
}
