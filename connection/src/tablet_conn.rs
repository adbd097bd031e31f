//! The consumed MySQL client surface (spec §6 "TabletConn"): the interface
//! the gateway, scatter-gather, and healthcheck subsystems drive against a
//! single tablet. The wire protocol itself is out of scope (spec §1); this
//! trait exists so those subsystems can be written and tested against a
//! fake without dragging in a live MySQL connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::err::decode_error::ReError;
use common::err::CResult;
use common::binlog::row::row_string::RowString;
use tokio::sync::Mutex;

use crate::conn::connection::{Connection, IConnection};

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub fields: Vec<String>,
    pub rows: Vec<RowString>,
    pub rows_affected: u64,
    pub insert_id: u64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TabletType {
    Master,
    Replica,
    Rdonly,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub keyspace: String,
    pub shard: String,
    pub tablet_type: TabletType,
}

/// health as reported by `StreamHealth` (spec §4.2): the same shape the
/// healthcheck cache stores per tablet.
#[derive(Debug, Clone)]
pub struct HealthResponse {
    pub target: Target,
    pub serving: bool,
    pub tablet_externally_reparented_timestamp: i64,
    pub realtime_stats: RealtimeStats,
}

#[derive(Debug, Clone, Default)]
pub struct RealtimeStats {
    pub health_error: String,
    pub seconds_behind_master: u32,
    pub cpu_usage: f64,
}

/// the operations the core requires of a single-tablet MySQL client (spec
/// §6): Execute family, Begin/Commit/Rollback, SplitQuery, StreamHealth.
#[async_trait]
pub trait TabletConn: Send + Sync {
    fn target(&self) -> &Target;

    async fn execute(&self, sql: &str, deadline: Duration) -> CResult<QueryResult>;
    async fn execute_batch(&self, sqls: &[String], deadline: Duration) -> CResult<Vec<QueryResult>>;
    async fn stream_execute(
        &self,
        sql: &str,
        deadline: Duration,
    ) -> CResult<tokio::sync::mpsc::Receiver<CResult<QueryResult>>>;

    async fn begin(&self, deadline: Duration) -> CResult<u64>;
    async fn commit(&self, transaction_id: u64, deadline: Duration) -> CResult<()>;
    async fn rollback(&self, transaction_id: u64, deadline: Duration) -> CResult<()>;

    /// split a full-table scan into `num_splits` roughly equal query
    /// fragments, used by batch/offline readers rather than live traffic
    async fn split_query(&self, sql: &str, num_splits: u32) -> CResult<Vec<String>>;

    async fn stream_health(&self) -> CResult<tokio::sync::mpsc::Receiver<HealthResponse>>;
}

/// Adapts the teacher's synchronous, blocking `Connection` to the async
/// `TabletConn` surface via `spawn_blocking`, since `Connection::query`
/// drives a real socket and must not run on a Tokio worker thread directly.
pub struct RealTabletConn {
    target: Target,
    conn: Arc<Mutex<Connection>>,
}

impl RealTabletConn {
    pub fn new(target: Target, conn: Connection) -> Self {
        RealTabletConn { target, conn: Arc::new(Mutex::new(conn)) }
    }
}

#[async_trait]
impl TabletConn for RealTabletConn {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn execute(&self, sql: &str, _deadline: Duration) -> CResult<QueryResult> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.blocking_lock();
            let rows = guard.query(sql)?;
            Ok(QueryResult { fields: vec![], rows, rows_affected: 0, insert_id: 0 })
        })
        .await
        .map_err(|e| ReError::Internal(format!("blocking query task panicked: {}", e)))?
    }

    async fn execute_batch(&self, sqls: &[String], deadline: Duration) -> CResult<Vec<QueryResult>> {
        let mut results = Vec::with_capacity(sqls.len());
        for sql in sqls {
            results.push(self.execute(sql, deadline).await?);
        }
        Ok(results)
    }

    async fn stream_execute(
        &self,
        sql: &str,
        deadline: Duration,
    ) -> CResult<tokio::sync::mpsc::Receiver<CResult<QueryResult>>> {
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let result = self.execute(sql, deadline).await;
        let _ = tx.send(result).await;
        Ok(rx)
    }

    async fn begin(&self, _deadline: Duration) -> CResult<u64> {
        Err(ReError::Unavailable("transactions are not exposed by the teacher's Connection yet".to_string()))
    }

    async fn commit(&self, _transaction_id: u64, _deadline: Duration) -> CResult<()> {
        Err(ReError::Unavailable("transactions are not exposed by the teacher's Connection yet".to_string()))
    }

    async fn rollback(&self, _transaction_id: u64, _deadline: Duration) -> CResult<()> {
        Err(ReError::Unavailable("transactions are not exposed by the teacher's Connection yet".to_string()))
    }

    async fn split_query(&self, _sql: &str, _num_splits: u32) -> CResult<Vec<String>> {
        Err(ReError::Unavailable("split_query requires an offline reader, unimplemented here".to_string()))
    }

    async fn stream_health(&self) -> CResult<tokio::sync::mpsc::Receiver<HealthResponse>> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }
}
