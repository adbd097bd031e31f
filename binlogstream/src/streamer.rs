//! Transaction assembly: turns a flat sequence of decoded binlog events into
//! ordered `BinlogTransaction`s, buffering statements between `BEGIN` and
//! `COMMIT`/`ROLLBACK`, carrying `SET` antecedents forward, and following
//! rotations without dropping events at the boundary.

use tokio::sync::mpsc;
use tracing::{instrument, warn};

use common::cancel::Deadline;
use common::err::CResult;

use crate::filter::{Decision, Filter};
use crate::format::{BinlogTransaction, Category, Statement, StreamEvent};
use crate::source::{EventSource, RawEvent};

pub struct BinlogStreamer {
    filter: Filter,
    output_buffer: usize,
}

impl BinlogStreamer {
    pub fn new(filter: Filter, output_buffer: usize) -> Self {
        BinlogStreamer { filter, output_buffer }
    }

    /// Drives `source` to completion (or until `deadline` fires), pushing
    /// assembled transactions onto a bounded channel. The channel's capacity
    /// is the backpressure mechanism: a slow consumer stalls the producer
    /// rather than unbounding memory.
    #[instrument(skip(self, source, deadline))]
    pub fn run<S>(self, mut source: S, deadline: Deadline) -> mpsc::Receiver<CResult<BinlogTransaction>>
    where
        S: EventSource + 'static,
    {
        let (tx, rx) = mpsc::channel(self.output_buffer);
        let filter = self.filter;

        tokio::spawn(async move {
            let mut pending: Vec<Statement> = Vec::new();
            let mut carried_sets: Vec<Statement> = Vec::new();
            let mut tx_timestamp: i64 = 0;
            let mut server_seq: u64 = 0;
            let mut current_file = String::new();
            let mut current_pos: u64 = 0;

            loop {
                if let Err(e) = deadline.check() {
                    let _ = tx.send(Err(e)).await;
                    return;
                }

                let event = match source.next_event().await {
                    Ok(Some(e)) => e,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };

                let Some(raw) = crate::source::adapt(&event) else { continue };

                match raw {
                    RawEvent::Rotate { file, position } => {
                        // rotation never interrupts a transaction in
                        // progress; it only marks where the next read
                        // resumes on reconnect.
                        current_file = file;
                        current_pos = position;
                        continue;
                    }
                    RawEvent::Xid { xid, timestamp } => {
                        // an XID event is itself the commit marker in
                        // row-based replication; treat it the same as a
                        // literal COMMIT statement.
                        tx_timestamp = timestamp;
                        let txn = flush(&mut pending, &mut carried_sets, tx_timestamp, xid);
                        server_seq += 1;
                        if let Some(txn) = txn {
                            if tx.send(Ok(txn)).await.is_err() {
                                return;
                            }
                        }
                        continue;
                    }
                    RawEvent::Query { sql, schema: _, timestamp, charset } => {
                        tx_timestamp = timestamp;
                        let category = Category::classify(&sql);
                        let statement = Statement { category, charset, sql: sql.clone() };

                        match category {
                            Category::Begin => {
                                pending.clear();
                                carried_sets.clear();
                            }
                            Category::Set => {
                                carried_sets.push(statement);
                            }
                            Category::Commit => {
                                let txn = flush(&mut pending, &mut carried_sets, tx_timestamp, server_seq);
                                server_seq += 1;
                                if let Some(txn) = txn {
                                    if tx.send(Ok(txn)).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Category::Rollback => {
                                pending.clear();
                                carried_sets.clear();
                            }
                            Category::Dml | Category::Ddl => {
                                match filter.decide(&sql) {
                                    Decision::Drop => {}
                                    Decision::Unparseable(reason) if category == Category::Dml => {
                                        warn!(%reason, %sql, "unparseable _stream comment, statement kept unfiltered");
                                        pending.extend(carried_sets.iter().cloned());
                                        pending.push(statement);
                                    }
                                    _ => {
                                        pending.extend(carried_sets.iter().cloned());
                                        pending.push(statement);
                                    }
                                }
                                // DDL runs outside a transaction in MySQL
                                // (implicit commit); flush it as its own
                                // single-statement transaction.
                                if category == Category::Ddl {
                                    let txn = flush(&mut pending, &mut carried_sets, tx_timestamp, server_seq);
                                    server_seq += 1;
                                    if let Some(txn) = txn {
                                        if tx.send(Ok(txn)).await.is_err() {
                                            return;
                                        }
                                    }
                                }
                            }
                            Category::Unrecognized => {}
                        }
                    }
                }
            }

            let _ = (current_file, current_pos);
        });

        rx
    }
}

fn flush(pending: &mut Vec<Statement>, carried_sets: &mut Vec<Statement>, timestamp: i64, seq: u64) -> Option<BinlogTransaction> {
    carried_sets.clear();
    if pending.is_empty() {
        return None;
    }
    let statements = std::mem::take(pending);
    Some(BinlogTransaction {
        statements,
        timestamp,
        transaction_id: BinlogTransaction::transaction_id(1, 0, seq),
    })
}

/// expands a `BinlogTransaction` into the per-row `StreamEvent`s a consumer
/// applies, parsing each DML's `_stream` comment. An unparseable comment on
/// a statement that survived filtering becomes an `err` event rather than
/// aborting the whole transaction.
pub fn into_stream_events(txn: &BinlogTransaction) -> Vec<StreamEvent> {
    txn.statements
        .iter()
        .filter(|s| matches!(s.category, Category::Dml | Category::Ddl))
        .map(|s| match s.category {
            Category::Ddl => StreamEvent::Ddl {
                sql: s.sql.clone(),
                timestamp: txn.timestamp,
                transaction_id: txn.transaction_id.clone(),
            },
            _ => match crate::stream_comment::parse(&s.sql) {
                Ok(c) => StreamEvent::Dml {
                    table: c.table,
                    pk_fields: c.pk_fields,
                    pk_values: c.pk_rows,
                    timestamp: txn.timestamp,
                    transaction_id: txn.transaction_id.clone(),
                },
                Err(e) => StreamEvent::Err {
                    sql: s.sql.clone(),
                    reason: e.to_string(),
                    timestamp: txn.timestamp,
                    transaction_id: txn.transaction_id.clone(),
                },
            },
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    use binlog::events::event::Event;
    use binlog::events::event_header::Header;
    use binlog::events::protocol::query_event::QueryEvent;
    use serde_json::Value as Json;
    use topo::{KeyRange, KeyspaceId};

    fn header(when: u32) -> Header {
        Header::new("".to_string(), when, 2, 1, 0, 0, 0)
    }

    fn query_event(sql: &str, when: u32) -> Event {
        let q = QueryEvent::new(header(when), "test".to_string(), sql.to_string(), vec![]);
        Event::Query(q)
    }

    struct FixedSource {
        events: std::vec::IntoIter<Event>,
    }

    #[async_trait]
    impl EventSource for FixedSource {
        async fn next_event(&mut self) -> CResult<Option<Event>> {
            Ok(self.events.next())
        }
    }

    #[tokio::test]
    async fn assembles_begin_dml_commit_into_one_transaction() {
        let events = vec![
            query_event("BEGIN", 1),
            query_event("insert into t values (5) /* _stream t (id) (5 ) */", 1),
            query_event("COMMIT", 2),
        ];
        let streamer = BinlogStreamer::new(Filter::None, 8);
        let mut rx = streamer.run(FixedSource { events: events.into_iter() }, Deadline::after(Duration::from_secs(5)));

        let txn = rx.recv().await.unwrap().unwrap();
        assert_eq!(txn.statements.len(), 1);
        assert_eq!(txn.statements[0].category, Category::Dml);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn rollback_discards_buffered_statements() {
        let events = vec![
            query_event("BEGIN", 1),
            query_event("insert into t values (5) /* _stream t (id) (5 ) */", 1),
            query_event("ROLLBACK", 1),
        ];
        let streamer = BinlogStreamer::new(Filter::None, 8);
        let mut rx = streamer.run(FixedSource { events: events.into_iter() }, Deadline::after(Duration::from_secs(5)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn key_range_filter_drops_non_matching_rows() {
        let ksid_of: crate::filter::KsidOf = Arc::new(|v: &Json| KeyspaceId::from_u64((v.as_i64().unwrap_or(0) as u64) * 0x10));
        let filter = Filter::KeyRange {
            range: KeyRange::new(Some(KeyspaceId::from_u64(0x80)), Some(KeyspaceId::from_u64(0xc0))),
            ksid_of,
        };
        let events = vec![
            query_event("BEGIN", 1),
            query_event("insert into t values (5) /* _stream t (id) (5 ) */", 1),
            query_event("COMMIT", 1),
        ];
        let streamer = BinlogStreamer::new(filter, 8);
        let mut rx = streamer.run(FixedSource { events: events.into_iter() }, Deadline::after(Duration::from_secs(5)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn ddl_flushes_as_its_own_transaction_outside_any_begin() {
        let events = vec![query_event("CREATE TABLE t (id int)", 1)];
        let streamer = BinlogStreamer::new(Filter::None, 8);
        let mut rx = streamer.run(FixedSource { events: events.into_iter() }, Deadline::after(Duration::from_secs(5)));
        let txn = rx.recv().await.unwrap().unwrap();
        assert_eq!(txn.statements[0].category, Category::Ddl);
    }
}
