//! Adapts already-decoded events from the `binlog` crate's event reader into
//! the minimal shape the transaction-assembly pipeline needs. This layers
//! directly on top of `binlog::events::event::Event` instead of re-deriving
//! a binlog-file parser.

use async_trait::async_trait;
use binlog::events::event::Event;
use binlog::QueryStatusVar;
use common::err::CResult;

use crate::format::Charset;

#[derive(Debug, Clone)]
pub enum RawEvent {
    Query { sql: String, schema: String, timestamp: i64, charset: Option<Charset> },
    Xid { xid: u64, timestamp: i64 },
    Rotate { file: String, position: u64 },
}

/// a live or replayed source of already-decoded binlog events. Implemented
/// by whatever wraps the wire connection (a `connection::binlog::BinlogEvents`
/// reader in production, an in-memory fixture in tests).
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> CResult<Option<Event>>;
}

/// picks out the charset triple from a `Query` event's status vars, if the
/// master wrote one (it always does for MySQL >= 5.0, per the binlog format).
fn charset_of(vars: &[QueryStatusVar]) -> Option<Charset> {
    vars.iter().find_map(|v| match v {
        QueryStatusVar::Q_CHARSET_CODE(client, conn, server) => Some((*client, *conn, *server)),
        _ => None,
    })
}

/// translates one decoded binlog event into the minimal shape the streamer
/// cares about. Returns `None` for events outside the transaction-assembly
/// concern (format description, GTID bookkeeping, row-image events, etc.) —
/// this teacher's binlog writes DML as `Query` events carrying a trailing
/// `_stream` comment, not row images, so those are safely skippable here.
pub fn adapt(event: &Event) -> Option<RawEvent> {
    match event {
        Event::Query(q) => Some(RawEvent::Query {
            sql: q.query.clone(),
            schema: q.schema.clone(),
            timestamp: q.header().when as i64,
            charset: charset_of(q.status_vars()),
        }),
        Event::XID { header, xid, .. } => Some(RawEvent::Xid { xid: *xid, timestamp: header.when as i64 }),
        Event::Rotate(r) => Some(RawEvent::Rotate { file: r.binlog_filename.clone(), position: r.binlog_position }),
        _ => None,
    }
}
