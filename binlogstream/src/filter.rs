//! Key-range and table-name filtering of DML statements (spec: "the streamer
//! keeps a statement iff at least one affected row's sharding-column value
//! falls in the requested key-range").

use std::sync::Arc;

use serde_json::Value as Json;
use topo::{KeyRange, KeyspaceId};

use crate::stream_comment;

/// Converts a raw sharding-column value (as decoded from a `_stream`
/// comment) into the `KeyspaceId` used to test against a `KeyRange`. Callers
/// supply this because the mapping depends on the vindex in effect for the
/// table being streamed — the streamer itself has no opinion on hashing.
pub type KsidOf = Arc<dyn Fn(&Json) -> KeyspaceId + Send + Sync>;

#[derive(Clone)]
pub enum Filter {
    /// pass every DML statement through unfiltered.
    None,
    /// keep a statement iff any affected row's first pk column maps into
    /// `range` via `ksid_of`. The first pk column is taken to be the
    /// sharding column, matching the `_stream` comment convention of
    /// listing it first.
    KeyRange { range: KeyRange, ksid_of: KsidOf },
    /// keep a statement iff its table is named in the list.
    Tables(Vec<String>),
}

pub enum Decision {
    Keep,
    Drop,
    /// the statement looked like DML but its `_stream` comment could not be
    /// parsed; the caller should surface an `err` event rather than drop it
    /// silently or abort the stream.
    Unparseable(String),
}

impl Filter {
    pub fn decide(&self, sql: &str) -> Decision {
        match self {
            Filter::None => Decision::Keep,
            Filter::Tables(tables) => match stream_comment::parse(sql) {
                Ok(c) if tables.iter().any(|t| t == &c.table) => Decision::Keep,
                Ok(_) => Decision::Drop,
                Err(e) => Decision::Unparseable(e.to_string()),
            },
            Filter::KeyRange { range, ksid_of } => match stream_comment::parse(sql) {
                Ok(c) => {
                    let hit = c.pk_rows.iter().any(|row| {
                        row.first().map(|v| range.contains(&ksid_of(v))).unwrap_or(false)
                    });
                    if hit {
                        Decision::Keep
                    } else {
                        Decision::Drop
                    }
                }
                Err(e) => Decision::Unparseable(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// maps the `id` pk value to a ksid by scaling it, so a pk value of `5`
    /// lands on ksid `0x50` — matching the worked example above.
    fn ksid_of_scaled() -> KsidOf {
        Arc::new(|v: &Json| KeyspaceId::from_u64((v.as_i64().unwrap_or(0) as u64) * 0x10))
    }

    #[test]
    fn key_range_keeps_rows_inside_the_range() {
        let filter = Filter::KeyRange {
            range: KeyRange::new(Some(KeyspaceId::from_u64(0x40)), Some(KeyspaceId::from_u64(0x60))),
            ksid_of: ksid_of_scaled(),
        };
        let sql = "insert into t values (5) /* _stream t (id) (5 ) */";
        assert!(matches!(filter.decide(sql), Decision::Keep));
    }

    #[test]
    fn key_range_drops_rows_outside_the_range() {
        let filter = Filter::KeyRange {
            range: KeyRange::new(Some(KeyspaceId::from_u64(0x80)), Some(KeyspaceId::from_u64(0xc0))),
            ksid_of: ksid_of_scaled(),
        };
        let sql = "insert into t values (5) /* _stream t (id) (5 ) */";
        assert!(matches!(filter.decide(sql), Decision::Drop));
    }

    #[test]
    fn table_filter_matches_by_name() {
        let filter = Filter::Tables(vec!["t".to_string()]);
        assert!(matches!(filter.decide("insert into t values (5) /* _stream t (id) (5 ) */"), Decision::Keep));
        assert!(matches!(filter.decide("insert into other values (5) /* _stream other (id) (5 ) */"), Decision::Drop));
    }

    #[test]
    fn unparseable_comment_is_surfaced_not_silently_dropped() {
        let filter = Filter::Tables(vec!["t".to_string()]);
        assert!(matches!(filter.decide("insert into t values (5)"), Decision::Unparseable(_)));
    }
}
