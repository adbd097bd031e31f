//! Wire shapes the streamer emits: the per-statement `Statement`/`Category`
//! pair grouped into a `BinlogTransaction`, and the filtered, per-row
//! `StreamEvent` a consumer actually wants to apply.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// What a statement does to the binlog, classified from its raw SQL text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Category {
    Unrecognized,
    Begin,
    Commit,
    Rollback,
    Dml,
    Ddl,
    Set,
}

impl Category {
    /// classifies a single SQL statement by its leading keyword, matching the
    /// prefixes MySQL itself writes for the session markers (`BEGIN`,
    /// `COMMIT`, `ROLLBACK`) and the common DDL verbs.
    pub fn classify(sql: &str) -> Category {
        let trimmed = sql.trim_start();
        let mut head = String::with_capacity(16);
        for c in trimmed.chars() {
            if c.is_whitespace() || c == '(' {
                break;
            }
            head.push(c.to_ascii_uppercase());
        }
        match head.as_str() {
            "BEGIN" | "START" => Category::Begin,
            "COMMIT" => Category::Commit,
            "ROLLBACK" => Category::Rollback,
            "SET" => Category::Set,
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "RENAME" => Category::Ddl,
            "INSERT" | "UPDATE" | "DELETE" | "REPLACE" => Category::Dml,
            "" => Category::Unrecognized,
            _ => Category::Unrecognized,
        }
    }
}

/// Charset triple carried by a `Query` event's `Q_CHARSET_CODE` status var:
/// `(character_set_client, collation_connection, collation_server)`.
pub type Charset = (u16, u16, u16);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub category: Category,
    pub charset: Option<Charset>,
    pub sql: String,
}

/// An ordered group of statements bounded by `BEGIN`..`COMMIT` (or a single
/// autocommit statement treated as its own transaction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinlogTransaction {
    pub statements: Vec<Statement>,
    pub timestamp: i64,
    pub transaction_id: String,
}

impl BinlogTransaction {
    /// the `MariaDB/<server>-<domain>-<seq>` shape used for `transaction_id`
    /// when no GTID is available, built from the xid and originating server.
    pub fn transaction_id(server_id: u32, domain: u32, seq: u64) -> String {
        format!("MariaDB/{}-{}-{}", server_id, domain, seq)
    }
}

/// The per-row event a consumer of the filtered stream actually wants:
/// either a decoded DML row change, a DDL statement passed through verbatim,
/// a position marker (so a consumer can track where to resume), or an error
/// that did not abort the stream (e.g. an unparseable `_stream` comment).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Dml {
        table: String,
        pk_fields: Vec<String>,
        pk_values: Vec<Vec<Json>>,
        timestamp: i64,
        transaction_id: String,
    },
    Ddl {
        sql: String,
        timestamp: i64,
        transaction_id: String,
    },
    Pos {
        timestamp: i64,
        transaction_id: String,
    },
    Err {
        sql: String,
        reason: String,
        timestamp: i64,
        transaction_id: String,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify_recognizes_the_session_markers() {
        assert_eq!(Category::classify("BEGIN"), Category::Begin);
        assert_eq!(Category::classify("  commit"), Category::Commit);
        assert_eq!(Category::classify("ROLLBACK"), Category::Rollback);
        assert_eq!(Category::classify("SET TIMESTAMP=1"), Category::Set);
    }

    #[test]
    fn classify_recognizes_dml_and_ddl() {
        assert_eq!(Category::classify("insert into t values (1)"), Category::Dml);
        assert_eq!(Category::classify("UPDATE t SET a=1"), Category::Dml);
        assert_eq!(Category::classify("CREATE TABLE t (id int)"), Category::Ddl);
        assert_eq!(Category::classify("alter table t add column b int"), Category::Ddl);
    }

    #[test]
    fn classify_falls_back_to_unrecognized() {
        assert_eq!(Category::classify("SELECT 1"), Category::Unrecognized);
        assert_eq!(Category::classify(""), Category::Unrecognized);
    }
}
