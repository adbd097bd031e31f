//! Parses the `/* _stream table (pk_cols...) (vals...) ... */` trailing
//! comment a DML statement carries so the streamer can recover affected
//! primary keys without row-based binlog images.

use common::err::decode_error::ReError;
use common::err::CResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*\s*_stream\s+(\S+)\s*(.*?)\*/").unwrap());
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct StreamComment {
    pub table: String,
    pub pk_fields: Vec<String>,
    pub pk_rows: Vec<Vec<Json>>,
}

/// extracts the `_stream` comment from a DML statement's SQL text.
///
/// The comment body is a column-name group followed by one value group per
/// affected row: `(id) (5) (6)` for two rows touching a single-column key.
/// Returns an error (rather than panicking) when the comment is missing or
/// malformed — callers treat that as "can't filter this row", not as a
/// reason to abort the whole stream.
pub fn parse(sql: &str) -> CResult<StreamComment> {
    let caps = COMMENT_RE
        .captures(sql)
        .ok_or_else(|| ReError::InvalidArgument(format!("no _stream comment in statement: {}", sql)))?;
    let table = caps[1].to_string();
    let body = &caps[2];

    let groups: Vec<&str> = GROUP_RE
        .captures_iter(body)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();
    let (cols, rows) = groups
        .split_first()
        .ok_or_else(|| ReError::InvalidArgument(format!("_stream comment for {} has no column group", table)))?;

    let pk_fields: Vec<String> = cols.split_whitespace().map(|s| s.to_string()).collect();
    if pk_fields.is_empty() {
        return Err(ReError::InvalidArgument(format!("_stream comment for {} names no pk columns", table)));
    }

    let pk_rows: Vec<Vec<Json>> = rows.iter().map(|r| tokenize(r)).collect();
    if pk_rows.is_empty() {
        return Err(ReError::InvalidArgument(format!("_stream comment for {} has no value rows", table)));
    }

    Ok(StreamComment { table, pk_fields, pk_rows })
}

fn tokenize(group: &str) -> Vec<Json> {
    group
        .split_whitespace()
        .map(|tok| match tok.parse::<i64>() {
            Ok(n) => Json::from(n),
            Err(_) => Json::from(tok.trim_matches('\'').to_string()),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_single_column_single_row_comment() {
        let c = parse("insert into t values (5) /* _stream t (id) (5 ) */").unwrap();
        assert_eq!(c.table, "t");
        assert_eq!(c.pk_fields, vec!["id".to_string()]);
        assert_eq!(c.pk_rows, vec![vec![Json::from(5)]]);
    }

    #[test]
    fn parses_multiple_affected_rows() {
        let c = parse("update t set a=1 /* _stream t (id) (5 ) (6 ) */").unwrap();
        assert_eq!(c.pk_rows, vec![vec![Json::from(5)], vec![Json::from(6)]]);
    }

    #[test]
    fn parses_composite_keys() {
        let c = parse("delete from t /* _stream t (a b ) (1 'x' ) */").unwrap();
        assert_eq!(c.pk_fields, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(c.pk_rows, vec![vec![Json::from(1), Json::from("x".to_string())]]);
    }

    #[test]
    fn missing_comment_is_an_error_not_a_panic() {
        assert!(parse("insert into t values (5)").is_err());
    }
}
