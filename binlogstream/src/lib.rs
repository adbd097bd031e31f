//! Binlog transaction streaming, layered on `binlog`'s already-decoded
//! events rather than re-deriving a binlog-file parser. Assembles raw
//! `Query`/`XID`/`Rotate` events into ordered `BinlogTransaction`s, applies
//! key-range or table-name filtering to the DML they contain, and exposes
//! the result either as transactions or as flattened per-row `StreamEvent`s.

pub mod file_source;
pub mod filter;
pub mod format;
pub mod source;
pub mod stream_comment;
pub mod streamer;

pub use file_source::FileEventSource;
pub use filter::{Decision, Filter, KsidOf};
pub use format::{BinlogTransaction, Category, Charset, Statement, StreamEvent};
pub use source::{EventSource, RawEvent};
pub use streamer::{into_stream_events, BinlogStreamer};
