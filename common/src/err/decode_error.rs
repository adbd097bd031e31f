use std::fmt::Display;
use std::{fmt, io};
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use hex::FromHexError;

#[derive(Debug)]
pub enum ReError {
    //////////////////////
    // Common
    //////////////////////
    /// 一定不会出现的异常。如果出现，一定是BUG
    BUG(String),
    /// The parser had an error (recoverable)
    Error(String),

    //////////////////////
    // SQL Parser
    //////////////////////
    ASTParserError(String),

    //////////////////////
    // Binlog
    //////////////////////
    /// Byte code is incomplete
    /// 此错误用于binlog编解码过程中的异常处理，包含：
    ///     编解码进行中、已完成、格式错误等， 由 Needed 产生为具体的错误信息描述
    Incomplete(Needed),

    //////////////////////
    // IO
    //////////////////////
    IoError(io::Error),
    Utf8Error(Utf8Error),
    FromUtf8Error(FromUtf8Error),
    FromHexError(FromHexError),
    ParseIntError(ParseIntError),
    ConnectionError(String),
    String(String),

    /// The parser had an unrecoverable error: we got to the right
    /// branch and we know other branches won't work, so backtrack
    /// as fast as possible
    Failure(String),

    ConfigFileParseErr(String),


    TableSchemaIntoErr(String),
    RcMysqlUrlErr(String),
    RcMysqlQueryErr(String),
    OpRaftErr(String),

    MysqlQueryErr(String),

    OpTableNotExistErr(String),
    OpSchemaNotExistErr(String),
    OpMetadataErr(String),
    MetadataMockErr(String),

    //////////////////////
    // Topology store (§4.1)
    //////////////////////
    /// the version supplied by the caller no longer matches the stored version
    BadVersion(String),
    /// `Get`/`Watch` against a path that does not exist
    NoNode(String),
    /// `Create` against a path that already exists
    NodeExists(String),
    /// a path-scoped lock is held by someone else
    LockHeld(String),

    //////////////////////
    // Gateway / Scatter-Gather (§4.3, §4.5, §7)
    //////////////////////
    /// bounded-deadline expired while waiting on I/O, a lock, or a rendezvous
    Timeout(String),
    /// the caller (or a linked deadline) cancelled the operation
    Canceled(String),
    /// session has no outstanding transaction on the target shard
    NotInTx(String),
    /// the tablet's transaction pool has no free slots; caller decides whether to retry
    TxPoolFull(String),
    /// a previous error already poisoned this session
    FailedPrecondition(String),
    /// no healthy tablet could be resolved for the requested target
    Unavailable(String),
    /// the router rejected the statement as unsupported or ambiguous
    InvalidArgument(String),
    /// an invariant was violated; always a bug, never a user-facing condition
    Internal(String),
    /// `ABORTED`-class aggregate error in a scatter-gather fan-out
    Aborted(String),
}

impl Display for ReError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            ReError::BUG(s) | ReError::Error(s) | ReError::ASTParserError(s)
            | ReError::ConnectionError(s) | ReError::String(s) | ReError::Failure(s)
            | ReError::ConfigFileParseErr(s) | ReError::TableSchemaIntoErr(s) | ReError::RcMysqlUrlErr(s)
            | ReError::RcMysqlQueryErr(s) | ReError::OpRaftErr(s) | ReError::MysqlQueryErr(s)
            | ReError::OpTableNotExistErr(s) | ReError::OpSchemaNotExistErr(s) | ReError::OpMetadataErr(s)
            | ReError::MetadataMockErr(s)
            | ReError::BadVersion(s) | ReError::NoNode(s) | ReError::NodeExists(s) | ReError::LockHeld(s)
            | ReError::Timeout(s) | ReError::Canceled(s) | ReError::NotInTx(s) | ReError::TxPoolFull(s)
            | ReError::FailedPrecondition(s) | ReError::Unavailable(s) | ReError::InvalidArgument(s)
            | ReError::Internal(s) | ReError::Aborted(s) => {
                write!(f, "{}", s)
            }
            ReError::Incomplete(n) => {
                write!(f, "{}", n)
            }
            ReError::IoError(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::Utf8Error(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::FromUtf8Error(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::FromHexError(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::ParseIntError(err) => {
                write!(f, "{}", err.to_string())
            }
        }
    }
}

impl From<io::Error> for ReError {
    fn from(error: io::Error) -> Self {
        ReError::IoError(error)
    }
}

// impl <T> From<error::Error<T>> for ReError {
//     fn  from(error: error::Error<T>) -> Self {
//         ReError::String(error.input)
//     }
// }

impl From<Utf8Error> for ReError {
    fn from(error: Utf8Error) -> Self {
        ReError::Utf8Error(error)
    }
}

impl From<FromUtf8Error> for ReError {
    fn from(error: FromUtf8Error) -> Self {
        ReError::FromUtf8Error(error)
    }
}

impl From<FromHexError> for ReError {
    fn from(error: FromHexError) -> Self {
        ReError::FromHexError(error)
    }
}

impl From<ParseIntError> for ReError {
    fn from(error: ParseIntError) -> Self {
        ReError::ParseIntError(error)
    }
}

/// Contains information on needed data if a parser returned `Incomplete`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Needed {
    /// Needs more data, but we do not know how much
    Unknown,

    NoEnoughData,

    InvalidUtf8,

    /// 被忽略的异常。
    MissingNull,

    InvalidData(String),
}

impl Display for Needed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            Needed::Unknown => {
                write!(f, "Unknown")
            }
            Needed::NoEnoughData => {
                write!(f, "NoEnoughData")
            }
            Needed::InvalidUtf8 => {
                write!(f, "InvalidUtf8")
            }
            Needed::MissingNull => {
                write!(f, "MissingNull")
            }
            Needed::InvalidData(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl ReError {
    pub fn is_error(&self) -> bool {
        print!("a");

        false
    }
}

#[cfg(test)]
mod test {
    #[test]
    fn test() {
        assert_eq!(1, 1);
    }
}