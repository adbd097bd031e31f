use crate::err::decode_error::ReError;

pub mod decode_error;
pub mod code;

/// older call sites spell this module `DecodeError`; kept as an alias rather
/// than touched up one by one.
pub use decode_error as DecodeError;

pub type CResult<T> = Result<T, ReError>;