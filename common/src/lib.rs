#![feature(allocator_api)]
#![feature(hasher_prefixfree_extras)]

pub mod config;
pub mod codec;
pub mod parse;
pub mod log;
pub mod err;

pub mod schema;

pub mod server;
pub mod structure;
pub mod lifecycle;
pub mod memory_ext;
pub mod cancel;
pub mod time_util;
pub mod file_util;
pub mod pretty_util;
pub mod uuid;
mod util;
mod decimal_util;