pub mod binlog_events;
pub mod binlog_events_wrapper;
pub mod binlog_options;
pub mod binlog_subscribe;
pub mod lifecycle;
pub mod reg;
pub mod starting_strategy;
