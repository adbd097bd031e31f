pub mod schema;
pub mod data_type;
pub mod mock;
pub mod rc_task;
