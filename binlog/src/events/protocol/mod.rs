pub mod v4;

pub mod format_description_log_event;
pub mod anonymous_gtid_log_event;
pub mod query_event;
pub mod table_map_event;
pub mod write_rows_v12_event;
pub mod update_rows_v12_event;
pub mod delete_rows_v12_event;
pub mod rotate_event;
pub mod unknown_event;
pub mod stop_event;
pub mod slave_event;
pub mod ignorable_log_event;
pub mod int_var_event;
pub mod xid_event;
