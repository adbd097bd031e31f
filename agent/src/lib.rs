//! Tablet agent (spec §4.6): per-tablet state machine, action queue with
//! mutual exclusion, and the snapshot/restore handlers the reparent
//! coordinator (crate `reparent`) drives this through.

pub mod action_queue;
pub mod backup;
pub mod handlers;
pub mod mysqld;
pub mod state_machine;
pub mod tablet_agent;

pub use action_queue::ActionQueue;
pub use backup::{BackupStorage, LocalFsBackupStorage, Manifest};
pub use mysqld::{FakeMysqld, MysqldControl};
pub use state_machine::{can_restore, can_transition, takes_out_of_serving, Transition};
pub use tablet_agent::TabletAgent;
