//! The local mysqld the agent manages (spec §1: process lifecycle glue and
//! the MySQL wire protocol itself are external collaborators; this trait is
//! the narrow surface the action handlers in §4.6.2/§4.7 actually drive).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use common::err::decode_error::ReError;
use common::err::CResult;

#[async_trait]
pub trait MysqldControl: Send + Sync {
    async fn stop_replication(&self) -> CResult<()>;
    async fn start_replication(&self) -> CResult<()>;
    async fn set_read_only(&self, read_only: bool) -> CResult<()>;
    async fn reset_replication(&self) -> CResult<()>;
    async fn set_master(&self, parent_alias: &str, position: &str) -> CResult<()>;
    /// the current replication position, advanced only by `advance_position`
    /// in the fake — a real impl reads `SHOW MASTER STATUS`/`SHOW SLAVE STATUS`.
    async fn current_position(&self) -> CResult<String>;
    async fn wait_for_position(&self, position: &str, timeout: Duration) -> CResult<()>;
    async fn data_files(&self, db_name: &str) -> CResult<Vec<String>>;
    async fn shutdown(&self) -> CResult<()>;
    async fn start(&self) -> CResult<()>;
    async fn install_data_files(&self, db_name: &str, files: Vec<String>) -> CResult<()>;
    /// a reparent-journal row becomes visible once this tablet has applied
    /// the event written by the promoted master at `position` (spec §4.7
    /// step 5: "waits until it observes a reparent-journal row at Q").
    async fn has_reparent_journal_row(&self, position: &str) -> CResult<bool>;
}

#[derive(Debug, Default)]
struct FakeState {
    read_only: bool,
    replicating: bool,
    position: String,
    data_files: HashMap<String, Vec<String>>,
    journal: Vec<String>,
    running: bool,
}

/// an in-process stand-in for a real mysqld, sufficient to exercise
/// Snapshot -> manifest -> Restore and the full reparent protocol in tests
/// deterministically.
pub struct FakeMysqld {
    state: Mutex<FakeState>,
}

impl FakeMysqld {
    pub fn new(initial_position: impl Into<String>) -> Self {
        FakeMysqld {
            state: Mutex::new(FakeState {
                read_only: false,
                replicating: true,
                position: initial_position.into(),
                data_files: HashMap::new(),
                journal: vec![],
                running: true,
            }),
        }
    }

    pub fn seed_data_file(&self, db_name: &str, file: impl Into<String>) {
        self.state.lock().unwrap().data_files.entry(db_name.to_string()).or_default().push(file.into());
    }

    /// advances the position as if a write landed; used by reparent tests to
    /// simulate replication progress.
    pub fn advance_position(&self, position: impl Into<String>) {
        let position = position.into();
        let mut state = self.state.lock().unwrap();
        state.position = position.clone();
        state.journal.push(position);
    }

    pub fn position(&self) -> String {
        self.state.lock().unwrap().position.clone()
    }
}

#[async_trait]
impl MysqldControl for FakeMysqld {
    async fn stop_replication(&self) -> CResult<()> {
        self.state.lock().unwrap().replicating = false;
        Ok(())
    }

    async fn start_replication(&self) -> CResult<()> {
        self.state.lock().unwrap().replicating = true;
        Ok(())
    }

    async fn set_read_only(&self, read_only: bool) -> CResult<()> {
        self.state.lock().unwrap().read_only = read_only;
        Ok(())
    }

    async fn reset_replication(&self) -> CResult<()> {
        let mut state = self.state.lock().unwrap();
        state.replicating = false;
        state.read_only = false;
        Ok(())
    }

    async fn set_master(&self, _parent_alias: &str, position: &str) -> CResult<()> {
        let mut state = self.state.lock().unwrap();
        state.position = position.to_string();
        state.replicating = true;
        // simulates the replica immediately applying the new master's
        // reparent-journal row at `position`, which a real mysqld would
        // only observe once replication actually catches up.
        state.journal.push(position.to_string());
        Ok(())
    }

    async fn current_position(&self) -> CResult<String> {
        Ok(self.state.lock().unwrap().position.clone())
    }

    async fn wait_for_position(&self, position: &str, timeout: Duration) -> CResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.state.lock().unwrap().position.as_str() >= position {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ReError::Timeout(format!("replica did not reach position {}", position)));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn data_files(&self, db_name: &str) -> CResult<Vec<String>> {
        Ok(self.state.lock().unwrap().data_files.get(db_name).cloned().unwrap_or_default())
    }

    async fn shutdown(&self) -> CResult<()> {
        self.state.lock().unwrap().running = false;
        Ok(())
    }

    async fn start(&self) -> CResult<()> {
        self.state.lock().unwrap().running = true;
        Ok(())
    }

    async fn install_data_files(&self, db_name: &str, files: Vec<String>) -> CResult<()> {
        self.state.lock().unwrap().data_files.insert(db_name.to_string(), files);
        Ok(())
    }

    async fn has_reparent_journal_row(&self, position: &str) -> CResult<bool> {
        Ok(self.state.lock().unwrap().journal.iter().any(|p| p == position))
    }
}
