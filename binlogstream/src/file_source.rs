//! A production `EventSource` over `binlog::decoder::file_binlog_reader`
//! (spec §4.8: the streaming path reads a real binlog file/connection, not
//! just a test fixture).
//!
//! `FileBinlogReader` carries `Rc<RefCell<LogContext>>` internally and is
//! therefore `!Send`; it is constructed and driven entirely inside a
//! dedicated OS thread and never crosses a thread boundary. Decoded events
//! are forwarded to the async side over a bounded channel — the same
//! blocking-thread-plus-channel bridge `connection::tablet_conn::RealTabletConn`
//! uses to wrap the teacher's blocking `Connection`.

use std::path::PathBuf;
use std::thread;

use async_trait::async_trait;
use binlog::decoder::binlog_decoder::BinlogReader;
use binlog::decoder::file_binlog_reader::FileBinlogReader;
use binlog::events::event::Event;
use common::err::decode_error::ReError;
use common::err::CResult;
use tokio::sync::mpsc;
use tracing::warn;

use crate::source::EventSource;

pub struct FileEventSource {
    rx: mpsc::Receiver<Result<Event, ReError>>,
}

impl FileEventSource {
    /// spawn a reader thread over the binlog file at `path`. `buffer` sizes
    /// the forwarding channel — the reader thread blocks on `send` once it
    /// fills, so a slow consumer throttles the file read instead of
    /// buffering the whole file in memory.
    pub fn open(path: impl Into<PathBuf>, buffer: usize) -> CResult<Self> {
        let path = path.into();
        let (tx, rx) = mpsc::channel(buffer);

        thread::Builder::new()
            .name("binlog-file-reader".to_string())
            .spawn(move || run_reader(path, tx))
            .map_err(|e| ReError::Internal(format!("failed to spawn binlog reader thread: {}", e)))?;

        Ok(FileEventSource { rx })
    }
}

fn run_reader(path: PathBuf, tx: mpsc::Sender<Result<Event, ReError>>) {
    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            let _ = tx.blocking_send(Err(ReError::IoError(e)));
            return;
        }
    };

    let (reader, _context) = match FileBinlogReader::new_without_context(false) {
        Ok(r) => r,
        Err(e) => {
            let _ = tx.blocking_send(Err(e));
            return;
        }
    };

    for result in reader.read_events(file) {
        match result {
            Ok((_header, event)) => {
                if tx.blocking_send(Ok(event)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "binlog file reader stopped on decode error");
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

#[async_trait]
impl EventSource for FileEventSource {
    async fn next_event(&mut self) -> CResult<Option<Event>> {
        match self.rx.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn open_on_missing_file_surfaces_io_error_through_next_event() {
        let mut source = FileEventSource::open("/nonexistent/path/to.binlog", 8).unwrap();
        let err = source.next_event().await.unwrap_err();
        assert!(matches!(err, ReError::IoError(_)));
    }
}
