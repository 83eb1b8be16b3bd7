use crate::domain::{OperationType, OutboxError, OutboxResult, PendingOperation};
use crate::ports::OutboxQueue;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One line of the outbox log.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JournalEntry {
    Enqueue(PendingOperation),
    Ack {
        #[serde(rename = "operationId")]
        operation_id: Uuid,
    },
}

/// Where log lines are appended.
///
/// `truncate` cuts the log back to a known-good length after a failed append.
trait LogSink: Write {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

struct JournalState {
    file: File,
    /// Byte length of the log up to the last complete, synced line.
    log_len: u64,
    /// Live entries keyed by sequence, so iteration is insertion order.
    live: BTreeMap<u64, PendingOperation>,
    next_sequence: u64,
    /// Lines in the log, live or not. Drives `compact`.
    log_lines: usize,
}

/// Durable outbox backed by an append-only JSON-lines file.
///
/// Every append is flushed with `sync_data` before `enqueue` returns. A
/// failed append is cut back off the log, so the file always replays.
pub struct FileBackedOutbox {
    state: Mutex<JournalState>,
    path: PathBuf,
}

impl FileBackedOutbox {
    /// Open the log at `path`, creating it if missing, and rebuild the live
    /// set by replaying it.
    pub fn open<P: AsRef<Path>>(path: P) -> OutboxResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let replay = replay_log(&path, &bytes)?;

        if replay.valid_len < bytes.len() as u64 {
            warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() as u64 - replay.valid_len,
                "[bt-02] torn trailing outbox entry discarded"
            );
            file.set_len(replay.valid_len)?;
            file.sync_data()?;
        }

        info!(
            "[bt-02] 📬 Outbox opened at {} ({} pending)",
            path.display(),
            replay.live.len()
        );

        Ok(Self {
            state: Mutex::new(JournalState {
                file,
                log_len: replay.valid_len,
                live: replay.live,
                next_sequence: replay.next_sequence,
                log_lines: replay.lines,
            }),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the log so it holds only live entries.
    ///
    /// Uses temp file + rename; a crash leaves either the old or the new log.
    pub fn compact(&self) -> OutboxResult<()> {
        let mut state = self.state.lock();
        if state.log_lines == state.live.len() {
            return Ok(());
        }

        let temp_path = self.path.with_extension("compact");
        let mut temp = File::create(&temp_path)?;
        let mut compacted_len = 0;
        for op in state.live.values() {
            compacted_len += write_line(&mut temp, &JournalEntry::Enqueue(op.clone()))?;
        }
        temp.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        state.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        state.log_len = compacted_len;
        let before = state.log_lines;
        state.log_lines = state.live.len();
        debug!(
            "[bt-02] compacted outbox log from {} to {} lines",
            before, state.log_lines
        );
        Ok(())
    }
}

impl OutboxQueue for FileBackedOutbox {
    fn enqueue(
        &self,
        operation_type: OperationType,
        target_key: String,
        payload: serde_json::Value,
        created_at: Timestamp,
    ) -> OutboxResult<PendingOperation> {
        let mut state = self.state.lock();
        let op = PendingOperation::new(
            state.next_sequence,
            operation_type,
            target_key,
            payload,
            created_at,
        );

        let JournalState { file, log_len, .. } = &mut *state;
        append_entry(file, log_len, &JournalEntry::Enqueue(op.clone()))?;

        state.next_sequence += 1;
        state.log_lines += 1;
        state.live.insert(op.sequence, op.clone());
        Ok(op)
    }

    fn count(&self) -> OutboxResult<usize> {
        Ok(self.state.lock().live.len())
    }

    fn pending(&self) -> OutboxResult<Vec<PendingOperation>> {
        Ok(self.state.lock().live.values().cloned().collect())
    }

    fn acknowledge(&self, operation_id: Uuid) -> OutboxResult<bool> {
        let mut state = self.state.lock();
        let Some(sequence) = state
            .live
            .values()
            .find(|op| op.operation_id == operation_id)
            .map(|op| op.sequence)
        else {
            return Ok(false);
        };

        let JournalState { file, log_len, .. } = &mut *state;
        append_entry(file, log_len, &JournalEntry::Ack { operation_id })?;

        state.live.remove(&sequence);
        state.log_lines += 1;
        Ok(true)
    }
}

/// Write one entry and its newline. Returns the bytes written.
fn write_line<W: Write>(out: &mut W, entry: &JournalEntry) -> OutboxResult<u64> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');
    out.write_all(&line)?;
    Ok(line.len() as u64)
}

/// Append and sync one entry, advancing `log_len` on success.
///
/// A write or sync error may leave part of the line on disk. The log is cut
/// back to `log_len` before the error is returned, so the next append never
/// lands behind a fragment.
fn append_entry<S: LogSink>(
    sink: &mut S,
    log_len: &mut u64,
    entry: &JournalEntry,
) -> OutboxResult<()> {
    let line = serde_json::to_vec(entry)?;
    let written = sink
        .write_all(&line)
        .and_then(|()| sink.write_all(b"\n"))
        .and_then(|()| sink.sync());

    if let Err(e) = written {
        match sink.truncate(*log_len).and_then(|()| sink.sync()) {
            Ok(()) => warn!(error = %e, "[bt-02] outbox append failed, partial line rolled back"),
            Err(rollback) => warn!(
                error = %e,
                rollback_error = %rollback,
                "[bt-02] outbox append failed and could not be rolled back"
            ),
        }
        return Err(e.into());
    }

    *log_len += line.len() as u64 + 1;
    Ok(())
}

struct Replay {
    live: BTreeMap<u64, PendingOperation>,
    next_sequence: u64,
    lines: usize,
    /// Byte length of the well-formed prefix.
    valid_len: u64,
}

/// Rebuild the live set from raw log bytes.
///
/// A final line without its newline terminator is a torn append and is
/// excluded from `valid_len`. Any malformed complete line is corruption.
fn replay_log(path: &Path, bytes: &[u8]) -> OutboxResult<Replay> {
    let mut live = BTreeMap::new();
    let mut next_sequence = 0u64;
    let mut lines = 0usize;
    let mut offset = 0usize;

    for (index, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        if raw.last() != Some(&b'\n') {
            break;
        }
        let body = &raw[..raw.len() - 1];
        offset += raw.len();
        if body.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let entry: JournalEntry =
            serde_json::from_slice(body).map_err(|e| OutboxError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;
        lines += 1;

        match entry {
            JournalEntry::Enqueue(op) => {
                next_sequence = next_sequence.max(op.sequence + 1);
                live.insert(op.sequence, op);
            }
            JournalEntry::Ack { operation_id } => {
                live.retain(|_, op: &mut PendingOperation| op.operation_id != operation_id);
            }
        }
    }

    Ok(Replay {
        live,
        next_sequence,
        lines,
        valid_len: offset as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn log_path(dir: &TempDir) -> PathBuf {
        dir.path().join("outbox.log")
    }

    #[test]
    fn test_pending_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let acked;
        {
            let outbox = FileBackedOutbox::open(log_path(&dir)).unwrap();
            acked = outbox
                .enqueue(OperationType::ClearUpdate, "A".into(), json!({"a": 1}), 10)
                .unwrap();
            outbox
                .enqueue(OperationType::TransferUpdate, "B".into(), json!({"b": 2}), 11)
                .unwrap();
            assert!(outbox.acknowledge(acked.operation_id).unwrap());
        }

        let reopened = FileBackedOutbox::open(log_path(&dir)).unwrap();
        let pending = reopened.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target_key, "B");
        assert_eq!(pending[0].payload, json!({"b": 2}));
        assert!(!reopened.acknowledge(acked.operation_id).unwrap());
    }

    #[test]
    fn test_sequence_continues_after_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let outbox = FileBackedOutbox::open(log_path(&dir)).unwrap();
            for uid in ["A", "B"] {
                outbox
                    .enqueue(OperationType::SamplingMark, uid.into(), json!(null), 0)
                    .unwrap();
            }
        }
        let reopened = FileBackedOutbox::open(log_path(&dir)).unwrap();
        let next = reopened
            .enqueue(OperationType::SamplingMark, "C".into(), json!(null), 0)
            .unwrap();
        assert_eq!(next.sequence, 2);
    }

    #[test]
    fn test_torn_trailing_line_is_dropped() {
        let dir = TempDir::new().unwrap();
        {
            let outbox = FileBackedOutbox::open(log_path(&dir)).unwrap();
            outbox
                .enqueue(OperationType::ClearUpdate, "A".into(), json!({}), 0)
                .unwrap();
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(log_path(&dir))
            .unwrap();
        file.write_all(br#"{"kind":"enqueue","seq"#).unwrap();
        drop(file);

        let reopened = FileBackedOutbox::open(log_path(&dir)).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);

        reopened
            .enqueue(OperationType::ClearUpdate, "B".into(), json!({}), 0)
            .unwrap();
        drop(reopened);
        let again = FileBackedOutbox::open(log_path(&dir)).unwrap();
        assert_eq!(again.count().unwrap(), 2);
    }

    /// In-memory log that runs out of space after `capacity` bytes.
    #[derive(Default)]
    struct ShortDisk {
        bytes: Vec<u8>,
        capacity: Option<usize>,
    }

    impl Write for ShortDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.map_or(buf.len(), |c| c.saturating_sub(self.bytes.len()));
            if room == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let n = room.min(buf.len());
            self.bytes.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogSink for ShortDisk {
        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.bytes.truncate(len as usize);
            Ok(())
        }
    }

    fn enqueue_entry(sequence: u64, key: &str) -> JournalEntry {
        JournalEntry::Enqueue(PendingOperation::new(
            sequence,
            OperationType::ReceivingUpdate,
            key.into(),
            json!({"rfid": key}),
            0,
        ))
    }

    #[test]
    fn test_failed_append_leaves_replayable_log() {
        let mut disk = ShortDisk::default();
        let mut log_len = 0;
        append_entry(&mut disk, &mut log_len, &enqueue_entry(0, "A")).unwrap();
        assert_eq!(log_len, disk.bytes.len() as u64);

        disk.capacity = Some(disk.bytes.len() + 10);
        let err = append_entry(&mut disk, &mut log_len, &enqueue_entry(1, "B")).unwrap_err();
        assert!(matches!(err, OutboxError::Io { .. }));
        assert_eq!(disk.bytes.len() as u64, log_len);

        disk.capacity = None;
        append_entry(&mut disk, &mut log_len, &enqueue_entry(2, "C")).unwrap();

        let replay = replay_log(Path::new("outbox.log"), &disk.bytes).unwrap();
        let keys: Vec<_> = replay.live.values().map(|op| op.target_key.as_str()).collect();
        assert_eq!(keys, vec!["A", "C"]);
        assert_eq!(replay.valid_len, log_len);
        assert_eq!(replay.next_sequence, 3);
    }

    #[test]
    fn test_failed_ack_keeps_entry_pending_after_replay() {
        let mut disk = ShortDisk::default();
        let mut log_len = 0;
        let entry = enqueue_entry(0, "A");
        let JournalEntry::Enqueue(op) = &entry else {
            unreachable!()
        };
        let operation_id = op.operation_id;
        append_entry(&mut disk, &mut log_len, &entry).unwrap();

        disk.capacity = Some(disk.bytes.len() + 5);
        append_entry(&mut disk, &mut log_len, &JournalEntry::Ack { operation_id }).unwrap_err();
        disk.capacity = None;
        append_entry(&mut disk, &mut log_len, &enqueue_entry(1, "B")).unwrap();

        let replay = replay_log(Path::new("outbox.log"), &disk.bytes).unwrap();
        assert_eq!(replay.live.len(), 2);
    }

    #[test]
    fn test_corrupt_complete_line_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(log_path(&dir), b"garbage\n").unwrap();

        let err = FileBackedOutbox::open(log_path(&dir)).err().unwrap();
        assert!(matches!(err, OutboxError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn test_compact_keeps_only_live_entries() {
        let dir = TempDir::new().unwrap();
        let outbox = FileBackedOutbox::open(log_path(&dir)).unwrap();
        let a = outbox
            .enqueue(OperationType::ClearUpdate, "A".into(), json!({}), 0)
            .unwrap();
        outbox
            .enqueue(OperationType::ClearUpdate, "B".into(), json!({}), 0)
            .unwrap();
        outbox.acknowledge(a.operation_id).unwrap();

        outbox.compact().unwrap();
        let contents = std::fs::read_to_string(log_path(&dir)).unwrap();
        assert_eq!(contents.lines().count(), 1);

        outbox
            .enqueue(OperationType::ClearUpdate, "C".into(), json!({}), 0)
            .unwrap();
        drop(outbox);
        let reopened = FileBackedOutbox::open(log_path(&dir)).unwrap();
        let keys: Vec<_> = reopened
            .pending()
            .unwrap()
            .into_iter()
            .map(|op| op.target_key)
            .collect();
        assert_eq!(keys, vec!["B", "C"]);
    }
}
