use crate::domain::{OperationType, OutboxResult, PendingOperation};
use crate::ports::OutboxQueue;
use parking_lot::Mutex;
use shared_types::Timestamp;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Default)]
struct QueueState {
    entries: VecDeque<PendingOperation>,
    next_sequence: u64,
}

/// Volatile outbox for tests and sessions that do not need durability.
#[derive(Default)]
pub struct InMemoryOutbox {
    state: Mutex<QueueState>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutboxQueue for InMemoryOutbox {
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
        state.next_sequence += 1;
        state.entries.push_back(op.clone());
        Ok(op)
    }

    fn count(&self) -> OutboxResult<usize> {
        Ok(self.state.lock().entries.len())
    }

    fn pending(&self) -> OutboxResult<Vec<PendingOperation>> {
        Ok(self.state.lock().entries.iter().cloned().collect())
    }

    fn acknowledge(&self, operation_id: Uuid) -> OutboxResult<bool> {
        let mut state = self.state.lock();
        match state
            .entries
            .iter()
            .position(|op| op.operation_id == operation_id)
        {
            Some(index) => {
                state.entries.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
