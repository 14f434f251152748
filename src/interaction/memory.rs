use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    gate::{
        error::{GateError, duplicate_record},
        ports::{InteractionLog, ReserveOutcome},
        types::TweetId,
    },
    interaction::types::InteractionRecord,
};

#[derive(Debug, Default)]
struct LogState {
    records: Vec<InteractionRecord>,
    recorded_ids: BTreeSet<TweetId>,
    pending: BTreeSet<TweetId>,
}

#[derive(Debug, Default)]
pub struct InMemoryInteractionLog {
    state: Mutex<LogState>,
}

impl InMemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log with previously persisted records. Duplicated ids are
    /// rejected.
    pub fn with_records(records: Vec<InteractionRecord>) -> Result<Self, GateError> {
        let mut state = LogState::default();
        for record in records {
            if !state.recorded_ids.insert(record.tweet_id) {
                return Err(duplicate_record(format!(
                    "tweet {} appears more than once in the interaction log",
                    record.tweet_id
                )));
            }
            state.records.push(record);
        }
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Appends `record` and runs `persist` on the full record list while the
    /// log is still locked, so concurrent appends reach `persist` in order.
    /// The in-memory append stands even when `persist` fails.
    pub(crate) fn record_with<F>(&self, record: InteractionRecord, persist: F) -> Result<(), GateError>
    where
        F: FnOnce(&[InteractionRecord]) -> Result<(), GateError>,
    {
        let mut state = self.lock();
        let tweet_id = record.tweet_id;
        if !state.recorded_ids.insert(tweet_id) {
            return Err(duplicate_record(format!(
                "tweet {tweet_id} already has an interaction record"
            )));
        }
        state.pending.remove(&tweet_id);
        state.records.push(record);
        persist(&state.records)
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InteractionLog for InMemoryInteractionLog {
    fn has_interacted(&self, tweet_id: TweetId) -> Result<bool, GateError> {
        Ok(self.lock().recorded_ids.contains(&tweet_id))
    }

    fn reserve(&self, tweet_id: TweetId) -> Result<ReserveOutcome, GateError> {
        let mut state = self.lock();
        if state.recorded_ids.contains(&tweet_id) {
            return Ok(ReserveOutcome::AlreadyRecorded);
        }
        if !state.pending.insert(tweet_id) {
            return Ok(ReserveOutcome::InFlight);
        }
        Ok(ReserveOutcome::Reserved)
    }

    fn record(&self, record: InteractionRecord) -> Result<(), GateError> {
        self.record_with(record, |_| Ok(()))
    }

    fn release(&self, tweet_id: TweetId) {
        self.lock().pending.remove(&tweet_id);
    }
}
