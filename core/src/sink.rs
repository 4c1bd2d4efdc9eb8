//! Best-effort destinations for generated query fragments.
//!
//! Recording never blocks and never fails query construction: rules call
//! [`FragmentSink::record`] and only log the error it returns.

use crate::query::QueryFragment;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

pub const TRACE_TARGET: &str = "catalog::search";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentRecord {
    pub rule: String,
    pub fragment: QueryFragment,
}

impl FragmentRecord {
    pub fn new(rule: impl Into<String>, fragment: QueryFragment) -> Self {
        Self { rule: rule.into(), fragment }
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink busy, record dropped")]
    Busy,
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

pub trait FragmentSink: Send + Sync {
    fn record(&self, record: FragmentRecord) -> Result<(), SinkError>;
}

/// Records queued for the log worker before new ones are dropped.
pub const LOG_QUEUE_CAPACITY: usize = 1024;

/// Emits each record as a `debug` event with the fragment as JSON.
///
/// Formatting and writing happen on a dedicated thread fed by a bounded
/// queue; `record` only does a `try_send`. A full queue drops the record
/// and counts it. Events go to the dispatcher current when the sink was
/// created.
#[derive(Debug)]
pub struct TracingSink {
    tx: Sender<FragmentRecord>,
    dropped: AtomicU64,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(LOG_QUEUE_CAPACITY)
    }
}

impl TracingSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let spawned = thread::Builder::new()
            .name("fragment-log".into())
            .spawn(move || tracing::dispatcher::with_default(&dispatch, || drain(rx)));
        if let Err(err) = spawned {
            // The receiver is gone with the closure, so every record reports Unavailable.
            tracing::warn!(error = %err, "fragment log worker not started");
        }
        Self { tx, dropped: AtomicU64::new(0) }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn drain(rx: Receiver<FragmentRecord>) {
    for record in rx {
        if !tracing::enabled!(target: TRACE_TARGET, tracing::Level::DEBUG) {
            continue;
        }
        match serde_json::to_string(&record.fragment) {
            Ok(fragment) => tracing::debug!(target: TRACE_TARGET, rule = %record.rule, %fragment, "query fragment"),
            Err(err) => tracing::warn!(rule = %record.rule, error = %err, "query fragment not encoded"),
        }
    }
}

impl FragmentSink for TracingSink {
    fn record(&self, record: FragmentRecord) -> Result<(), SinkError> {
        match self.tx.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Busy)
            }
            Err(TrySendError::Disconnected(_)) => Err(SinkError::Unavailable("log worker stopped".into())),
        }
    }
}

/// Keeps the most recent records in memory for the debug endpoint.
///
/// Only ever `try_lock`s: a contended record is dropped and counted.
#[derive(Debug)]
pub struct RingSink {
    capacity: usize,
    records: Mutex<VecDeque<FragmentRecord>>,
    dropped: AtomicU64,
}

impl RingSink {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<FragmentRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FragmentSink for RingSink {
    fn record(&self, record: FragmentRecord) -> Result<(), SinkError> {
        let Some(mut records) = self.records.try_lock() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::Busy);
        };
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }
}

/// Fans out to every sink; reports the first failure after trying all.
impl FragmentSink for Vec<Arc<dyn FragmentSink>> {
    fn record(&self, record: FragmentRecord) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in self {
            if let Err(err) = sink.record(record.clone()) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
