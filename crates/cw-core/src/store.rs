//! Persistence seam for the aggregate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;

use crate::record::Aggregate;

/// Whole-aggregate load and save.
///
/// `save` must replace the stored aggregate atomically: a concurrent reader
/// sees either the previous aggregate or the new one, never a mix.
pub trait AggregateStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self) -> Result<Aggregate, Self::Error>;

    fn save(&self, aggregate: &Aggregate) -> Result<(), Self::Error>;
}

impl<S: AggregateStore + ?Sized> AggregateStore for &S {
    type Error = S::Error;

    fn load(&self) -> Result<Aggregate, Self::Error> {
        (**self).load()
    }

    fn save(&self, aggregate: &Aggregate) -> Result<(), Self::Error> {
        (**self).save(aggregate)
    }
}

#[derive(Debug, Error)]
#[error("in-memory store write rejected")]
pub struct MemoryStoreError;

/// An in-process store, used for log replay and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    aggregate: Mutex<Aggregate>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            aggregate: Mutex::new(aggregate),
            ..Self::default()
        }
    }

    /// Makes every following `save` fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved aggregate.
    pub fn snapshot(&self) -> Aggregate {
        self.aggregate
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl AggregateStore for MemoryStore {
    type Error = MemoryStoreError;

    fn load(&self) -> Result<Aggregate, Self::Error> {
        Ok(self.snapshot())
    }

    fn save(&self, aggregate: &Aggregate) -> Result<(), Self::Error> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(MemoryStoreError);
        }
        *self
            .aggregate
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = aggregate.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
