use std::fmt;
use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Result of running one transform (or a whole pipeline) over a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Record(Value),
    /// Drop the record. Remaining transforms are skipped.
    Filtered,
}

impl Outcome {
    pub fn into_record(self) -> Option<Value> {
        match self {
            Self::Record(value) => Some(value),
            Self::Filtered => None,
        }
    }
}

impl From<Option<Value>> for Outcome {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Filtered, Self::Record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record transform failed: {message}")]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type TransformFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Outcome, TransformError>> + Send + 'a>>;

/// One step of a record pipeline. May suspend.
pub trait RecordTransform: Send + Sync {
    fn apply(&self, record: Value) -> TransformFuture<'_>;
}

/// Ordered transform chain, immutable once handed to a session.
///
/// Cloning is cheap; transforms are shared behind `Arc`.
#[derive(Clone, Default)]
pub struct Pipeline {
    transforms: Vec<Arc<dyn RecordTransform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, transform: impl RecordTransform + 'static) -> Self {
        self.push(transform);
        self
    }

    pub fn push(&mut self, transform: impl RecordTransform + 'static) {
        self.transforms.push(Arc::new(transform));
    }

    pub fn push_shared(&mut self, transform: Arc<dyn RecordTransform>) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run `record` through every transform, left to right.
    pub async fn apply(&self, record: Value) -> Result<Outcome, TransformError> {
        let mut current = record;
        for transform in &self.transforms {
            match transform.apply(current).await? {
                Outcome::Record(next) => current = next,
                Outcome::Filtered => return Ok(Outcome::Filtered),
            }
        }
        Ok(Outcome::Record(current))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

struct MapFn<F>(F);

impl<F> RecordTransform for MapFn<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn apply(&self, record: Value) -> TransformFuture<'_> {
        Box::pin(ready(Ok(Outcome::Record((self.0)(record)))))
    }
}

struct TryMapFn<F>(F);

impl<F> RecordTransform for TryMapFn<F>
where
    F: Fn(Value) -> Result<Outcome, TransformError> + Send + Sync,
{
    fn apply(&self, record: Value) -> TransformFuture<'_> {
        Box::pin(ready((self.0)(record)))
    }
}

struct FilterFn<F>(F);

impl<F> RecordTransform for FilterFn<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn apply(&self, record: Value) -> TransformFuture<'_> {
        let outcome = if (self.0)(&record) {
            Outcome::Record(record)
        } else {
            Outcome::Filtered
        };
        Box::pin(ready(Ok(outcome)))
    }
}

struct AsyncFn<F>(F);

impl<F, Fut> RecordTransform for AsyncFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome, TransformError>> + Send + 'static,
{
    fn apply(&self, record: Value) -> TransformFuture<'_> {
        Box::pin((self.0)(record))
    }
}

/// Infallible synchronous rewrite.
pub fn map<F>(f: F) -> impl RecordTransform
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    MapFn(f)
}

/// Synchronous transform that may filter or fail.
pub fn try_map<F>(f: F) -> impl RecordTransform
where
    F: Fn(Value) -> Result<Outcome, TransformError> + Send + Sync + 'static,
{
    TryMapFn(f)
}

/// Keep records for which `predicate` holds.
pub fn filter<F>(predicate: F) -> impl RecordTransform
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    FilterFn(predicate)
}

/// Asynchronous transform; the returned future must own its state.
pub fn from_async<F, Fut>(f: F) -> impl RecordTransform
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, TransformError>> + Send + 'static,
{
    AsyncFn(f)
}
