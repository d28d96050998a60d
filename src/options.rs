use std::sync::Arc;

use record_stream::{CamelizeKeys, Pipeline, RecordTransform};

/// Per-query settings.
///
/// Camelized keys are on by default; the camelization step always runs after
/// the caller's own transforms.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub pipeline: Arc<Pipeline>,
    pub camel_response: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            pipeline: Arc::new(Pipeline::new()),
            camel_response: true,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<Arc<Pipeline>>) -> Self {
        self.pipeline = pipeline.into();
        self
    }

    pub fn with_transform(mut self, transform: impl RecordTransform + 'static) -> Self {
        Arc::make_mut(&mut self.pipeline).push(transform);
        self
    }

    /// Append a transform instance that other queries may also hold.
    pub fn with_shared_transform(mut self, transform: Arc<dyn RecordTransform>) -> Self {
        Arc::make_mut(&mut self.pipeline).push_shared(transform);
        self
    }

    pub fn with_camel_response(mut self, enabled: bool) -> Self {
        self.camel_response = enabled;
        self
    }

    /// Pipeline a session actually runs.
    pub fn effective_pipeline(&self) -> Arc<Pipeline> {
        if !self.camel_response {
            return Arc::clone(&self.pipeline);
        }
        let mut pipeline = Pipeline::clone(&self.pipeline);
        pipeline.push(CamelizeKeys);
        Arc::new(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use record_stream::{map, Outcome, RecordTransform};
    use serde_json::json;

    use super::QueryOptions;

    #[tokio::test]
    async fn camelization_runs_after_caller_transforms() {
        let options = QueryOptions::new().with_transform(map(|mut record| {
            record["seen_by"] = json!("caller");
            record
        }));
        let pipeline = options.effective_pipeline();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(options.pipeline.len(), 1);

        let outcome = pipeline
            .apply(json!({"block_number": 1}))
            .await
            .expect("apply");
        assert_eq!(
            outcome,
            Outcome::Record(json!({"blockNumber": 1, "seenBy": "caller"}))
        );
    }

    #[tokio::test]
    async fn camelization_can_be_disabled() {
        let options = QueryOptions::new().with_camel_response(false);
        let pipeline = options.effective_pipeline();
        assert!(pipeline.is_empty());

        let outcome = pipeline.apply(json!({"block_number": 1})).await.expect("apply");
        assert_eq!(outcome, Outcome::Record(json!({"block_number": 1})));
    }

    #[tokio::test]
    async fn shared_transform_is_one_instance_across_queries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let shared: Arc<dyn RecordTransform> = Arc::new(map(move |record| {
            counter.fetch_add(1, Ordering::SeqCst);
            record
        }));

        let blocks = QueryOptions::new().with_shared_transform(Arc::clone(&shared));
        let logs = QueryOptions::new()
            .with_camel_response(false)
            .with_shared_transform(shared);

        blocks
            .effective_pipeline()
            .apply(json!({"n": 1}))
            .await
            .expect("apply");
        logs.effective_pipeline()
            .apply(json!({"n": 2}))
            .await
            .expect("apply");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
