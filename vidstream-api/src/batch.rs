use crate::error::{ApiError, ApiResult};
use futures::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Called after every completion with `(completed, total)`
pub type OnBatchProgress = Box<dyn Fn(usize, usize) + Send + Sync>;
/// Called with the error and the original index of a failed request
pub type OnBatchError = Box<dyn Fn(&ApiError, usize) + Send + Sync>;

pub struct BatchOptions {
    /// Requests per batch; zero is treated as one
    pub concurrency: usize,
    pub on_progress: Option<OnBatchProgress>,
    pub on_error: Option<OnBatchError>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            on_progress: None,
            on_error: None,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ApiError, usize) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }
}

/// Run independent requests in sequential batches of `concurrency`.
///
/// Requests inside a batch run concurrently and a failure never cancels its
/// neighbours. The result has one slot per request in input order; failed
/// requests leave `None` in their slot.
pub async fn batch_request<T, F, Fut, I>(requests: I, options: BatchOptions) -> Vec<Option<T>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let requests: Vec<F> = requests.into_iter().collect();
    let total = requests.len();
    let concurrency = options.concurrency.max(1);
    let completed = AtomicUsize::new(0);
    let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    tracing::debug!(target: "api::batch", total, concurrency, "Starting batch");

    let mut pending = requests.into_iter().enumerate().peekable();
    while pending.peek().is_some() {
        let batch: Vec<(usize, F)> = pending.by_ref().take(concurrency).collect();

        let outcomes = join_all(batch.into_iter().map(|(index, request)| {
            let completed = &completed;
            let options = &options;
            async move {
                let value = match request().await {
                    Ok(value) => Some(value),
                    Err(err) => {
                        tracing::debug!(target: "api::batch", index, error = %err, "Batch item failed");
                        if let Some(on_error) = &options.on_error {
                            on_error(&err, index);
                        }
                        None
                    }
                };
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(on_progress) = &options.on_progress {
                    on_progress(done, total);
                }
                (index, value)
            }
        }))
        .await;

        for (index, value) in outcomes {
            results[index] = value;
        }
    }

    results
}
