use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use resolvegate_planner::print_selection_set;
use tokio::sync::oneshot;
use value::ConstValue;

use crate::{DelegateOptions, SourceField};

type Waiter = oneshot::Sender<Result<ConstValue, String>>;

type PendingBatches = Arc<Mutex<HashMap<String, PendingBatch>>>;

#[derive(Default)]
struct PendingBatch {
    keys: Vec<ConstValue>,
    waiters: Vec<Waiter>,
}

/// Collects concurrent key batched calls to a list accepting source field and
/// issues them as one call.
///
/// Calls are grouped by the arguments they share besides the key and by the
/// selection set they request. The first call of a group schedules a dispatch
/// task that waits for `delay`, then calls the inner field with every key
/// collected so far and hands each caller the element at its key's position.
/// The dispatch does not depend on the first caller, so dropping that caller
/// never stalls the rest of its group. The inner field receives the `root` and
/// `info` of the first caller. Calls without a key are passed through.
pub struct KeyBatcher<F> {
    inner: Arc<F>,
    delay: Duration,
    pending: PendingBatches,
}

impl<F: SourceField + 'static> KeyBatcher<F> {
    pub fn new(inner: F) -> Self {
        Self::with_delay(inner, Duration::from_millis(1))
    }

    pub fn with_delay(inner: F, delay: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            delay,
            pending: Default::default(),
        }
    }
}

fn lock(pending: &PendingBatches) -> MutexGuard<'_, HashMap<String, PendingBatch>> {
    match pending.lock() {
        Ok(pending) => pending,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn dispatch<F: SourceField>(
    inner: Arc<F>,
    pending: PendingBatches,
    group: String,
    delay: Duration,
    mut options: DelegateOptions,
) {
    tokio::time::sleep(delay).await;

    let batch = lock(&pending).remove(&group).unwrap_or_default();
    if let Some(args_from_keys) = options.args_from_keys.take() {
        options.args = args_from_keys.args(batch.keys.clone());
    }
    options.key = None;

    tracing::debug!(keys = batch.keys.len(), "Dispatch key batch.");

    let results = match inner.call(options).await {
        Ok(ConstValue::List(values)) if values.len() == batch.keys.len() => {
            values.into_iter().map(Ok).collect()
        }
        Ok(value) => {
            let message = format!(
                "Expected a list of {} values from the batched call, found '{}'.",
                batch.keys.len(),
                value
            );
            vec![Err(message); batch.waiters.len()]
        }
        Err(err) => vec![Err(err.to_string()); batch.waiters.len()],
    };

    for (waiter, result) in batch.waiters.into_iter().zip(results) {
        let _ = waiter.send(result);
    }
}

#[async_trait::async_trait]
impl<F: SourceField + 'static> SourceField for KeyBatcher<F> {
    async fn call(&self, options: DelegateOptions) -> Result<ConstValue> {
        let (key, group) = match (&options.key, &options.args_from_keys) {
            (Some(key), Some(args_from_keys)) => (
                key.clone(),
                format!(
                    "{} {}",
                    args_from_keys.additional_args(),
                    print_selection_set(&options.selection_set)
                ),
            ),
            _ => return self.inner.call(options).await,
        };

        let (tx, rx) = oneshot::channel();
        let leader = {
            let mut pending = lock(&self.pending);
            let batch = pending.entry(group.clone()).or_default();
            batch.keys.push(key);
            batch.waiters.push(tx);
            batch.keys.len() == 1
        };

        if leader {
            tokio::spawn(dispatch(
                self.inner.clone(),
                self.pending.clone(),
                group,
                self.delay,
                options,
            ));
        }

        match rx.await {
            Ok(result) => result.map_err(anyhow::Error::msg),
            Err(_) => anyhow::bail!("The key batch was dropped before completing."),
        }
    }
}
