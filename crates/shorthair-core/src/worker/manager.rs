//! Generic supervisor for a group of workers.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::Worker;
use crate::error::FetchError;

/// Runs a homogeneous set of workers concurrently. The first failure cancels
/// the rest; so does cancellation of the parent token.
pub struct WorkerManager {
    name: String,
    workers: Vec<Arc<dyn Worker>>,
}

impl WorkerManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workers: Vec::new(),
        }
    }

    /// Builds a manager holding `count` workers from `factory`, stopping at the
    /// first factory error.
    pub fn with_factory<F>(
        name: impl Into<String>,
        count: usize,
        mut factory: F,
    ) -> Result<Self, FetchError>
    where
        F: FnMut(usize) -> Result<Arc<dyn Worker>, FetchError>,
    {
        let mut manager = Self::new(name);
        manager.workers.reserve(count);
        for index in 0..count {
            manager.add(factory(index)?);
        }
        Ok(manager)
    }

    pub fn add(&mut self, worker: Arc<dyn Worker>) {
        self.workers.push(worker);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> usize {
        self.workers.len()
    }

    pub fn get(&self, index: usize) -> Result<&Arc<dyn Worker>, FetchError> {
        self.workers.get(index).ok_or(FetchError::WorkerIndex {
            index,
            count: self.workers.len(),
        })
    }

    /// Runs every worker on its own task under a child of `parent`.
    ///
    /// Returns `Ok(())` once all workers finish or `parent` is cancelled, or the
    /// first error any worker reports. Either way the remaining workers are
    /// cancelled and joined before this returns. The same result is also sent
    /// on `notify` when one is given.
    pub async fn run(
        &self,
        parent: CancellationToken,
        notify: Option<oneshot::Sender<Result<(), FetchError>>>,
    ) -> Result<(), FetchError> {
        let outcome = self.supervise(&parent).await;
        if let Some(tx) = notify {
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    async fn supervise(&self, parent: &CancellationToken) -> Result<(), FetchError> {
        let count = self.workers.len();
        if count == 0 {
            return Ok(());
        }

        let scope = parent.child_token();
        let mut tasks = JoinSet::new();
        for worker in &self.workers {
            let worker = Arc::clone(worker);
            let cancel = scope.clone();
            tasks.spawn(async move {
                let result = worker.run(cancel).await;
                (worker, result)
            });
        }

        let mut finished = 0usize;
        let outcome = loop {
            tokio::select! {
                _ = parent.cancelled() => {
                    tracing::debug!(manager = %self.name, "parent cancelled");
                    break Ok(());
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((_, Ok(())))) => {
                        finished += 1;
                        if finished == count {
                            break Ok(());
                        }
                    }
                    Some(Ok((worker, Err(e)))) => {
                        tracing::debug!(
                            manager = %self.name,
                            worker = worker.identity(),
                            error = %e,
                            "worker failed"
                        );
                        break Err(e);
                    }
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                },
            }
        };

        scope.cancel();
        while let Some(joined) = tasks.join_next().await {
            if let Ok((worker, Err(e))) = joined {
                tracing::debug!(
                    manager = %self.name,
                    worker = worker.identity(),
                    error = %e,
                    "worker failed during shutdown"
                );
            }
        }

        outcome
    }
}
