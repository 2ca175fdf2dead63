//! Bounded worker pool

use crate::crawler::PageFetcher;
use crate::task::{TaskResult, TaskWorker};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

/// Runs tasks concurrently with at most `max_workers` in progress
///
/// Every dispatched pair yields exactly one [`TaskResult`]. Panics inside a
/// task are dead-lettered by the worker itself; a task that is aborted, or
/// whose join fails for any other reason, is reported as
/// [`TaskResult::TransientError`] for the target it was dispatched with.
pub struct ConcurrencyManager<F> {
    worker: Arc<TaskWorker<F>>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<TaskResult>,
    targets: HashMap<Id, String>,
    max_workers: usize,
    closed: bool,
    progress: bool,
}

impl<F> ConcurrencyManager<F>
where
    F: PageFetcher + 'static,
{
    /// Creates a pool; `max_workers` is raised to at least 1
    pub fn new(worker: TaskWorker<F>, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        tracing::info!(max_workers, "Starting worker pool");

        Self {
            worker: Arc::new(worker),
            permits: Arc::new(Semaphore::new(max_workers)),
            tasks: JoinSet::new(),
            targets: HashMap::new(),
            max_workers,
            closed: false,
            progress: false,
        }
    }

    /// Shows a terminal progress bar while collecting results
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Tasks dispatched and not yet collected
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn worker(&self) -> &TaskWorker<F> {
        &self.worker
    }

    /// Dispatches one task
    ///
    /// Returns false, without dispatching, when the target or selector is
    /// empty or the pool has been shut down.
    pub fn submit(&mut self, target: &str, selector: &str) -> bool {
        let target = target.trim().to_string();
        let selector = selector.trim().to_string();

        if self.closed {
            tracing::warn!(%target, "Pool is shut down, not submitting");
            return false;
        }
        if target.is_empty() || selector.is_empty() {
            tracing::warn!(%target, %selector, "Skipping task with empty target or selector");
            return false;
        }

        let worker = Arc::clone(&self.worker);
        let permits = Arc::clone(&self.permits);
        let task_target = target.clone();

        let handle = self.tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return TaskResult::TransientError {
                        target: task_target,
                        error: "Worker pool shut down before the task started".to_string(),
                    }
                }
            };
            worker.run_task(&task_target, &selector).await
        });

        tracing::debug!(%target, "Task submitted");
        self.targets.insert(handle.id(), target);
        true
    }

    /// Waits for every dispatched task and returns their results
    ///
    /// Results arrive in completion order.
    pub async fn collect(&mut self) -> Vec<TaskResult> {
        let total = self.tasks.len();
        let mut results = Vec::with_capacity(total);
        let progress = (self.progress && total > 0).then(|| progress_bar(total));

        while let Some(joined) = self.tasks.join_next_with_id().await {
            let result = match joined {
                Ok((id, result)) => {
                    self.targets.remove(&id);
                    result
                }
                Err(e) => {
                    let target = self.targets.remove(&e.id()).unwrap_or_default();
                    let error = if e.is_panic() {
                        format!("Task panicked: {}", e)
                    } else {
                        format!("Task cancelled: {}", e)
                    };
                    tracing::error!(%target, %error, "Task did not complete");
                    TaskResult::TransientError { target, error }
                }
            };

            tracing::info!(
                done = results.len() + 1,
                total,
                target = %result.target(),
                success = result.is_success(),
                "Task finished"
            );
            if let Some(pb) = &progress {
                pb.set_message(result.target().to_string());
                pb.inc(1);
            }
            results.push(result);
        }

        if let Some(pb) = progress {
            let failed = results.iter().filter(|r| !r.is_success()).count();
            pb.finish_with_message(format!("done, {} failed", failed));
        }

        results
    }

    /// Dispatches every pair and waits for all of them
    pub async fn run_all<I, T, S>(&mut self, pairs: I) -> Vec<TaskResult>
    where
        I: IntoIterator<Item = (T, S)>,
        T: AsRef<str>,
        S: AsRef<str>,
    {
        let submitted = pairs
            .into_iter()
            .filter(|(target, selector)| self.submit(target.as_ref(), selector.as_ref()))
            .count();
        tracing::info!(submitted, "All tasks submitted");

        self.collect().await
    }

    /// Stops accepting work and releases the pool
    ///
    /// With `wait`, in-flight tasks run to completion; otherwise they are
    /// aborted. Results of tasks that had not been collected are returned.
    pub async fn shutdown(&mut self, wait: bool) -> Vec<TaskResult> {
        self.closed = true;

        if !wait {
            tracing::warn!(in_flight = self.tasks.len(), "Aborting in-flight tasks");
            self.permits.close();
            self.tasks.abort_all();
        }

        let results = self.collect().await;
        self.permits.close();
        tracing::info!("Worker pool shut down");
        results
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
