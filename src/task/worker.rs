//! Single-target task execution

use crate::config::{Config, OutputConfig};
use crate::crawler::{FetchError, HttpFetcher, Navigator, PageFetcher};
use crate::output::{render_tree, AtomicWriter, DeadLetterEntry, DeadLetterLog};
use crate::task::TaskResult;
use crate::url::output_path_for;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

/// Crawls, renders and stores the navigation map of one target
///
/// Failures never escape [`TaskWorker::run_task`]: they are classified into
/// a [`TaskResult`] and recorded in the dead-letter log. This includes a
/// panic raised while crawling or rendering.
#[derive(Debug)]
pub struct TaskWorker<F> {
    navigator: Navigator<F>,
    writer: Arc<AtomicWriter>,
    dead_letters: Arc<DeadLetterLog>,
    output_dir: PathBuf,
    file_suffix: String,
}

impl TaskWorker<HttpFetcher> {
    /// Creates a worker that fetches over HTTP
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config.crawler)?;
        Ok(Self::new(Navigator::new(fetcher), &config.output))
    }
}

impl<F: PageFetcher> TaskWorker<F> {
    pub fn new(navigator: Navigator<F>, output: &OutputConfig) -> Self {
        Self {
            navigator,
            writer: Arc::new(AtomicWriter::from_config(output)),
            dead_letters: Arc::new(DeadLetterLog::new(output.dead_letter_path.clone())),
            output_dir: output.output_dir.clone(),
            file_suffix: output.file_suffix.clone(),
        }
    }

    pub fn navigator(&self) -> &Navigator<F> {
        &self.navigator
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dead_letter_path(&self) -> &Path {
        self.dead_letters.path()
    }

    /// Where the map for `target` is written
    pub fn output_path(&self, target: &str) -> PathBuf {
        output_path_for(&self.output_dir, target, &self.file_suffix)
    }

    /// Runs one task to completion
    ///
    /// # Returns
    ///
    /// * `TaskResult::Success` - The map was written
    /// * `TaskResult::DeadLettered` - The crawl or the write failed, or the
    ///   task panicked; an entry was appended to the dead-letter log
    pub async fn run_task(&self, target: &str, selector: &str) -> TaskResult {
        let span = tracing::info_span!("task", target = %target);
        async {
            match AssertUnwindSafe(self.run_task_inner(target, selector))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(&*payload);
                    tracing::error!(panic = %message, "Task panicked");
                    self.dead_letter(target, selector, format!("Task panicked: {}", message))
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_task_inner(&self, target: &str, selector: &str) -> TaskResult {
        tracing::info!(selector = %selector, "Starting navigation crawl");

        let tree = match self.navigator.crawl(target, selector).await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!(error = %e, "Crawl failed");
                return self.dead_letter(target, selector, e.to_string()).await;
            }
        };

        let content = render_tree(Some(&tree));
        let output_path = self.output_path(target);

        let writer = Arc::clone(&self.writer);
        let path = output_path.clone();
        let written = tokio::task::spawn_blocking(move || writer.write(&path, &content)).await;

        let error = match written {
            Ok(Ok(())) => {
                tracing::info!(
                    path = %output_path.display(),
                    pages = tree.len(),
                    "Navigation map written"
                );
                return TaskResult::Success {
                    target: target.to_string(),
                    output_path,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("Write task for {} did not complete: {}", output_path.display(), e),
        };

        tracing::error!(error = %error, "Failed to write navigation map");
        self.dead_letter(target, selector, format!("Failed to write output file: {}", error))
            .await
    }

    /// Records a permanent failure; append errors are only logged
    async fn dead_letter(&self, target: &str, selector: &str, error: String) -> TaskResult {
        let entry = DeadLetterEntry::new(target, selector, error.clone());
        let log = Arc::clone(&self.dead_letters);

        match tokio::task::spawn_blocking(move || log.append(&entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to record dead letter"),
            Err(e) => tracing::error!(error = %e, "Dead-letter append did not complete"),
        }

        TaskResult::DeadLettered {
            target: target.to_string(),
            error,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::EMPTY_TREE_MESSAGE;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    impl StaticFetcher {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
            match self.pages.get(url) {
                Some(html) => Ok(Some(html.clone())),
                None => Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: 1,
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }

    #[derive(Debug)]
    struct PanickingFetcher;

    impl PageFetcher for PanickingFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
            panic!("fetcher exploded on {}", url);
        }
    }

    fn output_config(dir: &Path) -> OutputConfig {
        OutputConfig {
            output_dir: dir.join("maps"),
            dead_letter_path: dir.join("dlq.log"),
            ..OutputConfig::default()
        }
    }

    fn dead_letter_lines(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("dlq.log"))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_successful_task_writes_map() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::default().page(
            "https://a.example/",
            r#"<nav><a href="/about">About</a><a href="/contact">Contact</a></nav>"#,
        );
        let worker = TaskWorker::new(Navigator::new(fetcher), &output_config(dir.path()));

        let result = worker.run_task("https://a.example/", "nav").await;

        let expected_path = dir.path().join("maps").join("a_example_nav_map.md");
        assert_eq!(
            result,
            TaskResult::Success {
                target: "https://a.example/".to_string(),
                output_path: expected_path.clone(),
            }
        );
        let content = fs::read_to_string(expected_path).unwrap();
        assert!(content.starts_with("https://a.example/\n"));
        assert!(content.contains("├── https://a.example/about"));
        assert!(content.contains("└── https://a.example/contact"));
        assert!(dead_letter_lines(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_root_only_map_is_a_success() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::default().page("https://a.example/docs/", "<p>no nav</p>");
        let worker = TaskWorker::new(Navigator::new(fetcher), &output_config(dir.path()));

        let result = worker.run_task("https://a.example/docs/", "nav").await;

        assert!(result.is_success());
        let path = dir.path().join("maps").join("a_example_docs_nav_map.md");
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "https://a.example/docs/");
        assert_ne!(content, EMPTY_TREE_MESSAGE);
    }

    #[tokio::test]
    async fn test_root_failure_is_dead_lettered() {
        let dir = TempDir::new().unwrap();
        let worker = TaskWorker::new(
            Navigator::new(StaticFetcher::default()),
            &output_config(dir.path()),
        );

        let result = worker.run_task("https://down.example/", "#nav").await;

        assert!(matches!(result, TaskResult::DeadLettered { .. }));
        let lines = dead_letter_lines(dir.path());
        assert_eq!(lines.len(), 1);
        let entry: DeadLetterEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(entry.url, "https://down.example/");
        assert_eq!(entry.css_selector, "#nav");
        assert!(!dir.path().join("maps").join("down_example_nav_map.md").exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_dead_lettered() {
        let dir = TempDir::new().unwrap();
        let config = output_config(dir.path());
        let fetcher = StaticFetcher::default().page("https://a.example/", "<nav></nav>");
        let worker = TaskWorker::new(Navigator::new(fetcher), &config);

        // A fresh lock held by someone else
        fs::create_dir_all(&config.output_dir).unwrap();
        let lock = config.output_dir.join("a_example_nav_map.md.lock");
        fs::write(&lock, "").unwrap();

        let result = worker.run_task("https://a.example/", "nav").await;

        match result {
            TaskResult::DeadLettered { error, .. } => {
                assert!(error.contains("Failed to write output file"), "{}", error)
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(dead_letter_lines(dir.path()).len(), 1);
        assert!(lock.exists());
    }

    #[tokio::test]
    async fn test_dead_letter_append_failure_keeps_classification() {
        let dir = TempDir::new().unwrap();
        let config = OutputConfig {
            output_dir: dir.path().join("maps"),
            // A directory cannot be appended to
            dead_letter_path: dir.path().to_path_buf(),
            ..OutputConfig::default()
        };
        let worker = TaskWorker::new(Navigator::new(StaticFetcher::default()), &config);

        let result = worker.run_task("https://down.example/", "#nav").await;
        assert!(matches!(result, TaskResult::DeadLettered { .. }));
    }

    #[tokio::test]
    async fn test_panicking_crawl_is_dead_lettered() {
        let dir = TempDir::new().unwrap();
        let worker = Arc::new(TaskWorker::new(
            Navigator::new(PanickingFetcher),
            &output_config(dir.path()),
        ));

        // Spawned like the manager does, so the join result shows whether the
        // panic escaped the worker
        let task_worker = Arc::clone(&worker);
        let result = tokio::spawn(async move {
            task_worker.run_task("https://boom.example/", "nav").await
        })
        .await
        .unwrap();

        match result {
            TaskResult::DeadLettered { target, error } => {
                assert_eq!(target, "https://boom.example/");
                assert!(error.contains("Task panicked"), "{}", error);
                assert!(error.contains("fetcher exploded"), "{}", error);
            }
            other => panic!("unexpected result {:?}", other),
        }
        let lines = dead_letter_lines(dir.path());
        assert_eq!(lines.len(), 1);
        let entry: DeadLetterEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(entry.url, "https://boom.example/");
        assert_eq!(entry.css_selector, "nav");
    }

    #[test]
    fn test_panic_message_variants() {
        let borrowed: Box<dyn Any + Send> = Box::new("static message");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let other: Box<dyn Any + Send> = Box::new(42u32);

        assert_eq!(panic_message(&*borrowed), "static message");
        assert_eq!(panic_message(&*owned), "owned message");
        assert_eq!(panic_message(&*other), "unknown panic payload");
    }
}
