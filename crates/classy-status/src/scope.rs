//! Lifecycle scope for background work
//!
//! Every task a status model starts is owned by its scope. Shutting the scope
//! down (explicitly or by dropping it) signals and aborts all of them.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owner of a component's background tasks
///
/// Tasks are spawned on the ambient tokio runtime, so a scope must be used
/// from within one.
#[derive(Debug)]
pub struct Scope {
    name: String,
    shut_down: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scope {
    /// Create a new scope
    pub fn new(name: impl Into<String>) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            name: name.into(),
            shut_down: AtomicBool::new(false),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Scope name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn a task owned by this scope
    ///
    /// The task ends early when the scope shuts down. Returns `false` (and
    /// drops the future) if the scope is already shut down.
    pub fn spawn<F>(&self, task: &'static str, fut: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut handles) = self.handles.lock() else {
            return false;
        };
        if self.is_shut_down() {
            tracing::warn!(scope = %self.name, task, "Scope is shut down, task not started");
            return false;
        }

        handles.retain(|handle| !handle.is_finished());

        let shutdown_rx = self.shutdown_tx.subscribe();
        let scope = self.name.clone();
        tracing::debug!(scope = %scope, task, "Spawning task");
        handles.push(tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signalled(shutdown_rx) => {
                    tracing::debug!(scope = %scope, task, "Task cancelled");
                }
                _ = fut => {}
            }
        }));
        true
    }

    /// Number of tasks that have not finished yet
    pub fn active_tasks(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|handle| !handle.is_finished()).count())
            .unwrap_or(0)
    }

    /// True once [`Scope::shutdown`] has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Cancel every task and refuse new ones
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(true);
        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
        tracing::debug!(scope = %self.name, "Scope shut down");
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn shutdown_signalled(mut shutdown_rx: watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|down| *down).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_runs() {
        let scope = Scope::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let task_counter = Arc::clone(&counter);
        assert!(scope.spawn("increment", async move {
            task_counter.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scope.active_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_tasks() {
        let scope = Scope::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let task_counter = Arc::clone(&counter);
        scope.spawn("slow", async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            task_counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scope.active_tasks(), 1);

        scope.shutdown();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(scope.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_after_shutdown_is_refused() {
        let scope = Scope::new("test");
        scope.shutdown();
        assert!(!scope.spawn("late", async {}));
        assert_eq!(scope.active_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let scope = Scope::new("test");
            let task_counter = Arc::clone(&counter);
            scope.spawn("slow", async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                task_counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
