//! View lifecycle
//!
//! A [`ViewScope`] owns every background loop started for one view. Only
//! the scope can stop them: closing or dropping it cancels its token and
//! nothing it spawned outlives it.

use std::future::Future;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ViewScope {
    name: String,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a task bound to this scope. It receives a token that fires
    /// when the scope closes.
    pub fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task(self.token.child_token()));
        let mut tasks = self.tasks.lock();
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Tasks that have not finished yet
    pub fn active_tasks(&self) -> usize {
        self.tasks.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Cancel every task and wait for them to stop
    pub async fn close(self) {
        self.token.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let count = tasks.len();
        for handle in tasks {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(view = %self.name, "view task panicked");
                }
            }
        }
        debug!(view = %self.name, tasks = count, "view scope closed");
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
        for handle in self.tasks.get_mut().drain(..) {
            handle.abort();
        }
    }
}

/// Holds the single active view. Navigating closes the previous one first.
#[derive(Default)]
pub struct Navigator {
    current: Option<ViewScope>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn navigate(&mut self, name: impl Into<String>) -> &ViewScope {
        self.leave().await;
        self.current.insert(ViewScope::new(name))
    }

    pub fn current(&self) -> Option<&ViewScope> {
        self.current.as_ref()
    }

    pub async fn leave(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.close().await;
        }
    }
}
