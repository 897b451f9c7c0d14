//! Context implementation for request-scoped data and cancellation
//!
//! Every RPC handler derives a child context from the server's root context,
//! so stopping the provider cancels all in-flight work.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};

/// Context carries request-scoped values like cancellation signals, timeouts, and metadata
/// Pass this as first parameter to all async trait methods
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    values: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    done_tx: watch::Sender<bool>,
    parent: Option<Context>,
}

impl Context {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    fn build(parent: Option<Context>, deadline: Option<Instant>) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline,
                values: RwLock::new(HashMap::new()),
                done_tx,
                parent,
            }),
        }
    }

    /// Derive a context that is cancelled with its parent
    pub fn child(&self) -> Self {
        Self::build(Some(self.clone()), self.inner.deadline)
    }

    /// Derive a context that is also cancelled once the timeout elapses
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self::build(Some(self), Some(deadline))
    }

    pub async fn with_value<T: Send + Sync + 'static>(self, key: &str, value: T) -> Self {
        self.inner
            .values
            .write()
            .await
            .insert(key.to_string(), Arc::new(value));
        self
    }

    /// Looks the key up here first, then in the ancestors
    pub async fn get_value<T>(&self, key: &str) -> Option<T>
    where
        T: Send + Sync + Clone + 'static,
    {
        let mut current = Some(self);
        while let Some(ctx) = current {
            let values = ctx.inner.values.read().await;
            if let Some(value) = values.get(key) {
                return value.downcast_ref::<T>().cloned();
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    pub fn is_cancelled(&self) -> bool {
        if *self.inner.done_tx.borrow() {
            return true;
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.inner
            .parent
            .as_ref()
            .is_some_and(Context::is_cancelled)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Subscribe to explicit cancellation of this context
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done_tx.subscribe()
    }

    pub fn cancel(&self) {
        self.inner.done_tx.send_replace(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
