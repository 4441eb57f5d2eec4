//! The callback-thread dispatcher: one logical context for user-facing work.
//!
//! Events, login prompts, and result-completion hooks must all run on the
//! same logical context so the embedding application observes them in a
//! single, predictable place (a UI thread, an actor, a test recorder).
//! The pipeline *awaits* some dispatched work (fault-policy decisions), so
//! the dispatcher must eventually execute every action, including actions
//! dispatched from within another dispatched action.

/// A unit of work handed to the dispatcher.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Marshals actions onto the callback context.
///
/// # Contract
///
/// - Every dispatched action is eventually executed.
/// - Dispatching from inside a running action must not deadlock
///   (reentrancy-safe): the action is queued, not run inline on top of the
///   current one, except in test dispatchers that document otherwise.
pub trait Dispatcher: Send + Sync + 'static {
    /// Queues `action` for execution on the callback context.
    fn dispatch(&self, action: Action);
}

// ---------------------------------------------------------------------------
// CallbackThread
// ---------------------------------------------------------------------------

/// The standard dispatcher: a dedicated tokio task draining a queue.
///
/// Actions run strictly in dispatch order on one task, which gives the
/// "single logical callback thread" the event contract requires without
/// pinning an OS thread. Dropping every clone closes the queue and ends
/// the task.
#[derive(Clone)]
pub struct CallbackThread {
    tx: tokio::sync::mpsc::UnboundedSender<Action>,
}

impl CallbackThread {
    /// Spawns the callback task. Must be called from within a tokio
    /// runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) =
            tokio::sync::mpsc::unbounded_channel::<Action>();
        tokio::spawn(async move {
            while let Some(action) = rx.recv().await {
                action();
            }
            tracing::debug!("callback thread drained and closed");
        });
        Self { tx }
    }
}

impl Dispatcher for CallbackThread {
    fn dispatch(&self, action: Action) {
        // A closed queue means the client is shutting down; dropping the
        // action is the correct behavior then.
        if self.tx.send(action).is_err() {
            tracing::debug!("dispatch after shutdown; action dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// InlineDispatcher
// ---------------------------------------------------------------------------

/// Runs every action immediately on the calling task.
///
/// For tests and synchronous embeddings. Reentrancy here means plain
/// nested calls, so actions must not assume they run *after* the current
/// one returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, action: Action) {
        action();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_dispatcher_runs_immediately() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        InlineDispatcher.dispatch(Box::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_callback_thread_runs_actions_in_order() {
        let thread = CallbackThread::spawn();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        for i in 0..3 {
            let log = Arc::clone(&log);
            thread.dispatch(Box::new(move || {
                log.lock().unwrap().push(i);
            }));
        }
        thread.dispatch(Box::new(move || {
            let _ = done_tx.send(());
        }));

        done_rx.await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_callback_thread_is_reentrant_safe() {
        // An action that dispatches another action must not deadlock, and
        // the nested action must eventually run.
        let thread = CallbackThread::spawn();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let inner_thread = thread.clone();
        thread.dispatch(Box::new(move || {
            inner_thread.dispatch(Box::new(move || {
                let _ = done_tx.send(());
            }));
        }));

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            done_rx,
        )
        .await
        .expect("nested action should run")
        .unwrap();
    }
}
