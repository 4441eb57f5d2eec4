//! Result conversion with a callback-context completion hook.
//!
//! Internal operations fetch loosely-typed payloads and hand the caller a
//! strongly-typed [`CallResult`]. The conversion itself is just
//! [`CallResult::map`]; what this module adds is the *completion hook*: a
//! closure that observes both the original and the converted result,
//! exactly once, on the callback context, before the converted result is
//! delivered to the awaiting caller. Login and registration use the hook
//! to install the authenticated identity so that by the time the caller
//! sees the result, the session already reflects it.
//!
//! Identity conversion is spelled [`complete`], an explicit call-site
//! choice rather than a runtime type check; logout uses it to clear the
//! signed-in identity through the same hook discipline.

use tether_platform::Dispatcher;
use tether_protocol::CallResult;
use tokio::sync::oneshot;

/// Maps a result's success value; failures pass through untouched.
pub fn convert<A, B>(
    result: CallResult<A>,
    map: impl FnOnce(A) -> B,
) -> CallResult<B> {
    result.map(map)
}

/// Maps a result and runs `on_completed(&original, &converted)` on the
/// callback context before the converted result is returned.
///
/// `map` borrows the success value because the hook still needs the
/// original afterwards. If the dispatcher has shut down the hook is
/// dropped unexecuted and the converted result is delivered anyway.
pub async fn convert_with<A, B, D, M, F>(
    dispatcher: &D,
    result: CallResult<A>,
    map: M,
    on_completed: F,
) -> CallResult<B>
where
    D: Dispatcher,
    A: Send + 'static,
    B: Clone + Send + 'static,
    M: FnOnce(&A) -> B,
    F: FnOnce(&CallResult<A>, &CallResult<B>) + Send + 'static,
{
    let converted = match &result {
        CallResult::Success { value, request_id } => CallResult::Success {
            value: map(value),
            request_id: request_id.clone(),
        },
        CallResult::Failure(fault) => CallResult::Failure(fault.clone()),
    };

    let delivered = converted.clone();
    let (tx, rx) = oneshot::channel();
    dispatcher.dispatch(Box::new(move || {
        on_completed(&result, &converted);
        let _ = tx.send(());
    }));
    // A closed channel means shutdown; the result is still delivered.
    let _ = rx.await;
    delivered
}

/// Runs `on_completed(&result)` on the callback context, then returns the
/// result unchanged.
pub async fn complete<T, D, F>(
    dispatcher: &D,
    result: CallResult<T>,
    on_completed: F,
) -> CallResult<T>
where
    D: Dispatcher,
    T: Clone + Send + 'static,
    F: FnOnce(&CallResult<T>) + Send + 'static,
{
    let delivered = result.clone();
    let (tx, rx) = oneshot::channel();
    dispatcher.dispatch(Box::new(move || {
        on_completed(&result);
        let _ = tx.send(());
    }));
    let _ = rx.await;
    delivered
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tether_platform::InlineDispatcher;
    use tether_protocol::{CallOutcome, ServiceFault};

    fn fault() -> ServiceFault {
        ServiceFault::classify(&CallOutcome::failure(500, "ServiceError"))
            .unwrap()
    }

    #[test]
    fn test_convert_maps_success() {
        let result = CallResult::success(2, Some("req".into()));
        let converted = convert(result, |n| n * 2);
        assert_eq!(converted.value(), Some(&4));
        assert_eq!(converted.request_id(), Some("req"));
    }

    #[tokio::test]
    async fn test_convert_with_runs_hook_exactly_once() {
        let hook_runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hook_runs);

        let result = CallResult::success(21, None);
        let converted = convert_with(
            &InlineDispatcher,
            result,
            |n| n * 2,
            move |original, converted| {
                counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(original.value(), Some(&21));
                assert_eq!(converted.value(), Some(&42));
            },
        )
        .await;

        assert_eq!(converted.value(), Some(&42));
        assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_convert_with_passes_failure_to_hook() {
        let saw_failure = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&saw_failure);

        let result: CallResult<i32> = CallResult::Failure(fault());
        let converted: CallResult<String> = convert_with(
            &InlineDispatcher,
            result,
            |n| n.to_string(),
            move |original, converted| {
                assert!(original.fault().is_some());
                assert!(converted.fault().is_some());
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        assert!(converted.fault().is_some());
        assert_eq!(saw_failure.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_complete_delivers_result_unchanged() {
        let hook_runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hook_runs);

        let result = CallResult::success("pong".to_string(), None);
        let delivered = complete(&InlineDispatcher, result, move |r| {
            assert!(r.is_success());
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert_eq!(delivered.value().map(String::as_str), Some("pong"));
        assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    }
}
