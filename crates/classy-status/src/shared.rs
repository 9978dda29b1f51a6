//! Shared, replaying state derived from a set of inputs
//!
//! A [`SharedState`] keeps the latest value computed from its inputs. Every
//! subscriber sees that value immediately and is woken on each new one.
//! Equal consecutive values are not republished.
//!
//! # Lifecycle under [`SharingPolicy::WhileSubscribed`]
//!
//! | Event | Effect |
//! |-------|--------|
//! | First subscriber arrives | Fresh inputs opened, computation starts |
//! | Subscriber count drops to zero | Stop timer starts |
//! | Subscriber arrives before the timer fires | Timer cancelled, computation continues |
//! | Timer fires | Computation stops; last value stays readable |
//! | Next subscriber arrives | Sees the retained value, computation restarts |

use crate::config::SharingPolicy;
use crate::error::StatusError;
use crate::inputs::Inputs;
use crate::scope::Scope;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Counters describing a shared state's computation
#[derive(Debug, Default)]
struct SharingStats {
    starts: AtomicUsize,
    stops: AtomicUsize,
    recomputations: AtomicUsize,
}

/// Latest value derived from a set of inputs, shared among subscribers
pub struct SharedState<T> {
    value: Arc<watch::Sender<T>>,
    subscribers: Arc<watch::Sender<usize>>,
    stats: Arc<SharingStats>,
}

impl<T> SharedState<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start sharing the value `transform` derives from the inputs `open` yields
    ///
    /// `open` is called each time computation (re)starts, so every run reads
    /// fresh receivers. The supervising task belongs to `scope` and ends
    /// with it.
    pub fn launch<I, O, F>(
        scope: &Scope,
        policy: SharingPolicy,
        initial: T,
        open: O,
        transform: F,
    ) -> Self
    where
        I: Inputs,
        O: Fn() -> I + Send + Sync + 'static,
        F: Fn(I::Snapshot) -> T + Send + Sync + 'static,
    {
        let (value, _) = watch::channel(initial);
        let value = Arc::new(value);
        let (subscribers, subscribers_rx) = watch::channel(0usize);
        let subscribers = Arc::new(subscribers);
        let stats = Arc::new(SharingStats::default());

        scope.spawn(
            "shared-state",
            supervise(
                policy,
                Arc::clone(&value),
                subscribers_rx,
                open,
                transform,
                Arc::clone(&stats),
            ),
        );

        Self {
            value,
            subscribers,
            stats,
        }
    }

    /// Subscribe to the value
    ///
    /// The subscription counts as an observer until it is dropped.
    pub fn subscribe(&self) -> StateSubscription<T> {
        let receiver = self.value.subscribe();
        self.subscribers.send_modify(|count| *count += 1);
        StateSubscription {
            receiver,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    /// The latest value, without subscribing
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        *self.subscribers.borrow()
    }

    /// How many times computation has started
    pub fn starts(&self) -> usize {
        self.stats.starts.load(Ordering::SeqCst)
    }

    /// How many times computation has stopped after its stop timeout
    pub fn stops(&self) -> usize {
        self.stats.stops.load(Ordering::SeqCst)
    }

    /// How many snapshots have been transformed
    pub fn recomputations(&self) -> usize {
        self.stats.recomputations.load(Ordering::SeqCst)
    }
}

/// An observer of a [`SharedState`]
pub struct StateSubscription<T> {
    receiver: watch::Receiver<T>,
    subscribers: Arc<watch::Sender<usize>>,
}

impl<T: Clone> StateSubscription<T> {
    /// The latest value
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published value
    pub async fn changed(&mut self) -> Result<T, StatusError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StatusError::SourceClosed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the value satisfies `predicate` (checks the current value first)
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&T) -> bool,
    ) -> Result<T, StatusError> {
        let value = self
            .receiver
            .wait_for(predicate)
            .await
            .map_err(|_| StatusError::SourceClosed)?;
        Ok(value.clone())
    }
}

impl<T> Drop for StateSubscription<T> {
    fn drop(&mut self) {
        self.subscribers
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

async fn supervise<T, I, O, F>(
    policy: SharingPolicy,
    value: Arc<watch::Sender<T>>,
    mut subscribers: watch::Receiver<usize>,
    open: O,
    transform: F,
    stats: Arc<SharingStats>,
) where
    T: PartialEq + Send + Sync,
    I: Inputs,
    O: Fn() -> I,
    F: Fn(I::Snapshot) -> T,
{
    let stop_timeout = match policy {
        SharingPolicy::Eagerly => {
            stats.starts.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Starting eager computation");
            drive(open(), &transform, &value, &stats).await;
            tracing::debug!("Inputs closed, eager computation finished");
            return;
        }
        SharingPolicy::WhileSubscribed { stop_timeout } => stop_timeout,
    };

    loop {
        if !wait_until(&mut subscribers, |count| count > 0).await {
            return;
        }

        stats.starts.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Subscriber arrived, starting computation");

        let upstream = drive(open(), &transform, &value, &stats);
        tokio::pin!(upstream);

        let finished = tokio::select! {
            _ = &mut upstream => true,
            alive = idle_expired(&mut subscribers, stop_timeout) => {
                if !alive {
                    return;
                }
                false
            }
        };
        if finished {
            tracing::debug!("Inputs closed, keeping last value");
            if !idle_expired(&mut subscribers, stop_timeout).await {
                return;
            }
        }

        stats.stops.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(?stop_timeout, "No subscribers left, computation stopped");
    }
}

async fn drive<T, I, F>(mut inputs: I, transform: &F, value: &watch::Sender<T>, stats: &SharingStats)
where
    T: PartialEq,
    I: Inputs,
    F: Fn(I::Snapshot) -> T,
{
    loop {
        let next = transform(inputs.snapshot());
        stats.recomputations.fetch_add(1, Ordering::SeqCst);
        value.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        if !inputs.changed().await {
            return;
        }
    }
}

/// Resolves `true` once the count has stayed at zero for `stop_timeout`,
/// `false` if the subscription channel closed.
async fn idle_expired(subscribers: &mut watch::Receiver<usize>, stop_timeout: Duration) -> bool {
    loop {
        if !wait_until(subscribers, |count| count == 0).await {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(stop_timeout) => return true,
            alive = wait_until(subscribers, |count| count > 0) => {
                if !alive {
                    return false;
                }
            }
        }
    }
}

async fn wait_until(subscribers: &mut watch::Receiver<usize>, predicate: impl Fn(usize) -> bool) -> bool {
    loop {
        if predicate(*subscribers.borrow_and_update()) {
            return true;
        }
        if subscribers.changed().await.is_err() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Counter {
        rx: watch::Receiver<u32>,
    }

    #[async_trait]
    impl Inputs for Counter {
        type Snapshot = u32;

        fn snapshot(&mut self) -> u32 {
            *self.rx.borrow_and_update()
        }

        async fn changed(&mut self) -> bool {
            self.rx.changed().await.is_ok()
        }
    }

    fn launch(scope: &Scope, policy: SharingPolicy, tx: &watch::Sender<u32>) -> SharedState<u32> {
        let source = tx.subscribe();
        SharedState::launch(
            scope,
            policy,
            0,
            move || Counter { rx: source.clone() },
            |n| n * 10,
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_eager_computes_without_subscribers() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::Eagerly, &tx);

        settle().await;
        assert_eq!(state.value(), 10);

        tx.send_replace(2);
        settle().await;
        assert_eq!(state.value(), 20);
        assert_eq!(state.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_while_subscribed_waits_for_first_subscriber() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::while_subscribed_ms(5000), &tx);

        settle().await;
        assert_eq!(state.value(), 0);
        assert_eq!(state.starts(), 0);

        let mut sub = state.subscribe();
        assert_eq!(sub.wait_for(|v| *v == 10).await.unwrap(), 10);
        assert_eq!(state.starts(), 1);
        assert_eq!(state.subscriber_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_timeout_and_replays_last_value() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::while_subscribed_ms(5000), &tx);

        let mut sub = state.subscribe();
        sub.wait_for(|v| *v == 10).await.unwrap();
        drop(sub);
        assert_eq!(state.subscriber_count(), 0);

        // Still computing inside the grace window
        tokio::time::sleep(Duration::from_secs(4)).await;
        tx.send_replace(2);
        settle().await;
        assert_eq!(state.value(), 20);
        assert_eq!(state.stops(), 0);

        // Past the window: computation stops, value is retained
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(state.stops(), 1);
        tx.send_replace(3);
        settle().await;
        assert_eq!(state.value(), 20);

        // A new subscriber sees the retained value, then a fresh computation
        let mut sub = state.subscribe();
        assert_eq!(sub.current(), 20);
        assert_eq!(sub.wait_for(|v| *v == 30).await.unwrap(), 30);
        assert_eq!(state.starts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_inside_window_keeps_running() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::while_subscribed_ms(5000), &tx);

        let mut sub = state.subscribe();
        sub.wait_for(|v| *v == 10).await.unwrap();
        drop(sub);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let _sub = state.subscribe();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(state.starts(), 1);
        assert_eq!(state.stops(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_values_are_not_republished() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::Eagerly, &tx);

        let mut sub = state.subscribe();
        sub.wait_for(|v| *v == 10).await.unwrap();
        let before = state.recomputations();

        tx.send_replace(1);
        settle().await;
        assert_eq!(state.recomputations(), before + 1);

        let waited = tokio::time::timeout(Duration::from_millis(100), sub.changed()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_survives_closed_inputs() {
        let scope = Scope::new("test");
        let (tx, rx) = watch::channel(4);
        let state = SharedState::launch(
            &scope,
            SharingPolicy::Eagerly,
            0,
            move || Counter { rx: rx.clone() },
            |n| n + 1,
        );

        settle().await;
        drop(tx);
        settle().await;
        assert_eq!(state.value(), 5);
        assert_eq!(scope.active_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_shutdown_stops_computation() {
        let scope = Scope::new("test");
        let (tx, _rx) = watch::channel(1);
        let state = launch(&scope, SharingPolicy::Eagerly, &tx);
        settle().await;

        scope.shutdown();
        tx.send_replace(7);
        settle().await;
        assert_eq!(state.value(), 10);
    }
}
