//! Aggregation of independent watch signals
//!
//! An [`Inputs`] value owns one receiver per upstream signal. It hands out a
//! snapshot of all current values and waits until any one of them changes.
//! All receivers are polled in a single `select`, whatever their number.

use async_trait::async_trait;
use classy_domain::{ContentResource, EntitlementSnapshot};
use tokio::sync::watch;

/// A set of upstream signals combined into one snapshot
#[async_trait]
pub trait Inputs: Send + 'static {
    /// Values of every signal at one instant
    type Snapshot: Send;

    /// Read every signal, marking the current values as seen
    fn snapshot(&mut self) -> Self::Snapshot;

    /// Wait until any signal publishes a new value
    ///
    /// Returns `false` once every publisher is gone; a closed signal keeps
    /// its last value in later snapshots.
    async fn changed(&mut self) -> bool;
}

/// Snapshot of everything the subscription resolver reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    /// The four subscription entitlements
    pub entitlements: EntitlementSnapshot,
    /// Content for basic plans
    pub basic_content: Option<ContentResource>,
    /// Content for premium plans
    pub premium_content: Option<ContentResource>,
}

/// Receivers for the six subscription signals
#[derive(Debug)]
pub struct SubscriptionInputs {
    prepaid_basic: watch::Receiver<bool>,
    renewable_basic: watch::Receiver<bool>,
    prepaid_premium: watch::Receiver<bool>,
    renewable_premium: watch::Receiver<bool>,
    basic_content: watch::Receiver<Option<ContentResource>>,
    premium_content: watch::Receiver<Option<ContentResource>>,
    open: [bool; 6],
}

impl SubscriptionInputs {
    /// Combine the six subscription signals
    pub fn new(
        prepaid_basic: watch::Receiver<bool>,
        renewable_basic: watch::Receiver<bool>,
        prepaid_premium: watch::Receiver<bool>,
        renewable_premium: watch::Receiver<bool>,
        basic_content: watch::Receiver<Option<ContentResource>>,
        premium_content: watch::Receiver<Option<ContentResource>>,
    ) -> Self {
        Self {
            prepaid_basic,
            renewable_basic,
            prepaid_premium,
            renewable_premium,
            basic_content,
            premium_content,
            open: [true; 6],
        }
    }
}

#[async_trait]
impl Inputs for SubscriptionInputs {
    type Snapshot = SubscriptionSnapshot;

    fn snapshot(&mut self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            entitlements: EntitlementSnapshot {
                prepaid_basic: *self.prepaid_basic.borrow_and_update(),
                renewable_basic: *self.renewable_basic.borrow_and_update(),
                prepaid_premium: *self.prepaid_premium.borrow_and_update(),
                renewable_premium: *self.renewable_premium.borrow_and_update(),
            },
            basic_content: self.basic_content.borrow_and_update().clone(),
            premium_content: self.premium_content.borrow_and_update().clone(),
        }
    }

    async fn changed(&mut self) -> bool {
        loop {
            // A branch whose publisher is gone is disabled; `else` fires when all are.
            tokio::select! {
                res = self.prepaid_basic.changed(), if self.open[0] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[0] = false,
                },
                res = self.renewable_basic.changed(), if self.open[1] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[1] = false,
                },
                res = self.prepaid_premium.changed(), if self.open[2] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[2] = false,
                },
                res = self.renewable_premium.changed(), if self.open[3] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[3] = false,
                },
                res = self.basic_content.changed(), if self.open[4] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[4] = false,
                },
                res = self.premium_content.changed(), if self.open[5] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[5] = false,
                },
                else => return false,
            }
        }
    }
}

/// Snapshot of everything the one-time product resolver reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeProductSnapshot {
    /// The one-time product is owned
    pub owned: bool,
    /// One-time product content
    pub content: Option<ContentResource>,
}

/// Receivers for the two one-time product signals
#[derive(Debug)]
pub struct OneTimeProductInputs {
    owned: watch::Receiver<bool>,
    content: watch::Receiver<Option<ContentResource>>,
    open: [bool; 2],
}

impl OneTimeProductInputs {
    /// Combine the ownership and content signals
    pub fn new(
        owned: watch::Receiver<bool>,
        content: watch::Receiver<Option<ContentResource>>,
    ) -> Self {
        Self {
            owned,
            content,
            open: [true; 2],
        }
    }
}

#[async_trait]
impl Inputs for OneTimeProductInputs {
    type Snapshot = OneTimeProductSnapshot;

    fn snapshot(&mut self) -> OneTimeProductSnapshot {
        OneTimeProductSnapshot {
            owned: *self.owned.borrow_and_update(),
            content: self.content.borrow_and_update().clone(),
        }
    }

    async fn changed(&mut self) -> bool {
        loop {
            tokio::select! {
                res = self.owned.changed(), if self.open[0] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[0] = false,
                },
                res = self.content.changed(), if self.open[1] => match res {
                    Ok(()) => return true,
                    Err(_) => self.open[1] = false,
                },
                else => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn one_time_inputs() -> (
        watch::Sender<bool>,
        watch::Sender<Option<ContentResource>>,
        OneTimeProductInputs,
    ) {
        let (owned_tx, owned_rx) = watch::channel(false);
        let (content_tx, content_rx) = watch::channel(None);
        (owned_tx, content_tx, OneTimeProductInputs::new(owned_rx, content_rx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reads_current_values() {
        let (owned_tx, content_tx, mut inputs) = one_time_inputs();
        owned_tx.send_replace(true);
        content_tx.send_replace(Some(ContentResource::new("url-otp")));

        let snapshot = inputs.snapshot();
        assert!(snapshot.owned);
        assert_eq!(snapshot.content, Some(ContentResource::new("url-otp")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_input_change_wakes() {
        let (_owned_tx, content_tx, mut inputs) = one_time_inputs();
        inputs.snapshot();

        content_tx.send_replace(Some(ContentResource::new("url-otp")));
        assert!(inputs.changed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_change_keeps_waiting() {
        let (_owned_tx, _content_tx, mut inputs) = one_time_inputs();
        inputs.snapshot();

        let waited = tokio::time::timeout(Duration::from_millis(100), inputs.changed()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_only_when_every_publisher_is_gone() {
        let (owned_tx, content_tx, mut inputs) = one_time_inputs();
        inputs.snapshot();

        drop(owned_tx);
        content_tx.send_replace(Some(ContentResource::new("late")));
        assert!(inputs.changed().await);

        drop(content_tx);
        assert!(!inputs.changed().await);
        assert_eq!(inputs.snapshot().content, Some(ContentResource::new("late")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_snapshot() {
        let (pb_tx, pb) = watch::channel(false);
        let (_rb_tx, rb) = watch::channel(false);
        let (_pp_tx, pp) = watch::channel(false);
        let (rp_tx, rp) = watch::channel(false);
        let (_basic_tx, basic) = watch::channel(None);
        let (premium_tx, premium) = watch::channel(None);
        let mut inputs = SubscriptionInputs::new(pb, rb, pp, rp, basic, premium);

        assert_eq!(inputs.snapshot().entitlements, EntitlementSnapshot::default());

        rp_tx.send_replace(true);
        assert!(inputs.changed().await);
        premium_tx.send_replace(Some(ContentResource::new("url-premium")));
        pb_tx.send_replace(true);

        let snapshot = inputs.snapshot();
        assert!(snapshot.entitlements.prepaid_basic);
        assert!(snapshot.entitlements.renewable_premium);
        assert_eq!(snapshot.premium_content, Some(ContentResource::new("url-premium")));
        assert_eq!(snapshot.basic_content, None);
    }
}
