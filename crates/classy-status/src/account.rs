//! Signed-in user tracking
//!
//! The session re-reads the injected [`AccountProvider`] when told that a
//! sign-in or sign-out completed. Consumers watch the user value to keep
//! their view current; the separate change stream fires only when the user
//! id actually differs and drives the backend re-registration.

use crate::identity::AccountProvider;
use classy_domain::UserAccount;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

/// A change of signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChange {
    /// Uid before the change
    pub previous: Option<String>,
    /// Uid after the change
    pub current: Option<String>,
}

/// Tracks the signed-in user
pub struct AccountSession {
    provider: Arc<dyn AccountProvider>,
    user: watch::Sender<Option<UserAccount>>,
    changes_tx: mpsc::UnboundedSender<UserChange>,
    changes_rx: Mutex<Option<mpsc::UnboundedReceiver<UserChange>>>,
}

impl AccountSession {
    /// Create a session and read the provider once
    ///
    /// A user already signed in at this point counts as a change, so the
    /// follower of [`AccountSession::take_user_changes`] sees it even if it
    /// subscribes later.
    pub fn new(provider: Arc<dyn AccountProvider>) -> Self {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let session = Self {
            provider,
            user: watch::channel(None).0,
            changes_tx,
            changes_rx: Mutex::new(Some(changes_rx)),
        };
        session.update_user();
        session
    }

    /// Re-read the provider; call when sign-in or sign-out completes
    ///
    /// Returns the change if the uid differs from the previous read.
    pub fn update_user(&self) -> Option<UserChange> {
        let new_user = self.provider.current_user();
        let previous = self.user.borrow().as_ref().map(|user| user.uid.clone());

        let change = if UserAccount::same_user(self.user.borrow().as_ref(), new_user.as_ref()) {
            None
        } else {
            Some(UserChange {
                previous,
                current: new_user.as_ref().map(|user| user.uid.clone()),
            })
        };

        match &new_user {
            Some(user) => tracing::debug!(uid = %user.uid, email = ?user.email, "Current user"),
            None => tracing::debug!("No user signed in"),
        }
        self.user.send_replace(new_user);

        if let Some(change) = &change {
            // Nobody may be following yet; the change is buffered until taken
            let _ = self.changes_tx.send(change.clone());
        }
        change
    }

    /// True if a user is signed in
    pub fn is_signed_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// The signed-in user
    pub fn current_user(&self) -> Option<UserAccount> {
        self.user.borrow().clone()
    }

    /// Watch the user value; updated on every [`AccountSession::update_user`]
    pub fn watch_user(&self) -> watch::Receiver<Option<UserAccount>> {
        self.user.subscribe()
    }

    /// Take the user change stream
    ///
    /// Each change is delivered once, to a single follower. Returns `None`
    /// after the first call.
    pub fn take_user_changes(&self) -> Option<mpsc::UnboundedReceiver<UserChange>> {
        self.changes_rx.lock().ok().and_then(|mut rx| rx.take())
    }
}
