//! Injected identity providers
//!
//! Auth and push-messaging state are reached only through these traits, so
//! callers choose the backing service (or a fixed value in tests).

use crate::error::StatusError;
use async_trait::async_trait;
use classy_domain::UserAccount;
use std::sync::Mutex;

/// Reports the currently signed-in user
pub trait AccountProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<UserAccount>;
}

/// Reports the current push (instance-id) token
#[async_trait]
pub trait PushTokenSource: Send + Sync {
    /// Fetch the token; `Ok(None)` when none has been issued yet
    async fn current_token(&self) -> Result<Option<String>, StatusError>;
}

/// Account provider backed by a value the caller sets
#[derive(Debug, Default)]
pub struct StaticAccountProvider {
    user: Mutex<Option<UserAccount>>,
}

impl StaticAccountProvider {
    /// Create a provider, optionally already signed in
    pub fn new(user: Option<UserAccount>) -> Self {
        Self {
            user: Mutex::new(user),
        }
    }

    /// Report `user` as signed in from now on
    pub fn sign_in(&self, user: UserAccount) {
        if let Ok(mut current) = self.user.lock() {
            *current = Some(user);
        }
    }

    /// Report no signed-in user from now on
    pub fn sign_out(&self) {
        if let Ok(mut current) = self.user.lock() {
            *current = None;
        }
    }
}

impl AccountProvider for StaticAccountProvider {
    fn current_user(&self) -> Option<UserAccount> {
        self.user.lock().ok().and_then(|user| user.clone())
    }
}

/// Push token source backed by a value the caller sets
#[derive(Debug)]
pub struct StaticPushToken {
    token: Mutex<Result<Option<String>, String>>,
}

impl StaticPushToken {
    /// Source that reports `token`
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(Ok(token)),
        }
    }

    /// Source whose fetches fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Err(message.into())),
        }
    }

    /// Replace the reported token
    pub fn set(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.lock() {
            *current = Ok(token);
        }
    }
}

#[async_trait]
impl PushTokenSource for StaticPushToken {
    async fn current_token(&self) -> Result<Option<String>, StatusError> {
        let token = self
            .token
            .lock()
            .map_err(|_| StatusError::PushToken("token lock poisoned".to_string()))?
            .clone();
        token.map_err(StatusError::PushToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_account_provider() {
        let provider = StaticAccountProvider::default();
        assert!(provider.current_user().is_none());

        provider.sign_in(UserAccount::new("uid-1"));
        assert_eq!(provider.current_user().map(|u| u.uid), Some("uid-1".to_string()));

        provider.sign_out();
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_static_push_token() {
        let source = StaticPushToken::new(Some("token-1".to_string()));
        assert_eq!(source.current_token().await.unwrap(), Some("token-1".to_string()));

        source.set(None);
        assert_eq!(source.current_token().await.unwrap(), None);

        let failing = StaticPushToken::failing("messaging unavailable");
        assert!(matches!(failing.current_token().await, Err(StatusError::PushToken(_))));
    }
}
