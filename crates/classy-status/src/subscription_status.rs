//! Subscription status model
//!
//! Binds the repository's subscription signals to one shared
//! [`SubscriptionUiState`] and exposes the fire-and-forget operations the
//! presentation layer triggers (refresh, purchase registration, user change).

use crate::account::AccountSession;
use crate::config::StatusConfig;
use crate::error::{publish_error, RepositoryError};
use crate::identity::PushTokenSource;
use crate::inputs::SubscriptionSnapshot;
use crate::repository::BillingRepository;
use crate::scope::Scope;
use crate::shared::{SharedState, StateSubscription};
use classy_domain::{resolve_subscription_state, CurrentSubscription, SubscriptionUiState};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Resolve one subscription snapshot, logging the cases worth a trace
fn resolve(snapshot: SubscriptionSnapshot) -> SubscriptionUiState {
    let state = resolve_subscription_state(
        snapshot.entitlements,
        snapshot.basic_content.as_ref(),
        snapshot.premium_content.as_ref(),
    );

    match state.current() {
        Some(CurrentSubscription::None) => tracing::debug!("No subscription held"),
        Some(winner) if snapshot.entitlements.overlapping() => tracing::debug!(
            held = snapshot.entitlements.held(),
            %winner,
            "Overlapping entitlements reported"
        ),
        _ => {}
    }
    state
}

/// State the background operations share with the model
struct Operations {
    repository: Arc<dyn BillingRepository>,
    push_tokens: Arc<dyn PushTokenSource>,
    error_message: watch::Sender<Option<String>>,
    instance_id_token: Mutex<Option<String>>,
}

impl Operations {
    fn publish_error(&self, message: String) {
        publish_error(&self.error_message, message);
    }

    fn remembered_token(&self) -> Option<String> {
        self.instance_id_token.lock().ok().and_then(|token| token.clone())
    }

    async fn user_changed(&self) {
        self.repository.delete_local_user_data().await;

        let token = match self.push_tokens.current_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Fetching push registration token failed: {}", e);
                return;
            }
        };

        if let Some(token) = token {
            if let Err(e) = self.repository.register_instance_id(&token).await {
                tracing::error!("Registering push token failed: {}", e);
            }
            // Remembered even on failure so sign-out can still unregister it
            if let Ok(mut remembered) = self.instance_id_token.lock() {
                *remembered = Some(token);
            }
        }
    }
}

/// Subscription status for the signed-in user
///
/// Must be created inside a tokio runtime. Dropping the model (or calling
/// [`SubscriptionStatus::close`]) cancels every task it started.
///
/// # Examples
///
/// ```
/// use classy_domain::{ContentResource, CurrentSubscription, Entitlement, ProductTier};
/// use classy_status::{InMemoryBillingRepository, StaticPushToken, StatusConfig, SubscriptionStatus};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = Arc::new(InMemoryBillingRepository::new());
/// let status = SubscriptionStatus::new(
///     repository.clone(),
///     Arc::new(StaticPushToken::new(None)),
///     &StatusConfig::default(),
/// );
///
/// let mut state = status.state();
/// repository.set_tier_content(ProductTier::Basic, Some(ContentResource::new("url-A")));
/// repository.set_entitlement(Entitlement::RenewableBasic, true);
///
/// let resolved = state
///     .wait_for(|s| s.current() == Some(CurrentSubscription::BasicRenewable))
///     .await?;
/// assert_eq!(resolved.content().map(|c| c.url()), Some("url-A"));
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionStatus {
    operations: Arc<Operations>,
    state: SharedState<SubscriptionUiState>,
    scope: Scope,
}

impl SubscriptionStatus {
    /// Create the model and start sharing its state
    pub fn new(
        repository: Arc<dyn BillingRepository>,
        push_tokens: Arc<dyn PushTokenSource>,
        config: &StatusConfig,
    ) -> Self {
        let scope = Scope::new("subscription-status");

        let source = Arc::clone(&repository);
        let state = SharedState::launch(
            &scope,
            config.subscription_policy(),
            SubscriptionUiState::Loading,
            move || source.subscription_inputs(),
            resolve,
        );

        let (error_message, _) = watch::channel(None);
        Self {
            operations: Arc::new(Operations {
                repository,
                push_tokens,
                error_message,
                instance_id_token: Mutex::new(None),
            }),
            state,
            scope,
        }
    }

    /// Subscribe to the resolved state
    pub fn state(&self) -> StateSubscription<SubscriptionUiState> {
        self.state.subscribe()
    }

    /// The latest resolved state
    pub fn current_state(&self) -> SubscriptionUiState {
        self.state.value()
    }

    /// The shared state, for diagnostics
    pub fn shared_state(&self) -> &SharedState<SubscriptionUiState> {
        &self.state
    }

    /// Error side channel set by failed one-shot operations
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.operations.error_message.subscribe()
    }

    /// Scope owning this model's tasks
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Ask the repository to re-fetch products and subscriptions
    ///
    /// The state follows transitively once the repository updates its
    /// signals. A failed subscription fetch lands on the error channel.
    pub fn manual_refresh(&self) {
        let operations = Arc::clone(&self.operations);
        self.scope.spawn("query_products", async move {
            if let Err(e) = operations.repository.query_products().await {
                tracing::warn!("Querying products failed: {}", e);
            }
        });

        let operations = Arc::clone(&self.operations);
        self.scope.spawn("fetch_subscriptions", async move {
            if let Err(e) = operations.repository.fetch_subscriptions().await {
                tracing::error!("Fetching subscriptions failed: {}", e);
                operations.publish_error(e.to_string());
            }
        });
    }

    /// Register a new subscription purchase with the backend
    pub fn register_subscription(&self, product: impl Into<String>, purchase_token: impl Into<String>) {
        let operations = Arc::clone(&self.operations);
        let product = product.into();
        let purchase_token = purchase_token.into();
        self.scope.spawn("register_subscription", async move {
            tracing::info!(%product, "Registering subscription");
            if let Err(e) = operations
                .repository
                .register_subscription(&product, &purchase_token)
                .await
            {
                tracing::error!(%product, "Registering subscription failed: {}", e);
                operations.publish_error(e.to_string());
            }
        });
    }

    /// React to a (possible) change of signed-in user
    ///
    /// Drops the previous user's local data, then registers the current push
    /// token with the backend and remembers it for
    /// [`SubscriptionStatus::unregister_instance_id`].
    pub fn user_changed(&self) {
        let operations = Arc::clone(&self.operations);
        self.scope.spawn("user_changed", async move {
            operations.user_changed().await;
        });
    }

    /// Call [`SubscriptionStatus::user_changed`] for every change the session reports
    ///
    /// The session hands its change stream to one follower only; returns
    /// `false` if it was already taken.
    pub fn follow_user_changes(&self, session: &AccountSession) -> bool {
        let Some(mut changes) = session.take_user_changes() else {
            tracing::warn!("User change stream already taken");
            return false;
        };

        let operations = Arc::clone(&self.operations);
        self.scope.spawn("follow_user_changes", async move {
            while let Some(change) = changes.recv().await {
                tracing::info!(
                    previous = ?change.previous,
                    current = ?change.current,
                    "User changed"
                );
                operations.user_changed().await;
            }
        })
    }

    /// Unregister the remembered push token
    ///
    /// This is an authenticated call, so it must run before sign-out
    /// completes. Does nothing if no token was registered.
    pub fn unregister_instance_id(&self) {
        let Some(token) = self.operations.remembered_token() else {
            tracing::debug!("No push token registered, nothing to unregister");
            return;
        };

        let operations = Arc::clone(&self.operations);
        self.scope.spawn("unregister_instance_id", async move {
            if let Err(e) = operations.repository.unregister_instance_id(&token).await {
                tracing::error!("Unregistering push token failed: {}", e);
            }
        });
    }

    /// Unregister the remembered push token and wait for the backend to answer
    ///
    /// Use this when sign-out has to wait for the call. Returns `Ok(false)`
    /// if no token was registered.
    pub async fn unregister_instance_id_and_wait(&self) -> Result<bool, RepositoryError> {
        let Some(token) = self.operations.remembered_token() else {
            tracing::debug!("No push token registered, nothing to unregister");
            return Ok(false);
        };

        if let Err(e) = self.operations.repository.unregister_instance_id(&token).await {
            tracing::error!("Unregistering push token failed: {}", e);
            return Err(e);
        }
        Ok(true)
    }

    /// Push token remembered by the last user change
    pub fn instance_id_token(&self) -> Option<String> {
        self.operations.remembered_token()
    }

    /// Cancel all in-flight work and stop updating the state
    pub fn close(&self) {
        self.scope.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classy_domain::{ContentResource, EntitlementSnapshot};

    #[test]
    fn test_resolve_overlapping_snapshot() {
        let snapshot = SubscriptionSnapshot {
            entitlements: EntitlementSnapshot {
                prepaid_basic: true,
                renewable_basic: true,
                ..Default::default()
            },
            basic_content: Some(ContentResource::new("url-A")),
            premium_content: None,
        };

        assert_eq!(
            resolve(snapshot),
            SubscriptionUiState::Success {
                content: Some(ContentResource::new("url-A")),
                current: CurrentSubscription::BasicPrepaid,
            }
        );
    }

    #[test]
    fn test_resolve_missing_content_is_loading() {
        let snapshot = SubscriptionSnapshot {
            entitlements: EntitlementSnapshot {
                renewable_premium: true,
                ..Default::default()
            },
            basic_content: None,
            premium_content: None,
        };

        assert_eq!(resolve(snapshot), SubscriptionUiState::Loading);
    }
}
