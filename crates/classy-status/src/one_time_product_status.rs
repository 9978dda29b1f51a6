//! One-time product status model

use crate::config::StatusConfig;
use crate::error::publish_error;
use crate::inputs::OneTimeProductSnapshot;
use crate::repository::BillingRepository;
use crate::scope::Scope;
use crate::shared::{SharedState, StateSubscription};
use classy_domain::{resolve_one_time_product_state, OneTimeProductUiState};
use std::sync::Arc;
use tokio::sync::watch;

/// One-time product purchase status for the signed-in user
///
/// The state is computed only while observed (see
/// [`StatusConfig::one_time_product_stop_timeout_ms`]) and is `None` until
/// the first computation.
pub struct OneTimeProductStatus {
    repository: Arc<dyn BillingRepository>,
    error_message: Arc<watch::Sender<Option<String>>>,
    state: SharedState<Option<OneTimeProductUiState>>,
    scope: Scope,
}

impl OneTimeProductStatus {
    /// Create the model; must be called inside a tokio runtime
    pub fn new(repository: Arc<dyn BillingRepository>, config: &StatusConfig) -> Self {
        let scope = Scope::new("one-time-product-status");

        let source = Arc::clone(&repository);
        let state = SharedState::launch(
            &scope,
            config.one_time_product_policy(),
            None,
            move || source.one_time_product_inputs(),
            |snapshot: OneTimeProductSnapshot| {
                Some(resolve_one_time_product_state(
                    snapshot.owned,
                    snapshot.content.as_ref(),
                ))
            },
        );

        Self {
            repository,
            error_message: Arc::new(watch::channel(None).0),
            state,
            scope,
        }
    }

    /// Subscribe to the resolved state
    pub fn state(&self) -> StateSubscription<Option<OneTimeProductUiState>> {
        self.state.subscribe()
    }

    /// The latest resolved state; `None` before the first computation
    pub fn current_state(&self) -> Option<OneTimeProductUiState> {
        self.state.value()
    }

    /// The shared state, for diagnostics
    pub fn shared_state(&self) -> &SharedState<Option<OneTimeProductUiState>> {
        &self.state
    }

    /// Error side channel set by failed refreshes
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.error_message.subscribe()
    }

    /// Ask the repository to re-fetch one-time product purchases
    pub fn manual_refresh(&self) {
        let repository = Arc::clone(&self.repository);
        let error_message = Arc::clone(&self.error_message);
        self.scope.spawn("fetch_one_time_product_purchases", async move {
            if let Err(e) = repository.fetch_one_time_product_purchases().await {
                tracing::error!("Fetching one-time product purchases failed: {}", e);
                publish_error(&error_message, e.to_string());
            }
        });
    }

    /// Scope owning this model's tasks
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Cancel all in-flight work and stop updating the state
    pub fn close(&self) {
        self.scope.shutdown();
    }
}
