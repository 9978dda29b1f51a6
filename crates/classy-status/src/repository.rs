//! Billing repository boundary
//!
//! The repository owns every entitlement signal and talks to the backend.
//! Status models only read its signals and fire one-shot calls at it.

use crate::error::RepositoryError;
use crate::inputs::{OneTimeProductInputs, SubscriptionInputs};
use async_trait::async_trait;
use classy_domain::ContentResource;
use tokio::sync::watch;

/// Source of entitlement signals and backend operations
///
/// Implemented by whatever fetches purchase state (network, cache, database).
/// Each signal accessor returns a fresh receiver.
#[async_trait]
pub trait BillingRepository: Send + Sync + 'static {
    /// User holds a prepaid basic plan
    fn has_prepaid_basic(&self) -> watch::Receiver<bool>;

    /// User holds a renewable basic plan
    fn has_renewable_basic(&self) -> watch::Receiver<bool>;

    /// User holds a prepaid premium plan
    fn has_prepaid_premium(&self) -> watch::Receiver<bool>;

    /// User holds a renewable premium plan
    fn has_renewable_premium(&self) -> watch::Receiver<bool>;

    /// User owns the one-time product
    fn has_one_time_product(&self) -> watch::Receiver<bool>;

    /// Content unlocked by basic plans
    fn basic_content(&self) -> watch::Receiver<Option<ContentResource>>;

    /// Content unlocked by premium plans
    fn premium_content(&self) -> watch::Receiver<Option<ContentResource>>;

    /// Content unlocked by the one-time product
    fn one_time_product_content(&self) -> watch::Receiver<Option<ContentResource>>;

    /// Refresh the product catalog
    async fn query_products(&self) -> Result<(), RepositoryError>;

    /// Re-fetch subscription purchases; updates the subscription signals
    async fn fetch_subscriptions(&self) -> Result<(), RepositoryError>;

    /// Re-fetch one-time product purchases; updates the ownership signal
    async fn fetch_one_time_product_purchases(&self) -> Result<(), RepositoryError>;

    /// Register a new subscription purchase with the backend
    async fn register_subscription(
        &self,
        product: &str,
        purchase_token: &str,
    ) -> Result<(), RepositoryError>;

    /// Register this device's push token for the signed-in user
    async fn register_instance_id(&self, token: &str) -> Result<(), RepositoryError>;

    /// Unregister a push token; must run before sign-out completes
    async fn unregister_instance_id(&self, token: &str) -> Result<(), RepositoryError>;

    /// Forget all purchase state cached for the previous user
    async fn delete_local_user_data(&self);

    /// Receivers for the subscription resolver
    fn subscription_inputs(&self) -> SubscriptionInputs {
        SubscriptionInputs::new(
            self.has_prepaid_basic(),
            self.has_renewable_basic(),
            self.has_prepaid_premium(),
            self.has_renewable_premium(),
            self.basic_content(),
            self.premium_content(),
        )
    }

    /// Receivers for the one-time product resolver
    fn one_time_product_inputs(&self) -> OneTimeProductInputs {
        OneTimeProductInputs::new(self.has_one_time_product(), self.one_time_product_content())
    }
}
