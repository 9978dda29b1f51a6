//! In-memory billing repository
//!
//! Holds every signal locally, records the backend calls made against it and
//! can be scripted to fail. Used by tests and by the interactive CLI session.

use crate::error::RepositoryError;
use crate::repository::BillingRepository;
use async_trait::async_trait;
use classy_domain::{ContentResource, Entitlement, ProductTier};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Backend operations the repository can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `query_products`
    QueryProducts,
    /// `fetch_subscriptions`
    FetchSubscriptions,
    /// `fetch_one_time_product_purchases`
    FetchOneTimeProductPurchases,
    /// `register_subscription`
    RegisterSubscription,
    /// `register_instance_id`
    RegisterInstanceId,
    /// `unregister_instance_id`
    UnregisterInstanceId,
}

impl Operation {
    /// Get the operation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::QueryProducts => "query-products",
            Operation::FetchSubscriptions => "fetch-subscriptions",
            Operation::FetchOneTimeProductPurchases => "fetch-otp",
            Operation::RegisterSubscription => "register-subscription",
            Operation::RegisterInstanceId => "register-instance-id",
            Operation::UnregisterInstanceId => "unregister-instance-id",
        }
    }

    /// Parse an operation from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "query-products" => Some(Operation::QueryProducts),
            "fetch-subscriptions" => Some(Operation::FetchSubscriptions),
            "fetch-otp" | "fetch-one-time-product-purchases" => {
                Some(Operation::FetchOneTimeProductPurchases)
            }
            "register-subscription" => Some(Operation::RegisterSubscription),
            "register-instance-id" => Some(Operation::RegisterInstanceId),
            "unregister-instance-id" => Some(Operation::UnregisterInstanceId),
            _ => None,
        }
    }
}

/// A completed backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    /// Product catalog refreshed
    QueryProducts,
    /// Subscriptions fetched
    FetchSubscriptions,
    /// One-time product purchases fetched
    FetchOneTimeProductPurchases,
    /// Subscription registered
    RegisterSubscription {
        /// Product id
        product: String,
        /// Purchase token
        purchase_token: String,
    },
    /// Push token registered
    RegisterInstanceId(String),
    /// Push token unregistered
    UnregisterInstanceId(String),
    /// Local user data deleted
    DeleteLocalUserData,
}

/// Billing repository that keeps all state in memory
#[derive(Debug)]
pub struct InMemoryBillingRepository {
    prepaid_basic: watch::Sender<bool>,
    renewable_basic: watch::Sender<bool>,
    prepaid_premium: watch::Sender<bool>,
    renewable_premium: watch::Sender<bool>,
    one_time_product: watch::Sender<bool>,
    basic_content: watch::Sender<Option<ContentResource>>,
    premium_content: watch::Sender<Option<ContentResource>>,
    one_time_product_content: watch::Sender<Option<ContentResource>>,
    latency: Duration,
    calls: Mutex<Vec<RepositoryCall>>,
    failures: Mutex<HashMap<Operation, RepositoryError>>,
}

impl Default for InMemoryBillingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBillingRepository {
    /// Create a repository with nothing held and no content
    pub fn new() -> Self {
        Self {
            prepaid_basic: watch::channel(false).0,
            renewable_basic: watch::channel(false).0,
            prepaid_premium: watch::channel(false).0,
            renewable_premium: watch::channel(false).0,
            one_time_product: watch::channel(false).0,
            basic_content: watch::channel(None).0,
            premium_content: watch::channel(None).0,
            one_time_product_content: watch::channel(None).0,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Delay every backend call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Publish an entitlement signal
    pub fn set_entitlement(&self, entitlement: Entitlement, held: bool) {
        let sender = match entitlement {
            Entitlement::PrepaidBasic => &self.prepaid_basic,
            Entitlement::RenewableBasic => &self.renewable_basic,
            Entitlement::PrepaidPremium => &self.prepaid_premium,
            Entitlement::RenewablePremium => &self.renewable_premium,
            Entitlement::OneTimeProduct => &self.one_time_product,
        };
        sender.send_replace(held);
    }

    /// Current value of an entitlement signal
    pub fn entitlement(&self, entitlement: Entitlement) -> bool {
        let sender = match entitlement {
            Entitlement::PrepaidBasic => &self.prepaid_basic,
            Entitlement::RenewableBasic => &self.renewable_basic,
            Entitlement::PrepaidPremium => &self.prepaid_premium,
            Entitlement::RenewablePremium => &self.renewable_premium,
            Entitlement::OneTimeProduct => &self.one_time_product,
        };
        *sender.borrow()
    }

    /// Publish the content for a subscription tier
    pub fn set_tier_content(&self, tier: ProductTier, content: Option<ContentResource>) {
        match tier {
            ProductTier::Basic => self.basic_content.send_replace(content),
            ProductTier::Premium => self.premium_content.send_replace(content),
        };
    }

    /// Publish the one-time product content
    pub fn set_one_time_product_content(&self, content: Option<ContentResource>) {
        self.one_time_product_content.send_replace(content);
    }

    /// Make the next call to `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: RepositoryError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(operation, error);
        }
    }

    /// Completed calls, oldest first
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    async fn complete(&self, operation: Option<Operation>, call: RepositoryCall) -> Result<(), RepositoryError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failure = operation.and_then(|operation| {
            self.failures
                .lock()
                .ok()
                .and_then(|mut failures| failures.remove(&operation))
        });
        if let Some(error) = failure {
            tracing::debug!(?call, %error, "Scripted repository failure");
            return Err(error);
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(())
    }
}

#[async_trait]
impl BillingRepository for InMemoryBillingRepository {
    fn has_prepaid_basic(&self) -> watch::Receiver<bool> {
        self.prepaid_basic.subscribe()
    }

    fn has_renewable_basic(&self) -> watch::Receiver<bool> {
        self.renewable_basic.subscribe()
    }

    fn has_prepaid_premium(&self) -> watch::Receiver<bool> {
        self.prepaid_premium.subscribe()
    }

    fn has_renewable_premium(&self) -> watch::Receiver<bool> {
        self.renewable_premium.subscribe()
    }

    fn has_one_time_product(&self) -> watch::Receiver<bool> {
        self.one_time_product.subscribe()
    }

    fn basic_content(&self) -> watch::Receiver<Option<ContentResource>> {
        self.basic_content.subscribe()
    }

    fn premium_content(&self) -> watch::Receiver<Option<ContentResource>> {
        self.premium_content.subscribe()
    }

    fn one_time_product_content(&self) -> watch::Receiver<Option<ContentResource>> {
        self.one_time_product_content.subscribe()
    }

    async fn query_products(&self) -> Result<(), RepositoryError> {
        self.complete(Some(Operation::QueryProducts), RepositoryCall::QueryProducts)
            .await
    }

    async fn fetch_subscriptions(&self) -> Result<(), RepositoryError> {
        self.complete(Some(Operation::FetchSubscriptions), RepositoryCall::FetchSubscriptions)
            .await
    }

    async fn fetch_one_time_product_purchases(&self) -> Result<(), RepositoryError> {
        self.complete(
            Some(Operation::FetchOneTimeProductPurchases),
            RepositoryCall::FetchOneTimeProductPurchases,
        )
        .await
    }

    async fn register_subscription(
        &self,
        product: &str,
        purchase_token: &str,
    ) -> Result<(), RepositoryError> {
        self.complete(
            Some(Operation::RegisterSubscription),
            RepositoryCall::RegisterSubscription {
                product: product.to_string(),
                purchase_token: purchase_token.to_string(),
            },
        )
        .await
    }

    async fn register_instance_id(&self, token: &str) -> Result<(), RepositoryError> {
        self.complete(
            Some(Operation::RegisterInstanceId),
            RepositoryCall::RegisterInstanceId(token.to_string()),
        )
        .await
    }

    async fn unregister_instance_id(&self, token: &str) -> Result<(), RepositoryError> {
        self.complete(
            Some(Operation::UnregisterInstanceId),
            RepositoryCall::UnregisterInstanceId(token.to_string()),
        )
        .await
    }

    async fn delete_local_user_data(&self) {
        let _ = self.complete(None, RepositoryCall::DeleteLocalUserData).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signals_reach_receivers() {
        let repository = InMemoryBillingRepository::new();
        let mut premium = repository.has_renewable_premium();

        repository.set_entitlement(Entitlement::RenewablePremium, true);
        premium.changed().await.unwrap();
        assert!(*premium.borrow());
        assert!(repository.entitlement(Entitlement::RenewablePremium));
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let repository = InMemoryBillingRepository::new();
        repository.query_products().await.unwrap();
        repository.register_instance_id("token-1").await.unwrap();

        assert_eq!(
            repository.calls(),
            vec![
                RepositoryCall::QueryProducts,
                RepositoryCall::RegisterInstanceId("token-1".to_string()),
            ]
        );

        repository.clear_calls();
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failure_applies_once() {
        let repository = InMemoryBillingRepository::new();
        repository.fail_next(
            Operation::FetchSubscriptions,
            RepositoryError::Network("offline".to_string()),
        );

        let first = repository.fetch_subscriptions().await;
        assert_eq!(first, Err(RepositoryError::Network("offline".to_string())));
        assert!(repository.fetch_subscriptions().await.is_ok());
        assert_eq!(repository.calls(), vec![RepositoryCall::FetchSubscriptions]);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!(Operation::parse("fetch-subscriptions"), Some(Operation::FetchSubscriptions));
        assert_eq!(Operation::parse("FETCH_OTP"), Some(Operation::FetchOneTimeProductPurchases));
        assert_eq!(Operation::parse(Operation::RegisterInstanceId.as_str()), Some(Operation::RegisterInstanceId));
        assert!(Operation::parse("transfer").is_none());
    }
}
