//! Classy Status
//!
//! Reactive entitlement status for the Classy Taxi client.
//!
//! # Overview
//!
//! The billing repository publishes one signal per entitlement and per content
//! resource. This crate combines those signals into the states the
//! presentation layer renders:
//! - **Subscription status**: [`SubscriptionStatus`] resolves the four
//!   subscription entitlements and the tier content into a
//!   [`SubscriptionUiState`](classy_domain::SubscriptionUiState)
//! - **One-time product status**: [`OneTimeProductStatus`] resolves ownership
//!   of the one-time product and its content
//! - **Account session**: [`AccountSession`] tracks the signed-in user and
//!   reports changes of user, which re-register the push token
//!
//! # Sharing
//!
//! Each model owns a [`Scope`]; dropping or closing the model cancels every
//! task it started. States are shared through [`SharedState`]:
//!
//! | State | Policy | Initial value |
//! |-------|--------|---------------|
//! | Subscription | Eagerly (configurable) | `Loading` |
//! | One-time product | While subscribed, 5 s grace | `None` |
//!
//! # Usage
//!
//! ```
//! use classy_domain::{ContentResource, OneTimeProductUiState};
//! use classy_status::{InMemoryBillingRepository, OneTimeProductStatus, StatusConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryBillingRepository::new());
//! repository.set_one_time_product_content(Some(ContentResource::new("url-C")));
//!
//! let status = OneTimeProductStatus::new(repository.clone(), &StatusConfig::default());
//! let mut state = status.state();
//! let resolved = state.wait_for(|s| s.is_some()).await?;
//! assert!(matches!(resolved, Some(OneTimeProductUiState::Success { .. })));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [status]
//! one_time_product_stop_timeout_ms = 5000
//! subscription_eager = true
//! subscription_stop_timeout_ms = 5000
//! ```

#![warn(missing_docs)]

mod account;
mod config;
mod error;
mod identity;
mod inputs;
mod memory;
mod one_time_product_status;
mod repository;
mod scope;
mod shared;
mod subscription_status;

pub use account::{AccountSession, UserChange};
pub use config::{SharingPolicy, StatusConfig};
pub use error::{RepositoryError, StatusError};
pub use identity::{AccountProvider, PushTokenSource, StaticAccountProvider, StaticPushToken};
pub use inputs::{
    Inputs, OneTimeProductInputs, OneTimeProductSnapshot, SubscriptionInputs, SubscriptionSnapshot,
};
pub use memory::{InMemoryBillingRepository, Operation, RepositoryCall};
pub use one_time_product_status::OneTimeProductStatus;
pub use repository::BillingRepository;
pub use scope::Scope;
pub use shared::{SharedState, StateSubscription};
pub use subscription_status::SubscriptionStatus;
