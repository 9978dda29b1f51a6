//! Classy Taxi Domain Layer
//!
//! This crate contains the entitlement model for the Classy Taxi client.
//! It has no external dependencies and defines the value types, the pure
//! resolvers, and the identity types that the reactive layer builds upon.
//!
//! ## Key Concepts
//!
//! - **Entitlement**: a boolean fact that the user currently holds a plan
//! - **Tier**: a product grouping (basic, premium) with its own content
//! - **CurrentSubscription**: the single plan that "wins" for a snapshot
//! - **UI state**: Loading / Error / Success, recomputed on every change
//!
//! ## Resolution order
//!
//! When the backend reports overlapping entitlements the winner is chosen in
//! a fixed order:
//!
//! | Rank | Entitlement | Classification | Content |
//! |------|-------------|----------------|---------|
//! | 1 | prepaid basic | `BasicPrepaid` | basic |
//! | 2 | renewable basic | `BasicRenewable` | basic |
//! | 3 | prepaid premium | `PremiumPrepaid` | premium |
//! | 4 | renewable premium | `PremiumRenewable` | premium |
//! | - | none | `None` | absent |
//!
//! ```
//! use classy_domain::{resolve_subscription_state, ContentResource, CurrentSubscription,
//!     EntitlementSnapshot, SubscriptionUiState};
//!
//! let snapshot = EntitlementSnapshot {
//!     prepaid_basic: true,
//!     renewable_basic: true,
//!     ..Default::default()
//! };
//! let basic = ContentResource::new("url-A");
//!
//! let state = resolve_subscription_state(snapshot, Some(&basic), None);
//! assert_eq!(
//!     state,
//!     SubscriptionUiState::Success {
//!         content: Some(basic),
//!         current: CurrentSubscription::BasicPrepaid,
//!     }
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod content;
pub mod entitlement;
pub mod one_time_product;
pub mod resolver;
pub mod state;
pub mod subscription;

// Re-exports for convenience
pub use account::UserAccount;
pub use content::ContentResource;
pub use entitlement::{BillingKind, Entitlement, EntitlementSnapshot, ProductTier};
pub use one_time_product::CurrentOneTimeProductPurchase;
pub use resolver::{resolve_one_time_product_state, resolve_subscription_state};
pub use state::{OneTimeProductUiState, SubscriptionUiState};
pub use subscription::CurrentSubscription;
