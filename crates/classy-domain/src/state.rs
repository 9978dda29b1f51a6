//! UI state sum types handed to the presentation layer

use crate::content::ContentResource;
use crate::one_time_product::CurrentOneTimeProductPurchase;
use crate::subscription::CurrentSubscription;

/// Message carried by every successful one-time product state
pub const ONE_TIME_PRODUCT_SUCCESS_MESSAGE: &str = "Success";

/// Message of the one-time product error state
pub const NO_ONE_TIME_PRODUCT_MESSAGE: &str = "No one-time product purchase found.";

/// Resolved subscription state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionUiState {
    /// A plan is held but its tier content has not arrived yet
    Loading,

    /// Resolution failed
    Error(String),

    /// Resolution finished
    Success {
        /// Content for the winning tier; absent when no plan is held
        content: Option<ContentResource>,
        /// The winning plan
        current: CurrentSubscription,
    },
}

impl SubscriptionUiState {
    /// Short label for logs and tables
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionUiState::Loading => "loading",
            SubscriptionUiState::Error(_) => "error",
            SubscriptionUiState::Success { .. } => "success",
        }
    }

    /// Winning plan, if resolution finished
    pub fn current(&self) -> Option<CurrentSubscription> {
        match self {
            SubscriptionUiState::Success { current, .. } => Some(*current),
            _ => None,
        }
    }

    /// Content, if resolution finished with content
    pub fn content(&self) -> Option<&ContentResource> {
        match self {
            SubscriptionUiState::Success { content, .. } => content.as_ref(),
            _ => None,
        }
    }
}

/// Resolved one-time product state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneTimeProductUiState {
    /// Resolution failed
    Error(String),

    /// Resolution finished
    Success {
        /// Ownership classification
        current: CurrentOneTimeProductPurchase,
        /// One-time product content, passed through as published
        content: Option<ContentResource>,
        /// Status message
        message: String,
    },
}

impl OneTimeProductUiState {
    /// Short label for logs and tables
    pub fn label(&self) -> &'static str {
        match self {
            OneTimeProductUiState::Error(_) => "error",
            OneTimeProductUiState::Success { .. } => "success",
        }
    }

    /// Ownership classification, if resolution finished
    pub fn current(&self) -> Option<CurrentOneTimeProductPurchase> {
        match self {
            OneTimeProductUiState::Success { current, .. } => Some(*current),
            OneTimeProductUiState::Error(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_accessors() {
        let state = SubscriptionUiState::Success {
            content: Some(ContentResource::new("url-A")),
            current: CurrentSubscription::BasicPrepaid,
        };
        assert_eq!(state.label(), "success");
        assert_eq!(state.current(), Some(CurrentSubscription::BasicPrepaid));
        assert_eq!(state.content().map(ContentResource::url), Some("url-A"));

        assert_eq!(SubscriptionUiState::Loading.current(), None);
        assert_eq!(SubscriptionUiState::Loading.content(), None);
    }

    #[test]
    fn test_one_time_product_accessors() {
        let state = OneTimeProductUiState::Error(NO_ONE_TIME_PRODUCT_MESSAGE.to_string());
        assert_eq!(state.label(), "error");
        assert_eq!(state.current(), None);
    }
}
