//! Pure resolvers from entitlement snapshots to UI state
//!
//! Both functions are total: every input combination yields exactly one
//! state, and neither produces an `Error` variant.

use crate::content::ContentResource;
use crate::entitlement::{EntitlementSnapshot, ProductTier};
use crate::one_time_product::CurrentOneTimeProductPurchase;
use crate::state::{OneTimeProductUiState, SubscriptionUiState, ONE_TIME_PRODUCT_SUCCESS_MESSAGE};
use crate::subscription::CurrentSubscription;

/// Resolve the subscription state for one snapshot of the inputs
///
/// The winning plan is picked by [`CurrentSubscription::resolve`] and its
/// tier selects the content. A held plan whose content has not arrived yet
/// resolves to `Loading`; otherwise the result is `Success`. With no plan
/// held the result is `Success` with no content, never `Loading`.
pub fn resolve_subscription_state(
    snapshot: EntitlementSnapshot,
    basic_content: Option<&ContentResource>,
    premium_content: Option<&ContentResource>,
) -> SubscriptionUiState {
    let current = CurrentSubscription::resolve(&snapshot);
    let content = match current.tier() {
        Some(ProductTier::Basic) => basic_content,
        Some(ProductTier::Premium) => premium_content,
        None => None,
    };

    match content {
        None if current.is_subscribed() => SubscriptionUiState::Loading,
        content => SubscriptionUiState::Success {
            content: content.cloned(),
            current,
        },
    }
}

/// Resolve the one-time product state
///
/// Ownership maps onto `Otp` / `None` and the content is passed through.
pub fn resolve_one_time_product_state(
    owned: bool,
    content: Option<&ContentResource>,
) -> OneTimeProductUiState {
    OneTimeProductUiState::Success {
        current: CurrentOneTimeProductPurchase::from_owned(owned),
        content: content.cloned(),
        message: ONE_TIME_PRODUCT_SUCCESS_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> ContentResource {
        ContentResource::new("url-basic")
    }

    fn premium() -> ContentResource {
        ContentResource::new("url-premium")
    }

    #[test]
    fn test_prepaid_wins_over_renewable() {
        let snapshot = EntitlementSnapshot {
            prepaid_basic: true,
            renewable_basic: true,
            ..Default::default()
        };
        let content = ContentResource::new("url-A");

        let state = resolve_subscription_state(snapshot, Some(&content), None);
        assert_eq!(
            state,
            SubscriptionUiState::Success {
                content: Some(content),
                current: CurrentSubscription::BasicPrepaid,
            }
        );
    }

    #[test]
    fn test_nothing_held_is_success_not_loading() {
        let state = resolve_subscription_state(
            EntitlementSnapshot::default(),
            Some(&basic()),
            Some(&premium()),
        );
        assert_eq!(
            state,
            SubscriptionUiState::Success {
                content: None,
                current: CurrentSubscription::None,
            }
        );
    }

    #[test]
    fn test_missing_premium_content_is_loading() {
        let snapshot = EntitlementSnapshot {
            renewable_premium: true,
            ..Default::default()
        };
        // Basic content present does not help a premium plan
        let state = resolve_subscription_state(snapshot, Some(&basic()), None);
        assert_eq!(state, SubscriptionUiState::Loading);
    }

    #[test]
    fn test_premium_plan_gets_premium_content() {
        let snapshot = EntitlementSnapshot {
            prepaid_premium: true,
            ..Default::default()
        };
        let state = resolve_subscription_state(snapshot, Some(&basic()), Some(&premium()));
        assert_eq!(state.content(), Some(&premium()));
        assert_eq!(state.current(), Some(CurrentSubscription::PremiumPrepaid));
    }

    #[test]
    fn test_one_time_product_states() {
        let content = ContentResource::new("url-otp");

        let owned = resolve_one_time_product_state(true, Some(&content));
        assert_eq!(
            owned,
            OneTimeProductUiState::Success {
                current: CurrentOneTimeProductPurchase::Otp,
                content: Some(content),
                message: "Success".to_string(),
            }
        );

        let not_owned = resolve_one_time_product_state(false, None);
        assert_eq!(not_owned.current(), Some(CurrentOneTimeProductPurchase::None));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn expected_winner(pb: bool, rb: bool, pp: bool, rp: bool) -> CurrentSubscription {
        [
            (pb, CurrentSubscription::BasicPrepaid),
            (rb, CurrentSubscription::BasicRenewable),
            (pp, CurrentSubscription::PremiumPrepaid),
            (rp, CurrentSubscription::PremiumRenewable),
        ]
        .into_iter()
        .find(|(held, _)| *held)
        .map(|(_, current)| current)
        .unwrap_or(CurrentSubscription::None)
    }

    proptest! {
        /// Property: the first held entitlement in rank order wins
        #[test]
        fn test_classification_follows_precedence(
            pb: bool, rb: bool, pp: bool, rp: bool,
            has_basic: bool, has_premium: bool,
        ) {
            let snapshot = EntitlementSnapshot {
                prepaid_basic: pb,
                renewable_basic: rb,
                prepaid_premium: pp,
                renewable_premium: rp,
            };
            let basic = has_basic.then(|| ContentResource::new("basic"));
            let premium = has_premium.then(|| ContentResource::new("premium"));
            let winner = expected_winner(pb, rb, pp, rp);

            prop_assert_eq!(CurrentSubscription::resolve(&snapshot), winner);

            let state = resolve_subscription_state(snapshot, basic.as_ref(), premium.as_ref());
            let tier_content = match winner.tier() {
                Some(ProductTier::Basic) => basic.clone(),
                Some(ProductTier::Premium) => premium.clone(),
                None => None,
            };

            match (winner, tier_content) {
                (CurrentSubscription::None, _) => prop_assert_eq!(
                    state,
                    SubscriptionUiState::Success { content: None, current: CurrentSubscription::None }
                ),
                (current, Some(content)) => prop_assert_eq!(
                    state,
                    SubscriptionUiState::Success { content: Some(content), current }
                ),
                (_, None) => prop_assert_eq!(state, SubscriptionUiState::Loading),
            }
        }

        /// Property: the one-time product resolver never yields Pending or Error
        #[test]
        fn test_one_time_product_total(owned: bool, has_content: bool) {
            let content = has_content.then(|| ContentResource::new("otp"));
            let state = resolve_one_time_product_state(owned, content.as_ref());

            prop_assert_eq!(state.current(), Some(CurrentOneTimeProductPurchase::from_owned(owned)));
            prop_assert_ne!(state.current(), Some(CurrentOneTimeProductPurchase::Pending));
        }
    }
}
