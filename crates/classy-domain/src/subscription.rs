//! Current subscription classification

use crate::entitlement::{BillingKind, EntitlementSnapshot, ProductTier};

/// The plan that wins for an entitlement snapshot
///
/// Derived on every change and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentSubscription {
    /// Prepaid basic plan
    BasicPrepaid,

    /// Auto-renewing basic plan
    BasicRenewable,

    /// Prepaid premium plan
    PremiumPrepaid,

    /// Auto-renewing premium plan
    PremiumRenewable,

    /// No subscription held
    None,
}

impl CurrentSubscription {
    /// Classify a snapshot
    ///
    /// The first held entitlement wins, checked in this order: prepaid basic,
    /// renewable basic, prepaid premium, renewable premium. Prepaid beats
    /// renewable within a tier and basic beats premium across tiers.
    ///
    /// # Examples
    ///
    /// ```
    /// use classy_domain::{CurrentSubscription, EntitlementSnapshot};
    ///
    /// let snapshot = EntitlementSnapshot {
    ///     renewable_basic: true,
    ///     prepaid_premium: true,
    ///     ..Default::default()
    /// };
    /// assert_eq!(CurrentSubscription::resolve(&snapshot), CurrentSubscription::BasicRenewable);
    /// ```
    pub fn resolve(snapshot: &EntitlementSnapshot) -> Self {
        if snapshot.prepaid_basic {
            CurrentSubscription::BasicPrepaid
        } else if snapshot.renewable_basic {
            CurrentSubscription::BasicRenewable
        } else if snapshot.prepaid_premium {
            CurrentSubscription::PremiumPrepaid
        } else if snapshot.renewable_premium {
            CurrentSubscription::PremiumRenewable
        } else {
            CurrentSubscription::None
        }
    }

    /// Tier whose content this classification unlocks
    pub fn tier(&self) -> Option<ProductTier> {
        match self {
            CurrentSubscription::BasicPrepaid | CurrentSubscription::BasicRenewable => {
                Some(ProductTier::Basic)
            }
            CurrentSubscription::PremiumPrepaid | CurrentSubscription::PremiumRenewable => {
                Some(ProductTier::Premium)
            }
            CurrentSubscription::None => None,
        }
    }

    /// Billing kind of the winning plan
    pub fn billing(&self) -> Option<BillingKind> {
        match self {
            CurrentSubscription::BasicPrepaid | CurrentSubscription::PremiumPrepaid => {
                Some(BillingKind::Prepaid)
            }
            CurrentSubscription::BasicRenewable | CurrentSubscription::PremiumRenewable => {
                Some(BillingKind::Renewable)
            }
            CurrentSubscription::None => None,
        }
    }

    /// True for every variant except [`CurrentSubscription::None`]
    pub fn is_subscribed(&self) -> bool {
        !matches!(self, CurrentSubscription::None)
    }

    /// Get the classification name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrentSubscription::BasicPrepaid => "BASIC_PREPAID",
            CurrentSubscription::BasicRenewable => "BASIC_RENEWABLE",
            CurrentSubscription::PremiumPrepaid => "PREMIUM_PREPAID",
            CurrentSubscription::PremiumRenewable => "PREMIUM_RENEWABLE",
            CurrentSubscription::None => "NONE",
        }
    }
}

impl std::fmt::Display for CurrentSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
