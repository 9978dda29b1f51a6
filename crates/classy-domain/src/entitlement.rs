//! Entitlement module - the boolean facts reported by the backend

/// Product grouping with its own content resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductTier {
    /// Basic plans
    Basic,

    /// Premium plans
    Premium,
}

impl ProductTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductTier::Basic => "basic",
            ProductTier::Premium => "premium",
        }
    }

    /// Parse a tier from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(ProductTier::Basic),
            "premium" => Some(ProductTier::Premium),
            _ => None,
        }
    }
}

impl std::str::FromStr for ProductTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid tier: {}", s))
    }
}

/// How a plan is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingKind {
    /// Paid up front for a fixed period, no auto-renewal
    Prepaid,

    /// Auto-renewing subscription
    Renewable,
}

impl BillingKind {
    /// Get the billing kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingKind::Prepaid => "prepaid",
            BillingKind::Renewable => "renewable",
        }
    }
}

/// One of the five entitlement signals the repository publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entitlement {
    /// Prepaid basic plan
    PrepaidBasic,
    /// Auto-renewing basic plan
    RenewableBasic,
    /// Prepaid premium plan
    PrepaidPremium,
    /// Auto-renewing premium plan
    RenewablePremium,
    /// One-time product ownership
    OneTimeProduct,
}

impl Entitlement {
    /// All entitlements, in resolution order (one-time product last)
    pub const ALL: [Entitlement; 5] = [
        Entitlement::PrepaidBasic,
        Entitlement::RenewableBasic,
        Entitlement::PrepaidPremium,
        Entitlement::RenewablePremium,
        Entitlement::OneTimeProduct,
    ];

    /// Get the entitlement name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Entitlement::PrepaidBasic => "prepaid-basic",
            Entitlement::RenewableBasic => "renewable-basic",
            Entitlement::PrepaidPremium => "prepaid-premium",
            Entitlement::RenewablePremium => "renewable-premium",
            Entitlement::OneTimeProduct => "one-time-product",
        }
    }

    /// Parse an entitlement from a string (accepts `_` or `-` separators)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "prepaid-basic" => Some(Entitlement::PrepaidBasic),
            "renewable-basic" => Some(Entitlement::RenewableBasic),
            "prepaid-premium" => Some(Entitlement::PrepaidPremium),
            "renewable-premium" => Some(Entitlement::RenewablePremium),
            "one-time-product" | "otp" => Some(Entitlement::OneTimeProduct),
            _ => None,
        }
    }
}

impl std::str::FromStr for Entitlement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid entitlement: {}", s))
    }
}

/// The four subscription entitlements captured at one instant
///
/// In normal operation at most one flag is set. The resolver still has to
/// pick a winner when the backend reports several; see
/// [`CurrentSubscription::resolve`](crate::CurrentSubscription::resolve).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntitlementSnapshot {
    /// User holds a prepaid basic plan
    pub prepaid_basic: bool,

    /// User holds a renewable basic plan
    pub renewable_basic: bool,

    /// User holds a prepaid premium plan
    pub prepaid_premium: bool,

    /// User holds a renewable premium plan
    pub renewable_premium: bool,
}

impl EntitlementSnapshot {
    /// Number of entitlements set in this snapshot
    pub fn held(&self) -> usize {
        [
            self.prepaid_basic,
            self.renewable_basic,
            self.prepaid_premium,
            self.renewable_premium,
        ]
        .iter()
        .filter(|held| **held)
        .count()
    }

    /// True when more than one plan is reported at once
    pub fn overlapping(&self) -> bool {
        self.held() > 1
    }

    /// Set the flag for a subscription entitlement
    ///
    /// Returns `false` (and changes nothing) for [`Entitlement::OneTimeProduct`],
    /// which is not part of the subscription snapshot.
    pub fn set(&mut self, entitlement: Entitlement, held: bool) -> bool {
        match entitlement {
            Entitlement::PrepaidBasic => self.prepaid_basic = held,
            Entitlement::RenewableBasic => self.renewable_basic = held,
            Entitlement::PrepaidPremium => self.prepaid_premium = held,
            Entitlement::RenewablePremium => self.renewable_premium = held,
            Entitlement::OneTimeProduct => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!(ProductTier::parse("Basic"), Some(ProductTier::Basic));
        assert_eq!(ProductTier::parse("PREMIUM"), Some(ProductTier::Premium));
        assert!("gold".parse::<ProductTier>().is_err());
    }

    #[test]
    fn test_entitlement_parsing() {
        for entitlement in Entitlement::ALL {
            assert_eq!(Entitlement::parse(entitlement.as_str()), Some(entitlement));
        }
        assert_eq!(Entitlement::parse("prepaid_basic"), Some(Entitlement::PrepaidBasic));
        assert_eq!(Entitlement::parse("otp"), Some(Entitlement::OneTimeProduct));
        assert!(Entitlement::parse("yearly").is_none());
    }

    #[test]
    fn test_overlap_detection() {
        let mut snapshot = EntitlementSnapshot::default();
        assert_eq!(snapshot.held(), 0);
        assert!(!snapshot.overlapping());

        snapshot.set(Entitlement::RenewablePremium, true);
        assert!(!snapshot.overlapping());

        snapshot.set(Entitlement::PrepaidBasic, true);
        assert_eq!(snapshot.held(), 2);
        assert!(snapshot.overlapping());
    }

    #[test]
    fn test_set_ignores_one_time_product() {
        let mut snapshot = EntitlementSnapshot::default();
        assert!(!snapshot.set(Entitlement::OneTimeProduct, true));
        assert_eq!(snapshot, EntitlementSnapshot::default());
    }
}
