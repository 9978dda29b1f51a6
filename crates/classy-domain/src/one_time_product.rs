//! One-time product purchase classification

/// Current one-time product purchase state
///
/// `Pending` is part of the published shape but nothing derives it: ownership
/// is a single boolean, so only `Otp` and `None` are ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentOneTimeProductPurchase {
    /// The one-time product is owned
    Otp,

    /// The one-time product is not owned
    None,

    /// Purchase awaiting completion
    Pending,
}

impl CurrentOneTimeProductPurchase {
    /// Map the ownership signal onto a classification
    pub fn from_owned(owned: bool) -> Self {
        if owned {
            CurrentOneTimeProductPurchase::Otp
        } else {
            CurrentOneTimeProductPurchase::None
        }
    }

    /// Get the classification name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrentOneTimeProductPurchase::Otp => "OTP",
            CurrentOneTimeProductPurchase::None => "NONE",
            CurrentOneTimeProductPurchase::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for CurrentOneTimeProductPurchase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_mapping() {
        assert_eq!(CurrentOneTimeProductPurchase::from_owned(true), CurrentOneTimeProductPurchase::Otp);
        assert_eq!(CurrentOneTimeProductPurchase::from_owned(false), CurrentOneTimeProductPurchase::None);
    }

    #[test]
    fn test_pending_never_derived() {
        for owned in [true, false] {
            assert_ne!(
                CurrentOneTimeProductPurchase::from_owned(owned),
                CurrentOneTimeProductPurchase::Pending
            );
        }
    }
}
