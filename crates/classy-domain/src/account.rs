//! Signed-in user identity

/// The user an auth provider reports as signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable user id assigned by the auth provider
    pub uid: String,

    /// Email address, if shared
    pub email: Option<String>,

    /// Display name, if shared
    pub display_name: Option<String>,
}

impl UserAccount {
    /// Create an account with only a uid
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    /// Attach an email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Attach a display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// True when both values name the same user
    ///
    /// Identity is the uid alone; profile fields may change between reads.
    pub fn same_user(a: Option<&UserAccount>, b: Option<&UserAccount>) -> bool {
        a.map(|u| u.uid.as_str()) == b.map(|u| u.uid.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_uid() {
        let a = UserAccount::new("uid-1").with_email("a@example.com");
        let b = UserAccount::new("uid-1").with_display_name("Alice");
        let c = UserAccount::new("uid-2");

        assert!(UserAccount::same_user(Some(&a), Some(&b)));
        assert!(!UserAccount::same_user(Some(&a), Some(&c)));
        assert!(!UserAccount::same_user(Some(&a), None));
        assert!(UserAccount::same_user(None, None));
    }
}
