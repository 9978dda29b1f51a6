//! Configuration for status models
//!
//! Defines how long shared state keeps computing after its last observer
//! leaves, and whether the subscription pipeline starts eagerly.

use crate::error::StatusError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When a shared state computes its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingPolicy {
    /// Start immediately and keep computing until the owning scope ends
    Eagerly,

    /// Compute only while observed
    ///
    /// After the last observer leaves, computation continues for
    /// `stop_timeout` and then stops. The last value stays readable.
    WhileSubscribed {
        /// Grace period before computation stops
        stop_timeout: Duration,
    },
}

impl SharingPolicy {
    /// While-subscribed policy with a stop timeout in milliseconds
    pub fn while_subscribed_ms(stop_timeout_ms: u64) -> Self {
        SharingPolicy::WhileSubscribed {
            stop_timeout: Duration::from_millis(stop_timeout_ms),
        }
    }
}

/// Configuration for the status models
///
/// # Examples
///
/// ```
/// use classy_status::StatusConfig;
///
/// let config = StatusConfig::default();
/// assert_eq!(config.one_time_product_stop_timeout_ms, 5000);
///
/// let config = StatusConfig::from_toml_str("one_time_product_stop_timeout_ms = 250").unwrap();
/// assert_eq!(config.one_time_product_stop_timeout_ms, 250);
/// assert!(config.subscription_eager);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Grace period for the one-time product state (in milliseconds)
    /// Default: 5000
    #[serde(default = "default_stop_timeout_ms")]
    pub one_time_product_stop_timeout_ms: u64,

    /// Start the subscription state as soon as the model is built
    /// Default: true
    #[serde(default = "default_true")]
    pub subscription_eager: bool,

    /// Grace period for the subscription state when it is not eager
    /// Default: 5000
    #[serde(default = "default_stop_timeout_ms")]
    pub subscription_stop_timeout_ms: u64,
}

fn default_stop_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            one_time_product_stop_timeout_ms: default_stop_timeout_ms(),
            subscription_eager: true,
            subscription_stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl StatusConfig {
    /// Short grace periods; observers that come and go restart computation quickly
    pub fn responsive() -> Self {
        Self {
            one_time_product_stop_timeout_ms: 500,
            subscription_eager: true,
            subscription_stop_timeout_ms: 500,
        }
    }

    /// Long grace periods and a lazy subscription pipeline
    pub fn retentive() -> Self {
        Self {
            one_time_product_stop_timeout_ms: 60_000,
            subscription_eager: false,
            subscription_stop_timeout_ms: 60_000,
        }
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, StatusError> {
        Ok(toml::from_str(contents)?)
    }

    /// Sharing policy for the subscription state
    pub fn subscription_policy(&self) -> SharingPolicy {
        if self.subscription_eager {
            SharingPolicy::Eagerly
        } else {
            SharingPolicy::while_subscribed_ms(self.subscription_stop_timeout_ms)
        }
    }

    /// Sharing policy for the one-time product state
    pub fn one_time_product_policy(&self) -> SharingPolicy {
        SharingPolicy::while_subscribed_ms(self.one_time_product_stop_timeout_ms)
    }
}
