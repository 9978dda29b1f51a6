//! Command implementations.

pub mod otp;
pub mod resolve;

pub use self::otp::execute_otp;
pub use self::resolve::execute_resolve;
