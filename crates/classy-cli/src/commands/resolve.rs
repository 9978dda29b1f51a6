//! Resolve command implementation.

use crate::cli::ResolveArgs;
use crate::error::Result;
use crate::output::Formatter;
use classy_domain::{
    resolve_subscription_state, ContentResource, EntitlementSnapshot, SubscriptionUiState,
};

/// Resolve the subscription state described by `args`.
pub fn resolve(args: &ResolveArgs) -> SubscriptionUiState {
    let snapshot = EntitlementSnapshot {
        prepaid_basic: args.prepaid_basic,
        renewable_basic: args.renewable_basic,
        prepaid_premium: args.prepaid_premium,
        renewable_premium: args.renewable_premium,
    };
    let basic = args.basic_content.as_deref().map(ContentResource::new);
    let premium = args.premium_content.as_deref().map(ContentResource::new);

    if snapshot.overlapping() {
        tracing::warn!(held = snapshot.held(), "Several subscription entitlements held");
    }
    resolve_subscription_state(snapshot, basic.as_ref(), premium.as_ref())
}

/// Execute the resolve command.
pub fn execute_resolve(args: ResolveArgs, formatter: &Formatter) -> Result<()> {
    let state = resolve(&args);
    println!("{}", formatter.format_subscription(&state)?);
    Ok(())
}
