//! One-time product command implementation.

use crate::cli::OtpArgs;
use crate::error::Result;
use crate::output::Formatter;
use classy_domain::{resolve_one_time_product_state, ContentResource};

/// Execute the otp command.
pub fn execute_otp(args: OtpArgs, formatter: &Formatter) -> Result<()> {
    let content = args.content.map(ContentResource::new);
    let state = resolve_one_time_product_state(args.owned, content.as_ref());
    println!("{}", formatter.format_one_time_product(Some(&state))?);
    Ok(())
}
