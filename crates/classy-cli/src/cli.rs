//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Classy CLI - Resolve Classy Taxi entitlements into UI state.
#[derive(Debug, Parser)]
#[command(name = "classy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CLASSY_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (plan name only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the subscription state for a set of entitlements
    Resolve(ResolveArgs),

    /// Resolve the one-time product state
    Otp(OtpArgs),

    /// Enter an interactive session against an in-memory repository
    Session,
}

/// Arguments for the resolve command.
#[derive(Debug, Default, Parser)]
pub struct ResolveArgs {
    /// User holds a prepaid basic plan
    #[arg(long)]
    pub prepaid_basic: bool,

    /// User holds a renewable basic plan
    #[arg(long)]
    pub renewable_basic: bool,

    /// User holds a prepaid premium plan
    #[arg(long)]
    pub prepaid_premium: bool,

    /// User holds a renewable premium plan
    #[arg(long)]
    pub renewable_premium: bool,

    /// Content URL for the basic tier
    #[arg(long, value_name = "URL")]
    pub basic_content: Option<String>,

    /// Content URL for the premium tier
    #[arg(long, value_name = "URL")]
    pub premium_content: Option<String>,
}

/// Arguments for the otp command.
#[derive(Debug, Default, Parser)]
pub struct OtpArgs {
    /// User owns the one-time product
    #[arg(long)]
    pub owned: bool,

    /// Content URL for the one-time product
    #[arg(long, value_name = "URL")]
    pub content: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_enters_session() {
        let cli = Cli::parse_from(["classy"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_resolve_command() {
        let cli = Cli::parse_from([
            "classy",
            "resolve",
            "--prepaid-basic",
            "--renewable-premium",
            "--basic-content",
            "url-A",
        ]);
        match cli.command {
            Some(Command::Resolve(args)) => {
                assert!(args.prepaid_basic);
                assert!(args.renewable_premium);
                assert!(!args.renewable_basic);
                assert_eq!(args.basic_content.as_deref(), Some("url-A"));
                assert!(args.premium_content.is_none());
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_global_format_after_subcommand() {
        let cli = Cli::parse_from(["classy", "otp", "--owned", "--format", "json"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Some(Command::Otp(args)) => assert!(args.owned),
            _ => panic!("Expected Otp command"),
        }
    }
}
