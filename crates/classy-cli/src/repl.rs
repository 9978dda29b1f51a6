//! Interactive session mode.
//!
//! Runs the status models against an in-memory repository so entitlement
//! signals, backend failures and sign-in changes can be driven by hand.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use classy_domain::{ContentResource, Entitlement, ProductTier, UserAccount};
use classy_status::{
    AccountSession, InMemoryBillingRepository, OneTimeProductStatus, Operation, RepositoryError,
    StaticAccountProvider, StaticPushToken, SubscriptionStatus,
};
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Push token the session reports for every signed-in user.
const SESSION_PUSH_TOKEN: &str = "session-push-token";

/// How long to wait for a one-time product state before giving up.
const OTP_WAIT: Duration = Duration::from_secs(2);

/// Which content signal a `content` command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentSlot {
    Tier(ProductTier),
    OneTimeProduct,
}

/// Session command type.
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Exit,
    Help,
    Grant(Entitlement),
    Revoke(Entitlement),
    Content(ContentSlot, Option<ContentResource>),
    State,
    Otp,
    Refresh,
    Register { product: String, purchase_token: String },
    Fail(Operation, String),
    SignIn(UserAccount),
    SignOut,
    Errors,
    Calls,
}

/// Status models wired to an in-memory repository.
struct Session {
    repository: Arc<InMemoryBillingRepository>,
    accounts: Arc<StaticAccountProvider>,
    account: AccountSession,
    subscription: SubscriptionStatus,
    one_time_product: OneTimeProductStatus,
}

impl Session {
    fn new(config: &Config) -> Self {
        let repository = Arc::new(InMemoryBillingRepository::new());
        let accounts = Arc::new(StaticAccountProvider::default());
        let account = AccountSession::new(accounts.clone());

        let subscription = SubscriptionStatus::new(
            repository.clone(),
            Arc::new(StaticPushToken::new(Some(SESSION_PUSH_TOKEN.to_string()))),
            &config.status,
        );
        subscription.follow_user_changes(&account);
        let one_time_product = OneTimeProductStatus::new(repository.clone(), &config.status);

        Self {
            repository,
            accounts,
            account,
            subscription,
            one_time_product,
        }
    }

    fn prompt(&self) -> String {
        match self.account.current_user() {
            Some(user) => format!("classy ({})> ", user.uid),
            None => "classy (signed out)> ".to_string(),
        }
    }

    async fn execute(&self, cmd: SessionCommand, formatter: &Formatter) -> Result<()> {
        match cmd {
            SessionCommand::Grant(entitlement) => {
                self.repository.set_entitlement(entitlement, true);
                println!("{}", formatter.success(&format!("Granted {}", entitlement.as_str())));
            }
            SessionCommand::Revoke(entitlement) => {
                self.repository.set_entitlement(entitlement, false);
                println!("{}", formatter.success(&format!("Revoked {}", entitlement.as_str())));
            }
            SessionCommand::Content(slot, content) => {
                let described = content
                    .as_ref()
                    .map_or_else(|| "cleared".to_string(), |c| format!("set to {}", c));
                match slot {
                    ContentSlot::Tier(tier) => {
                        self.repository.set_tier_content(tier, content);
                        println!("{}", formatter.success(&format!("{} content {}", tier.as_str(), described)));
                    }
                    ContentSlot::OneTimeProduct => {
                        self.repository.set_one_time_product_content(content);
                        println!("{}", formatter.success(&format!("One-time product content {}", described)));
                    }
                }
            }
            SessionCommand::State => {
                settle().await;
                let entitlements: Vec<(Entitlement, bool)> = Entitlement::ALL
                    .iter()
                    .map(|e| (*e, self.repository.entitlement(*e)))
                    .collect();
                println!("{}", formatter.format_entitlements(&entitlements)?);
                println!("{}", formatter.format_subscription(&self.subscription.current_state())?);
            }
            SessionCommand::Otp => {
                // Observing the state starts its computation; the grace
                // period keeps it warm for the next `otp`
                let mut state = self.one_time_product.state();
                let resolved = tokio::time::timeout(OTP_WAIT, state.wait_for(Option::is_some))
                    .await
                    .map_err(|_| CliError::Timeout("one-time product state"))??;
                settle().await;
                let latest = state.current().or(resolved);
                println!("{}", formatter.format_one_time_product(latest.as_ref())?);
            }
            SessionCommand::Refresh => {
                self.subscription.manual_refresh();
                self.one_time_product.manual_refresh();
                println!("{}", formatter.info("Refresh requested"));
            }
            SessionCommand::Register {
                product,
                purchase_token,
            } => {
                self.subscription.register_subscription(product.as_str(), purchase_token);
                println!("{}", formatter.info(&format!("Registering {}", product)));
            }
            SessionCommand::Fail(operation, message) => {
                self.repository
                    .fail_next(operation, RepositoryError::Network(message));
                println!(
                    "{}",
                    formatter.warning(&format!("Next {} will fail", operation.as_str()))
                );
            }
            SessionCommand::SignIn(user) => {
                let uid = user.uid.clone();
                self.accounts.sign_in(user);
                match self.account.update_user() {
                    Some(_) => println!("{}", formatter.success(&format!("Signed in as {}", uid))),
                    None => println!("{}", formatter.info(&format!("Already signed in as {}", uid))),
                }
            }
            SessionCommand::SignOut => {
                if !self.account.is_signed_in() {
                    println!("{}", formatter.info("Not signed in"));
                    return Ok(());
                }
                // Unregistering is authenticated, so it completes first
                if let Err(e) = self.subscription.unregister_instance_id_and_wait().await {
                    println!("{}", formatter.warning(&format!("Push token not unregistered: {}", e)));
                }
                self.accounts.sign_out();
                self.account.update_user();
                println!("{}", formatter.success("Signed out"));
            }
            SessionCommand::Errors => {
                settle().await;
                let subscription = self.subscription.error_message().borrow().clone();
                let one_time_product = self.one_time_product.error_message().borrow().clone();
                if subscription.is_none() && one_time_product.is_none() {
                    println!("{}", formatter.info("No errors reported"));
                }
                if let Some(message) = subscription {
                    println!("{}", formatter.error(&format!("subscription: {}", message)));
                }
                if let Some(message) = one_time_product {
                    println!("{}", formatter.error(&format!("one-time product: {}", message)));
                }
            }
            SessionCommand::Calls => {
                settle().await;
                println!("{}", formatter.format_calls(&self.repository.calls())?);
            }
            SessionCommand::Exit | SessionCommand::Help => {}
        }
        Ok(())
    }

    fn close(&self) {
        self.subscription.close();
        self.one_time_product.close();
    }
}

/// Give background tasks a moment to publish.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Run the interactive session.
pub async fn run_session(config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.info("Classy session - Type 'help' for commands, 'exit' to quit"));
    println!();

    let editor_config = EditorConfig::builder()
        .max_history_size(config.settings.history_size)
        .map_err(|e| CliError::Editor(e.to_string()))?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config)
        .map_err(|e| CliError::Editor(format!("Failed to initialize editor: {}", e)))?;

    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    let session = Session::new(config);

    loop {
        match editor.readline(&session.prompt()) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_session_command(line) {
                    Ok(SessionCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(SessionCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        tracing::debug!(?cmd, "Executing session command");
                        if let Err(e) = session.execute(cmd, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    session.close();
    editor.save_history(&history_path).ok();

    Ok(())
}

/// Parse a session command line.
fn parse_session_command(line: &str) -> Result<SessionCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let Some((command, args)) = parts.split_first() else {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    };

    match *command {
        "exit" | "quit" | "q" => Ok(SessionCommand::Exit),
        "help" | "?" => Ok(SessionCommand::Help),
        "grant" => Ok(SessionCommand::Grant(parse_entitlement(args, "grant")?)),
        "revoke" => Ok(SessionCommand::Revoke(parse_entitlement(args, "revoke")?)),
        "content" => parse_content_command(args),
        "state" => Ok(SessionCommand::State),
        "otp" => Ok(SessionCommand::Otp),
        "refresh" => Ok(SessionCommand::Refresh),
        "register" => parse_register_command(args),
        "fail" => parse_fail_command(args),
        "signin" => parse_signin_command(args),
        "signout" => Ok(SessionCommand::SignOut),
        "errors" => Ok(SessionCommand::Errors),
        "calls" => Ok(SessionCommand::Calls),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            command
        ))),
    }
}

fn parse_entitlement(args: &[&str], command: &str) -> Result<Entitlement> {
    let name = args
        .first()
        .ok_or_else(|| CliError::InvalidInput(format!("Usage: {} <entitlement>", command)))?;
    Entitlement::parse(name).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "Unknown entitlement: {}. Expected one of: {}",
            name,
            Entitlement::ALL.map(|e| e.as_str()).join(", ")
        ))
    })
}

fn parse_content_command(args: &[&str]) -> Result<SessionCommand> {
    let usage = || CliError::InvalidInput("Usage: content <basic|premium|otp> [url]".to_string());
    let slot = match args.first().map(|s| s.to_lowercase()) {
        Some(name) if name == "otp" => ContentSlot::OneTimeProduct,
        Some(name) => ContentSlot::Tier(ProductTier::parse(&name).ok_or_else(usage)?),
        None => return Err(usage()),
    };
    let content = args.get(1).map(|url| ContentResource::new(*url));
    Ok(SessionCommand::Content(slot, content))
}

fn parse_register_command(args: &[&str]) -> Result<SessionCommand> {
    match args {
        [product, purchase_token, ..] => Ok(SessionCommand::Register {
            product: product.to_string(),
            purchase_token: purchase_token.to_string(),
        }),
        _ => Err(CliError::InvalidInput(
            "Usage: register <product> <purchase-token>".to_string(),
        )),
    }
}

fn parse_fail_command(args: &[&str]) -> Result<SessionCommand> {
    let name = args
        .first()
        .ok_or_else(|| CliError::InvalidInput("Usage: fail <operation> [message]".to_string()))?;
    let operation = Operation::parse(name)
        .ok_or_else(|| CliError::InvalidInput(format!("Unknown operation: {}", name)))?;
    let message = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "simulated failure".to_string()
    };
    Ok(SessionCommand::Fail(operation, message))
}

fn parse_signin_command(args: &[&str]) -> Result<SessionCommand> {
    let uid = args
        .first()
        .ok_or_else(|| CliError::InvalidInput("Usage: signin <uid> [email]".to_string()))?;
    let mut user = UserAccount::new(*uid);
    if let Some(email) = args.get(1) {
        user = user.with_email(*email);
    }
    Ok(SessionCommand::SignIn(user))
}

fn get_history_path() -> Result<PathBuf> {
    let classy_dir = Config::dir()?;
    std::fs::create_dir_all(&classy_dir)?;
    Ok(classy_dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  grant <entitlement>            - Publish an entitlement as held");
    println!("  revoke <entitlement>           - Publish an entitlement as not held");
    println!("    entitlement: prepaid-basic|renewable-basic|prepaid-premium|renewable-premium|otp");
    println!("  content <basic|premium|otp> [url] - Set (or clear) content");
    println!("  state                          - Show entitlements and subscription state");
    println!("  otp                            - Show one-time product state");
    println!("  refresh                        - Re-fetch subscriptions and purchases");
    println!("  register <product> <token>     - Register a subscription purchase");
    println!("  fail <operation> [message]     - Make the next backend call fail");
    println!("    operation: query-products|fetch-subscriptions|fetch-otp|");
    println!("               register-subscription|register-instance-id|unregister-instance-id");
    println!("  signin <uid> [email]           - Sign in as a user");
    println!("  signout                        - Unregister the push token and sign out");
    println!("  errors                         - Show reported errors");
    println!("  calls                          - Show recorded backend calls");
    println!("  help, ?                        - Show this help");
    println!("  exit, quit, q                  - Exit session");
    println!();
}
