//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use classy_domain::{ContentResource, Entitlement, OneTimeProductUiState, SubscriptionUiState};
use classy_status::RepositoryCall;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a subscription state.
    pub fn format_subscription(&self, state: &SubscriptionUiState) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = match state {
                    SubscriptionUiState::Loading => serde_json::json!({ "state": "loading" }),
                    SubscriptionUiState::Error(message) => {
                        serde_json::json!({ "state": "error", "message": message })
                    }
                    SubscriptionUiState::Success { content, current } => serde_json::json!({
                        "state": "success",
                        "current": current.as_str(),
                        "tier": current.tier().map(|t| t.as_str()),
                        "billing": current.billing().map(|b| b.as_str()),
                        "content": content.as_ref().map(ContentResource::url),
                    }),
                };
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut rows = vec![("State", self.state_label(state.label()))];
                match state {
                    SubscriptionUiState::Loading => {}
                    SubscriptionUiState::Error(message) => rows.push(("Message", message.clone())),
                    SubscriptionUiState::Success { content, current } => {
                        rows.push(("Plan", current.as_str().to_string()));
                        rows.push(("Tier", current.tier().map_or("-", |t| t.as_str()).to_string()));
                        rows.push((
                            "Billing",
                            current.billing().map_or("-", |b| b.as_str()).to_string(),
                        ));
                        rows.push(("Content", content_cell(content.as_ref())));
                    }
                }
                Ok(self.field_table(&rows))
            }
            OutputFormat::Quiet => Ok(state
                .current()
                .map_or_else(|| state.label().to_uppercase(), |c| c.as_str().to_string())),
        }
    }

    /// Format a one-time product state; `None` before the first computation.
    pub fn format_one_time_product(&self, state: Option<&OneTimeProductUiState>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = match state {
                    None => serde_json::Value::Null,
                    Some(OneTimeProductUiState::Error(message)) => {
                        serde_json::json!({ "state": "error", "message": message })
                    }
                    Some(OneTimeProductUiState::Success {
                        current,
                        content,
                        message,
                    }) => serde_json::json!({
                        "state": "success",
                        "current": current.as_str(),
                        "content": content.as_ref().map(ContentResource::url),
                        "message": message,
                    }),
                };
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let Some(state) = state else {
                    return Ok(self.colorize("Not computed yet.", "yellow"));
                };
                let mut rows = vec![("State", self.state_label(state.label()))];
                match state {
                    OneTimeProductUiState::Error(message) => rows.push(("Message", message.clone())),
                    OneTimeProductUiState::Success {
                        current,
                        content,
                        message,
                    } => {
                        rows.push(("Purchase", current.as_str().to_string()));
                        rows.push(("Content", content_cell(content.as_ref())));
                        rows.push(("Message", message.clone()));
                    }
                }
                Ok(self.field_table(&rows))
            }
            OutputFormat::Quiet => Ok(state
                .and_then(OneTimeProductUiState::current)
                .map_or_else(|| "NONE".to_string(), |c| c.as_str().to_string())),
        }
    }

    /// Format the entitlement signals currently published.
    pub fn format_entitlements(&self, entitlements: &[(Entitlement, bool)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = entitlements
                    .iter()
                    .map(|(e, held)| (e.as_str().to_string(), serde_json::Value::Bool(*held)))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Entitlement", "Held"]);
                for (entitlement, held) in entitlements {
                    let cell = if *held {
                        self.colorize("yes", "green")
                    } else {
                        "no".to_string()
                    };
                    builder.push_record([entitlement.as_str().to_string(), cell]);
                }
                Ok(self.render(builder))
            }
            OutputFormat::Quiet => Ok(entitlements
                .iter()
                .filter(|(_, held)| *held)
                .map(|(e, _)| e.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format the backend calls recorded by the session repository.
    pub fn format_calls(&self, calls: &[RepositoryCall]) -> Result<String> {
        let described: Vec<String> = calls.iter().map(describe_call).collect();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&described)?),
            OutputFormat::Table => {
                if calls.is_empty() {
                    return Ok(self.colorize("No backend calls recorded.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Call"]);
                for (i, call) in described.iter().enumerate() {
                    builder.push_record([(i + 1).to_string(), call.clone()]);
                }
                Ok(self.render(builder))
            }
            OutputFormat::Quiet => Ok(described.join("\n")),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn state_label(&self, label: &str) -> String {
        match label {
            "success" => self.colorize(label, "green"),
            "loading" => self.colorize(label, "yellow"),
            "error" => self.colorize(label, "red"),
            _ => label.to_string(),
        }
    }

    fn field_table(&self, rows: &[(&str, String)]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (field, value) in rows {
            builder.push_record([field.to_string(), value.clone()]);
        }
        self.render(builder)
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn content_cell(content: Option<&ContentResource>) -> String {
    content.map_or_else(|| "-".to_string(), |c| c.url().to_string())
}

fn describe_call(call: &RepositoryCall) -> String {
    match call {
        RepositoryCall::QueryProducts => "query products".to_string(),
        RepositoryCall::FetchSubscriptions => "fetch subscriptions".to_string(),
        RepositoryCall::FetchOneTimeProductPurchases => "fetch one-time product purchases".to_string(),
        RepositoryCall::RegisterSubscription {
            product,
            purchase_token,
        } => format!("register subscription {} ({})", product, purchase_token),
        RepositoryCall::RegisterInstanceId(token) => format!("register push token {}", token),
        RepositoryCall::UnregisterInstanceId(token) => format!("unregister push token {}", token),
        RepositoryCall::DeleteLocalUserData => "delete local user data".to_string(),
    }
}
