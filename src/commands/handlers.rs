//! `unipkg handlers [enable|disable <id>]`

use crate::error::{Result, UnipkgError};
use crate::handlers::PackageService;
use crate::ui as output;
use crate::utils::machine_output;
use colored::Colorize;
use serde::Serialize;

pub struct HandlersOptions {
    /// `Some((id, enabled))` to change a flag, `None` to list.
    pub toggle: Option<(String, bool)>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HandlerOut {
    id: String,
    name: String,
    namespaces: Vec<String>,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<AccountOut>,
}

#[derive(Debug, Serialize)]
struct AccountOut {
    id: String,
    signed_in_as: Option<String>,
}

pub fn run(service: &PackageService, options: HandlersOptions) -> Result<()> {
    match options.toggle {
        Some((id, enabled)) => toggle(service, &id, enabled, options.json),
        None => list(service, options.json),
    }
}

fn list(service: &PackageService, json: bool) -> Result<()> {
    let rows: Vec<HandlerOut> = service
        .handlers()
        .iter()
        .map(|entry| {
            let handler = entry.handler();
            HandlerOut {
                id: entry.id().to_string(),
                name: handler.display_name().to_string(),
                namespaces: handler
                    .handled_namespaces()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                enabled: entry.is_enabled(),
                account: handler.account_handler().map(|account| AccountOut {
                    id: account.id().to_string(),
                    signed_in_as: account.current_user().map(|user| user.user_name),
                }),
            }
        })
        .collect();

    if json {
        return machine_output::emit("handlers", rows, Vec::new());
    }

    output::header("Handlers");
    for row in &rows {
        let state = if row.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!(
            "{}  {}  [{}]  {}",
            row.id.bold(),
            row.name,
            row.namespaces.join(", ").cyan(),
            state
        );
        if let Some(account) = &row.account {
            let who = match &account.signed_in_as {
                Some(user) => format!("signed in as {}", user),
                None => "signed out".to_string(),
            };
            output::indent(&format!("account {}: {}", account.id, who.dimmed()), 1);
        }
    }
    Ok(())
}

/// Persist the flag in `settings.kdl`; it takes effect on the next run.
fn toggle(service: &PackageService, id: &str, enabled: bool, json: bool) -> Result<()> {
    if service.handler(id).is_none() {
        return Err(UnipkgError::InvalidArgument(format!(
            "unknown handler '{}' (see `unipkg handlers`)",
            id
        )));
    }

    let mut settings = service.context().settings.clone();
    settings.set_handler_enabled(id, enabled);
    settings.save()?;
    tracing::info!(handler = id, enabled, "handler flag saved");

    if json {
        return machine_output::emit(
            "handlers",
            serde_json::json!({ "id": id, "enabled": enabled }),
            Vec::new(),
        );
    }

    let verb = if enabled { "Enabled" } else { "Disabled" };
    output::success(&format!("{} handler '{}'", verb, id));
    Ok(())
}
