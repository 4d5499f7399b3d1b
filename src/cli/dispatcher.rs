//! Command dispatcher
//!
//! Builds the application context and handler registry once, then routes the
//! parsed command to its implementation in `commands`.

use crate::cli::args::{Cli, Command, HandlersAction};
use crate::commands;
use crate::commands::accounts::{AccountAction, AccountOptions};
use crate::commands::acquire::{AcquireOptions, Action};
use crate::commands::search::{Listing, SearchOptions};
use crate::context::{AppContext, CancelToken};
use crate::config::Settings;
use crate::error::Result;
use crate::events::log_observer;
use crate::handlers::PackageService;
use crate::ui as output;
use std::sync::Arc;

/// Name used for the `--json` envelope of a command.
pub fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Resolve { .. } => "resolve",
        Command::Search { .. } => "search",
        Command::Suggest { .. } => "suggest",
        Command::Featured => "featured",
        Command::Collections => "collections",
        Command::Download { .. } => "download",
        Command::Install { .. } => "install",
        Command::Launch { .. } => "launch",
        Command::Handlers { .. } => "handlers",
        Command::SignIn { .. } => "sign-in",
        Command::SignOut { .. } => "sign-out",
        Command::Activate { .. } => "activate",
        Command::Completions { .. } => "completions",
    }
}

/// Commands that talk to backends as the signed-in user.
fn wants_silent_sign_in(command: &Command) -> bool {
    !matches!(
        command,
        Command::Handlers { .. } | Command::SignOut { .. } | Command::Completions { .. }
    )
}

pub fn open_service(cancel: CancelToken) -> Result<PackageService> {
    let context = AppContext::builder(Settings::load()?).cancel(cancel).build()?;
    Ok(PackageService::with_builtin_handlers(Arc::new(context)))
}

/// Dispatch the parsed CLI command to the appropriate handler
pub fn dispatch(args: &Cli, cancel: CancelToken) -> Result<()> {
    let Some(command) = &args.command else {
        output::info("Nothing to do. Try `unipkg search <query>` or `unipkg --help`.");
        return Ok(());
    };

    if let Command::Completions { shell } = command {
        return commands::completions::run(*shell);
    }

    let service = open_service(cancel)?;
    let _log = service.context().events.subscribe(log_observer);

    if wants_silent_sign_in(command) {
        let signed_in = service.try_silent_sign_in();
        if !signed_in.is_empty() {
            tracing::debug!(accounts = ?signed_in, "restored sessions");
        }
    }

    let json = args.global.json;
    match command {
        Command::Resolve { target, status } => commands::resolve::run(
            &service,
            commands::resolve::ResolveOptions {
                target: target.clone(),
                status: (*status).into(),
                json,
            },
        ),

        Command::Search { query, limit } => commands::search::run(
            &service,
            SearchOptions {
                listing: Listing::Search,
                query: Some(query.clone()),
                limit: *limit,
                json,
            },
        ),

        Command::Suggest { query } => commands::search::run(
            &service,
            SearchOptions {
                listing: Listing::Suggest,
                query: Some(query.clone()),
                limit: None,
                json,
            },
        ),

        Command::Featured => commands::search::run(
            &service,
            SearchOptions {
                listing: Listing::Featured,
                query: None,
                limit: None,
                json,
            },
        ),

        Command::Collections => commands::search::run(
            &service,
            SearchOptions {
                listing: Listing::Collections,
                query: None,
                limit: None,
                json,
            },
        ),

        Command::Download { target } => acquire(&service, Action::Download, target, json),
        Command::Install { target } => acquire(&service, Action::Install, target, json),
        Command::Launch { target } => acquire(&service, Action::Launch, target, json),

        Command::Handlers { action } => commands::handlers::run(
            &service,
            commands::handlers::HandlersOptions {
                toggle: action.as_ref().map(|action| match action {
                    HandlersAction::Enable { id } => (id.clone(), true),
                    HandlersAction::Disable { id } => (id.clone(), false),
                }),
                json,
            },
        ),

        Command::SignIn { account, token } => commands::accounts::run(
            &service,
            AccountOptions {
                account: account.clone(),
                action: AccountAction::SignIn {
                    token: token.clone(),
                },
                json,
            },
        ),

        Command::SignOut { account } => commands::accounts::run(
            &service,
            AccountOptions {
                account: account.clone(),
                action: AccountAction::SignOut,
                json,
            },
        ),

        Command::Activate { url } => commands::accounts::activate(&service, url, json),

        Command::Completions { shell } => commands::completions::run(*shell),
    }
}

fn acquire(service: &PackageService, action: Action, target: &str, json: bool) -> Result<()> {
    commands::acquire::run(
        service,
        AcquireOptions {
            action,
            target: target.to_string(),
            json,
        },
    )
}
