//! `sign-in`, `sign-out` and `activate`.

use crate::accounts::Credential;
use crate::error::{Result, UnipkgError};
use crate::handlers::PackageService;
use crate::ui as output;
use crate::utils::machine_output;
use serde_json::json;

pub enum AccountAction {
    /// Without a token the browser sign-in URL is printed instead.
    SignIn { token: Option<String> },
    SignOut,
}

pub struct AccountOptions {
    pub account: String,
    pub action: AccountAction,
    pub json: bool,
}

pub fn run(service: &PackageService, options: AccountOptions) -> Result<()> {
    match options.action {
        AccountAction::SignIn { token: Some(token) } => {
            let credential = Credential::new("token", token);
            let signed_in = service.sign_in(&options.account, &credential)?;
            if !signed_in {
                return Err(UnipkgError::AuthActivation(format!(
                    "'{}' rejected the token",
                    options.account
                )));
            }
            let user = service
                .account(&options.account)?
                .current_user()
                .map(|account| account.user_name);
            if options.json {
                return machine_output::emit(
                    "sign-in",
                    json!({ "account": options.account, "user": user }),
                    Vec::new(),
                );
            }
            output::success(&format!(
                "Signed in to {} as {}",
                options.account,
                user.as_deref().unwrap_or("unknown user")
            ));
            Ok(())
        }
        AccountAction::SignIn { token: None } => {
            let account = service.account(&options.account)?;
            let url = account.sign_in_url(service.context()).ok_or_else(|| {
                UnipkgError::InvalidArgument(format!(
                    "'{}' has no browser sign-in; pass --token",
                    options.account
                ))
            })?;
            if options.json {
                return machine_output::emit(
                    "sign-in",
                    json!({ "account": options.account, "url": url.as_str() }),
                    Vec::new(),
                );
            }
            output::info("Open this URL to sign in, then run `unipkg activate <redirect-url>`:");
            println!("{}", url);
            Ok(())
        }
        AccountAction::SignOut => {
            service.sign_out(&options.account)?;
            if options.json {
                return machine_output::emit(
                    "sign-out",
                    json!({ "account": options.account }),
                    Vec::new(),
                );
            }
            output::success(&format!("Signed out of {}", options.account));
            Ok(())
        }
    }
}

/// Finish a browser sign-in from the `unipkg://auth/...` redirect.
pub fn activate(service: &PackageService, link: &str, json: bool) -> Result<()> {
    if !service.handle_auth_activation(link)? {
        return Err(UnipkgError::AuthActivation(
            "the account handler rejected the sign-in".to_string(),
        ));
    }
    if json {
        return machine_output::emit("activate", json!({ "signed_in": true }), Vec::new());
    }
    output::success("Signed in");
    Ok(())
}
