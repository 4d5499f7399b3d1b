//! GitHub account handler
//!
//! Tokens (personal access tokens or OAuth tokens from the browser flow) are
//! validated against `/user`. Signing in lifts the anonymous API rate limit
//! for every call the GitHub handler makes.

use super::models::{AccessToken, User};
use crate::accounts::{Account, AccountHandler, Credential, Session};
use crate::context::AppContext;
use crate::core::deep_link;
use crate::core::{Image, ImageKind};
use crate::error::{Result, UnipkgError};
use crate::utils::remote::{self, endpoint};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;

pub const ACCOUNT_ID: &str = "gh-user";

const SCOPES: &[&str] = &["read:user", "user:email", "repo"];

#[derive(Default)]
pub struct GitHubAccountHandler {
    session: Arc<Session>,
}

impl GitHubAccountHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared with packages so release lookups use the signed-in token.
    pub(crate) fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    fn fetch_user(&self, token: &str, cx: &AppContext) -> Result<User> {
        let url = endpoint(&cx.settings.github.api_url, &["user"])?;
        remote::get_json(&cx.http, url.as_str(), Some(token))
    }

    fn exchange_code(&self, code: &str, cx: &AppContext) -> Result<String> {
        let github = &cx.settings.github;
        let (Some(client_id), Some(client_secret)) = (&github.client_id, &github.client_secret)
        else {
            return Err(UnipkgError::Config(
                "github client-id and client-secret are required for browser sign-in".to_string(),
            ));
        };

        let url = endpoint(&github.oauth_url, &["login", "oauth", "access_token"])?;
        let reply: AccessToken = remote::post_form(
            &cx.http,
            url.as_str(),
            &[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
            ],
        )?;

        match reply.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(UnipkgError::AuthActivation(
                reply
                    .error_description
                    .or(reply.error)
                    .unwrap_or_else(|| "no access token in OAuth reply".to_string()),
            )),
        }
    }
}

impl fmt::Debug for GitHubAccountHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubAccountHandler")
            .field("user", &self.session.user().map(|u| u.user_name))
            .finish()
    }
}

impl AccountHandler for GitHubAccountHandler {
    fn id(&self) -> &str {
        ACCOUNT_ID
    }

    fn display_name(&self) -> &str {
        "GitHub"
    }

    fn current_user(&self) -> Option<Account> {
        self.session.user()
    }

    fn sign_in(&self, credential: &Credential, cx: &AppContext) -> Result<bool> {
        let user = match self.fetch_user(&credential.secret, cx) {
            Ok(user) => user,
            Err(UnipkgError::RemoteService {
                status: Some(401 | 403),
                ..
            }) => {
                tracing::debug!("github rejected the token");
                self.session.end();
                return Ok(false);
            }
            Err(error) => {
                self.session.end();
                return Err(error);
            }
        };

        let account = Account {
            id: user.id.to_string(),
            user_name: user.login.clone(),
            display_name: user.name,
            avatar: user
                .avatar_url
                .map(|url| Image::url(url, ImageKind::Logo)),
        };
        self.session.start(account, credential.secret.clone());
        cx.credentials
            .save(ACCOUNT_ID, &Credential::new(user.login, credential.secret.clone()))?;

        tracing::debug!(user = ?self.session.user().map(|u| u.user_name), "signed in to github");
        Ok(true)
    }

    fn sign_out(&self, cx: &AppContext) -> Result<()> {
        self.session.end();
        cx.credentials.remove(ACCOUNT_ID)
    }

    fn handle_auth_activation(&self, url: &Url, cx: &AppContext) -> Result<bool> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        if let Some(error) = param("error") {
            return Err(UnipkgError::AuthActivation(
                param("error_description").unwrap_or(error),
            ));
        }
        let code = param("code")
            .filter(|code| !code.is_empty())
            .ok_or_else(|| UnipkgError::AuthActivation("No OAuth code was supplied".to_string()))?;

        let token = self.exchange_code(&code, cx)?;
        self.sign_in(&Credential::new("oauth", token), cx)
    }

    fn sign_in_url(&self, cx: &AppContext) -> Option<Url> {
        let github = &cx.settings.github;
        let client_id = github.client_id.as_deref()?;
        let mut url = endpoint(&github.oauth_url, &["login", "oauth", "authorize"]).ok()?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &deep_link::auth_redirect(ACCOUNT_ID))
            .append_pair("scope", &SCOPES.join(" "));
        Some(url)
    }

    fn auth_token(&self) -> Option<String> {
        self.session.token()
    }
}
