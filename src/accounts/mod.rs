//! # Accounts
//!
//! Per-backend session lifecycle: `SignedOut -> sign_in -> SignedIn -> sign_out -> SignedOut`.
//!
//! Rejected credentials are a soft failure (`Ok(false)`, still signed out);
//! only transport or storage problems surface as errors.

mod credentials;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

use crate::context::AppContext;
use crate::core::Image;
use crate::error::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub user_name: String,
    pub display_name: Option<String>,
    pub avatar: Option<Image>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub user_name: String,
    pub secret: String,
}

impl Credential {
    pub fn new(user_name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_name", &self.user_name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

pub trait AccountHandler: Send + Sync {
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn current_user(&self) -> Option<Account>;

    fn is_logged_in(&self) -> bool {
        self.current_user().is_some()
    }

    /// Validate `credential` and start a session. Persists the credential on success.
    fn sign_in(&self, credential: &Credential, cx: &AppContext) -> Result<bool>;

    /// Sign in from the credential store without user interaction.
    fn try_silent_sign_in(&self, cx: &AppContext) -> Result<bool> {
        match cx.credentials.get(self.id())? {
            Some(credential) => self.sign_in(&credential, cx),
            None => Ok(false),
        }
    }

    /// Re-validate the current session.
    fn refresh(&self, cx: &AppContext) -> Result<bool> {
        self.try_silent_sign_in(cx)
    }

    fn sign_out(&self, cx: &AppContext) -> Result<()>;

    /// Complete a browser sign-in from its redirect URL.
    fn handle_auth_activation(&self, url: &Url, cx: &AppContext) -> Result<bool>;

    /// Browser URL that starts an interactive sign-in, when the backend has one.
    fn sign_in_url(&self, _cx: &AppContext) -> Option<Url> {
        None
    }

    fn auth_token(&self) -> Option<String>;
}

/// Signed-in user and token, stored together so a user never exists without a token.
#[derive(Debug, Default)]
pub struct Session {
    inner: RwLock<Option<(Account, String)>>,
}

impl Session {
    pub fn user(&self) -> Option<Account> {
        self.read(|(account, _)| account.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.read(|(_, token)| token.clone())
    }

    pub fn start(&self, account: Account, token: String) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((account, token));
    }

    pub fn end(&self) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn read<T>(&self, f: impl FnOnce(&(Account, String)) -> T) -> Option<T> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(f)
    }
}

#[cfg(test)]
mod tests;
