//! REST v3 payloads, trimmed to the fields the handler reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u64,
    pub language: Option<String>,
    pub license: Option<License>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct License {
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

impl License {
    /// SPDX id when GitHub recognised the license, otherwise its display name.
    pub fn label(&self) -> Option<&str> {
        self.spdx_id
            .as_deref()
            .filter(|id| *id != "NOASSERTION")
            .or(self.name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Reply of the OAuth code exchange. GitHub answers 200 with `error` set for bad codes.
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
