//! winget.run v2 payloads (PascalCase on the wire).

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageResponse {
    pub package: WinGetEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageList {
    #[serde(default)]
    pub packages: Vec<WinGetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WinGetEntry {
    pub id: String,
    #[serde(default)]
    pub versions: Vec<String>,
    pub latest: LatestInfo,
    pub icon_url: Option<String>,
    pub banner: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl WinGetEntry {
    /// The index lists versions oldest first.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LatestInfo {
    pub name: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub installer_type: Option<String>,
    pub switches: Option<Switches>,
    #[serde(default)]
    pub installers: Vec<ManifestInstaller>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestInstaller {
    pub arch: String,
    pub url: String,
    pub installer_type: Option<String>,
    pub switches: Option<Switches>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Switches {
    pub silent: Option<String>,
}
