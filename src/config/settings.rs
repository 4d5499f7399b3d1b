//! Settings Module
//!
//! Loads and saves `settings.kdl`: download location, per-handler enable
//! flags, backend endpoints and installer command templates.
//!
//! ```kdl
//! settings {
//!     download-dir "~/Downloads/unipkg"
//! }
//! handlers {
//!     github #true
//!     winget #false
//! }
//! github {
//!     api-url "https://api.github.com"
//!     client-id "Iv1.abc"
//!     client-secret "..."
//! }
//! installer {
//!     timeout 1800
//!     install "deb" "pkexec dpkg -i {file}"
//!     is-installed "dpkg -s {id}"
//!     launch "gtk-launch {id}"
//! }
//! ```

use crate::constants::{DEFAULT_GITHUB_API, DEFAULT_GITHUB_OAUTH, DEFAULT_WINGET_API};
use crate::core::InstallerType;
use crate::error::{Result, UnipkgError};
use crate::utils::paths;
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default installer command timeout (seconds)
pub const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 1800;

#[derive(Debug, Clone, PartialEq)]
pub struct GitHubSettings {
    pub api_url: String,
    pub oauth_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API.to_string(),
            oauth_url: DEFAULT_GITHUB_OAUTH.to_string(),
            client_id: None,
            client_secret: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WinGetSettings {
    pub api_url: String,
}

impl Default for WinGetSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WINGET_API.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallerSettings {
    pub timeout_secs: u64,
    pub install: BTreeMap<String, String>,
    pub is_installed: Option<String>,
    pub launch: Option<String>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_INSTALL_TIMEOUT_SECS,
            install: BTreeMap::new(),
            is_installed: None,
            launch: None,
        }
    }
}

impl InstallerSettings {
    pub fn install_template(&self, installer_type: InstallerType) -> Option<&str> {
        self.install.get(installer_type.name()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    settings_file: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    handlers: BTreeMap<String, bool>,
    pub github: GitHubSettings,
    pub winget: WinGetSettings,
    pub installer: InstallerSettings,
}

impl Settings {
    /// Load from the default location, or defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::settings_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| UnipkgError::io(path, e))?;
            Self::parse(&content)?
        } else {
            Self::default()
        };
        settings.settings_file = Some(path.to_path_buf());
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let doc = KdlDocument::parse(content)
            .map_err(|e| UnipkgError::Config(format!("Failed to parse settings: {}", e)))?;

        let mut settings = Self::default();
        for node in doc.nodes() {
            match node.name().value() {
                "settings" => parse_general(node, &mut settings)?,
                "handlers" => parse_handlers(node, &mut settings)?,
                "github" => parse_github(node, &mut settings.github),
                "winget" => parse_winget(node, &mut settings.winget),
                "installer" => parse_installer(node, &mut settings.installer)?,
                other => {
                    tracing::warn!(section = other, "ignoring unknown settings section");
                }
            }
        }
        Ok(settings)
    }

    /// Handlers are enabled unless explicitly switched off.
    pub fn handler_enabled(&self, id: &str) -> bool {
        self.handlers.get(id).copied().unwrap_or(true)
    }

    pub fn set_handler_enabled(&mut self, id: &str, enabled: bool) {
        self.handlers.insert(id.to_string(), enabled);
    }

    pub fn handler_flags(&self) -> &BTreeMap<String, bool> {
        &self.handlers
    }

    pub fn download_dir(&self) -> Result<PathBuf> {
        match &self.download_dir {
            Some(dir) => paths::expand_home(dir),
            None => paths::default_download_dir(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.settings_file.as_deref()
    }

    /// Write settings back to the file they were loaded from.
    pub fn save(&self) -> Result<()> {
        let path = match &self.settings_file {
            Some(path) => path.clone(),
            None => paths::settings_file()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| UnipkgError::io(parent, e))?;
        }

        fs::write(&path, self.to_kdl()).map_err(|e| UnipkgError::io(&path, e))
    }

    pub fn to_kdl(&self) -> String {
        let mut content =
            String::from("// unipkg settings\n// Generated by unipkg, comments are not preserved\n\n");

        if let Some(dir) = &self.download_dir {
            content.push_str("settings {\n");
            content.push_str(&format!(
                "    download-dir {}\n",
                quote(&dir.to_string_lossy())
            ));
            content.push_str("}\n\n");
        }

        if !self.handlers.is_empty() {
            content.push_str("handlers {\n");
            for (id, enabled) in &self.handlers {
                content.push_str(&format!("    {} {}\n", quote(id), kdl_bool(*enabled)));
            }
            content.push_str("}\n\n");
        }

        content.push_str("github {\n");
        content.push_str(&format!("    api-url {}\n", quote(&self.github.api_url)));
        content.push_str(&format!("    oauth-url {}\n", quote(&self.github.oauth_url)));
        if let Some(id) = &self.github.client_id {
            content.push_str(&format!("    client-id {}\n", quote(id)));
        }
        if let Some(secret) = &self.github.client_secret {
            content.push_str(&format!("    client-secret {}\n", quote(secret)));
        }
        content.push_str("}\n\n");

        content.push_str("winget {\n");
        content.push_str(&format!("    api-url {}\n", quote(&self.winget.api_url)));
        content.push_str("}\n\n");

        content.push_str("installer {\n");
        content.push_str(&format!("    timeout {}\n", self.installer.timeout_secs));
        for (kind, template) in &self.installer.install {
            content.push_str(&format!("    install {} {}\n", quote(kind), quote(template)));
        }
        if let Some(template) = &self.installer.is_installed {
            content.push_str(&format!("    is-installed {}\n", quote(template)));
        }
        if let Some(template) = &self.installer.launch {
            content.push_str(&format!("    launch {}\n", quote(template)));
        }
        content.push_str("}\n");

        content
    }
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children()
        .map(|doc| doc.nodes())
        .unwrap_or_default()
        .iter()
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(str::to_string)
}

fn parse_bool(node: &KdlNode) -> Result<bool> {
    let entry = node.entries().first();

    if let Some(val) = entry.and_then(|e| e.value().as_bool()) {
        return Ok(val);
    }

    if let Some(s) = entry.and_then(|e| e.value().as_string()) {
        match s.to_lowercase().as_str() {
            "true" | "on" | "yes" => return Ok(true),
            "false" | "off" | "no" => return Ok(false),
            _ => {}
        }
    }

    Err(UnipkgError::Config(format!(
        "Expected a boolean for '{}'",
        node.name().value()
    )))
}

fn parse_general(node: &KdlNode, settings: &mut Settings) -> Result<()> {
    for child in children(node) {
        if child.name().value() == "download-dir" {
            let dir = first_string(child).ok_or_else(|| {
                UnipkgError::Config("download-dir expects a path string".to_string())
            })?;
            settings.download_dir = Some(PathBuf::from(dir));
        }
    }
    Ok(())
}

fn parse_handlers(node: &KdlNode, settings: &mut Settings) -> Result<()> {
    for child in children(node) {
        let enabled = parse_bool(child)?;
        settings.set_handler_enabled(child.name().value(), enabled);
    }
    Ok(())
}

fn parse_github(node: &KdlNode, github: &mut GitHubSettings) {
    for child in children(node) {
        let value = first_string(child);
        match (child.name().value(), value) {
            ("api-url", Some(v)) => github.api_url = v,
            ("oauth-url", Some(v)) => github.oauth_url = v,
            ("client-id", v) => github.client_id = v,
            ("client-secret", v) => github.client_secret = v,
            _ => {}
        }
    }
}

fn parse_winget(node: &KdlNode, winget: &mut WinGetSettings) {
    for child in children(node) {
        if child.name().value() == "api-url"
            && let Some(v) = first_string(child)
        {
            winget.api_url = v;
        }
    }
}

fn parse_installer(node: &KdlNode, installer: &mut InstallerSettings) -> Result<()> {
    for child in children(node) {
        match child.name().value() {
            "timeout" => {
                let secs = child
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_integer())
                    .and_then(|v| u64::try_from(v).ok())
                    .ok_or_else(|| {
                        UnipkgError::Config("installer timeout expects seconds".to_string())
                    })?;
                installer.timeout_secs = secs;
            }
            "install" => {
                let values: Vec<&str> = child
                    .entries()
                    .iter()
                    .filter_map(|e| e.value().as_string())
                    .collect();
                let [kind, template] = values.as_slice() else {
                    return Err(UnipkgError::Config(
                        "install expects: install \"<type>\" \"<command>\"".to_string(),
                    ));
                };
                let installer_type = InstallerType::from_name(kind).ok_or_else(|| {
                    UnipkgError::Config(format!("Unknown installer type '{}'", kind))
                })?;
                installer
                    .install
                    .insert(installer_type.name().to_string(), template.to_string());
            }
            "is-installed" => installer.is_installed = first_string(child),
            "launch" => installer.launch = first_string(child),
            _ => {}
        }
    }
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn kdl_bool(value: bool) -> &'static str {
    if value { "#true" } else { "#false" }
}
