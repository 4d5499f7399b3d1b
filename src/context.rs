//! Application context
//!
//! Everything that used to be process-wide (the HTTP client, the event bus,
//! the installer backend, the credential store and settings) is built once
//! here and handed to handlers and packages by reference.

use crate::accounts::{CredentialStore, FileCredentialStore};
use crate::config::Settings;
use crate::constants::USER_AGENT;
use crate::core::Architecture;
use crate::error::Result;
use crate::events::EventBus;
use crate::installer::{CommandInstaller, InstallerBackend};
use crate::utils::paths;
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared abort flag for long-running transfers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the next operation can run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct AppContext {
    pub http: Client,
    pub events: EventBus,
    pub installer: Arc<dyn InstallerBackend>,
    pub credentials: Arc<dyn CredentialStore>,
    pub settings: Settings,
    pub download_dir: PathBuf,
    pub architecture: Architecture,
    pub cancel: CancelToken,
}

impl AppContext {
    /// Load settings from the config directory and build with the default services.
    pub fn load() -> Result<Self> {
        Self::builder(Settings::load()?).build()
    }

    pub fn builder(settings: Settings) -> AppContextBuilder {
        AppContextBuilder {
            settings,
            http: None,
            events: None,
            installer: None,
            credentials: None,
            download_dir: None,
            architecture: None,
            cancel: None,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("events", &self.events)
            .field("download_dir", &self.download_dir)
            .field("architecture", &self.architecture)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

pub struct AppContextBuilder {
    settings: Settings,
    http: Option<Client>,
    events: Option<EventBus>,
    installer: Option<Arc<dyn InstallerBackend>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    download_dir: Option<PathBuf>,
    architecture: Option<Architecture>,
    cancel: Option<CancelToken>,
}

impl AppContextBuilder {
    pub fn http(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn installer(mut self, installer: Arc<dyn InstallerBackend>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = Some(architecture);
        self
    }

    /// Share an abort flag created before the context, e.g. by a Ctrl-C handler.
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Result<AppContext> {
        let http = match self.http {
            Some(client) => client,
            None => Client::builder().user_agent(USER_AGENT).build()?,
        };

        let installer = match self.installer {
            Some(installer) => installer,
            None => Arc::new(CommandInstaller::new(self.settings.installer.clone())),
        };

        let credentials = match self.credentials {
            Some(store) => store,
            None => Arc::new(FileCredentialStore::new(paths::credentials_file()?)),
        };

        let download_dir = match self.download_dir {
            Some(dir) => dir,
            None => self.settings.download_dir()?,
        };

        Ok(AppContext {
            http,
            events: self.events.unwrap_or_default(),
            installer,
            credentials,
            settings: self.settings,
            download_dir,
            architecture: self.architecture.unwrap_or_else(Architecture::current),
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}
