//! # Progress / Error Signaling
//!
//! Long-running work (fetching artifact metadata, downloading, installing,
//! fan-out calls across handlers) reports what it is doing through a closed
//! set of [`PackageMessage`]s published on an [`EventBus`].
//!
//! Observers register with [`EventBus::subscribe`] and keep the returned
//! [`Subscription`] alive for as long as they want messages; dropping it
//! unregisters the observer. Delivery is synchronous on the publishing thread.

mod bus;

pub use bus::{EventBus, Subscription};

use crate::core::{PackageStatus, PackageUrn};
use crate::error::UnipkgError;
use serde::Serialize;
use std::fmt;

/// Identifies the package a message is about, so observers can correlate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageContext {
    pub urn: PackageUrn,
    pub title: Option<String>,
    pub handler: String,
    pub status: PackageStatus,
}

impl fmt::Display for PackageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} ({})", title, self.urn),
            None => write!(f, "{}", self.urn),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuccessKind {
    PackageFetchCompleted,
    PackageDownloadCompleted,
    PackageInstallCompleted,
    SignedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    PackageFetchFailed,
    PackageDownloadFailed,
    PackageInstallFailed,
    PackageLaunchFailed,
    ResolveFailed,
    SearchFailed,
    FeaturedFailed,
    SignInFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackageMessage {
    FetchStarted {
        package: PackageContext,
    },
    DownloadStarted {
        package: PackageContext,
    },
    DownloadProgress {
        package: PackageContext,
        downloaded: u64,
        total: Option<u64>,
    },
    InstallStarted {
        package: PackageContext,
    },
    /// `fraction` is `None` while the installer cannot estimate progress.
    InstallProgress {
        package: PackageContext,
        fraction: Option<f64>,
    },
    Success {
        kind: SuccessKind,
        context: Option<PackageContext>,
    },
    Error {
        kind: ErrorKind,
        error: UnipkgError,
        context: Option<PackageContext>,
    },
}

impl PackageMessage {
    pub fn success(kind: SuccessKind, package: &PackageContext) -> Self {
        Self::Success {
            kind,
            context: Some(package.clone()),
        }
    }

    pub fn error(kind: ErrorKind, error: UnipkgError, package: Option<&PackageContext>) -> Self {
        Self::Error {
            kind,
            error,
            context: package.cloned(),
        }
    }

    pub fn context(&self) -> Option<&PackageContext> {
        match self {
            Self::FetchStarted { package }
            | Self::DownloadStarted { package }
            | Self::DownloadProgress { package, .. }
            | Self::InstallStarted { package }
            | Self::InstallProgress { package, .. } => Some(package),
            Self::Success { context, .. } | Self::Error { context, .. } => context.as_ref(),
        }
    }

    /// Success and Error end an operation; everything else is intermediate.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

/// Observer mirroring every message to `tracing`.
pub fn log_observer(message: &PackageMessage) {
    match message {
        PackageMessage::FetchStarted { package } => {
            tracing::debug!(urn = %package.urn, "fetch started")
        }
        PackageMessage::DownloadStarted { package } => {
            tracing::info!(urn = %package.urn, "download started")
        }
        PackageMessage::DownloadProgress {
            package,
            downloaded,
            total,
        } => tracing::trace!(urn = %package.urn, downloaded, total = ?total, "download progress"),
        PackageMessage::InstallStarted { package } => {
            tracing::info!(urn = %package.urn, "install started")
        }
        PackageMessage::InstallProgress { package, fraction } => {
            tracing::trace!(urn = %package.urn, fraction = ?fraction, "install progress")
        }
        PackageMessage::Success { kind, context } => match context {
            Some(package) => tracing::info!(urn = %package.urn, kind = ?kind, "completed"),
            None => tracing::info!(kind = ?kind, "completed"),
        },
        PackageMessage::Error {
            kind,
            error,
            context,
        } => match context {
            Some(package) => tracing::warn!(urn = %package.urn, kind = ?kind, %error, "failed"),
            None => tracing::warn!(kind = ?kind, %error, "failed"),
        },
    }
}
