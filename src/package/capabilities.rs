//! Backend capabilities
//!
//! A [`Package`](super::Package) owns one [`PackageBackend`] with the
//! backend-specific fields; optional behaviour is exposed as capability
//! objects instead of a class hierarchy.

use crate::context::AppContext;
use crate::core::{Architecture, Image, InstallerType, PackageStatus, PackageUrn};
use crate::error::Result;
use crate::installer::InstallRequest;
use reqwest::Url;
use std::any::Any;
use std::fmt;
use std::path::Path;

/// Where the installer for a package can be fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub url: Url,
    pub file_name: String,
    pub installer_type: InstallerType,
    /// Installer switches to pass through (e.g. silent flags).
    pub install_args: Vec<String>,
}

impl Artifact {
    pub fn new(url: Url, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            installer_type: InstallerType::from_file_name(&file_name),
            url,
            file_name,
            install_args: Vec::new(),
        }
    }
}

pub trait PackageBackend: fmt::Debug + Send + Sync {
    /// Concrete backend name; part of package equality.
    fn type_tag(&self) -> &'static str;

    /// Stable identifying fields. Two packages are equal when tag and identity match.
    fn identity(&self) -> Vec<String>;

    fn derive_urn(&self) -> PackageUrn;

    fn required_download_status(&self) -> PackageStatus {
        PackageStatus::Details
    }

    fn downloader(&self) -> Option<&dyn Downloadable> {
        None
    }

    fn installer(&self) -> Option<&dyn Installable> {
        None
    }

    fn launcher(&self) -> Option<&dyn Launchable> {
        None
    }

    fn app_icon(&self, _cx: &AppContext) -> Result<Option<Image>> {
        Ok(None)
    }

    fn hero_image(&self, _cx: &AppContext) -> Result<Option<Image>> {
        Ok(None)
    }

    fn screenshots(&self, _cx: &AppContext) -> Result<Vec<Image>> {
        Ok(Vec::new())
    }

    /// Backend-specific `(label, value)` rows appended after the common metadata.
    fn display_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn clone_box(&self) -> Box<dyn PackageBackend>;

    fn as_any(&self) -> &dyn Any;
}

pub trait Downloadable {
    /// Look up the installer artifact for this package and the context's architecture.
    fn resolve_artifact(&self, cx: &AppContext) -> Result<Artifact>;
}

pub trait Installable {
    /// Name the installer backend knows the package by once installed.
    fn install_identifier(&self) -> String;

    fn install(
        &self,
        file: &Path,
        artifact: &Artifact,
        cx: &AppContext,
        progress: &dyn Fn(Option<f64>),
    ) -> Result<bool> {
        let identifier = self.install_identifier();
        let installer_type = match artifact.installer_type {
            InstallerType::Unknown => cx.installer.installer_type(file),
            known => known,
        };
        let request = InstallRequest {
            file,
            installer_type,
            identifier: &identifier,
            args: &artifact.install_args,
        };
        cx.installer.install(&request, progress)
    }

    fn is_installed(&self, cx: &AppContext) -> Result<bool> {
        cx.installer.is_installed(&self.install_identifier())
    }
}

pub trait Launchable {
    fn launch_identifier(&self) -> String;

    fn can_launch(&self, cx: &AppContext) -> Result<bool> {
        cx.installer.is_installed(&self.launch_identifier())
    }

    fn launch(&self, cx: &AppContext) -> Result<()> {
        cx.installer.launch(&self.launch_identifier())
    }
}

/// Pick the item built for `host`: exact match first, then architecture-neutral,
/// then 32-bit x86.
pub fn pick_for_architecture<T>(
    items: &[T],
    host: Architecture,
    arch_of: impl Fn(&T) -> Architecture,
) -> Option<&T> {
    [host, Architecture::Neutral, Architecture::X86]
        .into_iter()
        .find_map(|wanted| items.iter().find(|item| arch_of(item) == wanted))
}
