//! # Installer backend
//!
//! The narrow contract the core uses to put a downloaded artifact on the
//! system. Packages never talk to OS packaging tools directly; they build an
//! [`InstallRequest`] and hand it to whatever [`InstallerBackend`] the
//! [`AppContext`](crate::context::AppContext) carries.

mod command;
mod command_exec;

pub use command::CommandInstaller;

use crate::core::InstallerType;
use crate::error::Result;
use std::path::Path;

/// Everything an installer backend needs to install one artifact.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub file: &'a Path,
    pub installer_type: InstallerType,
    /// Name the system will know the package by once installed.
    pub identifier: &'a str,
    /// Extra installer switches (e.g. silent-install flags).
    pub args: &'a [String],
}

pub trait InstallerBackend: Send + Sync {
    /// Install the artifact. `Ok(false)` means the installer ran and reported failure.
    ///
    /// `progress` receives a fraction in `0.0..=1.0`, or `None` while indeterminate.
    fn install(&self, request: &InstallRequest<'_>, progress: &dyn Fn(Option<f64>))
    -> Result<bool>;

    fn is_installed(&self, identifier: &str) -> Result<bool>;

    fn launch(&self, identifier: &str) -> Result<()>;

    fn installer_type(&self, file: &Path) -> InstallerType {
        detect_installer_type(file)
    }
}

/// Installer type from the artifact's file name.
pub fn detect_installer_type(file: &Path) -> InstallerType {
    file.file_name()
        .and_then(|name| name.to_str())
        .map(InstallerType::from_file_name)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
