//! Collections: a package whose operations fan out to its children.
//!
//! Children are attempted in order and a failing child never stops the rest;
//! results reduce with logical AND. A collection never contains itself,
//! directly or through a nested collection: inserts are checked, and every
//! traversal re-checks with an ancestor stack before touching children.

use super::Package;
use crate::context::AppContext;
use crate::core::{PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::events::{ErrorKind, PackageMessage, SuccessKind};

impl Package {
    pub fn add_item(&mut self, item: Package) -> Result<()> {
        let own = self.urn().clone();
        if self.items.is_none() {
            return Err(UnipkgError::InvalidArgument(format!(
                "{} is not a collection",
                own
            )));
        }
        if item.urn() == &own || item.contains_urn(&own) {
            return Err(UnipkgError::CyclicCollection(format!(
                "{} cannot contain {}",
                own,
                item.urn()
            )));
        }

        if let Some(items) = &mut self.items {
            items.push(item);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, urn: &PackageUrn) -> Option<Package> {
        let items = self.items.as_mut()?;
        let index = items.iter().position(|item| item.urn() == urn)?;
        Some(items.remove(index))
    }

    /// Whether `urn` appears anywhere below this package.
    pub fn contains_urn(&self, urn: &PackageUrn) -> bool {
        self.items.iter().flatten().any(|item| item.urn() == urn || item.contains_urn(urn))
    }

    /// Walk the whole tree and fail on the first package that is its own ancestor.
    pub fn ensure_acyclic(&self) -> Result<()> {
        self.check_cycles(&mut Vec::new())
    }

    fn check_cycles<'a>(&'a self, ancestors: &mut Vec<&'a PackageUrn>) -> Result<()> {
        let urn = self.urn();
        if ancestors.contains(&urn) {
            return Err(UnipkgError::CyclicCollection(format!(
                "{} appears inside itself",
                urn
            )));
        }

        if let Some(items) = &self.items {
            ancestors.push(urn);
            for item in items {
                item.check_cycles(ancestors)?;
            }
            ancestors.pop();
        }
        Ok(())
    }

    pub(super) fn download_items(&mut self, cx: &AppContext) -> Result<()> {
        self.ensure_acyclic()?;
        self.require("download", self.backend.required_download_status())?;

        let package = self.context();
        cx.events
            .publish(PackageMessage::DownloadStarted { package: package.clone() });

        let (failed, total) = self.for_each_item(|item| match item.download(cx) {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(urn = %item.urn(), %error, "collection item failed to download");
                false
            }
        });

        if failed == 0 {
            self.advance_status(PackageStatus::Downloaded);
            cx.events.publish(PackageMessage::success(
                SuccessKind::PackageDownloadCompleted,
                &self.context(),
            ));
            return Ok(());
        }

        let error = UnipkgError::CollectionFailed {
            operation: "download",
            failed,
            total,
        };
        cx.events.publish(PackageMessage::error(
            ErrorKind::PackageDownloadFailed,
            error.clone(),
            Some(&package),
        ));
        Err(error)
    }

    pub(super) fn install_items(&mut self, cx: &AppContext) -> Result<bool> {
        self.ensure_acyclic()?;
        // listings carry no children; only a hydrated collection can be acted on
        self.require("install", self.backend.required_download_status())?;

        let package = self.context();
        cx.events
            .publish(PackageMessage::InstallStarted { package: package.clone() });

        let (failed, total) = self.for_each_item(|item| match item.install(cx) {
            Ok(installed) => installed,
            Err(error) => {
                tracing::warn!(urn = %item.urn(), %error, "collection item failed to install");
                false
            }
        });

        if failed == 0 {
            self.advance_status(PackageStatus::Installed);
            cx.events.publish(PackageMessage::success(
                SuccessKind::PackageInstallCompleted,
                &self.context(),
            ));
            return Ok(true);
        }

        cx.events.publish(PackageMessage::error(
            ErrorKind::PackageInstallFailed,
            UnipkgError::CollectionFailed {
                operation: "install",
                failed,
                total,
            },
            Some(&package),
        ));
        Ok(false)
    }

    pub(super) fn is_installed_items(&mut self, cx: &AppContext) -> Result<bool> {
        self.ensure_acyclic()?;
        self.require("is-installed", self.backend.required_download_status())?;

        let (failed, _) = self.for_each_item(|item| {
            item.is_installed(cx).unwrap_or_else(|error| {
                tracing::warn!(urn = %item.urn(), %error, "could not query install state");
                false
            })
        });

        if failed == 0 {
            self.advance_status(PackageStatus::Installed);
        }
        Ok(failed == 0)
    }

    /// Launches every child, even after one fails.
    pub(super) fn launch_items(&self, cx: &AppContext) -> Result<()> {
        self.ensure_acyclic()?;

        let items = self.items.as_deref().unwrap_or_default();
        let failed = items
            .iter()
            .filter(|item| match item.launch(cx) {
                Ok(()) => false,
                Err(error) => {
                    tracing::warn!(urn = %item.urn(), %error, "collection item failed to launch");
                    true
                }
            })
            .count();

        if failed == 0 {
            Ok(())
        } else {
            Err(UnipkgError::CollectionFailed {
                operation: "launch",
                failed,
                total: items.len(),
            })
        }
    }

    /// Run `op` on every child in order; returns `(failed, total)`.
    fn for_each_item(&mut self, mut op: impl FnMut(&mut Package) -> bool) -> (usize, usize) {
        let items = self.items.as_deref_mut().unwrap_or_default();
        let failed = items.iter_mut().map(|item| !op(item)).filter(|f| *f).count();
        (failed, items.len())
    }
}
