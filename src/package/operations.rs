//! Status-gated package operations.
//!
//! | operation | requires           | on success        |
//! |-----------|--------------------|-------------------|
//! | download  | backend-specific   | `Downloaded`      |
//! | install   | `Downloaded`       | `Installed`       |
//! | launch    | `Installed` or OS  | unchanged         |
//!
//! Download and install publish a start message, progress, and exactly one
//! terminal `Success`/`Error` on the context's event bus. Precondition
//! failures return immediately without publishing anything.

use super::{Package, transfer};
use crate::context::AppContext;
use crate::core::{Image, ImageKind, PackageStatus};
use crate::error::{Result, UnipkgError};
use crate::events::{ErrorKind, PackageMessage, SuccessKind};
use crate::utils::sanitize::sanitize_file_name;
use std::path::PathBuf;

impl Package {
    /// Resolve the installer artifact and download it into the context's download directory.
    pub fn download(&mut self, cx: &AppContext) -> Result<PathBuf> {
        if self.is_collection() {
            return self.download_items(cx).map(|_| cx.download_dir.clone());
        }

        self.require("download", self.backend.required_download_status())?;
        if self.backend.downloader().is_none() {
            return Err(self.unsupported("download"));
        }

        let artifact = match self.artifact.clone() {
            Some(artifact) => artifact,
            None => {
                let package = self.context();
                cx.events
                    .publish(PackageMessage::FetchStarted { package: package.clone() });

                let resolved = self
                    .backend
                    .downloader()
                    .ok_or_else(|| self.unsupported("download"))
                    .and_then(|downloader| downloader.resolve_artifact(cx));

                match resolved {
                    Ok(artifact) => {
                        self.artifact = Some(artifact.clone());
                        self.advance_status(PackageStatus::DownloadReady);
                        cx.events.publish(PackageMessage::success(
                            SuccessKind::PackageFetchCompleted,
                            &self.context(),
                        ));
                        artifact
                    }
                    Err(error) => {
                        cx.events.publish(PackageMessage::error(
                            ErrorKind::PackageFetchFailed,
                            error.clone(),
                            Some(&package),
                        ));
                        return Err(error);
                    }
                }
            }
        };

        let dest = cx
            .download_dir
            .join(self.urn().to_file_stem())
            .join(sanitize_file_name(&artifact.file_name));

        let package = self.context();
        cx.events
            .publish(PackageMessage::DownloadStarted { package: package.clone() });
        tracing::debug!(urn = %package.urn, url = %artifact.url, dest = %dest.display(), "downloading");

        let transferred = transfer::fetch(cx, &artifact.url, &dest, |downloaded, total| {
            cx.events.publish(PackageMessage::DownloadProgress {
                package: package.clone(),
                downloaded,
                total,
            });
        });

        match transferred {
            Ok(_) => {
                self.download_item = Some(dest.clone());
                self.advance_status(PackageStatus::Downloaded);
                cx.events.publish(PackageMessage::success(
                    SuccessKind::PackageDownloadCompleted,
                    &self.context(),
                ));
                Ok(dest)
            }
            Err(error) => {
                cx.events.publish(PackageMessage::error(
                    ErrorKind::PackageDownloadFailed,
                    error.clone(),
                    Some(&package),
                ));
                Err(error)
            }
        }
    }

    /// Install the downloaded artifact. `Ok(false)` when the installer reports failure.
    pub fn install(&mut self, cx: &AppContext) -> Result<bool> {
        if self.is_collection() {
            return self.install_items(cx);
        }

        self.require("install", PackageStatus::Downloaded)?;
        let installable = self
            .backend
            .installer()
            .ok_or_else(|| self.unsupported("install"))?;
        let (Some(file), Some(artifact)) = (&self.download_item, &self.artifact) else {
            return Err(UnipkgError::Precondition {
                operation: "install",
                required: PackageStatus::Downloaded,
                actual: self.status,
            });
        };

        let package = self.context();
        cx.events
            .publish(PackageMessage::InstallStarted { package: package.clone() });

        let progress = |fraction: Option<f64>| {
            cx.events.publish(PackageMessage::InstallProgress {
                package: package.clone(),
                fraction,
            });
        };

        match installable.install(file, artifact, cx, &progress) {
            Ok(true) => {
                self.advance_status(PackageStatus::Installed);
                cx.events.publish(PackageMessage::success(
                    SuccessKind::PackageInstallCompleted,
                    &self.context(),
                ));
                Ok(true)
            }
            Ok(false) => {
                cx.events.publish(PackageMessage::error(
                    ErrorKind::PackageInstallFailed,
                    UnipkgError::Other(format!("installer reported failure for {}", package.urn)),
                    Some(&package),
                ));
                Ok(false)
            }
            Err(error) => {
                cx.events.publish(PackageMessage::error(
                    ErrorKind::PackageInstallFailed,
                    error.clone(),
                    Some(&package),
                ));
                Err(error)
            }
        }
    }

    /// Ask the installer backend whether the package is present; a yes advances to `Installed`.
    pub fn is_installed(&mut self, cx: &AppContext) -> Result<bool> {
        if self.is_collection() {
            return self.is_installed_items(cx);
        }

        let Some(installable) = self.backend.installer() else {
            return Ok(false);
        };
        let installed = installable.is_installed(cx)?;
        if installed {
            self.advance_status(PackageStatus::Installed);
        }
        Ok(installed)
    }

    /// Read-only probe; never changes status.
    pub fn can_launch(&self, cx: &AppContext) -> Result<bool> {
        if let Some(items) = &self.items {
            for item in items {
                if !item.can_launch(cx)? {
                    return Ok(false);
                }
            }
            return Ok(!items.is_empty());
        }

        match self.backend.launcher() {
            Some(launcher) => launcher.can_launch(cx),
            None => Ok(false),
        }
    }

    /// Launch the installed package. Requires `Installed`, or an installer backend
    /// that confirms the package is present.
    pub fn launch(&self, cx: &AppContext) -> Result<()> {
        if self.is_collection() {
            return self.launch_items(cx);
        }

        let launcher = self
            .backend
            .launcher()
            .ok_or_else(|| self.unsupported("launch"))?;

        if self.status.is_less_than(PackageStatus::Installed) && !launcher.can_launch(cx)? {
            return Err(UnipkgError::Precondition {
                operation: "launch",
                required: PackageStatus::Installed,
                actual: self.status,
            });
        }

        launcher.launch(cx).inspect_err(|error| {
            cx.events.publish(PackageMessage::error(
                ErrorKind::PackageLaunchFailed,
                error.clone(),
                Some(&self.context()),
            ));
        })
    }

    /// Logo/icon image, falling back to initials of the title.
    pub fn cache_app_icon(&mut self, cx: &AppContext) -> Result<Image> {
        if let Some(icon) = self
            .image(ImageKind::Logo)
            .or_else(|| self.image(ImageKind::Icon))
        {
            return Ok(icon.clone());
        }

        let icon = match self.backend.app_icon(cx)? {
            Some(icon) => icon,
            None => Image::text_from_name(&self.display_title(), ImageKind::Logo),
        };
        self.images.push(icon.clone());
        Ok(icon)
    }

    pub fn cache_hero_image(&mut self, cx: &AppContext) -> Result<Option<Image>> {
        if let Some(hero) = self.image(ImageKind::Hero) {
            return Ok(Some(hero.clone()));
        }

        let hero = self.backend.hero_image(cx)?;
        if let Some(image) = &hero {
            self.images.push(image.clone());
        }
        Ok(hero)
    }

    pub fn cache_screenshots(&mut self, cx: &AppContext) -> Result<Vec<Image>> {
        let cached: Vec<Image> = self
            .images
            .iter()
            .filter(|image| image.kind == ImageKind::Screenshot)
            .cloned()
            .collect();
        if !cached.is_empty() {
            return Ok(cached);
        }

        let screenshots = self.backend.screenshots(cx)?;
        self.images.extend(screenshots.iter().cloned());
        Ok(screenshots)
    }

    fn unsupported(&self, operation: &'static str) -> UnipkgError {
        UnipkgError::Unsupported {
            operation,
            package: self.urn().to_string(),
        }
    }
}
