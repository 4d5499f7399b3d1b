//! # Package entity
//!
//! One [`Package`] per resolved item. It carries the common metadata, a
//! monotonic [`PackageStatus`], images, the downloaded artifact and a
//! [`PackageBackend`] holding everything backend-specific.
//!
//! A package with `items` is a collection: its operations fan out to the
//! child packages (see `collection.rs`).

mod capabilities;
mod collection;
mod display;
mod operations;
mod transfer;

pub use capabilities::{
    Artifact, Downloadable, Installable, Launchable, PackageBackend, pick_for_architecture,
};
pub use display::BASE_FIELDS;

use crate::core::{Image, ImageKind, Link, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::events::PackageContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageMeta {
    pub title: Option<String>,
    pub short_title: Option<String>,
    pub description: Option<String>,
    pub publisher_id: Option<String>,
    pub developer_name: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub version: Option<String>,
    pub website: Option<Link>,
    pub rating: Option<f64>,
}

/// Serializable snapshot of a package, used for `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    pub urn: String,
    pub handler: String,
    pub status: PackageStatus,
    #[serde(flatten)]
    pub meta: PackageMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_item: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PackageSummary>>,
}

pub struct Package {
    urn: OnceLock<PackageUrn>,
    status: PackageStatus,
    pub meta: PackageMeta,
    images: Vec<Image>,
    artifact: Option<Artifact>,
    download_item: Option<PathBuf>,
    handler_id: String,
    backend: Box<dyn PackageBackend>,
    items: Option<Vec<Package>>,
}

impl Package {
    pub fn new(
        handler_id: impl Into<String>,
        backend: impl PackageBackend + 'static,
        status: PackageStatus,
    ) -> Self {
        Self {
            urn: OnceLock::new(),
            status,
            meta: PackageMeta::default(),
            images: Vec::new(),
            artifact: None,
            download_item: None,
            handler_id: handler_id.into(),
            backend: Box::new(backend),
            items: None,
        }
    }

    /// An empty collection. Add children with [`Package::add_item`].
    pub fn collection(
        handler_id: impl Into<String>,
        backend: impl PackageBackend + 'static,
        status: PackageStatus,
    ) -> Self {
        Self {
            items: Some(Vec::new()),
            ..Self::new(handler_id, backend, status)
        }
    }

    pub fn with_meta(mut self, meta: PackageMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    /// Identity, derived from the backend on first use unless set explicitly.
    pub fn urn(&self) -> &PackageUrn {
        self.urn.get_or_init(|| self.backend.derive_urn())
    }

    pub fn set_urn(&mut self, urn: PackageUrn) {
        self.urn = OnceLock::from(urn);
    }

    pub fn status(&self) -> PackageStatus {
        self.status
    }

    /// Move the status forward. Lower values are ignored.
    pub fn advance_status(&mut self, status: PackageStatus) {
        if status > self.status {
            self.status = status;
        }
    }

    /// Explicit reset for re-download: forget the artifact and drop back to `Details`.
    pub fn reset_download(&mut self) {
        self.artifact = None;
        self.download_item = None;
        self.status = self.status.min(PackageStatus::Details);
        if let Some(items) = &mut self.items {
            items.iter_mut().for_each(Package::reset_download);
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.title.as_deref()
    }

    /// Title, falling back to the URN's namespace-specific part.
    pub fn display_title(&self) -> String {
        self.meta
            .short_title
            .clone()
            .or_else(|| self.meta.title.clone())
            .unwrap_or_else(|| self.urn().specific())
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn image(&self, kind: ImageKind) -> Option<&Image> {
        self.images.iter().find(|image| image.kind == kind)
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Downloaded artifact; only set once status is at least `Downloaded`.
    pub fn download_item(&self) -> Option<&Path> {
        self.download_item.as_deref()
    }

    /// Id of the handler that produced this package.
    pub fn handler_id(&self) -> &str {
        &self.handler_id
    }

    pub fn backend(&self) -> &dyn PackageBackend {
        self.backend.as_ref()
    }

    /// Typed access to the backend, for the handler that created it.
    pub fn backend_as<T: 'static>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    pub fn is_collection(&self) -> bool {
        self.items.is_some()
    }

    pub fn items(&self) -> Option<&[Package]> {
        self.items.as_deref()
    }

    pub fn context(&self) -> PackageContext {
        PackageContext {
            urn: self.urn().clone(),
            title: self.meta.title.clone(),
            handler: self.handler_id.clone(),
            status: self.status,
        }
    }

    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            urn: self.urn().to_string(),
            handler: self.handler_id.clone(),
            status: self.status,
            meta: self.meta.clone(),
            images: self.images.clone(),
            download_item: self.download_item.clone(),
            items: self
                .items
                .as_ref()
                .map(|items| items.iter().map(Package::summary).collect()),
        }
    }

    /// Fail fast unless the status is at least `required`.
    fn require(&self, operation: &'static str, required: PackageStatus) -> Result<()> {
        if self.status.is_less_than(required) {
            return Err(UnipkgError::Precondition {
                operation,
                required,
                actual: self.status,
            });
        }
        Ok(())
    }
}

impl Clone for Package {
    fn clone(&self) -> Self {
        Self {
            urn: self.urn.clone(),
            status: self.status,
            meta: self.meta.clone(),
            images: self.images.clone(),
            artifact: self.artifact.clone(),
            download_item: self.download_item.clone(),
            handler_id: self.handler_id.clone(),
            backend: self.backend.clone_box(),
            items: self.items.clone(),
        }
    }
}

/// Backend-defined equality: same backend type and same identifying fields.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.backend.type_tag() == other.backend.type_tag()
            && self.backend.identity() == other.backend.identity()
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("urn", self.urn())
            .field("status", &self.status)
            .field("title", &self.meta.title)
            .field("handler", &self.handler_id)
            .field("items", &self.items.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.context())
    }
}

#[cfg(test)]
mod tests;
