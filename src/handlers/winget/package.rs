use super::NAMESPACE_WINGET;
use super::models::{Manifest, ManifestInstaller, WinGetEntry};
use crate::context::AppContext;
use crate::core::{Architecture, Image, ImageKind, InstallerType, Link, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::package::{
    Artifact, Downloadable, Installable, Launchable, Package, PackageBackend, PackageMeta,
    pick_for_architecture,
};
use crate::utils::remote::{self, endpoint};
use reqwest::Url;
use std::any::Any;

#[derive(Debug, Clone, PartialEq)]
pub struct WinGetPackage {
    /// `Publisher.Package`
    pub id: String,
    pub version: Option<String>,
    pub license: Option<String>,
    pub tags: Vec<String>,
    icon_url: Option<String>,
    banner_url: Option<String>,
}

impl WinGetPackage {
    pub fn new(id: impl Into<String>, version: Option<String>) -> Self {
        Self {
            id: id.into(),
            version,
            license: None,
            tags: Vec::new(),
            icon_url: None,
            banner_url: None,
        }
    }

    pub fn package(handler_id: &str, entry: WinGetEntry, status: PackageStatus) -> Package {
        let (publisher_id, package_id) = split_id(&entry.id);
        let version = entry.latest_version().map(str::to_string);
        let latest = entry.latest;
        let short_title = package_id.unwrap_or(latest.name.as_str()).to_string();

        let meta = PackageMeta {
            website: Link::create(latest.homepage.as_deref(), format!("{} website", short_title)),
            title: Some(latest.name.clone()),
            short_title: Some(short_title),
            description: latest.description,
            publisher_id: Some(publisher_id.to_string()),
            developer_name: latest.publisher,
            release_date: entry.created_at,
            version: version.clone(),
            ..PackageMeta::default()
        };

        let backend = Self {
            version,
            license: latest.license,
            tags: latest.tags,
            icon_url: entry.icon_url,
            banner_url: entry.banner,
            id: entry.id,
        };

        Package::new(handler_id, backend, status).with_meta(meta)
    }

    pub fn web_url(&self) -> String {
        let (publisher, package) = split_id(&self.id);
        format!(
            "{}/{}/{}",
            crate::constants::urls::web::WINGET_PACKAGE_BASE,
            publisher,
            package.unwrap_or_default()
        )
    }

    fn fetch_manifest(&self, cx: &AppContext) -> Result<Manifest> {
        let version = self.version.as_deref().ok_or_else(|| {
            UnipkgError::NotFound(format!("{} lists no versions", self.id))
        })?;
        let url = endpoint(&cx.settings.winget.api_url, &["manifests", &self.id, version])?;
        remote::get_json(&cx.http, url.as_str(), None)
    }
}

/// `("Git", Some("Git"))` for `Git.Git`; package ids may contain further dots.
pub(crate) fn split_id(id: &str) -> (&str, Option<&str>) {
    match id.split_once('.') {
        Some((publisher, package)) => (publisher, Some(package)),
        None => (id, None),
    }
}

impl PackageBackend for WinGetPackage {
    fn type_tag(&self) -> &'static str {
        "winget"
    }

    fn identity(&self) -> Vec<String> {
        vec![
            self.id.to_lowercase(),
            self.version.clone().unwrap_or_default(),
        ]
    }

    fn derive_urn(&self) -> PackageUrn {
        PackageUrn::new(NAMESPACE_WINGET, [self.id.as_str()])
    }

    fn downloader(&self) -> Option<&dyn Downloadable> {
        Some(self)
    }

    fn installer(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn launcher(&self) -> Option<&dyn Launchable> {
        Some(self)
    }

    fn app_icon(&self, _cx: &AppContext) -> Result<Option<Image>> {
        Ok(self
            .icon_url
            .as_ref()
            .map(|url| Image::url(url.clone(), ImageKind::Logo)))
    }

    fn hero_image(&self, _cx: &AppContext) -> Result<Option<Image>> {
        Ok(self
            .banner_url
            .as_ref()
            .map(|url| Image::url(url.clone(), ImageKind::Hero)))
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("Package ID", self.id.clone())];
        if let Some(license) = &self.license {
            fields.push(("License", license.clone()));
        }
        if !self.tags.is_empty() {
            fields.push(("Tags", self.tags.join(", ")));
        }
        fields
    }

    fn clone_box(&self) -> Box<dyn PackageBackend> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Downloadable for WinGetPackage {
    fn resolve_artifact(&self, cx: &AppContext) -> Result<Artifact> {
        let manifest = self.fetch_manifest(cx)?;
        let installer = select_installer(&manifest, cx.architecture)?;
        tracing::debug!(
            id = %manifest.id,
            version = %manifest.version,
            arch = %installer.arch,
            "selected manifest installer"
        );
        artifact_for(&manifest, installer)
    }
}

impl Installable for WinGetPackage {
    fn install_identifier(&self) -> String {
        self.id.clone()
    }
}

impl Launchable for WinGetPackage {
    fn launch_identifier(&self) -> String {
        self.id.clone()
    }
}

/// Installer for `host`, falling back to neutral then x86 builds.
pub(crate) fn select_installer(manifest: &Manifest, host: Architecture) -> Result<&ManifestInstaller> {
    pick_for_architecture(&manifest.installers, host, |installer| {
        Architecture::from_name(&installer.arch)
    })
    .ok_or_else(|| {
        let available: Vec<&str> = manifest.installers.iter().map(|i| i.arch.as_str()).collect();
        UnipkgError::PlatformNotSupported(format!(
            "your architecture is {}, which {} does not support; it supports {}",
            host,
            manifest.id,
            if available.is_empty() {
                "nothing".to_string()
            } else {
                available.join(", ")
            }
        ))
    })
}

/// Manifest installer kinds mapped onto the formats the installer backend dispatches.
fn installer_kind(name: &str) -> InstallerType {
    match name.trim().to_ascii_lowercase().as_str() {
        "inno" | "nullsoft" | "burn" | "exe" | "portable" => InstallerType::Exe,
        "wix" | "msi" => InstallerType::Msi,
        other => InstallerType::from_name(other).unwrap_or_default(),
    }
}

pub(crate) fn artifact_for(manifest: &Manifest, installer: &ManifestInstaller) -> Result<Artifact> {
    let url = Url::parse(&installer.url)
        .map_err(|e| UnipkgError::remote(None, format!("bad installer URL '{}': {}", installer.url, e)))?;

    let declared = installer
        .installer_type
        .as_deref()
        .or(manifest.installer_type.as_deref())
        .map(installer_kind)
        .unwrap_or_default();

    let mut file_name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| manifest.id.clone());

    let detected = InstallerType::from_file_name(&file_name);
    if detected == InstallerType::Unknown && declared != InstallerType::Unknown {
        file_name = format!("{}.{}", file_name, declared.extension());
    }

    let mut artifact = Artifact::new(url, file_name);
    if declared != InstallerType::Unknown {
        artifact.installer_type = declared;
    }

    let silent = installer
        .switches
        .as_ref()
        .and_then(|s| s.silent.as_deref())
        .or_else(|| manifest.switches.as_ref().and_then(|s| s.silent.as_deref()));
    if let Some(switches) = silent {
        artifact.install_args = shlex::split(switches).ok_or_else(|| {
            UnipkgError::Serialization(format!("unbalanced quotes in silent switches '{}'", switches))
        })?;
    }

    Ok(artifact)
}
