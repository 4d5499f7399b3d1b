//! Repository-backed packages
//!
//! Downloading a repository means downloading an asset of its latest release.
//! Assets carry no structured platform data, so OS and architecture are read
//! from the file name (`tool-1.2-x86_64-linux.AppImage`, `Setup-arm64.msi`).

use super::models::{Asset, Release, Repository};
use super::NAMESPACE_REPO;
use crate::accounts::Session;
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
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct GitHubRepoPackage {
    pub owner: String,
    pub name: String,
    pub stars: u64,
    pub language: Option<String>,
    pub license: Option<String>,
    avatar_url: Option<String>,
    session: Arc<Session>,
}

impl GitHubRepoPackage {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            stars: 0,
            language: None,
            license: None,
            avatar_url: None,
            session,
        }
    }

    /// Build a package from a repository payload at the given status.
    pub fn package(
        handler_id: &str,
        repo: Repository,
        session: Arc<Session>,
        status: PackageStatus,
    ) -> Package {
        let website = repo
            .homepage
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(repo.html_url.as_str());

        let meta = PackageMeta {
            title: Some(repo.name.clone()),
            description: repo.description.clone(),
            publisher_id: Some(repo.owner.login.clone()),
            developer_name: Some(repo.owner.login.clone()),
            release_date: repo.created_at,
            website: Link::create(Some(website), format!("{} website", repo.name)),
            ..PackageMeta::default()
        };

        let backend = Self {
            owner: repo.owner.login,
            name: repo.name,
            stars: repo.stargazers_count,
            language: repo.language,
            license: repo
                .license
                .as_ref()
                .and_then(|l| l.label())
                .map(str::to_string),
            avatar_url: repo.owner.avatar_url,
            session,
        };

        let avatar = backend.avatar_url.clone();
        let package = Package::new(handler_id, backend, status).with_meta(meta);
        match avatar {
            Some(url) => package.with_image(Image::url(url, ImageKind::Logo)),
            None => package,
        }
    }

    pub fn web_url(&self) -> String {
        format!("https://{}/{}/{}", crate::constants::urls::web::GITHUB_HOST, self.owner, self.name)
    }
}

impl fmt::Debug for GitHubRepoPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubRepoPackage")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("stars", &self.stars)
            .finish_non_exhaustive()
    }
}

impl PackageBackend for GitHubRepoPackage {
    fn type_tag(&self) -> &'static str {
        "github-repo"
    }

    fn identity(&self) -> Vec<String> {
        vec![self.owner.to_lowercase(), self.name.to_lowercase()]
    }

    fn derive_urn(&self) -> PackageUrn {
        PackageUrn::new(NAMESPACE_REPO, [self.owner.as_str(), self.name.as_str()])
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
            .avatar_url
            .as_ref()
            .map(|url| Image::url(url.clone(), ImageKind::Logo)))
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("Stars", self.stars.to_string())];
        if let Some(language) = &self.language {
            fields.push(("Language", language.clone()));
        }
        if let Some(license) = &self.license {
            fields.push(("License", license.clone()));
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

impl Downloadable for GitHubRepoPackage {
    fn resolve_artifact(&self, cx: &AppContext) -> Result<Artifact> {
        let url = endpoint(
            &cx.settings.github.api_url,
            &["repos", &self.owner, &self.name, "releases", "latest"],
        )?;
        let release: Release = remote::get_json(&cx.http, url.as_str(), self.session.token().as_deref())
            .map_err(|error| match error {
                UnipkgError::NotFound(_) => {
                    UnipkgError::NotFound(format!("{}/{} has no published release", self.owner, self.name))
                }
                other => other,
            })?;

        let asset = select_asset(&release.assets, HostOs::current(), cx.architecture)?;
        tracing::debug!(
            repo = %self.web_url(),
            tag = %release.tag_name,
            asset = %asset.name,
            size = asset.size,
            "selected release asset"
        );

        let download_url = Url::parse(&asset.browser_download_url).map_err(|e| {
            UnipkgError::remote(None, format!("bad asset URL '{}': {}", asset.browser_download_url, e))
        })?;
        Ok(Artifact::new(download_url, asset.name.clone()))
    }
}

impl Installable for GitHubRepoPackage {
    fn install_identifier(&self) -> String {
        self.name.clone()
    }
}

impl Launchable for GitHubRepoPackage {
    fn launch_identifier(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostOs {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl HostOs {
    pub(crate) fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "windows" | "win" | "win32" | "win64" | "msvc" => Some(Self::Windows),
            "linux" | "gnu" | "musl" => Some(Self::Linux),
            "darwin" | "macos" | "mac" | "osx" | "apple" => Some(Self::MacOs),
            _ => None,
        }
    }

    fn native_installers(self) -> &'static [InstallerType] {
        match self {
            Self::Windows => &[
                InstallerType::Msix,
                InstallerType::Appx,
                InstallerType::Msi,
                InstallerType::Exe,
            ],
            Self::Linux => &[InstallerType::Deb, InstallerType::Rpm, InstallerType::AppImage],
            Self::MacOs => &[InstallerType::Dmg, InstallerType::Pkg],
            Self::Other => &[],
        }
    }

    fn of_installer(installer_type: InstallerType) -> Option<Self> {
        [Self::Windows, Self::Linux, Self::MacOs]
            .into_iter()
            .find(|os| os.native_installers().contains(&installer_type))
    }
}

fn name_tokens(name: &str) -> Vec<String> {
    // x86_64 is the only common arch name containing a separator
    name.to_ascii_lowercase()
        .replace("x86_64", "x64")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn asset_os(asset: &Asset) -> Option<HostOs> {
    name_tokens(&asset.name)
        .iter()
        .find_map(|token| HostOs::from_token(token))
        .or_else(|| HostOs::of_installer(InstallerType::from_file_name(&asset.name)))
}

/// Architecture named in the file, `Neutral` when it names none.
fn asset_arch(asset: &Asset) -> Architecture {
    name_tokens(&asset.name)
        .iter()
        .map(|token| Architecture::from_name(token))
        .find(|arch| *arch != Architecture::Unknown)
        .unwrap_or(Architecture::Neutral)
}

/// Pick the release asset to download: OS-native installers before archives,
/// then the host architecture with the usual neutral/x86 fallback.
pub(crate) fn select_asset(assets: &[Asset], os: HostOs, host: Architecture) -> Result<&Asset> {
    let usable: Vec<&Asset> = assets
        .iter()
        .filter(|asset| InstallerType::from_file_name(&asset.name) != InstallerType::Unknown)
        .filter(|asset| asset_os(asset).is_none_or(|asset_os| asset_os == os))
        .collect();

    let native = os.native_installers();
    let (preferred, archives): (Vec<&Asset>, Vec<&Asset>) = usable
        .into_iter()
        .partition(|asset| native.contains(&InstallerType::from_file_name(&asset.name)));

    [preferred, archives]
        .iter()
        .find_map(|group| pick_for_architecture(group, host, |asset| asset_arch(asset)).copied())
        .ok_or_else(|| {
            let available: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
            UnipkgError::PlatformNotSupported(format!(
                "no release asset for {:?}/{}; available: {}",
                os,
                host,
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            ))
        })
}
