//! # WinGet
//!
//! Community manifest index: `urn:winget:<Publisher.Package>`.
//!
//! Lookups, search and the featured list read the index at
//! `settings.winget.api-url`; the installer URL and silent switches come
//! from the version manifest at download time.

pub mod models;
mod package;

pub use package::WinGetPackage;

use super::{HandlerContext, PackageHandler, ensure_owner};
use crate::constants::urls::{icons, web};
use crate::core::{Image, ImageKind, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::package::Package;
use crate::utils::remote::{self, endpoint};
use models::{PackageList, PackageResponse};
use package::split_id;
use reqwest::Url;

pub const HANDLER_ID: &str = "winget";
pub const NAMESPACE_WINGET: &str = "winget";

const SEARCH_LIMIT: usize = 20;
const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Default)]
pub struct WinGetHandler;

impl WinGetHandler {
    pub fn new() -> Self {
        Self
    }

    fn list(&self, url: &Url, cx: &HandlerContext<'_>, limit: usize) -> Result<Vec<Package>> {
        let list: PackageList = remote::get_json(&cx.app.http, url.as_str(), None)?;
        Ok(list
            .packages
            .into_iter()
            .take(limit)
            .map(|entry| WinGetPackage::package(HANDLER_ID, entry, PackageStatus::BasicDetails))
            .collect())
    }

    fn search_index(&self, query: &str, limit: usize, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut url = endpoint(&cx.app.settings.winget.api_url, &["search"])?;
        url.query_pairs_mut()
            .append_pair("name", query.trim())
            .append_pair("limit", &limit.to_string());
        self.list(&url, cx, limit)
    }
}

/// The `Publisher.Package` id from `urn:winget:<id>`.
pub fn parse_winget_urn(urn: &PackageUrn) -> Result<String> {
    let invalid = |reason: &str| UnipkgError::InvalidUrn {
        input: urn.to_string(),
        reason: reason.to_string(),
    };

    if urn.namespace() != NAMESPACE_WINGET {
        return Err(invalid("not a winget URN"));
    }
    match urn.parts() {
        [id] => match split_id(id) {
            (publisher, Some(package)) if !publisher.is_empty() && !package.is_empty() => {
                Ok(id.clone())
            }
            _ => Err(invalid("expected <Publisher>.<Package>")),
        },
        _ => Err(invalid("expected a single <Publisher>.<Package> part")),
    }
}

/// `Publisher.Package` from `https://winget.run/pkg/<publisher>/<package>`.
pub fn id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.");
    if !host.eq_ignore_ascii_case(web::WINGET_HOST) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["pkg", publisher, package, ..] => Some(format!("{}.{}", publisher, package)),
        _ => None,
    }
}

impl PackageHandler for WinGetHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn display_name(&self) -> &str {
        "WinGet"
    }

    fn handled_namespaces(&self) -> Vec<&str> {
        vec![NAMESPACE_WINGET]
    }

    fn image(&self) -> Image {
        Image::url(icons::WINGET, ImageKind::Icon)
    }

    fn get_package(
        &self,
        urn: &PackageUrn,
        _min_status: PackageStatus,
        cx: &HandlerContext<'_>,
    ) -> Result<Package> {
        let id = parse_winget_urn(urn)?;
        let (publisher, package) = split_id(&id);
        let url = endpoint(
            &cx.app.settings.winget.api_url,
            &["packages", publisher, package.unwrap_or_default()],
        )?;

        let response: PackageResponse = remote::get_json(&cx.app.http, url.as_str(), None)
            .map_err(|error| match error {
                UnipkgError::NotFound(_) => UnipkgError::NotFound(id.clone()),
                other => other,
            })?;
        Ok(WinGetPackage::package(
            HANDLER_ID,
            response.package,
            PackageStatus::Details,
        ))
    }

    fn get_package_from_url(
        &self,
        url: &Url,
        cx: &HandlerContext<'_>,
    ) -> Result<Option<Package>> {
        let Some(id) = id_from_url(url) else {
            return Ok(None);
        };
        let urn = PackageUrn::new(NAMESPACE_WINGET, [id]);
        self.get_package(&urn, PackageStatus::Details, cx).map(Some)
    }

    fn get_url_from_package(&self, package: &Package) -> Result<Url> {
        ensure_owner(self, package)?;
        let entry = package.backend_as::<WinGetPackage>().ok_or_else(|| {
            UnipkgError::InvalidArgument(format!("{} is not a winget package", package.urn()))
        })?;
        Url::parse(&entry.web_url())
            .map_err(|e| UnipkgError::InvalidArgument(format!("{}: {}", package.urn(), e)))
    }

    fn search(&self, query: &str, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        self.search_index(query, SEARCH_LIMIT, cx)
    }

    fn search_suggestions(&self, query: &str, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        self.search_index(query, SUGGESTION_LIMIT, cx)
    }

    fn featured_packages(&self, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        let url = endpoint(&cx.app.settings.winget.api_url, &["featured"])?;
        self.list(&url, cx, usize::MAX)
    }
}

#[cfg(test)]
mod tests;
