//! # GitHub
//!
//! Repositories as packages: `urn:gh-repo:<owner>:<repo>`.
//!
//! Lookups and search go through the REST API at `settings.github.api-url`;
//! calls carry the signed-in token when there is one.

mod account;
pub mod models;
mod package;

pub use account::{ACCOUNT_ID, GitHubAccountHandler};
pub use package::GitHubRepoPackage;

use super::{HandlerContext, PackageHandler, ensure_owner};
use crate::accounts::AccountHandler;
use crate::constants::urls::{icons, web};
use crate::core::{Image, ImageKind, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::package::Package;
use crate::utils::remote::{self, endpoint};
use models::{Repository, SearchResults};
use reqwest::Url;

pub const HANDLER_ID: &str = "github";
pub const NAMESPACE_REPO: &str = "gh-repo";

const SEARCH_LIMIT: usize = 20;
const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Default)]
pub struct GitHubHandler {
    account: GitHubAccountHandler,
}

impl GitHubHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url, cx: &HandlerContext<'_>) -> Result<T> {
        let token = self.account.auth_token();
        remote::get_json(&cx.app.http, url.as_str(), token.as_deref())
    }

    fn repository(&self, owner: &str, name: &str, cx: &HandlerContext<'_>) -> Result<Repository> {
        let url = endpoint(&cx.app.settings.github.api_url, &["repos", owner, name])?;
        self.get_json(&url, cx).map_err(|error| match error {
            UnipkgError::NotFound(_) => UnipkgError::NotFound(format!("{}/{}", owner, name)),
            other => other,
        })
    }

    fn search_repositories(
        &self,
        query: &str,
        limit: usize,
        cx: &HandlerContext<'_>,
    ) -> Result<Vec<Package>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut url = endpoint(&cx.app.settings.github.api_url, &["search", "repositories"])?;
        url.query_pairs_mut()
            .append_pair("q", query.trim())
            .append_pair("per_page", &limit.to_string());

        let results: SearchResults = self.get_json(&url, cx)?;
        Ok(results
            .items
            .into_iter()
            .take(limit)
            .map(|repo| {
                GitHubRepoPackage::package(
                    HANDLER_ID,
                    repo,
                    self.account.session(),
                    PackageStatus::BasicDetails,
                )
            })
            .collect())
    }
}

/// `(owner, repo)` from `urn:gh-repo:<owner>:<repo>` or the legacy `urn:gh-repo:<owner>/<repo>`.
pub fn parse_repo_urn(urn: &PackageUrn) -> Result<(String, String)> {
    let invalid = |reason: &str| UnipkgError::InvalidUrn {
        input: urn.to_string(),
        reason: reason.to_string(),
    };

    if urn.namespace() != NAMESPACE_REPO {
        return Err(invalid("not a gh-repo URN"));
    }

    let (owner, name) = match urn.parts() {
        [owner, name] => (owner.as_str(), name.as_str()),
        [joined] => joined
            .split_once(['/', '\\'])
            .ok_or_else(|| invalid("expected <owner>:<repo>"))?,
        _ => return Err(invalid("expected <owner>:<repo>")),
    };

    if owner.is_empty() || name.is_empty() {
        return Err(invalid("owner and repository must not be empty"));
    }
    Ok((owner.to_string(), name.to_string()))
}

/// `(owner, repo)` from a `https://github.com/<owner>/<repo>[/...]` page URL.
pub fn repo_from_url(url: &Url) -> Option<(String, String)> {
    let host = url.host_str()?.trim_start_matches("www.");
    if !host.eq_ignore_ascii_case(web::GITHUB_HOST) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

impl PackageHandler for GitHubHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn display_name(&self) -> &str {
        "GitHub"
    }

    fn handled_namespaces(&self) -> Vec<&str> {
        vec![NAMESPACE_REPO]
    }

    fn image(&self) -> Image {
        Image::url(icons::GITHUB, ImageKind::Icon)
    }

    fn get_package(
        &self,
        urn: &PackageUrn,
        _min_status: PackageStatus,
        cx: &HandlerContext<'_>,
    ) -> Result<Package> {
        let (owner, name) = parse_repo_urn(urn)?;
        let repo = self.repository(&owner, &name, cx)?;
        Ok(GitHubRepoPackage::package(
            HANDLER_ID,
            repo,
            self.account.session(),
            PackageStatus::Details,
        ))
    }

    fn get_package_from_url(
        &self,
        url: &Url,
        cx: &HandlerContext<'_>,
    ) -> Result<Option<Package>> {
        let Some((owner, name)) = repo_from_url(url) else {
            return Ok(None);
        };
        let urn = PackageUrn::new(NAMESPACE_REPO, [owner, name]);
        self.get_package(&urn, PackageStatus::Details, cx).map(Some)
    }

    fn get_url_from_package(&self, package: &Package) -> Result<Url> {
        ensure_owner(self, package)?;
        let repo = package.backend_as::<GitHubRepoPackage>().ok_or_else(|| {
            UnipkgError::InvalidArgument(format!("{} is not a repository", package.urn()))
        })?;
        Url::parse(&repo.web_url())
            .map_err(|e| UnipkgError::InvalidArgument(format!("{}: {}", package.urn(), e)))
    }

    fn search(&self, query: &str, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        self.search_repositories(query, SEARCH_LIMIT, cx)
    }

    fn search_suggestions(&self, query: &str, cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        self.search_repositories(query, SUGGESTION_LIMIT, cx)
    }

    fn account_handler(&self) -> Option<&dyn AccountHandler> {
        Some(&self.account)
    }
}
