//! # Source handlers
//!
//! One [`PackageHandler`] per backend. Handlers claim URN namespaces, hydrate
//! [`Package`]s from their backend, map web URLs to packages and back, and
//! optionally expose search, featured lists, collections and an account.
//!
//! Handlers hold configuration only; they never cache packages.

pub mod collections;
pub mod github;
pub mod registry;
pub mod winget;

pub use registry::{PackageService, RegisteredHandler};

use crate::accounts::AccountHandler;
use crate::config::Settings;
use crate::context::AppContext;
use crate::core::{Image, PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::package::Package;
use reqwest::Url;
use std::sync::Arc;

pub trait PackageHandler: Send + Sync {
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Namespaces this handler owns. Must not perform I/O.
    fn handled_namespaces(&self) -> Vec<&str>;

    /// Branding icon; static, no I/O.
    fn image(&self) -> Image;

    /// Hydrate `urn` to at least `min_status`.
    ///
    /// Fails with `NotFound` when the backend reports no such item and with
    /// `RemoteService` on transport or backend errors.
    fn get_package(
        &self,
        urn: &PackageUrn,
        min_status: PackageStatus,
        cx: &HandlerContext<'_>,
    ) -> Result<Package>;

    /// `Ok(None)` when the URL is not one of this handler's shapes.
    fn get_package_from_url(&self, url: &Url, cx: &HandlerContext<'_>)
    -> Result<Option<Package>>;

    /// Web URL for a package this handler produced.
    fn get_url_from_package(&self, package: &Package) -> Result<Url>;

    fn search(&self, _query: &str, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn search_suggestions(&self, _query: &str, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn featured_packages(&self, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn collections(&self, _cx: &HandlerContext<'_>) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn account_handler(&self) -> Option<&dyn AccountHandler> {
        None
    }
}

/// Resolution entry point handed to handlers that hydrate nested URNs.
pub trait Resolver: Send + Sync {
    /// Resolve `urn` while `ancestors` (outermost first) are being resolved.
    fn resolve_within(
        &self,
        urn: &PackageUrn,
        min_status: PackageStatus,
        ancestors: &[PackageUrn],
    ) -> Result<Package>;
}

/// What a handler gets for each call: the application context plus a way
/// back into the registry for nested resolution.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    pub app: &'a AppContext,
    resolver: &'a dyn Resolver,
    ancestors: &'a [PackageUrn],
}

impl<'a> HandlerContext<'a> {
    pub fn new(app: &'a AppContext, resolver: &'a dyn Resolver, ancestors: &'a [PackageUrn]) -> Self {
        Self {
            app,
            resolver,
            ancestors,
        }
    }

    pub fn ancestors(&self) -> &[PackageUrn] {
        self.ancestors
    }

    /// Resolve a package nested inside `parent` (e.g. a collection item).
    ///
    /// Fails with `CyclicCollection` when `urn` is `parent` or one of its ancestors.
    pub fn resolve_nested(
        &self,
        parent: &PackageUrn,
        urn: &PackageUrn,
        min_status: PackageStatus,
    ) -> Result<Package> {
        if urn == parent || self.ancestors.contains(urn) {
            return Err(UnipkgError::CyclicCollection(format!(
                "{} is nested inside itself",
                urn
            )));
        }

        let chain: Vec<PackageUrn> = self
            .ancestors
            .iter()
            .chain(std::iter::once(parent))
            .cloned()
            .collect();
        self.resolver.resolve_within(urn, min_status, &chain)
    }
}

/// Reject packages that another handler produced.
pub(crate) fn ensure_owner(handler: &dyn PackageHandler, package: &Package) -> Result<()> {
    if package.handler_id() != handler.id() {
        return Err(UnipkgError::InvalidArgument(format!(
            "{} was produced by '{}', not '{}'",
            package.urn(),
            package.handler_id(),
            handler.id()
        )));
    }
    Ok(())
}

/// The handlers shipped with the crate, paired with their enabled flag from settings.
pub fn builtin_handlers(settings: &Settings) -> Vec<(Arc<dyn PackageHandler>, bool)> {
    let handlers: Vec<Arc<dyn PackageHandler>> = vec![
        Arc::new(github::GitHubHandler::new()),
        Arc::new(winget::WinGetHandler::new()),
        Arc::new(collections::CollectionsHandler::new()),
    ];

    handlers
        .into_iter()
        .map(|handler| {
            let enabled = settings.handler_enabled(handler.id());
            (handler, enabled)
        })
        .collect()
}
