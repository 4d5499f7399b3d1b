//! Handler registry
//!
//! [`PackageService`] is the single entry point the rest of the application
//! calls: it routes URNs by namespace and URLs by asking each handler in
//! registration order, fans search/featured/collection calls out to every
//! enabled handler, and coordinates account sign-in.
//!
//! Fan-out calls isolate handler failures: a failing handler is logged and
//! reported as an `Error` message, and the merged result from the others is
//! still returned.

use super::{HandlerContext, PackageHandler, Resolver, builtin_handlers};
use crate::accounts::{AccountHandler, Credential};
use crate::context::AppContext;
use crate::core::deep_link::{self, DeepLink};
use crate::core::{PackageStatus, PackageUrn};
use crate::error::{Result, UnipkgError};
use crate::events::{ErrorKind, PackageMessage, SuccessKind};
use crate::package::Package;
use rayon::prelude::*;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RegisteredHandler {
    handler: Arc<dyn PackageHandler>,
    enabled: bool,
}

impl RegisteredHandler {
    pub fn handler(&self) -> &dyn PackageHandler {
        self.handler.as_ref()
    }

    pub fn id(&self) -> &str {
        self.handler.id()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub struct PackageService {
    context: Arc<AppContext>,
    handlers: Vec<RegisteredHandler>,
    namespaces: HashMap<String, usize>,
}

impl PackageService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            handlers: Vec::new(),
            namespaces: HashMap::new(),
        }
    }

    /// Registry with the bundled handlers, enabled per settings.
    pub fn with_builtin_handlers(context: Arc<AppContext>) -> Self {
        let handlers = builtin_handlers(&context.settings);
        let mut service = Self::new(context);
        for (handler, enabled) in handlers {
            service.register(handler, enabled);
        }
        service
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Add a handler. A namespace claimed twice goes to the later handler.
    pub fn register(&mut self, handler: Arc<dyn PackageHandler>, enabled: bool) {
        let index = self.handlers.len();
        for namespace in handler.handled_namespaces() {
            if let Some(previous) = self.namespaces.insert(namespace.to_string(), index) {
                tracing::warn!(
                    namespace,
                    previous = self.handlers[previous].id(),
                    replacement = handler.id(),
                    "namespace claimed by two handlers, last registration wins"
                );
            }
        }
        tracing::debug!(handler = handler.id(), enabled, "registered handler");
        self.handlers.push(RegisteredHandler { handler, enabled });
    }

    pub fn handlers(&self) -> &[RegisteredHandler] {
        &self.handlers
    }

    pub fn handler(&self, id: &str) -> Option<&RegisteredHandler> {
        self.handlers.iter().find(|entry| entry.id() == id)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        let entry = self
            .handlers
            .iter_mut()
            .find(|entry| entry.handler.id() == id)
            .ok_or_else(|| UnipkgError::InvalidArgument(format!("unknown handler '{}'", id)))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Handler owning `namespace`, enabled or not.
    pub fn handler_for_namespace(&self, namespace: &str) -> Option<&RegisteredHandler> {
        self.namespaces
            .get(namespace)
            .map(|&index| &self.handlers[index])
    }

    /// The handler that produced `package`.
    pub fn handler_for(&self, package: &Package) -> Option<&dyn PackageHandler> {
        self.handler(package.handler_id())
            .map(RegisteredHandler::handler)
    }

    pub fn url_for(&self, package: &Package) -> Result<Url> {
        self.handler_for(package)
            .ok_or_else(|| {
                UnipkgError::InvalidArgument(format!(
                    "no handler '{}' registered for {}",
                    package.handler_id(),
                    package.urn()
                ))
            })?
            .get_url_from_package(package)
    }

    pub fn resolve_urn(&self, urn: &PackageUrn, min_status: PackageStatus) -> Result<Package> {
        self.resolve_within(urn, min_status, &[])
            .inspect_err(|error| self.report(ErrorKind::ResolveFailed, error))
    }

    /// First handler (in registration order) that recognises the URL wins.
    pub fn resolve_url(&self, url: &str) -> Result<Package> {
        let parsed =
            Url::parse(url.trim()).map_err(|_| UnipkgError::UnresolvableUrl(url.to_string()))?;
        let cx = HandlerContext::new(&self.context, self, &[]);

        for entry in self.handlers.iter().filter(|entry| entry.enabled) {
            match entry.handler.get_package_from_url(&parsed, &cx) {
                Ok(Some(package)) => return Ok(package),
                Ok(None) => continue,
                Err(error) => {
                    let error = error.in_handler(entry.id());
                    self.report(ErrorKind::ResolveFailed, &error);
                    return Err(error);
                }
            }
        }

        let error = UnipkgError::UnresolvableUrl(url.to_string());
        self.report(ErrorKind::ResolveFailed, &error);
        Err(error)
    }

    /// Resolve a URN string, a `unipkg://package/...` link or a web URL.
    pub fn resolve(&self, target: &str, min_status: PackageStatus) -> Result<Package> {
        let target = target.trim();
        let lowered = target.to_ascii_lowercase();

        if lowered.starts_with("urn:") {
            return self.resolve_urn(&PackageUrn::parse(target)?, min_status);
        }

        if lowered.starts_with(&format!("{}://", crate::constants::APP_SCHEME)) {
            return match deep_link::parse(target)? {
                DeepLink::Package(urn) => self.resolve_urn(&urn, min_status),
                DeepLink::Auth { .. } => Err(UnipkgError::InvalidArgument(
                    "sign-in links are handled by `activate`".to_string(),
                )),
            };
        }

        let package = self.resolve_url(target)?;
        if package.status().is_less_than(min_status) {
            return self.resolve_urn(&package.urn().clone(), min_status);
        }
        Ok(package)
    }

    pub fn search_all(&self, query: &str) -> Vec<Package> {
        self.fan_out(ErrorKind::SearchFailed, |handler, cx| {
            handler.search(query, cx)
        })
    }

    pub fn suggestions_all(&self, query: &str) -> Vec<Package> {
        self.fan_out(ErrorKind::SearchFailed, |handler, cx| {
            handler.search_suggestions(query, cx)
        })
    }

    pub fn featured_all(&self) -> Vec<Package> {
        self.fan_out(ErrorKind::FeaturedFailed, |handler, cx| {
            handler.featured_packages(cx)
        })
    }

    pub fn collections_all(&self) -> Vec<Package> {
        self.fan_out(ErrorKind::FeaturedFailed, |handler, cx| handler.collections(cx))
    }

    /// Run `call` on every enabled handler concurrently and merge in registration order.
    fn fan_out<F>(&self, kind: ErrorKind, call: F) -> Vec<Package>
    where
        F: Fn(&dyn PackageHandler, &HandlerContext<'_>) -> Result<Vec<Package>> + Sync,
    {
        let enabled: Vec<&RegisteredHandler> =
            self.handlers.iter().filter(|entry| entry.enabled).collect();

        let run = |entry: &&RegisteredHandler| -> Vec<Package> {
            let cx = HandlerContext::new(&self.context, self, &[]);
            match call(entry.handler(), &cx) {
                Ok(packages) => packages,
                Err(error) => {
                    let error = error.in_handler(entry.id());
                    tracing::warn!(handler = entry.id(), %error, "handler failed during fan-out");
                    self.report(kind, &error);
                    Vec::new()
                }
            }
        };

        let results: Vec<Vec<Package>> = if enabled.len() <= 1 {
            enabled.iter().map(run).collect()
        } else {
            enabled.par_iter().map(run).collect()
        };

        results.into_iter().flatten().collect()
    }

    /// Account handlers of enabled handlers, in registration order.
    pub fn account_handlers(&self) -> Vec<&dyn AccountHandler> {
        self.handlers
            .iter()
            .filter(|entry| entry.enabled)
            .filter_map(|entry| entry.handler.account_handler())
            .collect()
    }

    /// Look up an account handler by its own id or by its package handler's id.
    pub fn account(&self, id: &str) -> Result<&dyn AccountHandler> {
        self.handlers
            .iter()
            .filter_map(|entry| entry.handler.account_handler().map(|a| (entry.id(), a)))
            .find(|(handler_id, account)| account.id() == id || *handler_id == id)
            .map(|(_, account)| account)
            .ok_or_else(|| UnipkgError::InvalidArgument(format!("no account handler '{}'", id)))
    }

    /// Silent sign-in on every account handler concurrently.
    ///
    /// Failures are logged and reported per handler and never propagate.
    /// Returns the ids of the accounts that are now signed in.
    pub fn try_silent_sign_in(&self) -> Vec<String> {
        let accounts = self.account_handlers();

        accounts
            .par_iter()
            .filter_map(|account| match account.try_silent_sign_in(&self.context) {
                Ok(true) => {
                    self.context.events.publish(PackageMessage::Success {
                        kind: SuccessKind::SignedIn,
                        context: None,
                    });
                    Some(account.id().to_string())
                }
                Ok(false) => {
                    tracing::debug!(account = account.id(), "silent sign-in not possible");
                    None
                }
                Err(error) => {
                    let error = error.in_handler(account.id());
                    tracing::warn!(account = account.id(), %error, "silent sign-in failed");
                    self.report(ErrorKind::SignInFailed, &error);
                    None
                }
            })
            .collect()
    }

    pub fn sign_in(&self, account_id: &str, credential: &Credential) -> Result<bool> {
        let account = self.account(account_id)?;
        let signed_in = account
            .sign_in(credential, &self.context)
            .inspect_err(|error| self.report(ErrorKind::SignInFailed, error))?;
        if signed_in {
            self.context.events.publish(PackageMessage::Success {
                kind: SuccessKind::SignedIn,
                context: None,
            });
        }
        Ok(signed_in)
    }

    pub fn sign_out(&self, account_id: &str) -> Result<()> {
        self.account(account_id)?.sign_out(&self.context)
    }

    /// Route a `unipkg://auth/<account>?...` redirect to its account handler.
    pub fn handle_auth_activation(&self, link: &str) -> Result<bool> {
        let DeepLink::Auth {
            account_handler,
            url,
        } = deep_link::parse(link)?
        else {
            return Err(UnipkgError::InvalidArgument(format!(
                "'{}' is not a sign-in link",
                link
            )));
        };

        let account = self.account(&account_handler)?;
        let signed_in = account
            .handle_auth_activation(&url, &self.context)
            .inspect_err(|error| self.report(ErrorKind::SignInFailed, error))?;
        if signed_in {
            self.context.events.publish(PackageMessage::Success {
                kind: SuccessKind::SignedIn,
                context: None,
            });
        }
        Ok(signed_in)
    }

    fn report(&self, kind: ErrorKind, error: &UnipkgError) {
        self.context
            .events
            .publish(PackageMessage::error(kind, error.clone(), None));
    }
}

impl Resolver for PackageService {
    fn resolve_within(
        &self,
        urn: &PackageUrn,
        min_status: PackageStatus,
        ancestors: &[PackageUrn],
    ) -> Result<Package> {
        let entry = self
            .handler_for_namespace(urn.namespace())
            .ok_or_else(|| UnipkgError::UnknownNamespace(urn.namespace().to_string()))?;
        if !entry.enabled {
            return Err(UnipkgError::HandlerDisabled(entry.id().to_string()));
        }

        let cx = HandlerContext::new(&self.context, self, ancestors);
        let package = entry.handler.get_package(urn, min_status, &cx)?;

        if package.status().is_less_than(min_status) {
            return Err(UnipkgError::Precondition {
                operation: "resolve",
                required: min_status,
                actual: package.status(),
            });
        }
        tracing::debug!(%urn, status = %package.status(), "resolved");
        Ok(package)
    }
}
