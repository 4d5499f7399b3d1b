//! Deep links
//!
//! Two shapes arrive from the activation layer:
//! - `unipkg://package/<urn>` opens a package
//! - `unipkg://auth/<account-handler-id>?code=...` completes a browser sign-in

use crate::constants::APP_SCHEME;
use crate::core::urn::PackageUrn;
use crate::error::{Result, UnipkgError};
use reqwest::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum DeepLink {
    Package(PackageUrn),
    Auth { account_handler: String, url: Url },
}

pub fn package_link(urn: &PackageUrn) -> String {
    format!("{}://package/{}", APP_SCHEME, urn)
}

/// Redirect URI registered with OAuth providers for an account handler.
pub fn auth_redirect(account_handler: &str) -> String {
    format!("{}://auth/{}", APP_SCHEME, account_handler)
}

pub fn parse(link: &str) -> Result<DeepLink> {
    let url = Url::parse(link.trim())
        .map_err(|e| UnipkgError::InvalidArgument(format!("'{}' is not a URL: {}", link, e)))?;

    if url.scheme() != APP_SCHEME {
        return Err(UnipkgError::InvalidArgument(format!(
            "expected a {}:// link, got '{}'",
            APP_SCHEME, link
        )));
    }

    let target = url.path().trim_start_matches('/');
    match url.host_str() {
        Some("package") if !target.is_empty() => Ok(DeepLink::Package(PackageUrn::parse(target)?)),
        Some("auth") if !target.is_empty() => Ok(DeepLink::Auth {
            account_handler: target.to_string(),
            url,
        }),
        _ => Err(UnipkgError::InvalidArgument(format!(
            "unrecognised link '{}'",
            link
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_link_round_trip() {
        let urn = PackageUrn::new("gh-repo", ["octocat", "Hello-World"]);
        let link = package_link(&urn);
        assert_eq!(link, "unipkg://package/urn:gh-repo:octocat:Hello-World");
        assert_eq!(parse(&link).unwrap(), DeepLink::Package(urn));
    }

    #[test]
    fn test_auth_link() {
        match parse("unipkg://auth/gh-user?code=abc123").unwrap() {
            DeepLink::Auth { account_handler, url } => {
                assert_eq!(account_handler, "gh-user");
                assert_eq!(url.query(), Some("code=abc123"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(parse("https://package/urn:a:b").is_err());
        assert!(parse("unipkg://settings/x").is_err());
        assert!(parse("unipkg://package/").is_err());
    }
}
