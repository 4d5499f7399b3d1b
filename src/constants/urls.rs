//! Default backend endpoints
//!
//! Each of these can be overridden in `settings.kdl`, which is how the
//! test-suite points handlers at a local mock server.

/// GitHub REST API root
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// GitHub web root (OAuth authorize / token exchange)
pub const DEFAULT_GITHUB_OAUTH: &str = "https://github.com";

/// Community manifest index (winget.run v2)
pub const DEFAULT_WINGET_API: &str = "https://api.winget.run/v2";

/// Public web pages used for URL <-> package mapping
pub mod web {
    pub const GITHUB_HOST: &str = "github.com";
    pub const WINGET_HOST: &str = "winget.run";
    pub const WINGET_PACKAGE_BASE: &str = "https://winget.run/pkg";
}

/// Handler branding icons
pub mod icons {
    pub const GITHUB: &str = "https://github.githubassets.com/favicons/favicon.png";
    pub const WINGET: &str = "https://winget.run/favicon.ico";
}
