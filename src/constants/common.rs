// Common constants used throughout the codebase

/// Project name
pub const PROJECT_NAME: &str = "unipkg";

/// Project organization (reverse domain notation)
pub const PROJECT_QUALIFIER: &str = "org";
pub const PROJECT_ORG: &str = "unipkg";

/// URL scheme for deep links and OAuth redirects (`unipkg://package/<urn>`)
pub const APP_SCHEME: &str = "unipkg";

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "settings.kdl";

/// User collections file name
pub const COLLECTIONS_FILE_NAME: &str = "collections.kdl";

/// Stored credentials file name
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Folder under the user's download directory
pub const DOWNLOAD_DIR_NAME: &str = "unipkg";

/// Environment variable holding a tracing filter directive
pub const ENV_LOG: &str = "UNIPKG_LOG";

/// User-Agent sent to every backend
pub const USER_AGENT: &str = concat!("unipkg/", env!("CARGO_PKG_VERSION"));
