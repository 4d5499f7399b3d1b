pub mod common;
pub mod urls;

pub use common::{
    APP_SCHEME, COLLECTIONS_FILE_NAME, CREDENTIALS_FILE_NAME, DOWNLOAD_DIR_NAME,
    ENV_LOG, PROJECT_NAME, PROJECT_ORG, PROJECT_QUALIFIER, SETTINGS_FILE_NAME, USER_AGENT,
};
pub use urls::{DEFAULT_GITHUB_API, DEFAULT_GITHUB_OAUTH, DEFAULT_WINGET_API};
