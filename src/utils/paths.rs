use crate::constants::{
    COLLECTIONS_FILE_NAME, CREDENTIALS_FILE_NAME, DOWNLOAD_DIR_NAME, PROJECT_NAME, PROJECT_ORG,
    PROJECT_QUALIFIER, SETTINGS_FILE_NAME,
};
use crate::error::{Result, UnipkgError};
use directories::{ProjectDirs, UserDirs};
use std::path::{Path, PathBuf};

/// Overrides the config directory (used by tests and portable installs).
pub const CONFIG_DIR_ENV: &str = "UNIPKG_CONFIG_DIR";

pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    let user_dirs = UserDirs::new()
        .ok_or_else(|| UnipkgError::Other("Could not determine user home directory".to_string()))?;

    let home = user_dirs.home_dir();

    if path_str == "~" {
        return Ok(home.to_path_buf());
    }

    let stripped = path_str
        .strip_prefix("~/")
        .ok_or_else(|| UnipkgError::Other(format!("Invalid path format: {}", path_str)))?;

    Ok(home.join(stripped))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(PROJECT_QUALIFIER, PROJECT_ORG, PROJECT_NAME)
        .ok_or_else(|| UnipkgError::Other("Could not determine config directory".to_string()))
}

pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn settings_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE_NAME))
}

pub fn collections_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(COLLECTIONS_FILE_NAME))
}

pub fn credentials_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CREDENTIALS_FILE_NAME))
}

/// `~/Downloads/unipkg`, falling back to the cache directory on headless systems.
pub fn default_download_dir() -> Result<PathBuf> {
    if let Some(downloads) = UserDirs::new().and_then(|u| u.download_dir().map(Path::to_path_buf)) {
        return Ok(downloads.join(DOWNLOAD_DIR_NAME));
    }
    Ok(project_dirs()?.cache_dir().join("downloads"))
}

#[cfg(test)]
mod tests;
