use crate::core::status::PackageStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the acquisition core can report.
///
/// The enum is `Clone` so the same typed error can be returned to the caller
/// and published on the event bus at the same time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnipkgError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Remote service error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    RemoteService { status: Option<u16>, message: String },

    #[error("No handler registered for namespace '{0}'")]
    UnknownNamespace(String),

    #[error("No handler recognised URL: {0}")]
    UnresolvableUrl(String),

    #[error("Cannot {operation}: package status is {actual}, requires at least {required}")]
    Precondition {
        operation: &'static str,
        required: PackageStatus,
        actual: PackageStatus,
    },

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Authentication callback rejected: {0}")]
    AuthActivation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid URN '{input}': {reason}")]
    InvalidUrn { input: String, reason: String },

    #[error("Collection cycle detected: {0}")]
    CyclicCollection(String),

    #[error("Package '{package}' does not support {operation}")]
    Unsupported {
        operation: &'static str,
        package: String,
    },

    #[error("{failed} of {total} collection items failed to {operation}")]
    CollectionFailed {
        operation: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("Handler '{0}' is disabled")]
    HandlerDisabled(String),

    #[error("Handler '{handler}' failed: {source}")]
    HandlerFailed {
        handler: String,
        #[source]
        source: Box<UnipkgError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error{}: {reason}", .path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    Io {
        path: Option<PathBuf>,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("System command '{command}' failed: {reason}")]
    SystemCommandFailed { command: String, reason: String },

    #[error("System dependency missing: {0}")]
    DependencyMissing(String),

    #[error("{0}")]
    Other(String),
}

impl UnipkgError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            reason: source.to_string(),
        }
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteService {
            status,
            message: message.into(),
        }
    }

    /// Wrap an error with the id of the handler that produced it.
    pub fn in_handler(self, handler: &str) -> Self {
        match self {
            already @ Self::HandlerFailed { .. } => already,
            other => Self::HandlerFailed {
                handler: handler.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping handler attribution.
    pub fn root(&self) -> &UnipkgError {
        match self {
            Self::HandlerFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the user can act on the failure (retry, re-sign-in, pick another package).
    /// `Precondition` is a caller bug and never recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.root(),
            Self::Precondition { .. } | Self::CyclicCollection(_) | Self::InvalidArgument(_)
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            Self::RemoteService { .. } | Self::Io { .. } | Self::Cancelled
        )
    }
}

impl From<std::io::Error> for UnipkgError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            path: None,
            reason: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for UnipkgError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Serialization(e.to_string());
        }
        Self::RemoteService {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for UnipkgError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<kdl::KdlError> for UnipkgError {
    fn from(e: kdl::KdlError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UnipkgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_service_display_includes_status() {
        let err = UnipkgError::remote(Some(503), "unavailable");
        assert_eq!(err.to_string(), "Remote service error (503): unavailable");

        let err = UnipkgError::remote(None, "connection reset");
        assert_eq!(err.to_string(), "Remote service error: connection reset");
    }

    #[test]
    fn test_handler_attribution_is_not_nested_twice() {
        let err = UnipkgError::NotFound("x".into())
            .in_handler("github")
            .in_handler("winget");
        match &err {
            UnipkgError::HandlerFailed { handler, .. } => assert_eq!(handler, "github"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.root(), &UnipkgError::NotFound("x".into()));
    }

    #[test]
    fn test_recovery_classification() {
        let precondition = UnipkgError::Precondition {
            operation: "install",
            required: PackageStatus::Downloaded,
            actual: PackageStatus::Details,
        };
        assert!(!precondition.is_recoverable());
        assert!(UnipkgError::remote(Some(500), "x").is_retryable());
        assert!(UnipkgError::PlatformNotSupported("arm".into()).is_recoverable());
        assert!(!UnipkgError::PlatformNotSupported("arm".into()).is_retryable());
    }
}
