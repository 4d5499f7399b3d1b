use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a package has been hydrated or acquired.
///
/// Variants are declared in rank order; comparisons use that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageStatus {
    #[default]
    Unknown,
    BasicDetails,
    Details,
    DownloadReady,
    Downloaded,
    Installed,
}

impl PackageStatus {
    pub fn is_at_least(self, other: PackageStatus) -> bool {
        self >= other
    }

    pub fn is_less_than(self, other: PackageStatus) -> bool {
        self < other
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::BasicDetails => "basic-details",
            Self::Details => "details",
            Self::DownloadReady => "download-ready",
            Self::Downloaded => "downloaded",
            Self::Installed => "installed",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        use PackageStatus::*;
        let ordered = [Unknown, BasicDetails, Details, DownloadReady, Downloaded, Installed];
        for pair in ordered.windows(2) {
            assert!(pair[0].is_less_than(pair[1]));
            assert!(pair[1].is_at_least(pair[0]));
        }
        assert!(Details.is_at_least(Details));
        assert!(!Details.is_less_than(Details));
    }

    #[test]
    fn test_display() {
        assert_eq!(PackageStatus::DownloadReady.to_string(), "download-ready");
    }
}
