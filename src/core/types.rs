use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// Role an image plays when a package is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Logo,
    Tile,
    Poster,
    Screenshot,
    Hero,
    Icon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum ImageSource {
    Url(String),
    /// Rendered text (initials or a glyph) for packages without artwork
    Text(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub source: ImageSource,
    pub kind: ImageKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    pub fn url(url: impl Into<String>, kind: ImageKind) -> Self {
        Self {
            source: ImageSource::Url(url.into()),
            kind,
            width: None,
            height: None,
        }
    }

    /// Placeholder built from the initials of a name ("Visual Studio Code" -> "VS").
    pub fn text_from_name(name: &str, kind: ImageKind) -> Self {
        let initials: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        let text = if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        };

        Self {
            source: ImageSource::Text(text),
            kind,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

impl Link {
    /// Returns `None` for empty URLs so optional backend fields map straight through.
    pub fn create(url: Option<&str>, text: impl Into<String>) -> Option<Self> {
        match url {
            Some(url) if !url.trim().is_empty() => Some(Self {
                url: url.trim().to_string(),
                text: text.into(),
            }),
            _ => None,
        }
    }
}

// Installer formats the installer backend knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerType {
    #[default]
    Unknown,
    Msi,
    Msix,
    Appx,
    Exe,
    Deb,
    Rpm,
    AppImage,
    Zip,
    TarGz,
    Dmg,
    Pkg,
}

impl InstallerType {
    pub const ALL: &'static [InstallerType] = &[
        Self::Msi,
        Self::Msix,
        Self::Appx,
        Self::Exe,
        Self::Deb,
        Self::Rpm,
        Self::AppImage,
        Self::Zip,
        Self::TarGz,
        Self::Dmg,
        Self::Pkg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Msi => "msi",
            Self::Msix => "msix",
            Self::Appx => "appx",
            Self::Exe => "exe",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::AppImage => "appimage",
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::Dmg => "dmg",
            Self::Pkg => "pkg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().trim_start_matches('.').to_ascii_lowercase();
        match lowered.as_str() {
            "msixbundle" | "appxbundle" => Some(Self::Msix),
            "tgz" => Some(Self::TarGz),
            other => Self::ALL.iter().copied().find(|t| t.name() == other),
        }
    }

    /// Detect the installer type from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Self {
        let lowered = file_name.to_ascii_lowercase();
        if lowered.ends_with(".tar.gz") || lowered.ends_with(".tgz") {
            return Self::TarGz;
        }
        Path::new(&lowered)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
            .unwrap_or(Self::Unknown)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Unknown => "",
            other => other.name(),
        }
    }
}

impl fmt::Display for InstallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
    Neutral,
    Unknown,
}

impl Architecture {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" => Self::X86,
            "x86_64" => Self::X64,
            "arm" => Self::Arm,
            "aarch64" => Self::Arm64,
            _ => Self::Unknown,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" | "386" | "win32" => Self::X86,
            "x64" | "x86_64" | "amd64" | "win64" => Self::X64,
            "arm" | "arm32" | "armv7" | "armhf" => Self::Arm,
            "arm64" | "aarch64" => Self::Arm64,
            "neutral" | "any" | "noarch" | "universal" => Self::Neutral,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
