pub mod settings;

pub use settings::{GitHubSettings, InstallerSettings, Settings, WinGetSettings};
