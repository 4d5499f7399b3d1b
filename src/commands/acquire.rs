//! `download`, `install` and `launch`.

use crate::core::PackageStatus;
use crate::error::{Result, UnipkgError};
use crate::handlers::PackageService;
use crate::ui as output;
use crate::ui::observer::ConsoleObserver;
use crate::utils::machine_output;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Install,
    Launch,
}

impl Action {
    fn command(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Install => "install",
            Self::Launch => "launch",
        }
    }
}

pub struct AcquireOptions {
    pub action: Action,
    pub target: String,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct AcquireOut {
    urn: String,
    status: PackageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

pub fn run(service: &PackageService, options: AcquireOptions) -> Result<()> {
    let cx = service.context();
    let mut package = service.resolve(&options.target, PackageStatus::Details)?;

    // No live progress for machine output or --quiet.
    let _console = (!options.json && !output::is_quiet()).then(|| ConsoleObserver::attach(&cx.events));

    let path = match options.action {
        Action::Download => Some(package.download(cx)?),
        Action::Install => {
            let path = package.download(cx)?;
            if !package.install(cx)? {
                return Err(UnipkgError::Other(format!(
                    "installer reported failure for {}",
                    package.display_title()
                )));
            }
            Some(path)
        }
        Action::Launch => {
            package.is_installed(cx)?;
            package.launch(cx)?;
            output::success(&format!("Launched {}", package.display_title()));
            None
        }
    };

    if options.json {
        return machine_output::emit(
            options.action.command(),
            AcquireOut {
                urn: package.urn().to_string(),
                status: package.status(),
                path,
            },
            Vec::new(),
        );
    }

    if let (Action::Download, Some(path)) = (options.action, &path) {
        output::info(&format!("Saved to {}", path.display()));
    }
    Ok(())
}
