//! Renders bus messages on the terminal while a command runs.

use super::progress::{ProgressBar, Spinner};
use crate::core::PackageUrn;
use crate::events::{EventBus, PackageMessage, SuccessKind, Subscription};
use std::sync::Mutex;

#[derive(Default)]
struct ConsoleState {
    download: Option<(PackageUrn, ProgressBar)>,
    install: Option<Spinner>,
}

/// Drives one progress bar per active download and a spinner per install.
#[derive(Default)]
pub struct ConsoleObserver {
    state: Mutex<ConsoleState>,
}

impl ConsoleObserver {
    /// Subscribe a fresh observer; it renders until the subscription is dropped.
    pub fn attach(bus: &EventBus) -> Subscription {
        let observer = Self::default();
        bus.subscribe(move |message| observer.handle(message))
    }

    pub fn handle(&self, message: &PackageMessage) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match message {
            PackageMessage::FetchStarted { .. } => {}
            PackageMessage::DownloadStarted { package } => {
                let bar = ProgressBar::new(None, &package.to_string());
                state.download = Some((package.urn.clone(), bar));
            }
            PackageMessage::DownloadProgress {
                package,
                downloaded,
                total,
            } => {
                let current = matches!(&state.download, Some((urn, _)) if *urn == package.urn);
                if !current {
                    state.download = Some((
                        package.urn.clone(),
                        ProgressBar::new(*total, &package.to_string()),
                    ));
                }
                if let Some((_, bar)) = state.download.as_mut() {
                    bar.set_total(*total);
                    bar.set(*downloaded);
                }
            }
            PackageMessage::InstallStarted { package } => {
                let mut spinner = Spinner::new(&format!("Installing {}", package));
                spinner.tick();
                state.install = Some(spinner);
            }
            PackageMessage::InstallProgress { .. } => {
                if let Some(spinner) = state.install.as_mut() {
                    spinner.tick();
                }
            }
            PackageMessage::Success { kind, context } => {
                let label = context
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                match kind {
                    SuccessKind::PackageDownloadCompleted => {
                        if let Some((_, bar)) = state.download.take() {
                            bar.finish();
                        }
                        super::success(&format!("Downloaded {}", label));
                    }
                    SuccessKind::PackageInstallCompleted => {
                        if let Some(mut spinner) = state.install.take() {
                            spinner.stop();
                        }
                        super::success(&format!("Installed {}", label));
                    }
                    SuccessKind::PackageFetchCompleted | SuccessKind::SignedIn => {}
                }
            }
            // Failures are reported by the command result and the log; only tidy the line.
            PackageMessage::Error { .. } => {
                state.download = None;
                if let Some(mut spinner) = state.install.take() {
                    spinner.stop();
                }
            }
        }
    }
}
