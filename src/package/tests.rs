use super::*;
use crate::accounts::MemoryCredentialStore;
use crate::config::Settings;
use crate::context::AppContext;
use crate::core::{ImageSource, InstallerType};
use crate::events::{ErrorKind, PackageMessage, SuccessKind};
use crate::installer::{InstallRequest, InstallerBackend};
use reqwest::Url;
use std::any::Any;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct FakeBackend {
    id: String,
    source: PathBuf,
    fail_fetch: bool,
}

impl PackageBackend for FakeBackend {
    fn type_tag(&self) -> &'static str {
        "fake"
    }

    fn identity(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn derive_urn(&self) -> PackageUrn {
        PackageUrn::new("fake", [self.id.as_str()])
    }

    fn downloader(&self) -> Option<&dyn Downloadable> {
        Some(self)
    }

    fn installer(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn launcher(&self) -> Option<&dyn Launchable> {
        Some(self)
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![("Fake id", self.id.clone())]
    }

    fn clone_box(&self) -> Box<dyn PackageBackend> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Downloadable for FakeBackend {
    fn resolve_artifact(&self, _cx: &AppContext) -> Result<Artifact> {
        if self.fail_fetch {
            return Err(UnipkgError::remote(Some(502), "bad gateway"));
        }
        let url = Url::from_file_path(&self.source).unwrap();
        Ok(Artifact::new(url, format!("{}.zip", self.id)))
    }
}

impl Installable for FakeBackend {
    fn install_identifier(&self) -> String {
        self.id.clone()
    }
}

impl Launchable for FakeBackend {
    fn launch_identifier(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone)]
struct FakeCollection {
    id: String,
}

impl PackageBackend for FakeCollection {
    fn type_tag(&self) -> &'static str {
        "fake-collection"
    }

    fn identity(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn derive_urn(&self) -> PackageUrn {
        PackageUrn::new("fake-collection", [self.id.as_str()])
    }

    fn required_download_status(&self) -> PackageStatus {
        PackageStatus::BasicDetails
    }

    fn clone_box(&self) -> Box<dyn PackageBackend> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct RecordingInstaller {
    failing: Vec<String>,
    installed: Mutex<Vec<String>>,
    launched: Mutex<Vec<String>>,
    types: Mutex<Vec<InstallerType>>,
}

impl InstallerBackend for RecordingInstaller {
    fn install(
        &self,
        request: &InstallRequest<'_>,
        progress: &dyn Fn(Option<f64>),
    ) -> Result<bool> {
        progress(None);
        self.types.lock().unwrap().push(request.installer_type);
        if self.failing.iter().any(|id| id == request.identifier) {
            return Ok(false);
        }
        self.installed
            .lock()
            .unwrap()
            .push(request.identifier.to_string());
        progress(Some(1.0));
        Ok(true)
    }

    fn is_installed(&self, identifier: &str) -> Result<bool> {
        Ok(self.installed.lock().unwrap().iter().any(|id| id == identifier))
    }

    fn launch(&self, identifier: &str) -> Result<()> {
        if self.failing.iter().any(|id| id == identifier) {
            return Err(UnipkgError::SystemCommandFailed {
                command: "launch".to_string(),
                reason: "boom".to_string(),
            });
        }
        self.launched.lock().unwrap().push(identifier.to_string());
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    installer: Arc<RecordingInstaller>,
    cx: AppContext,
}

impl Fixture {
    fn new() -> Self {
        Self::with_installer(RecordingInstaller::default())
    }

    fn with_installer(installer: RecordingInstaller) -> Self {
        let dir = TempDir::new().unwrap();
        let installer = Arc::new(installer);
        let cx = AppContext::builder(Settings::default())
            .download_dir(dir.path().join("downloads"))
            .credentials(Arc::new(MemoryCredentialStore::new()))
            .installer(installer.clone())
            .build()
            .unwrap();
        Self { dir, installer, cx }
    }

    fn package(&self, id: &str) -> Package {
        let source = self.dir.path().join(format!("{}-source.bin", id));
        std::fs::write(&source, vec![7u8; 200 * 1024]).unwrap();
        Package::new(
            "fake",
            FakeBackend {
                id: id.to_string(),
                source,
                fail_fetch: false,
            },
            PackageStatus::Details,
        )
        .with_meta(PackageMeta {
            title: Some(format!("App {}", id)),
            ..PackageMeta::default()
        })
    }

    fn failing_fetch(&self, id: &str) -> Package {
        Package::new(
            "fake",
            FakeBackend {
                id: id.to_string(),
                source: self.dir.path().join("missing"),
                fail_fetch: true,
            },
            PackageStatus::Details,
        )
    }

    fn collection(&self, id: &str) -> Package {
        Package::collection(
            "fake",
            FakeCollection { id: id.to_string() },
            PackageStatus::Details,
        )
    }
}

#[test]
fn test_urn_is_derived_once_and_can_be_overridden() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    assert_eq!(package.urn().to_string(), "urn:fake:a");

    package.set_urn(PackageUrn::new("custom", ["x"]));
    assert_eq!(package.urn().to_string(), "urn:custom:x");
}

#[test]
fn test_equality_is_backend_identity() {
    let fx = Fixture::new();
    let mut first = fx.package("a");
    let second = fx.package("a").with_meta(PackageMeta::default());
    first.advance_status(PackageStatus::Installed);

    assert_eq!(first, second);
    assert_ne!(first, fx.package("b"));
    assert_ne!(fx.collection("a"), fx.package("a"));
}

#[test]
fn test_status_only_moves_forward() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    package.advance_status(PackageStatus::Downloaded);
    package.advance_status(PackageStatus::BasicDetails);
    assert_eq!(package.status(), PackageStatus::Downloaded);
}

#[test]
fn test_download_moves_to_downloaded_and_signals_in_order() {
    let fx = Fixture::new();
    let (_sub, rx) = fx.cx.events.channel();
    let mut package = fx.package("a");

    let path = package.download(&fx.cx).unwrap();

    assert_eq!(package.status(), PackageStatus::Downloaded);
    assert_eq!(package.download_item(), Some(path.as_path()));
    assert!(path.starts_with(fx.dir.path().join("downloads").join("fake_a")));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 200 * 1024);

    let messages: Vec<_> = rx.try_iter().collect();
    assert!(matches!(messages[0], PackageMessage::FetchStarted { .. }));
    assert!(matches!(
        messages[1],
        PackageMessage::Success {
            kind: SuccessKind::PackageFetchCompleted,
            ..
        }
    ));
    assert!(matches!(messages[2], PackageMessage::DownloadStarted { .. }));

    let progress: Vec<u64> = messages
        .iter()
        .filter_map(|m| match m {
            PackageMessage::DownloadProgress { downloaded, .. } => Some(*downloaded),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last(), Some(&(200 * 1024)));

    let terminal: Vec<_> = messages.iter().filter(|m| m.is_terminal()).collect();
    assert_eq!(terminal.len(), 2);
    assert!(matches!(
        messages.last(),
        Some(PackageMessage::Success {
            kind: SuccessKind::PackageDownloadCompleted,
            ..
        })
    ));
}

#[test]
fn test_download_below_required_status_fails_fast() {
    let fx = Fixture::new();
    let (_sub, rx) = fx.cx.events.channel();
    let mut package = Package::new(
        "fake",
        FakeBackend {
            id: "a".to_string(),
            source: PathBuf::from("/nonexistent"),
            fail_fetch: false,
        },
        PackageStatus::BasicDetails,
    );

    let err = package.download(&fx.cx).unwrap_err();
    assert_eq!(
        err,
        UnipkgError::Precondition {
            operation: "download",
            required: PackageStatus::Details,
            actual: PackageStatus::BasicDetails,
        }
    );
    assert_eq!(package.status(), PackageStatus::BasicDetails);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn test_failed_artifact_resolution_signals_fetch_failed_once() {
    let fx = Fixture::new();
    let (_sub, rx) = fx.cx.events.channel();
    let mut package = fx.failing_fetch("broken");

    let err = package.download(&fx.cx).unwrap_err();
    assert!(matches!(err, UnipkgError::RemoteService { status: Some(502), .. }));
    assert_eq!(package.status(), PackageStatus::Details);

    let errors: Vec<_> = rx
        .try_iter()
        .filter(|m| matches!(m, PackageMessage::Error { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        PackageMessage::Error { kind, error, context } => {
            assert_eq!(*kind, ErrorKind::PackageFetchFailed);
            assert_eq!(error, &err);
            assert_eq!(
                context.as_ref().map(|c| c.urn.to_string()),
                Some("urn:fake:broken".to_string())
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_cancelled_download_removes_partial_file() {
    let fx = Fixture::new();
    let (_sub, rx) = fx.cx.events.channel();
    let mut package = fx.package("a");
    fx.cx.cancel.cancel();

    let err = package.download(&fx.cx).unwrap_err();
    assert_eq!(err, UnipkgError::Cancelled);
    assert_eq!(package.status(), PackageStatus::DownloadReady);
    assert!(package.download_item().is_none());

    let folder = fx.dir.path().join("downloads").join("fake_a");
    let leftovers = std::fs::read_dir(&folder)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);

    assert!(rx.try_iter().any(|m| matches!(
        m,
        PackageMessage::Error {
            kind: ErrorKind::PackageDownloadFailed,
            error: UnipkgError::Cancelled,
            ..
        }
    )));
}

#[test]
fn test_install_requires_download() {
    let fx = Fixture::new();
    let mut package = fx.package("a");

    let err = package.install(&fx.cx).unwrap_err();
    assert!(matches!(
        err,
        UnipkgError::Precondition {
            operation: "install",
            ..
        }
    ));
    assert_eq!(package.status(), PackageStatus::Details);
    assert!(fx.installer.installed.lock().unwrap().is_empty());
}

#[test]
fn test_install_without_artifact_reports_current_status() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    package.advance_status(PackageStatus::Downloaded);

    let err = package.install(&fx.cx).unwrap_err();
    assert!(matches!(
        err,
        UnipkgError::Precondition {
            operation: "install",
            required: PackageStatus::Downloaded,
            actual: PackageStatus::Downloaded,
        }
    ));
}

#[test]
fn test_install_after_download() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    package.download(&fx.cx).unwrap();

    let (_sub, rx) = fx.cx.events.channel();
    assert!(package.install(&fx.cx).unwrap());
    assert_eq!(package.status(), PackageStatus::Installed);
    assert_eq!(*fx.installer.installed.lock().unwrap(), vec!["a".to_string()]);
    assert_eq!(*fx.installer.types.lock().unwrap(), vec![InstallerType::Zip]);

    let messages: Vec<_> = rx.try_iter().collect();
    assert!(matches!(messages[0], PackageMessage::InstallStarted { .. }));
    assert!(matches!(
        messages[1],
        PackageMessage::InstallProgress { fraction: None, .. }
    ));
    assert!(matches!(
        messages.last(),
        Some(PackageMessage::Success {
            kind: SuccessKind::PackageInstallCompleted,
            ..
        })
    ));
}

#[test]
fn test_installer_failure_keeps_downloaded_status() {
    let fx = Fixture::with_installer(RecordingInstaller {
        failing: vec!["a".to_string()],
        ..RecordingInstaller::default()
    });
    let mut package = fx.package("a");
    package.download(&fx.cx).unwrap();

    let (_sub, rx) = fx.cx.events.channel();
    assert!(!package.install(&fx.cx).unwrap());
    assert_eq!(package.status(), PackageStatus::Downloaded);
    assert!(rx.try_iter().any(|m| matches!(
        m,
        PackageMessage::Error {
            kind: ErrorKind::PackageInstallFailed,
            ..
        }
    )));
}

#[test]
fn test_launch_gated_on_install_state() {
    let fx = Fixture::new();
    let mut package = fx.package("a");

    assert!(!package.can_launch(&fx.cx).unwrap());
    assert!(matches!(
        package.launch(&fx.cx),
        Err(UnipkgError::Precondition {
            operation: "launch",
            ..
        })
    ));

    package.download(&fx.cx).unwrap();
    package.install(&fx.cx).unwrap();
    package.launch(&fx.cx).unwrap();
    assert_eq!(*fx.installer.launched.lock().unwrap(), vec!["a".to_string()]);
}

#[test]
fn test_launch_allowed_when_os_reports_installed() {
    let fx = Fixture::new();
    fx.installer.installed.lock().unwrap().push("a".to_string());

    let mut package = fx.package("a");
    assert!(package.can_launch(&fx.cx).unwrap());
    package.launch(&fx.cx).unwrap();
    assert_eq!(package.status(), PackageStatus::Details);

    assert!(package.is_installed(&fx.cx).unwrap());
    assert_eq!(package.status(), PackageStatus::Installed);
}

#[test]
fn test_reset_download_allows_redownload() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    package.download(&fx.cx).unwrap();

    package.reset_download();
    assert_eq!(package.status(), PackageStatus::Details);
    assert!(package.download_item().is_none());
    assert!(package.artifact().is_none());

    package.download(&fx.cx).unwrap();
    assert_eq!(package.status(), PackageStatus::Downloaded);
}

#[test]
fn test_collection_rejects_itself() {
    let fx = Fixture::new();
    let mut collection = fx.collection("c");
    let copy = collection.clone();

    let err = collection.add_item(copy).unwrap_err();
    assert!(matches!(err, UnipkgError::CyclicCollection(_)));
    assert_eq!(collection.items().map(<[Package]>::len), Some(0));
}

#[test]
fn test_collection_rejects_transitive_cycle() {
    let fx = Fixture::new();
    let mut outer = fx.collection("outer");
    let mut inner = fx.collection("inner");
    inner.add_item(fx.package("a")).unwrap();
    inner.add_item(fx.collection("outer")).unwrap();

    assert!(matches!(
        outer.add_item(inner),
        Err(UnipkgError::CyclicCollection(_))
    ));
}

#[test]
fn test_add_item_requires_collection() {
    let fx = Fixture::new();
    let mut package = fx.package("a");
    assert!(matches!(
        package.add_item(fx.package("b")),
        Err(UnipkgError::InvalidArgument(_))
    ));
}

#[test]
fn test_collection_install_is_and_of_children() {
    let fx = Fixture::with_installer(RecordingInstaller {
        failing: vec!["b".to_string()],
        ..RecordingInstaller::default()
    });
    let mut collection = fx.collection("c");
    for id in ["a", "b", "c"] {
        collection.add_item(fx.package(id)).unwrap();
    }

    collection.download(&fx.cx).unwrap();
    assert_eq!(collection.status(), PackageStatus::Downloaded);

    assert!(!collection.install(&fx.cx).unwrap());
    assert_eq!(
        *fx.installer.installed.lock().unwrap(),
        vec!["a".to_string(), "c".to_string()]
    );
    assert_eq!(collection.status(), PackageStatus::Downloaded);
    assert!(!collection.is_installed(&fx.cx).unwrap());
}

#[test]
fn test_collection_install_succeeds_when_every_child_does() {
    let fx = Fixture::new();
    let mut collection = fx.collection("c");
    collection.add_item(fx.package("a")).unwrap();
    collection.add_item(fx.package("b")).unwrap();

    collection.download(&fx.cx).unwrap();
    assert!(collection.install(&fx.cx).unwrap());
    assert_eq!(collection.status(), PackageStatus::Installed);
    assert!(collection.is_installed(&fx.cx).unwrap());
}

#[test]
fn test_collection_download_continues_past_failures() {
    let fx = Fixture::new();
    let (_sub, rx) = fx.cx.events.channel();
    let mut collection = fx.collection("c");
    collection.add_item(fx.failing_fetch("broken")).unwrap();
    collection.add_item(fx.package("a")).unwrap();

    let err = collection.download(&fx.cx).unwrap_err();
    assert_eq!(
        err,
        UnipkgError::CollectionFailed {
            operation: "download",
            failed: 1,
            total: 2,
        }
    );

    let items = collection.items().unwrap();
    assert_eq!(items[0].status(), PackageStatus::Details);
    assert_eq!(items[1].status(), PackageStatus::Downloaded);
    assert_eq!(collection.status(), PackageStatus::Details);

    let collection_errors = rx
        .try_iter()
        .filter(|m| {
            matches!(
                m,
                PackageMessage::Error {
                    kind: ErrorKind::PackageDownloadFailed,
                    context: Some(c),
                    ..
                } if c.urn.to_string() == "urn:fake-collection:c"
            )
        })
        .count();
    assert_eq!(collection_errors, 1);
}

#[test]
fn test_collection_launch_tries_every_child() {
    let fx = Fixture::with_installer(RecordingInstaller {
        failing: vec!["a".to_string()],
        ..RecordingInstaller::default()
    });
    let mut collection = fx.collection("c");
    let mut first = fx.package("a");
    let mut second = fx.package("b");
    first.advance_status(PackageStatus::Installed);
    second.advance_status(PackageStatus::Installed);
    collection.add_item(first).unwrap();
    collection.add_item(second).unwrap();

    let err = collection.launch(&fx.cx).unwrap_err();
    assert!(matches!(
        err,
        UnipkgError::CollectionFailed {
            operation: "launch",
            failed: 1,
            total: 2
        }
    ));
    assert_eq!(*fx.installer.launched.lock().unwrap(), vec!["b".to_string()]);
}

#[test]
fn test_remove_item() {
    let fx = Fixture::new();
    let mut collection = fx.collection("c");
    collection.add_item(fx.package("a")).unwrap();

    let removed = collection.remove_item(&PackageUrn::new("fake", ["a"]));
    assert_eq!(removed.map(|p| p.urn().to_string()), Some("urn:fake:a".to_string()));
    assert!(collection.remove_item(&PackageUrn::new("fake", ["a"])).is_none());
}

#[test]
fn test_display_fields_skip_missing_values() {
    let fx = Fixture::new();
    let package = fx.package("a").with_meta(PackageMeta {
        title: Some("App".to_string()),
        version: Some("1.2.3".to_string()),
        description: Some("   ".to_string()),
        ..PackageMeta::default()
    });

    assert_eq!(
        package.display_fields(),
        vec![
            ("Title", "App".to_string()),
            ("Version", "1.2.3".to_string()),
            ("Fake id", "a".to_string()),
        ]
    );
}

#[test]
fn test_app_icon_falls_back_to_initials() {
    let fx = Fixture::new();
    let mut package = fx.package("a");

    let icon = package.cache_app_icon(&fx.cx).unwrap();
    assert_eq!(icon.source, ImageSource::Text("AA".to_string()));
    assert_eq!(package.images().len(), 1);

    package.cache_app_icon(&fx.cx).unwrap();
    assert_eq!(package.images().len(), 1);
    assert_eq!(package.cache_hero_image(&fx.cx).unwrap(), None);
    assert!(package.cache_screenshots(&fx.cx).unwrap().is_empty());
}

#[test]
fn test_summary_serializes_collection_tree() {
    let fx = Fixture::new();
    let mut collection = fx.collection("c");
    collection.add_item(fx.package("a")).unwrap();

    let json = serde_json::to_value(collection.summary()).unwrap();
    assert_eq!(json["urn"], "urn:fake-collection:c");
    assert_eq!(json["status"], "details");
    assert_eq!(json["items"][0]["urn"], "urn:fake:a");
    assert_eq!(json["items"][0]["title"], "App a");
}

#[test]
fn test_pick_for_architecture_fallbacks() {
    use crate::core::Architecture;
    let items = [Architecture::X86, Architecture::Arm64, Architecture::Neutral];

    assert_eq!(
        pick_for_architecture(&items, Architecture::Arm64, |a| *a),
        Some(&Architecture::Arm64)
    );
    assert_eq!(
        pick_for_architecture(&items, Architecture::X64, |a| *a),
        Some(&Architecture::Neutral)
    );
    assert_eq!(
        pick_for_architecture(&[Architecture::X86], Architecture::X64, |a| *a),
        Some(&Architecture::X86)
    );
    assert_eq!(
        pick_for_architecture(&[Architecture::Arm], Architecture::X64, |a| *a),
        None
    );
}
