use super::command::CommandInstaller;
use super::*;
use crate::config::InstallerSettings;
use crate::error::UnipkgError;
use std::cell::RefCell;
use std::path::PathBuf;
use tempfile::TempDir;

fn settings_with(install: &[(&str, &str)]) -> InstallerSettings {
    let mut settings = InstallerSettings {
        timeout_secs: 10,
        ..InstallerSettings::default()
    };
    for (kind, template) in install {
        settings
            .install
            .insert(kind.to_string(), template.to_string());
    }
    settings
}

#[test]
fn test_detect_installer_type() {
    assert_eq!(
        detect_installer_type(Path::new("/tmp/setup.MSI")),
        InstallerType::Msi
    );
    assert_eq!(
        detect_installer_type(Path::new("tool-x86_64.tar.gz")),
        InstallerType::TarGz
    );
    assert_eq!(
        detect_installer_type(Path::new("README")),
        InstallerType::Unknown
    );
}

#[test]
fn test_missing_template_is_platform_error() {
    let installer = CommandInstaller::new(settings_with(&[]));
    let file = PathBuf::from("/tmp/app.deb");
    let request = InstallRequest {
        file: &file,
        installer_type: InstallerType::Deb,
        identifier: "app",
        args: &[],
    };

    let err = installer.install(&request, &|_| {}).unwrap_err();
    assert!(matches!(err, UnipkgError::PlatformNotSupported(_)));
}

#[test]
fn test_missing_program_is_dependency_error() {
    let installer = CommandInstaller::new(settings_with(&[(
        "deb",
        "unipkg-definitely-missing-tool {file}",
    )]));
    let file = PathBuf::from("/tmp/app.deb");
    let request = InstallRequest {
        file: &file,
        installer_type: InstallerType::Deb,
        identifier: "app",
        args: &[],
    };

    let err = installer.install(&request, &|_| {}).unwrap_err();
    assert_eq!(
        err,
        UnipkgError::DependencyMissing("unipkg-definitely-missing-tool".to_string())
    );
}

#[cfg(unix)]
#[test]
fn test_install_runs_template_with_file_and_args() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("my app.zip");
    std::fs::write(&artifact, b"payload").unwrap();
    let copy = dir.path().join("installed.zip");

    let template = format!("cp {{args}} {{file}} '{}'", copy.display());
    let installer = CommandInstaller::new(settings_with(&[("zip", template.as_str())]));
    let args = vec!["-f".to_string()];
    let request = InstallRequest {
        file: &artifact,
        installer_type: InstallerType::Zip,
        identifier: "my-app",
        args: &args,
    };

    let seen = RefCell::new(Vec::new());
    let ok = installer
        .install(&request, &|fraction| seen.borrow_mut().push(fraction))
        .unwrap();

    assert!(ok);
    assert_eq!(std::fs::read(&copy).unwrap(), b"payload");
    assert_eq!(seen.into_inner(), vec![None, Some(1.0)]);
}

#[cfg(unix)]
#[test]
fn test_failing_installer_returns_false() {
    let installer = CommandInstaller::new(settings_with(&[("deb", "false {file}")]));
    let file = PathBuf::from("/tmp/app.deb");
    let request = InstallRequest {
        file: &file,
        installer_type: InstallerType::Deb,
        identifier: "app",
        args: &[],
    };

    assert!(!installer.install(&request, &|_| {}).unwrap());
}

#[cfg(unix)]
#[test]
fn test_is_installed_probe() {
    let mut settings = settings_with(&[]);
    settings.is_installed = Some("test {id} = present".to_string());
    let installer = CommandInstaller::new(settings);

    assert!(installer.is_installed("present").unwrap());
    assert!(!installer.is_installed("absent").unwrap());
    assert!(installer.is_installed("bad; id").is_err());
}

#[test]
fn test_is_installed_without_probe_is_false() {
    let installer = CommandInstaller::new(settings_with(&[]));
    assert!(!installer.is_installed("anything").unwrap());
}

#[test]
fn test_launch_without_template() {
    let installer = CommandInstaller::new(settings_with(&[]));
    assert!(matches!(
        installer.launch("app"),
        Err(UnipkgError::PlatformNotSupported(_))
    ));
}
