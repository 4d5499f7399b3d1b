use super::models::{Manifest, PackageResponse};
use super::package::{artifact_for, select_installer};
use super::*;
use crate::core::{Architecture, InstallerType};

const PACKAGE_JSON: &str = r#"{
    "Package": {
        "Id": "Microsoft.PowerToys",
        "Versions": ["0.70.0", "0.71.0"],
        "Latest": {
            "Name": "PowerToys",
            "Publisher": "Microsoft Corporation",
            "Description": "Windows system utilities to maximize productivity",
            "Homepage": "https://github.com/microsoft/PowerToys",
            "License": "MIT",
            "Tags": ["utilities", "productivity"]
        },
        "IconUrl": "https://winget.run/icons/powertoys.png",
        "Banner": null,
        "CreatedAt": "2020-05-10T00:00:00Z"
    }
}"#;

const MANIFEST_JSON: &str = r#"{
    "Id": "Microsoft.PowerToys",
    "Version": "0.71.0",
    "InstallerType": "burn",
    "Switches": { "Silent": "/quiet /norestart" },
    "Installers": [
        { "Arch": "x64", "Url": "https://example.com/PowerToysSetup-0.71.0-x64.exe" },
        { "Arch": "arm64", "Url": "https://example.com/download?id=arm", "InstallerType": "wix",
          "Switches": { "Silent": "/qn \"INSTALLDIR=C:\\Program Files\\PT\"" } }
    ]
}"#;

fn manifest() -> Manifest {
    serde_json::from_str(MANIFEST_JSON).unwrap()
}

#[test]
fn test_parse_winget_urn() {
    let urn = PackageUrn::parse("urn:winget:Microsoft.VisualStudio.Code").unwrap();
    assert_eq!(parse_winget_urn(&urn).unwrap(), "Microsoft.VisualStudio.Code");

    for bad in ["urn:winget:NoDot", "urn:winget:a.b:c", "urn:winget:.pkg", "urn:gh-repo:a.b"] {
        let urn = PackageUrn::parse(bad).unwrap();
        assert!(parse_winget_urn(&urn).is_err(), "{} should be rejected", bad);
    }
}

#[test]
fn test_id_from_url() {
    let url = Url::parse("https://winget.run/pkg/Git/Git").unwrap();
    assert_eq!(id_from_url(&url).as_deref(), Some("Git.Git"));
    assert!(id_from_url(&Url::parse("https://winget.run/search?q=git").unwrap()).is_none());
    assert!(id_from_url(&Url::parse("https://example.com/pkg/Git/Git").unwrap()).is_none());
}

#[test]
fn test_entry_maps_to_package() {
    let response: PackageResponse = serde_json::from_str(PACKAGE_JSON).unwrap();
    let package = WinGetPackage::package(HANDLER_ID, response.package, PackageStatus::Details);

    assert_eq!(package.urn().to_string(), "urn:winget:Microsoft.PowerToys");
    assert_eq!(package.title(), Some("PowerToys"));
    assert_eq!(package.meta.short_title.as_deref(), Some("PowerToys"));
    assert_eq!(package.meta.publisher_id.as_deref(), Some("Microsoft"));
    assert_eq!(package.meta.version.as_deref(), Some("0.71.0"));

    let fields = package.display_fields();
    assert!(fields.contains(&("Tags", "utilities, productivity".to_string())));

    assert_eq!(
        WinGetHandler::new()
            .get_url_from_package(&package)
            .unwrap()
            .as_str(),
        "https://winget.run/pkg/Microsoft/PowerToys"
    );
}

#[test]
fn test_installer_selection_per_architecture() {
    let manifest = manifest();
    assert_eq!(
        select_installer(&manifest, Architecture::Arm64).unwrap().arch,
        "arm64"
    );
    assert_eq!(select_installer(&manifest, Architecture::X64).unwrap().arch, "x64");

    match select_installer(&manifest, Architecture::Arm) {
        Err(UnipkgError::PlatformNotSupported(message)) => {
            assert!(message.contains("x64, arm64"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_neutral_and_x86_fallback() {
    let manifest: Manifest = serde_json::from_str(
        r#"{ "Id": "A.B", "Version": "1", "Installers": [
            { "Arch": "x86", "Url": "https://example.com/b-x86.msi" },
            { "Arch": "neutral", "Url": "https://example.com/b.msix" }
        ] }"#,
    )
    .unwrap();
    assert_eq!(
        select_installer(&manifest, Architecture::Arm64).unwrap().arch,
        "neutral"
    );
}

#[test]
fn test_artifact_carries_type_and_silent_switches() {
    let manifest = manifest();

    let x64 = artifact_for(&manifest, &manifest.installers[0]).unwrap();
    assert_eq!(x64.file_name, "PowerToysSetup-0.71.0-x64.exe");
    assert_eq!(x64.installer_type, InstallerType::Exe);
    assert_eq!(x64.install_args, vec!["/quiet", "/norestart"]);

    // no extension in the URL: the declared type supplies one
    let arm = artifact_for(&manifest, &manifest.installers[1]).unwrap();
    assert_eq!(arm.file_name, "download.msi");
    assert_eq!(arm.installer_type, InstallerType::Msi);
    assert_eq!(arm.install_args, vec!["/qn", "INSTALLDIR=C:\\Program Files\\PT"]);
}
