use super::*;

#[test]
fn settings_file_uses_expected_filename() {
    let path = settings_file().expect("settings_file should resolve");
    assert_eq!(
        path.file_name().and_then(|f| f.to_str()),
        Some(SETTINGS_FILE_NAME)
    );
}

#[test]
fn collections_file_lives_next_to_settings() {
    let settings = settings_file().expect("settings_file should resolve");
    let collections = collections_file().expect("collections_file should resolve");
    assert_eq!(settings.parent(), collections.parent());
}

#[test]
fn expand_home_leaves_absolute_paths_alone() {
    let path = Path::new("/tmp/unipkg");
    assert_eq!(expand_home(path).unwrap(), PathBuf::from("/tmp/unipkg"));
}

#[test]
fn expand_home_rejects_other_users() {
    assert!(expand_home(Path::new("~bob/x")).is_err());
}
