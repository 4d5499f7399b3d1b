use super::*;
use crate::error::UnipkgError;
use tempfile::TempDir;

fn account(name: &str) -> Account {
    Account {
        id: "1".to_string(),
        user_name: name.to_string(),
        display_name: None,
        avatar: None,
    }
}

#[test]
fn test_session_user_and_token_move_together() {
    let session = Session::default();
    assert!(session.user().is_none());
    assert!(session.token().is_none());

    session.start(account("octocat"), "tok".to_string());
    assert_eq!(session.user().map(|a| a.user_name), Some("octocat".to_string()));
    assert_eq!(session.token().as_deref(), Some("tok"));

    session.end();
    assert!(session.user().is_none());
    assert!(session.token().is_none());
}

#[test]
fn test_credential_debug_hides_secret() {
    let credential = Credential::new("octocat", "ghp_secret");
    let printed = format!("{:?}", credential);
    assert!(printed.contains("octocat"));
    assert!(!printed.contains("ghp_secret"));
}

#[test]
fn test_memory_store() {
    let store = MemoryCredentialStore::new();
    assert_eq!(store.get("gh-user").unwrap(), None);

    store.save("gh-user", &Credential::new("a", "b")).unwrap();
    assert_eq!(
        store.get("gh-user").unwrap(),
        Some(Credential::new("a", "b"))
    );

    store.remove("gh-user").unwrap();
    assert_eq!(store.get("gh-user").unwrap(), None);
}

#[test]
fn test_file_store_persists_between_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config").join("credentials.json");

    let store = FileCredentialStore::new(&path);
    store.save("gh-user", &Credential::new("octocat", "t1")).unwrap();
    store.save("other", &Credential::new("someone", "t2")).unwrap();

    let reopened = FileCredentialStore::new(&path);
    assert_eq!(
        reopened.get("gh-user").unwrap(),
        Some(Credential::new("octocat", "t1"))
    );

    reopened.remove("gh-user").unwrap();
    assert_eq!(store.get("gh-user").unwrap(), None);
    assert_eq!(
        store.get("other").unwrap(),
        Some(Credential::new("someone", "t2"))
    );
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn test_file_store_missing_file() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::new(dir.path().join("credentials.json"));
    assert_eq!(store.get("gh-user").unwrap(), None);
    store.remove("gh-user").unwrap();
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = FileCredentialStore::new(&path);
    assert!(matches!(
        store.get("gh-user"),
        Err(UnipkgError::Serialization(_))
    ));
}
