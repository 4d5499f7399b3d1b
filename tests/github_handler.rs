//! GitHub handler against a local mock of the REST and OAuth endpoints.
//!
//! The blocking HTTP client must not run on the async runtime's worker
//! threads, so every service call goes through `spawn_blocking`.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use unipkg::accounts::{Credential, CredentialStore, MemoryCredentialStore};
use unipkg::config::Settings;
use unipkg::context::AppContext;
use unipkg::core::{Architecture, PackageStatus};
use unipkg::error::UnipkgError;
use unipkg::handlers::PackageService;
use unipkg::handlers::github::ACCOUNT_ID;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    _dir: TempDir,
    service: PackageService,
    credentials: Arc<MemoryCredentialStore>,
}

fn fixture(server_uri: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::parse(&format!(
        r#"
        handlers {{
            winget #false
            collections #false
        }}
        github {{
            api-url "{uri}/api"
            oauth-url "{uri}"
            client-id "client-1"
            client-secret "secret-1"
        }}
        "#,
        uri = server_uri
    ))
    .unwrap();

    let credentials = Arc::new(MemoryCredentialStore::new());
    let context = AppContext::builder(settings)
        .download_dir(dir.path().join("downloads"))
        .credentials(credentials.clone())
        .architecture(Architecture::X64)
        .build()
        .unwrap();

    Fixture {
        _dir: dir,
        service: PackageService::with_builtin_handlers(Arc::new(context)),
        credentials,
    }
}

fn repository() -> serde_json::Value {
    json!({
        "name": "tool",
        "owner": { "login": "acme", "avatar_url": "https://avatars.example/acme.png" },
        "description": "A handy tool",
        "html_url": "https://github.com/acme/tool",
        "homepage": "",
        "created_at": "2021-03-04T05:06:07Z",
        "stargazers_count": 42,
        "language": "Rust",
        "license": { "name": "MIT License", "spdx_id": "MIT" }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn resolves_repository_by_urn_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/repos/acme/tool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository()))
        .expect(2)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (title, urn, stars, from_url) = tokio::task::spawn_blocking(move || {
        let fixture = fixture(&uri);
        let package = fixture
            .service
            .resolve("urn:gh-repo:acme:tool", PackageStatus::Details)
            .unwrap();
        let stars = package
            .display_fields()
            .into_iter()
            .find(|(label, _)| *label == "Stars")
            .map(|(_, value)| value);
        let from_url = fixture
            .service
            .resolve("https://github.com/acme/tool.git", PackageStatus::Details)
            .unwrap();
        (
            package.title().map(str::to_string),
            package.urn().to_string(),
            stars,
            from_url.urn().to_string(),
        )
    })
    .await
    .unwrap();

    assert_eq!(title.as_deref(), Some("tool"));
    assert_eq!(urn, "urn:gh-repo:acme:tool");
    assert_eq!(stars.as_deref(), Some("42"));
    assert_eq!(from_url, urn);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_repository_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/repos/acme/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let error = tokio::task::spawn_blocking(move || {
        fixture(&uri)
            .service
            .resolve("urn:gh-repo:acme:ghost", PackageStatus::Details)
            .unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(error.root(), UnipkgError::NotFound(_)), "got {:?}", error);
}

#[tokio::test(flavor = "multi_thread")]
async fn search_maps_items_to_packages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/repositories"))
        .and(query_param("q", "tool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [repository()] })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let urns = tokio::task::spawn_blocking(move || {
        fixture(&uri)
            .service
            .search_all("tool")
            .into_iter()
            .map(|p| p.urn().to_string())
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();

    assert_eq!(urns, vec!["urn:gh-repo:acme:tool".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_is_a_soft_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (signed_in, stored) = tokio::task::spawn_blocking(move || {
        let fixture = fixture(&uri);
        let signed_in = fixture
            .service
            .sign_in(ACCOUNT_ID, &Credential::new("token", "bad"))
            .unwrap();
        (signed_in, fixture.credentials.get(ACCOUNT_ID).unwrap())
    })
    .await
    .unwrap();

    assert!(!signed_in);
    assert!(stored.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn oauth_redirect_exchanges_code_and_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "login": "octo", "name": "Octo Cat", "avatar_url": null
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (signed_in, user, stored) = tokio::task::spawn_blocking(move || {
        let fixture = fixture(&uri);
        let signed_in = fixture
            .service
            .handle_auth_activation("unipkg://auth/gh-user?code=abc123")
            .unwrap();
        let user = fixture
            .service
            .account(ACCOUNT_ID)
            .unwrap()
            .current_user()
            .map(|account| account.user_name);
        (signed_in, user, fixture.credentials.get(ACCOUNT_ID).unwrap())
    })
    .await
    .unwrap();

    assert!(signed_in);
    assert_eq!(user.as_deref(), Some("octo"));
    let stored = stored.expect("credential saved");
    assert_eq!(stored.user_name, "octo");
    assert_eq!(stored.secret, "tok-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn oauth_error_reply_is_rejected() {
    let server = MockServer::start().await;

    let uri = server.uri();
    let error = tokio::task::spawn_blocking(move || {
        fixture(&uri)
            .service
            .handle_auth_activation("unipkg://auth/gh-user?error=access_denied")
            .unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(error, UnipkgError::AuthActivation(_)), "got {:?}", error);
}

#[tokio::test(flavor = "multi_thread")]
async fn downloads_latest_release_asset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/repos/acme/tool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/repos/acme/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v1.0.0",
            "assets": [
                { "name": "checksums.txt", "browser_download_url": format!("{}/files/checksums.txt", server.uri()), "size": 10 },
                { "name": "tool.zip", "browser_download_url": format!("{}/files/tool.zip", server.uri()), "size": 11 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/tool.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip-payload".to_vec()))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (status, file_name, content) = tokio::task::spawn_blocking(move || {
        let fixture = fixture(&uri);
        let cx = fixture.service.context();
        let mut package = fixture
            .service
            .resolve("urn:gh-repo:acme:tool", PackageStatus::Details)
            .unwrap();
        let path = package.download(cx).unwrap();
        (
            package.status(),
            path.file_name().map(|n| n.to_string_lossy().into_owned()),
            std::fs::read(&path).unwrap(),
        )
    })
    .await
    .unwrap();

    assert_eq!(status, PackageStatus::Downloaded);
    assert_eq!(file_name.as_deref(), Some("tool.zip"));
    assert_eq!(content, b"zip-payload");
}
