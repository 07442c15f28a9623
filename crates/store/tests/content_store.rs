//! End-to-end behaviour of the content store against an in-memory GitHub

mod common;

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use catnav_store::http::Method;
use catnav_store::{
    Category, ConfigSetting, ContentStoreError, FileContent, HttpResponse, NavigationDocument, Site,
};
use common::{FakeGitHub, Scripted};

const DATA_PATH: &str = "src/mock/mock_data.js";

fn sample_document() -> NavigationDocument {
    let mut doc = NavigationDocument::new("猫猫导航");
    doc.set_default_search_engine("bing");

    let mut category = Category::new("dev-tools", "开发工具", 1);
    category.set_icon("🛠️");
    let mut site = Site::new("github", "GitHub", "https://github.com");
    site.set_description("全球最大的代码托管平台");
    site.set_icon("https://github.com/favicon.ico");
    category.sites.push(site);
    doc.categories.push(category);
    doc
}

#[tokio::test]
async fn test_load_compact_document() {
    let github = FakeGitHub::new();
    let sha = github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);

    let doc = common::store(&github).load_navigation_document().await.unwrap();

    assert_eq!(doc.title(), "T");
    assert!(doc.categories.is_empty());
    assert_eq!(doc.file_sha(), Some(sha.as_str()));
    assert!(!sha.is_empty());
}

#[tokio::test]
async fn test_save_round_trips_non_ascii() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);
    let store = common::store(&github);

    let doc = sample_document();
    store.save_navigation_document(&doc).await.unwrap();

    let text = github.file_text(DATA_PATH).unwrap();
    assert!(text.starts_with("export const mockData = {\n  \"categories\": ["));
    assert!(text.ends_with("}\n"));
    assert!(text.contains("猫猫导航"));
    assert!(!text.contains("_fileSha"));

    let reloaded = store.load_navigation_document().await.unwrap();
    assert_eq!(reloaded.title(), "猫猫导航");
    assert_eq!(reloaded.categories, doc.categories);
    assert_eq!(reloaded.default_search_engine(), Some("bing"));
}

#[tokio::test]
async fn test_save_fetches_once_and_uses_fresh_sha() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);
    let current = github.seed(DATA_PATH, r#"export const mockData = {"title":"T2","categories":[]}"#);

    let mut doc = sample_document();
    doc.set_file_sha("sha-from-an-old-load".to_string());
    common::store(&github).save_navigation_document(&doc).await.unwrap();

    assert_eq!(github.methods(), vec![Method::Get, Method::Put]);

    let writes = github.write_bodies();
    assert_eq!(writes[0]["sha"], current.as_str());
    assert_eq!(writes[0]["branch"], common::BRANCH);
    assert!(
        writes[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("chore: update navigation data - ")
    );
}

#[tokio::test]
async fn test_repeated_saves_are_byte_identical() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);
    let store = common::store(&github);

    store.save_navigation_document(&sample_document()).await.unwrap();
    let first = github.file_text(DATA_PATH).unwrap();

    let loaded = store.load_navigation_document().await.unwrap();
    store.save_navigation_document(&loaded).await.unwrap();
    let second = github.file_text(DATA_PATH).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unchanged_save_keeps_file_bytes() {
    // Hand-edited layout: title first, order before icon, no description
    let original = r#"export const mockData = {
  "title": "猫猫导航",
  "theme": "dark",
  "categories": [
    {
      "name": "开发工具",
      "id": "dev-tools",
      "order": 1.5,
      "icon": "🛠️",
      "sites": [
        {
          "url": "https://github.com",
          "name": "GitHub",
          "id": "github",
          "icon": "https://github.com/favicon.ico"
        }
      ]
    },
    {
      "id": "misc",
      "order": "2",
      "sites": []
    }
  ]
}
"#;
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, original);
    let store = common::store(&github);

    let loaded = store.load_navigation_document().await.unwrap();
    store.save_navigation_document(&loaded).await.unwrap();

    assert_eq!(github.file_text(DATA_PATH).unwrap(), original);
    assert_eq!(github.methods(), vec![Method::Get, Method::Get, Method::Put]);
}

#[tokio::test]
async fn test_sequential_saves_succeed_and_stale_sha_is_rejected() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);
    let store = common::store(&github);

    let first = store.save_navigation_document(&sample_document()).await.unwrap();
    let second = store.save_navigation_document(&sample_document()).await.unwrap();
    assert_ne!(first.content_sha(), second.content_sha());

    let held = store.fetch_file(DATA_PATH, false).await.unwrap().sha;
    github.seed(DATA_PATH, r#"export const mockData = {"title":"edited elsewhere","categories":[]}"#);

    let err = store
        .update_file(DATA_PATH, "export const mockData = {}\n", "overwrite", &held)
        .await
        .unwrap_err();

    assert!(matches!(err, ContentStoreError::RemoteRejection { status: 409, .. }));
    assert!(err.is_conflict());
    assert!(err.to_string().contains("does not match"));
}

#[tokio::test]
async fn test_racing_save_surfaces_rejection() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, r#"export const mockData = {"title":"T","categories":[]}"#);
    github.external_edit_before_next_write(
        DATA_PATH,
        r#"export const mockData = {"title":"other writer","categories":[]}"#,
    );

    let err = common::store(&github)
        .save_navigation_document(&sample_document())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(github.file_text(DATA_PATH).unwrap().contains("other writer"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_distinct_from_network_failure() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, "export const mockData = {}");
    let store = common::store(&github);

    github.script(Scripted::Stall);
    let err = store.fetch_file(DATA_PATH, false).await.unwrap_err();
    match err {
        ContentStoreError::Timeout { after, .. } => assert_eq!(after, Duration::from_secs(10)),
        other => panic!("expected timeout, got {other:?}"),
    }

    github.script(Scripted::NetworkFailure("connection reset".to_string()));
    let err = store.fetch_file(DATA_PATH, false).await.unwrap_err();
    assert!(matches!(err, ContentStoreError::NetworkError(_)));
}

#[tokio::test(start_paused = true)]
async fn test_upload_uses_longer_budget() {
    let github = FakeGitHub::new();
    let store = common::store(&github);

    github.script(Scripted::Respond(HttpResponse::new(404, r#"{"message":"Not Found"}"#)));
    github.script(Scripted::Stall);

    let err = store.upload_binary("public/logo.png", &[1, 2, 3], "upload").await.unwrap_err();
    match err {
        ContentStoreError::Timeout { after, .. } => assert_eq!(after, Duration::from_secs(30)),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_write_times_out_after_write_budget() {
    let github = FakeGitHub::new();
    let sha = github.seed(DATA_PATH, "export const mockData = {}");
    let store = common::store(&github);

    github.script(Scripted::Stall);
    let err = store
        .update_file(DATA_PATH, "export const mockData = {}\n", "save", &sha)
        .await
        .unwrap_err();

    match err {
        ContentStoreError::Timeout { after, .. } => assert_eq!(after, Duration::from_secs(15)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(github.file_text(DATA_PATH).unwrap(), "export const mockData = {}");
}

#[tokio::test]
async fn test_unauthorized_read_mentions_authentication() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, "export const mockData = {}");
    let mut settings = common::settings();
    settings.insert("CATNAV_GITHUB_TOKEN".to_string(), "revoked".to_string());

    let err = common::store_with(&github, settings)
        .fetch_file(DATA_PATH, false)
        .await
        .unwrap_err();

    assert!(err.is_auth());
    let message = err.to_string();
    assert!(message.contains("authentication failed"));
    assert!(message.contains("Bad credentials"));
}

#[tokio::test]
async fn test_non_json_error_body_uses_status_line() {
    let github = FakeGitHub::new();
    github.script(Scripted::Respond(HttpResponse::new(502, "<html>upstream error</html>")));

    let err = common::store(&github).fetch_file(DATA_PATH, false).await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_success_without_sha_is_malformed() {
    let github = FakeGitHub::new();
    github.script(Scripted::Respond(HttpResponse::new(200, r#"{"content":"e30="}"#)));

    let err = common::store(&github).fetch_file(DATA_PATH, false).await.unwrap_err();
    assert!(matches!(err, ContentStoreError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_empty_text_content_is_malformed() {
    let github = FakeGitHub::new();
    github.script(Scripted::Respond(HttpResponse::new(
        200,
        r#"{"content":"","sha":"abc","encoding":"none"}"#,
    )));

    let err = common::store(&github).fetch_file(DATA_PATH, false).await.unwrap_err();
    assert!(matches!(err, ContentStoreError::MalformedResponse(_)));
    assert!(err.to_string().contains("1 MB"));
}

#[tokio::test]
async fn test_upload_creates_without_sha() {
    let github = FakeGitHub::new();
    let bytes: Vec<u8> = (0..=255).cycle().take(5000).collect();

    let result = common::store(&github)
        .upload_binary("public/sitelogo/github.com.ico", &bytes, "add icon")
        .await
        .unwrap();

    let writes = github.write_bodies();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].get("sha").is_none());
    assert_eq!(writes[0]["content"], BASE64.encode(&bytes));
    assert_eq!(github.file("public/sitelogo/github.com.ico").unwrap(), bytes);
    assert!(result.commit_sha().is_some());
}

#[tokio::test]
async fn test_upload_replaces_with_discovered_sha() {
    let github = FakeGitHub::new();
    let existing = github.seed("public/logo.png", vec![0u8; 64]);

    common::store(&github)
        .upload_binary("public/logo.png", &[9, 9, 9], "replace logo")
        .await
        .unwrap();

    let writes = github.write_bodies();
    assert_eq!(writes[0]["sha"], existing.as_str());
    assert_eq!(github.file("public/logo.png").unwrap(), vec![9, 9, 9]);
}

#[tokio::test]
async fn test_upload_aborts_on_ambiguous_precheck() {
    let github = FakeGitHub::new();
    github.script(Scripted::Respond(HttpResponse::new(500, r#"{"message":"Server Error"}"#)));

    let err = common::store(&github)
        .upload_binary("public/logo.png", &[1, 2, 3], "upload")
        .await
        .unwrap_err();

    assert!(matches!(err, ContentStoreError::Precheck { .. }));
    assert_eq!(github.methods(), vec![Method::Get]);
}

#[tokio::test]
async fn test_text_round_trip_through_update() {
    let github = FakeGitHub::new();
    let sha = github.seed("README.md", "old");
    let store = common::store(&github);

    store.update_file("README.md", "猫猫导航\n", "docs", &sha).await.unwrap();

    let file = store.fetch_file("README.md", false).await.unwrap();
    assert_eq!(file.content, FileContent::Text("猫猫导航\n".to_string()));
    assert_eq!(file.resolved_path, "README.md");
    assert_eq!(Some(file.sha), github.sha("README.md"));
}

#[tokio::test]
async fn test_binary_fetch_returns_raw_base64() {
    let github = FakeGitHub::new();
    github.seed("public/logo.png", vec![0xff, 0xd8, 0xff]);

    let file = common::store(&github).fetch_file("public/logo.png", true).await.unwrap();

    match file.content {
        FileContent::Base64(encoded) => {
            let compact: String = encoded.split_whitespace().collect();
            assert_eq!(BASE64.decode(compact).unwrap(), vec![0xff, 0xd8, 0xff]);
        }
        other => panic!("expected base64 content, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_repository_fails_before_network() {
    let github = FakeGitHub::new();
    let mut settings = common::settings();
    settings.remove("CATNAV_GITHUB_REPO");
    let store = common::store_with(&github, settings);

    let err = store.resolve_configuration().unwrap_err();
    assert!(matches!(
        err,
        ContentStoreError::Configuration {
            setting: ConfigSetting::Repository
        }
    ));
    assert!(err.to_string().contains("CATNAV_GITHUB_REPO"));

    let err = store.load_navigation_document().await.unwrap_err();
    assert!(matches!(err, ContentStoreError::Configuration { .. }));
    assert!(github.requests().is_empty());
}

#[tokio::test]
async fn test_unrecognized_file_is_format_error() {
    let github = FakeGitHub::new();
    github.seed(DATA_PATH, "module.exports = {}");

    let err = common::store(&github).load_navigation_document().await.unwrap_err();
    assert!(matches!(err, ContentStoreError::Format(_)));
}

#[tokio::test]
async fn test_verify_connection() {
    let github = FakeGitHub::new();

    let status = common::store(&github).verify_connection().await;
    assert!(status.is_connected());
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["status"], "connected");
    assert_eq!(value["repository"], "maodeyu/nav");
    assert_eq!(value["permissions"]["push"], true);

    let mut settings = common::settings();
    settings.insert("CATNAV_GITHUB_TOKEN".to_string(), "revoked".to_string());
    let status = common::store_with(&github, settings).verify_connection().await;
    assert!(!status.is_connected());

    let mut settings = common::settings();
    settings.remove("CATNAV_GITHUB_BRANCH");
    let status = common::store_with(&github, settings).verify_connection().await;
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["status"], "disconnected");
    assert!(value["message"].as_str().unwrap().contains("CATNAV_GITHUB_BRANCH"));
}
