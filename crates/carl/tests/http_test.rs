mod common;

use reqwest::StatusCode;
use serde_json::Value;

async fn json(response: reqwest::Response) -> Value {
    response.json().await.expect("response should be JSON")
}

fn encode(url: &str) -> String {
    url.replace(':', "%3A").replace('/', "%2F")
}

#[tokio::test]
async fn test_package_lookup_rewrites_file_urls() {
    let servers = common::start().await;

    let response = servers.get("/pkg/glib/neofetch").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;

    assert_eq!(body["name"], "neofetch");
    assert_eq!(body["repo"], "glib");
    assert_eq!(body["version"], "0.1.0");
    assert_eq!(body["cli"], "neofetch.lua");

    let expected = format!(
        "{}/file?url={}",
        common::PUBLIC_URL,
        encode(&servers.upstream_url("/dir/lib/neofetch.lua"))
    );
    assert_eq!(body["files"][0]["url"], expected.as_str());
    assert_eq!(body["files"][0]["path"], "neofetch.lua");
}

#[tokio::test]
async fn test_repeat_requests_are_served_from_cache() {
    let servers = common::start().await;

    let first = json(servers.get("/repo/glib").await).await;
    let second = json(servers.get("/pkg/glib/neofetch").await).await;
    let third = json(servers.get("/repo/glib").await).await;

    assert_eq!(servers.definition_hits(), 1);
    assert_eq!(first, third);
    assert_eq!(second["files"], first["packages"][0]["files"]);
}

#[tokio::test]
async fn test_legacy_get_route() {
    let servers = common::start().await;

    let response = servers.get("/get/glib/neofetch").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["repo"], "glib");
}

#[tokio::test]
async fn test_repository_by_definition_url() {
    let servers = common::start().await;
    let definition = servers.upstream_url("/dir/repo.json");

    let response = servers
        .get(&format!("/repo?definitionURL={}", encode(&definition)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["name"], "glib");
    assert_eq!(body["packages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_declared_name_must_match() {
    let servers = common::start().await;

    let response = servers.get("/pkg/renamed/anything").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("name mismatch"), "{error}");

    let definition = servers.upstream_url("/dir/repo.json");
    let response = servers
        .get(&format!("/repo/mine?definitionURL={}", encode(&definition)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_package() {
    let servers = common::start().await;

    let response = servers.get("/pkg/glib/ghost").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("ghost"));
}

#[tokio::test]
async fn test_unknown_repository_without_url() {
    let servers = common::start().await;

    let response = servers.get("/repo/nothing").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_invalid_definition_is_rejected() {
    let servers = common::start().await;
    let definition = servers.upstream_url("/broken.json");

    let response = servers
        .get(&format!("/repo?definitionURL={}", encode(&definition)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("packages[0].version"), "{error}");
}

#[tokio::test]
async fn test_missing_definition_is_not_found() {
    let servers = common::start().await;
    let definition = servers.upstream_url("/nope.json");

    let response = servers
        .get(&format!("/repo?definitionURL={}", encode(&definition)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_relay_streams_upstream_body() {
    let servers = common::start().await;
    let target = servers.upstream_url("/dir/lib/neofetch.lua");

    let response = servers
        .get(&format!("/file?url={}", encode(&target)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.text().await.unwrap(), "print('neofetch')");
}

#[tokio::test]
async fn test_file_relay_requires_url() {
    let servers = common::start().await;

    for path in ["/file", "/file?url="] {
        let response = servers.get(path).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(response).await["error"],
            "Missing url query parameter"
        );
    }
}

#[tokio::test]
async fn test_file_relay_upstream_failures() {
    let servers = common::start().await;

    for path in ["/missing.lua", "/empty"] {
        let target = servers.upstream_url(path);
        let response = servers
            .get(&format!("/file?url={}", encode(&target)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        assert!(json(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn test_file_relay_unreachable_upstream() {
    let servers = common::start().await;

    let response = servers
        .get(&format!("/file?url={}", encode("http://127.0.0.1:1/x")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Failed to fetch http://127.0.0.1:1/x"), "{error}");
}

#[tokio::test]
async fn test_file_relay_outlives_request_timeout() {
    let servers = common::start_with(|config| config.request_timeout_secs = 1).await;
    let target = servers.upstream_url("/slow");

    // three chunks at 500 ms each take longer than the 1 s request timeout
    let response = servers
        .get(&format!("/file?url={}", encode(&target)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "chunk0;chunk1;chunk2;");
}

#[tokio::test]
async fn test_install_script() {
    let servers = common::start().await;

    let response = servers.get("/install").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/lua");
    assert_eq!(response.text().await.unwrap(), "-- carl installer");
}
