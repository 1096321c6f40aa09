//! Unit tests for the registry client

use super::*;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(RegistryConfig {
        base_url: server.uri(),
        ..RegistryConfig::default()
    })
    .unwrap()
}

async fn mount_project(server: &MockServer, name: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}/json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn flask_project() -> serde_json::Value {
    serde_json::json!({
        "info": {
            "name": "flask",
            "version": "3.0.0",
            "requires_python": ">=3.8",
            "requires_dist": ["werkzeug>=3.0.0", "jinja2>=3.1.2"]
        },
        "releases": {
            "3.0.0": [{"requires_python": ">=3.8"}],
            "2.3.0": [{"requires_python": ">=3.8"}],
            "2.0.0": [{"requires_python": ">=3.6"}],
            "1.1.4": [{"requires_python": ">=2.7"}],
            "2.0.0rc1": [{"requires_python": ">=3.6"}]
        }
    })
}

#[test]
fn test_config_defaults() {
    let config = RegistryConfig::default();
    assert_eq!(config.base_url, "https://pypi.org/pypi");
    assert_eq!(config.max_versions_per_package, 50);
    assert_eq!(config.timeout, Duration::from_secs(15));
}

#[tokio::test]
async fn test_project_fetch_success() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);
    let project = client.project("flask").await.unwrap();

    assert_eq!(project.info.name, "flask");
    assert_eq!(project.releases.len(), 5);
    assert_eq!(client.stats().snapshot().api_calls, 1);
}

#[tokio::test]
async fn test_project_not_found_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing/json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.project("missing").await.is_none());
    assert_eq!(client.stats().snapshot().api_calls, 1);
}

#[tokio::test]
async fn test_project_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flask/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flask_project()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.project("flask").await.is_some());
    assert!(client.project("flask").await.is_some());

    let stats = client.stats().snapshot();
    assert_eq!(stats.api_calls, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
}

#[tokio::test]
async fn test_concurrent_fetches_deduplicated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flask/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(flask_project())
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (a, b) = tokio::join!(client.project("flask"), client.project("flask"));

    assert!(a.is_some());
    assert!(b.is_some());
    assert_eq!(client.stats().snapshot().api_calls, 1);
}

#[tokio::test]
async fn test_list_versions_ascending_and_filtered() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "info": {"name": "pkg", "version": "2.0.0"},
        "releases": {
            "2.0.0": [{}],
            "1.0.0": [{}],
            "1.5.0": [{}],
            "not-a-version": [{}]
        }
    });
    mount_project(&server, "pkg", body).await;

    let client = client_for(&server);
    let versions = client.list_versions("pkg").await;

    let rendered: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["1.0.0", "1.5.0", "2.0.0"]);
}

#[tokio::test]
async fn test_list_versions_caps_to_newest() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "info": {"name": "pkg", "version": "4.0.0"},
        "releases": {
            "1.0.0": [{}],
            "2.0.0": [{}],
            "3.0.0": [{}],
            "4.0.0": [{}]
        }
    });
    mount_project(&server, "pkg", body).await;

    let client = RegistryClient::new(RegistryConfig {
        base_url: server.uri(),
        max_versions_per_package: 2,
        ..RegistryConfig::default()
    })
    .unwrap();

    let versions = client.list_versions("pkg").await;
    let rendered: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["3.0.0", "4.0.0"]);
    assert_eq!(client.stats().snapshot().versions_pruned, 2);
}

#[tokio::test]
async fn test_list_versions_for_missing_package() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing/json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.list_versions("missing").await.is_empty());
}

#[tokio::test]
async fn test_version_metadata() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);

    let latest = client.version_metadata("flask", "3.0.0").await.unwrap();
    assert_eq!(latest.dependencies.len(), 2);

    let older = client.version_metadata("flask", "2.0.0").await.unwrap();
    assert_eq!(older.requires_python.as_deref(), Some(">=3.6"));

    assert!(client.version_metadata("flask", "9.9.9").await.is_none());
}

#[tokio::test]
async fn test_python_compatibility_verdicts() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);

    assert!(client.is_python_compatible("flask", "3.0.0", "3.9").await);
    assert!(!client.is_python_compatible("flask", "3.0.0", "3.7").await);
    assert!(client.is_python_compatible("flask", "1.1.4", "2.7").await);

    // Verdicts land in the compatibility cache
    assert_eq!(client.cache().get_compatibility("flask", "3.0.0", "3.9"), Some(true));
    assert_eq!(client.cache().get_compatibility("flask", "3.0.0", "3.7"), Some(false));
}

#[tokio::test]
async fn test_find_compatible_versions() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);
    let constraint = VersionConstraint::parse("flask>=2.0,<3.0").unwrap();

    let found = client
        .find_compatible_versions("flask", "3.9", &constraint, 0)
        .await;
    // 2.0.0rc1 sorts before 2.0.0 and fails >=2.0
    let rendered: Vec<String> = found.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["2.0.0", "2.3.0"]);
}

#[tokio::test]
async fn test_find_compatible_versions_early_termination() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);
    let constraint = VersionConstraint::unconstrained("flask");

    let found = client
        .find_compatible_versions("flask", "3.9", &constraint, 2)
        .await;
    // Newest two, returned ascending
    let rendered: Vec<String> = found.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["2.3.0", "3.0.0"]);
}

#[tokio::test]
async fn test_find_optimal_version_prefers_stable() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);
    let constraint = VersionConstraint::parse("flask>1.9,<2.1").unwrap();

    // Both 2.0.0rc1 and 2.0.0 match; stable wins
    let optimal = client
        .find_optimal_version("flask", "3.9", &constraint, true)
        .await
        .unwrap();
    assert_eq!(optimal.to_string(), "2.0.0");
}

#[tokio::test]
async fn test_find_optimal_version_prerelease_fallback() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "info": {"name": "edgy", "version": "1.0.0rc1"},
        "releases": {
            "1.0.0rc1": [{}],
            "1.0.0b2": [{}]
        }
    });
    mount_project(&server, "edgy", body).await;

    let client = client_for(&server);
    let constraint = VersionConstraint::unconstrained("edgy");

    let optimal = client
        .find_optimal_version("edgy", "3.9", &constraint, true)
        .await
        .unwrap();
    assert_eq!(optimal.to_string(), "1.0.0rc1");
}

#[tokio::test]
async fn test_find_optimal_version_none_when_nothing_matches() {
    let server = MockServer::start().await;
    mount_project(&server, "flask", flask_project()).await;

    let client = client_for(&server);
    let constraint = VersionConstraint::parse("flask>=99.0").unwrap();

    assert!(client
        .find_optimal_version("flask", "3.9", &constraint, true)
        .await
        .is_none());
}

#[tokio::test]
async fn test_expired_entry_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flask/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flask_project()))
        .expect(2)
        .mount(&server)
        .await;

    let client = RegistryClient::new(RegistryConfig {
        base_url: server.uri(),
        cache_ttl: Duration::from_millis(10),
        ..RegistryConfig::default()
    })
    .unwrap();

    assert!(client.project("flask").await.is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(client.project("flask").await.is_some());

    let stats = client.stats().snapshot();
    assert_eq!(stats.api_calls, 2);
    assert_eq!(stats.cache_misses, 2);
    assert_eq!(stats.cache_hits, 0);
}

#[test]
fn test_python_matches_lenient() {
    assert!(python_matches(None, "3.9"));
    assert!(python_matches(Some(""), "3.9"));
    assert!(python_matches(Some(">=3.7"), "3.9"));
    assert!(!python_matches(Some(">=3.10"), "3.9"));
    assert!(python_matches(Some(">=3.7,<4"), "3.9"));
    // Syntax outside the grammar never excludes
    assert!(python_matches(Some("!=3.0.*"), "3.9"));
}
