//! Integration tests for the Spring API client against mock upstreams.
//!
//! Each test starts a `wiremock` server standing in for `api.spring.io` and
//! `calendar.spring.io`, and checks the requests sent and records decoded.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use spring_io_mcp::springio::{
    CalendarWindow, Generation, Release, SpringIoClient, SpringIoError, Upstream,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SpringIoClient {
    let base = server.uri().parse().unwrap();
    SpringIoClient::new(base, server.uri().parse().unwrap(), Duration::from_secs(5)).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Releases
// =============================================================================

#[tokio::test]
async fn test_project_releases_single_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/releases"))
        .and(header("accept", "application/hal+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {
                "releases": [{"version": "3.2.0", "status": "GA", "current": true}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let releases = client_for(&server)
        .project_releases("spring-boot")
        .await
        .unwrap();

    assert_eq!(
        releases,
        vec![Release {
            version: "3.2.0".to_string(),
            status: "GA".to_string(),
            current: true,
        }]
    );
}

#[tokio::test]
async fn test_project_releases_verbatim_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-framework/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {
                "releases": [
                    {"version": "6.2.0-SNAPSHOT", "status": "SNAPSHOT", "current": false,
                     "referenceDocUrl": "https://docs.spring.io/x"},
                    {"version": "6.1.8", "status": "GA", "current": true},
                    {"version": "6.2.0-M3", "status": "PRERELEASE", "current": false}
                ]
            },
            "_links": {"project": {"href": "https://api.spring.io/projects/spring-framework"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let releases = client_for(&server)
        .project_releases("spring-framework")
        .await
        .unwrap();

    let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, ["6.2.0-SNAPSHOT", "6.1.8", "6.2.0-M3"]);
    assert_eq!(releases[2].status, "PRERELEASE");
    assert!(releases[1].current);
}

#[tokio::test]
async fn test_project_releases_empty_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-shell/releases"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"releases": []}})),
        )
        .mount(&server)
        .await;

    let releases = client_for(&server)
        .project_releases("spring-shell")
        .await
        .unwrap();
    assert!(releases.is_empty());
}

#[tokio::test]
async fn test_blank_project_id_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);

    for project_id in ["", "   ", "\t\n"] {
        let err = client.project_releases(project_id).await.unwrap_err();
        assert!(matches!(err, SpringIoError::InvalidArgument { .. }));

        let err = client.project_generations(project_id).await.unwrap_err();
        assert!(matches!(err, SpringIoError::InvalidArgument { .. }));
    }
}

#[tokio::test]
async fn test_server_error_is_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/releases"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .project_releases("spring-boot")
        .await
        .unwrap_err();

    match err {
        SpringIoError::UpstreamRequestFailed {
            status, ref path, ..
        } => {
            assert_eq!(status, Some(500));
            assert_eq!(path, "/projects/spring-boot/releases");
        }
        other => panic!("Expected UpstreamRequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/no-such-project/generations"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .project_generations("no-such-project")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_non_json_body_is_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .project_releases("spring-boot")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "upstream_request_failed");
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_schema_mismatch_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"items": []}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .project_releases("spring-boot")
        .await
        .unwrap_err();
    match err {
        SpringIoError::MalformedUpstreamResponse { reason, .. } => {
            assert!(reason.contains("releases"));
        }
        other => panic!("Expected MalformedUpstreamResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_version_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"releases": [{"version": "", "status": "GA", "current": true}]}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .project_releases("spring-boot")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_upstream_response");
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = SpringIoClient::new(
        "http://127.0.0.1:9".parse().unwrap(),
        "http://127.0.0.1:9".parse().unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client.project_releases("spring-boot").await.unwrap_err();
    assert_eq!(err.kind(), "upstream_request_failed");
    assert_eq!(err.status(), None);
}

// =============================================================================
// Generations
// =============================================================================

#[tokio::test]
async fn test_project_generations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/generations"))
        .and(header("accept", "application/hal+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {
                "generations": [
                    {
                        "name": "3.2.x",
                        "initialReleaseDate": "2023-11-23",
                        "ossSupportEndDate": "2024-11-23",
                        "commercialSupportEndDate": "2026-02-23",
                        "_links": {}
                    },
                    {
                        "name": "3.4.x",
                        "initialReleaseDate": "2024-11-21",
                        "ossSupportEndDate": null,
                        "commercialSupportEndDate": null
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generations = client_for(&server)
        .project_generations("spring-boot")
        .await
        .unwrap();

    assert_eq!(
        generations,
        vec![
            Generation {
                name: "3.2.x".to_string(),
                initial_release_date: Some(date(2023, 11, 23)),
                oss_support_end_date: Some(date(2024, 11, 23)),
                commercial_support_end_date: Some(date(2026, 2, 23)),
            },
            Generation {
                name: "3.4.x".to_string(),
                initial_release_date: Some(date(2024, 11, 21)),
                oss_support_end_date: None,
                commercial_support_end_date: None,
            },
        ]
    );
}

#[tokio::test]
async fn test_project_generations_with_timestamp_dates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/spring-boot/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {
                "generations": [{
                    "name": "3.2.x",
                    "initialReleaseDate": "2023-11-23T00:00:00Z",
                    "ossSupportEndDate": "2024-11-23",
                    "commercialSupportEndDate": null
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generations = client_for(&server)
        .project_generations("spring-boot")
        .await
        .unwrap();

    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].initial_release_date, Some(date(2023, 11, 23)));
    assert_eq!(generations[0].oss_support_end_date, Some(date(2024, 11, 23)));
    assert_eq!(generations[0].commercial_support_end_date, None);
}

#[tokio::test]
async fn test_project_id_is_a_single_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/a%2Fb/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"generations": []}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generations = client_for(&server).project_generations("a/b").await.unwrap();
    assert!(generations.is_empty());
}

// =============================================================================
// Calendar
// =============================================================================

#[tokio::test]
async fn test_upcoming_releases_window_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/releases"))
        .and(query_param("start", "2024-03-01"))
        .and(query_param("end", "2024-05-30"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "allDay": true,
                "backgroundColor": "#6db33f",
                "start": "2024-03-21",
                "title": "Spring Boot 3.2.4",
                "url": "https://github.com/spring-projects/spring-boot/milestone/350"
            },
            {
                "allDay": false,
                "backgroundColor": "#34302d",
                "start": "2024-04-18T00:00:00+02:00",
                "title": "Spring Data 2024.0.0-RC1",
                "url": "https://github.com/spring-projects/spring-data/milestone/7"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let window = CalendarWindow::starting_at(date(2024, 3, 1), 90).unwrap();
    let upcoming = client_for(&server).upcoming_releases(window).await.unwrap();

    assert_eq!(upcoming.len(), 2);
    assert_eq!(upcoming[0].title, "Spring Boot 3.2.4");
    assert_eq!(upcoming[0].start, date(2024, 3, 21));
    assert_eq!(upcoming[1].start, date(2024, 4, 18));
    assert!(!upcoming[1].all_day);
}

#[tokio::test]
async fn test_upcoming_releases_empty_calendar() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let window = CalendarWindow::starting_at(date(2024, 12, 20), 30).unwrap();
    let upcoming = client_for(&server).upcoming_releases(window).await.unwrap();
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn test_upcoming_releases_enveloped_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"releases": []}})),
        )
        .mount(&server)
        .await;

    let window = CalendarWindow::starting_at(date(2024, 1, 1), 90).unwrap();
    let err = client_for(&server)
        .upcoming_releases(window)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_upstream_response");
}

// =============================================================================
// Raw fetch
// =============================================================================

#[tokio::test]
async fn test_fetch_returns_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"projects": []}})))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .fetch(Upstream::Projects, &["projects"], &[])
        .await
        .unwrap();
    assert_eq!(body, json!({"_embedded": {"projects": []}}));
}
