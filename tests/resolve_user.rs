// tests/resolve_user.rs
//
// resolve-user over stub sources: concurrency, timeouts, priority and caps.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reddit_persona::llm::LlmGateway;
use reddit_persona::profile::ProfileMetadata;
use reddit_persona::sources::ContentSource;
use reddit_persona::{PersonaError, PersonaService, ServiceSettings};

use common::{sample_items, StubFetcher, StubSource};

fn settings(timeout_ms: u64) -> ServiceSettings {
    ServiceSettings {
        source_timeout: Duration::from_millis(timeout_ms),
        ..ServiceSettings::default()
    }
}

fn service(sources: Vec<Arc<dyn ContentSource>>, fetcher: StubFetcher) -> PersonaService {
    PersonaService::new(sources, Arc::new(fetcher), LlmGateway::default(), settings(500))
}

#[tokio::test]
async fn everything_empty_still_yields_a_record() {
    let svc = service(
        vec![
            Arc::new(StubSource::new("reddit_api", vec![])),
            Arc::new(StubSource::new("old_reddit", vec![]).failing()),
        ],
        StubFetcher::default(),
    );

    let rec = svc.resolve_user("quiet_user").await.expect("not an error");
    assert_eq!(rec.username, "quiet_user");
    assert!(rec.posts.is_empty());
    assert!(rec.comments.is_empty());
    assert!(rec.profile.is_empty());
}

#[tokio::test]
async fn unusable_identifiers_are_not_found() {
    let svc = service(vec![], StubFetcher::default());
    for bad in ["", "   ", "has space", "https://www.reddit.com/user/", "way_too_long_handle_for_reddit"] {
        assert_eq!(
            svc.resolve_user(bad).await.unwrap_err(),
            PersonaError::NotFound,
            "input {bad:?}"
        );
    }
}

#[tokio::test]
async fn profile_url_and_prefixed_handles_resolve() {
    let svc = service(vec![], StubFetcher::default());
    let rec = svc
        .resolve_user("https://www.reddit.com/user/kojied/comments/?sort=new")
        .await
        .unwrap();
    assert_eq!(rec.username, "kojied");

    let rec = svc.resolve_user("u/Hungry-Move-6603").await.unwrap();
    assert_eq!(rec.username, "Hungry-Move-6603");
}

#[tokio::test]
async fn earlier_sources_lead_and_each_is_capped() {
    let svc = service(
        vec![
            Arc::new(StubSource::new("reddit_api", sample_items("a", 15))),
            Arc::new(StubSource::new("old_reddit", sample_items("b", 5))),
        ],
        StubFetcher::default(),
    );

    let rec = svc.resolve_user("ferris").await.unwrap();
    assert_eq!(rec.posts.len(), 15);
    assert!(rec.posts[..10].iter().all(|p| p.body.starts_with("a ")));
    assert!(rec.posts[10..].iter().all(|p| p.body.starts_with("b ")));
}

#[tokio::test]
async fn slow_source_is_cut_off_without_blocking_the_rest() {
    let slow = Arc::new(StubSource::new("old_reddit", sample_items("slow", 3)).slow(Duration::from_secs(30)));
    let svc = PersonaService::new(
        vec![
            slow.clone() as Arc<dyn ContentSource>,
            Arc::new(StubSource::new("user_feed", sample_items("fast", 2))),
        ],
        Arc::new(StubFetcher::default()),
        LlmGateway::default(),
        settings(100),
    );

    let t0 = Instant::now();
    let rec = svc.resolve_user("ferris").await.unwrap();
    assert!(t0.elapsed() < Duration::from_secs(5), "timeout must bound the call");
    assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    assert_eq!(rec.posts.len(), 2);
    assert!(rec.posts.iter().all(|p| p.body.starts_with("fast")));
}

#[tokio::test]
async fn slow_metadata_degrades_to_absent_fields() {
    let fetcher = StubFetcher {
        meta: ProfileMetadata {
            name: Some("ferris".into()),
            ..Default::default()
        },
        delay: Some(Duration::from_secs(30)),
    };
    let svc = PersonaService::new(
        vec![Arc::new(StubSource::new("user_feed", sample_items("p", 1)))],
        Arc::new(fetcher),
        LlmGateway::default(),
        settings(100),
    );

    let rec = svc.resolve_user("ferris").await.unwrap();
    assert!(rec.profile.is_empty());
    assert_eq!(rec.posts.len(), 1);
}

#[tokio::test]
async fn metadata_is_carried_into_the_record() {
    let fetcher = StubFetcher {
        meta: ProfileMetadata {
            name: Some("ferris".into()),
            comment_karma: Some(42),
            verified: Some(true),
            ..Default::default()
        },
        delay: None,
    };
    let svc = service(vec![], fetcher);
    let rec = svc.resolve_user("ferris").await.unwrap();
    assert_eq!(rec.profile.comment_karma, Some(42));

    let v = serde_json::to_value(&rec).unwrap();
    assert_eq!(v["name"], "ferris");
    assert_eq!(v["verified"], true);
    assert!(v["location"].is_null());
}
