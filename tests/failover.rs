//! Failover behavior against real HTTP mock hosts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use icon_resolver::config::{CachePolicy, FailoverConfig, RequestOptions};
use icon_resolver::{ConfigPatch, IconEngine, IconError, IconRequest};

mod common;

fn counting_host(
    status: u16,
    body: &'static str,
) -> (Arc<AtomicU32>, impl Fn(String) -> std::future::Ready<(u16, String)> + Send + Sync) {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let handler = move |_target: String| {
        cc.fetch_add(1, Ordering::SeqCst);
        std::future::ready((status, body.to_string()))
    };
    (calls, handler)
}

#[tokio::test]
async fn test_second_host_serves_after_primary_fails() {
    let (a_calls, a) = counting_host(500, "Internal Server Error");
    let (b_calls, b) = counting_host(200, common::GITHUB_SVG);
    let a_addr = common::start_programmable_backend(a).await;
    let b_addr = common::start_programmable_backend(b).await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(
            ConfigPatch::default()
                .hosts([format!("http://{a_addr}"), format!("http://{b_addr}")])
                .cache(CachePolicy::Bounded(2)),
        )
        .unwrap();

    let request = IconRequest::new("mdi:github");
    let started = Instant::now();
    let data = engine.resolve_icon(&request).await.unwrap();

    // Default failover delay between hosts.
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(data.attributes["viewBox"], "0 0 24 24");
    assert!(data.vector.starts_with("<path"));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.cached_keys(), vec!["mdi:github []".to_string()]);

    let again = engine.resolve_icon(&request).await.unwrap();
    assert!(Arc::ptr_eq(&data, &again));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_hosts_failing_is_not_cached() {
    let (a_calls, a) = counting_host(500, "down");
    let (b_calls, b) = counting_host(503, "down too");
    let a_addr = common::start_programmable_backend(a).await;
    let b_addr = common::start_programmable_backend(b).await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(
            ConfigPatch::default()
                .hosts([format!("http://{a_addr}"), format!("http://{b_addr}")])
                .failover_delay_ms(20),
        )
        .unwrap();

    let request = IconRequest::new("mdi:github");
    let err = engine.resolve_icon(&request).await.unwrap_err();

    match err {
        IconError::ExhaustedHosts { attempts, last_error } => {
            assert_eq!(attempts, 2);
            assert_eq!(*last_error, IconError::status(503));
        }
        other => panic!("expected ExhaustedHosts, got {other:?}"),
    }
    assert!(!engine.is_cached(&request));
    assert_eq!(engine.cached_len(), 0);

    // A failed resolution is retried from scratch.
    let _ = engine.resolve_icon(&request).await;
    assert_eq!(a_calls.load(Ordering::SeqCst), 2);
    assert_eq!(b_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_primary_and_unreachable_secondary_is_not_cached() {
    let (a_calls, a) = counting_host(502, "bad gateway");
    let a_addr = common::start_programmable_backend(a).await;
    let b_addr = common::closed_port().await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(
            ConfigPatch::default()
                .hosts([format!("http://{a_addr}"), format!("http://{b_addr}")])
                .failover_delay_ms(20),
        )
        .unwrap();

    let request = IconRequest::new("mdi:github");
    match engine.resolve_icon(&request).await.unwrap_err() {
        IconError::ExhaustedHosts { attempts, last_error } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last_error, IconError::Transport { status: None, .. }));
        }
        other => panic!("expected ExhaustedHosts, got {other:?}"),
    }
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert!(!engine.is_cached(&request));
    assert_eq!(engine.cached_len(), 0);
}

#[tokio::test]
async fn test_request_path_and_query() {
    let targets = Arc::new(Mutex::new(Vec::new()));
    let t = targets.clone();
    let addr = common::start_programmable_backend(move |target| {
        t.lock().unwrap().push(target);
        std::future::ready((200, common::GITHUB_SVG.to_string()))
    })
    .await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(ConfigPatch::default().hosts([format!("http://{addr}/v2")]))
        .unwrap();

    let request = IconRequest::new("mdi:github")
        .rotate(icon_resolver::icon::Rotate::Deg90)
        .color("red");
    engine.resolve_icon(&request).await.unwrap();

    assert_eq!(
        *targets.lock().unwrap(),
        vec!["/v2/mdi/github.svg?color=red&rotate=90deg".to_string()]
    );
    assert!(engine.is_cached(&request));
}

#[tokio::test]
async fn test_timeout_fails_over() {
    let slow = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, common::GITHUB_SVG.to_string())
    })
    .await;
    let (fast_calls, fast) = counting_host(200, common::GITHUB_SVG);
    let fast = common::start_programmable_backend(fast).await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(
            ConfigPatch::default()
                .hosts([format!("http://{slow}"), format!("http://{fast}")])
                .request(RequestOptions {
                    timeout_ms: 200,
                    ..RequestOptions::default()
                })
                .failover(FailoverConfig {
                    delay_ms: 10,
                    jitter_ratio: 0.0,
                }),
        )
        .unwrap();

    let started = Instant::now();
    let data = engine.resolve_icon(&IconRequest::new("mdi:github")).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(data.attributes["width"], "1em");
    assert_eq!(fast_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malicious_markup_is_sanitized() {
    let addr = common::start_programmable_backend(|_| {
        std::future::ready((
            200,
            r#"<svg viewBox="0 0 24 24" onload="alert(1)" style="x"><script>alert(2)</script><path d="M0 0" onclick="alert(3)"/><a href="javascript:alert(4)"><path d="M1 1"/></a></svg>"#
                .to_string(),
        ))
    })
    .await;

    let engine = IconEngine::with_transport(common::direct_transport()).unwrap();
    engine
        .configure(ConfigPatch::default().hosts([format!("http://{addr}")]))
        .unwrap();

    let data = engine.resolve_icon(&IconRequest::new("mdi:evil")).await.unwrap();
    let svg = data.to_svg();

    assert!(!svg.contains("alert"));
    assert!(!data.attributes.contains_key("onload"));
    assert!(!data.attributes.contains_key("style"));
    assert_eq!(data.vector, r#"<path d="M0 0"/>"#);
}
