//! Failure injection: every broken upstream becomes a 502, never a hang or a partial body.

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

mod common;

async fn get_proxy(gateway: std::net::SocketAddr) -> reqwest::Response {
    common::client()
        .get(format!("http://{}/proxy", gateway))
        .send()
        .await
        .expect("gateway unreachable")
}

#[tokio::test]
async fn refused_upstream_is_bad_gateway() {
    let backend = common::closed_port().await;

    let mut config = common::test_config();
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let res = get_proxy(gateway).await;
    assert_eq!(res.status(), 502);
    assert!(res.headers().contains_key("x-request-id"));
    assert!(!res.headers().contains_key("x-josh-loves-gateway"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn slow_upstream_times_out_as_bad_gateway() {
    let (backend, recorded) = common::start_raw_backend(
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok".to_vec(),
        Duration::from_secs(5),
    )
    .await;

    let mut config = common::test_config();
    config.timeouts.upstream_secs = 1;
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let start = Instant::now();
    let res = get_proxy(gateway).await;

    assert_eq!(res.status(), 502);
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(recorded.hits(), 1);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn garbage_reply_is_bad_gateway() {
    let (backend, _recorded) =
        common::start_raw_backend(b"SSH-2.0-OpenSSH_9.6\r\n\r\n".to_vec(), Duration::ZERO).await;

    let mut config = common::test_config();
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let res = get_proxy(gateway).await;
    assert_eq!(res.status(), 502);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_PROTOCOL_ERROR");
}

#[tokio::test]
async fn truncated_body_is_bad_gateway_not_partial() {
    let (backend, _recorded) = common::start_raw_backend(
        b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n{\"firstName\":".to_vec(),
        Duration::ZERO,
    )
    .await;

    let mut config = common::test_config();
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let res = get_proxy(gateway).await;
    assert_eq!(res.status(), 502);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_PROTOCOL_ERROR");
}

#[tokio::test]
async fn gateway_keeps_serving_after_failures() {
    let dead = common::closed_port().await;
    let (alive, recorded) = common::start_mock_backend("200 OK", "", "{}").await;

    let mut broken = common::proxy_route_to(dead);
    broken.id = "broken".into();
    broken.path = "/broken".into();

    let mut config = common::test_config();
    config.routes = vec![broken, common::proxy_route_to(alive)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;
    let client = common::client();

    for _ in 0..5 {
        let res = client
            .get(format!("http://{}/broken", gateway))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
    }

    let res = get_proxy(gateway).await;
    assert_eq!(res.status(), 200);
    assert_eq!(recorded.hits(), 1);
}

/// Accept one connection, read the request head, then report how long it
/// took for the gateway to close its side. Never replies.
async fn start_silent_backend() -> (std::net::SocketAddr, oneshot::Receiver<Option<Duration>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }

        let start = Instant::now();
        let closed = tokio::time::timeout(Duration::from_secs(8), socket.read(&mut buf)).await;
        let _ = tx.send(match closed {
            Ok(Ok(0)) | Ok(Err(_)) => Some(start.elapsed()),
            _ => None,
        });
    });

    (addr, rx)
}

#[tokio::test]
async fn inbound_timeout_abandons_upstream_call() {
    let (backend, closed) = start_silent_backend().await;

    let mut config = common::test_config();
    config.timeouts.request_secs = 1;
    config.timeouts.upstream_secs = 30;
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let res = get_proxy(gateway).await;
    assert_eq!(res.status(), 408);

    let waited = closed
        .await
        .unwrap()
        .expect("upstream connection should be closed once the request is abandoned");
    assert!(waited < Duration::from_secs(5), "closed after {waited:?}");
}

#[tokio::test]
async fn client_disconnect_abandons_upstream_call() {
    let (backend, closed) = start_silent_backend().await;

    let mut config = common::test_config();
    config.timeouts.upstream_secs = 30;
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let err = common::client()
        .get(format!("http://{}/proxy", gateway))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(err.is_err());

    let waited = closed
        .await
        .unwrap()
        .expect("upstream connection should be closed after the client leaves");
    assert!(waited < Duration::from_secs(5), "closed after {waited:?}");
}

#[tokio::test]
async fn excess_requests_queue_for_a_permit() {
    let (backend, recorded) = common::start_raw_backend(
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok".to_vec(),
        Duration::from_millis(800),
    )
    .await;

    let mut config = common::test_config();
    config.listener.max_connections = 1;
    config.routes = vec![common::proxy_route_to(backend)];
    let (gateway, _shutdown) = common::spawn_gateway(config).await;

    let start = Instant::now();
    let (first, second) = tokio::join!(get_proxy(gateway), get_proxy(gateway));
    let elapsed = start.elapsed();

    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);
    assert_eq!(recorded.hits(), 2);
    // One permit: the second upstream exchange starts only after the first ends.
    assert!(elapsed >= Duration::from_millis(1600), "took {elapsed:?}");
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let (gateway, shutdown) = common::spawn_gateway(common::test_config()).await;

    let res = common::client()
        .get(format!("http://{}/unknown", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = common::client()
        .get(format!("http://{}/unknown", gateway))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(err.is_err());
}
