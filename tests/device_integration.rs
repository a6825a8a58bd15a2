//! Integration tests for the device side
//!
//! Simulated LED controller endpoints, the connectivity probe, and
//! fire-and-forget dispatch against a live local server.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use facelamp::core::{
    device_router, CommandSink, DeviceClient, HttpDispatcher, SimulatedDevice,
};
use facelamp::types::{LampState, LedCommand};
use facelamp::LampError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Serve a router on an ephemeral local port, return "127.0.0.1:port"
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

fn client_for(host: &str) -> DeviceClient {
    DeviceClient::new(host, Duration::from_secs(2), Duration::from_secs(3)).unwrap()
}

#[tokio::test]
async fn test_simulator_root_answers_ok() {
    let app = device_router(Arc::new(SimulatedDevice::new()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_simulator_led_on_then_state() {
    let device = Arc::new(SimulatedDevice::new());
    let app = device_router(Arc::clone(&device));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/led/on").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/led/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["on"], true);
    assert_eq!(json["on_requests"], 1);
    assert_eq!(json["off_requests"], 0);
    assert_eq!(device.lamp_state().await, LampState::On);
}

#[tokio::test]
async fn test_simulator_unknown_path_not_found() {
    let app = device_router(Arc::new(SimulatedDevice::new()));

    let response = app
        .oneshot(Request::builder().uri("/led/blink").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_probe_succeeds_against_simulator() {
    let host = serve(device_router(Arc::new(SimulatedDevice::new()))).await;
    assert!(client_for(&host).probe().await.is_ok());
}

#[tokio::test]
async fn test_probe_rejects_non_200() {
    let router = Router::new().route(
        "/",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "booting") }),
    );
    let host = serve(router).await;

    match client_for(&host).probe().await {
        Err(LampError::DeviceStatus { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected DeviceStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_unreachable() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = client_for(&host).probe().await;
    assert!(matches!(result, Err(LampError::DeviceUnreachable { .. })));
}

#[tokio::test]
async fn test_send_reports_non_200_as_dispatch_error() {
    let router = Router::new().route(
        "/led/on",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "relay fault") }),
    );
    let host = serve(router).await;

    match client_for(&host).send(LedCommand::On).await {
        Err(LampError::Dispatch { command, reason }) => {
            assert_eq!(command, "on");
            assert!(reason.contains("500"));
        }
        other => panic!("expected Dispatch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dispatcher_delivers_in_background() {
    let device = Arc::new(SimulatedDevice::new());
    let host = serve(device_router(Arc::clone(&device))).await;
    let dispatcher = HttpDispatcher::on_current_runtime(Arc::new(client_for(&host)));

    dispatcher.submit(LedCommand::On);
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(device.lamp_state().await, LampState::On);

    dispatcher.submit(LedCommand::Off);
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(device.lamp_state().await, LampState::Off);

    let counts = dispatcher.counts();
    assert_eq!(counts.submitted, 2);
    assert_eq!(counts.succeeded, 2);
    assert_eq!(counts.failed, 0);
    assert_eq!(device.received().await, vec![LedCommand::On, LedCommand::Off]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_does_not_wait_for_slow_device() {
    let router = Router::new().route(
        "/led/on",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let host = serve(router).await;
    let client = DeviceClient::new(&host, Duration::from_millis(300), Duration::from_secs(3)).unwrap();
    let dispatcher = HttpDispatcher::on_current_runtime(Arc::new(client));

    let started = std::time::Instant::now();
    dispatcher.submit(LedCommand::On);
    assert!(started.elapsed() < Duration::from_millis(100));

    // Timeout fires, failure is counted, nothing propagates
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(dispatcher.counts().failed, 1);
}
