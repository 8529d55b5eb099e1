// Integration tests for the HTTP control surface
//
// Requests go straight into the router via tower's `oneshot`.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::Value;
use tower::ServiceExt;
use voice_tutor::http::{create_router, AppState};
use voice_tutor::transfer::ResponseMode;

async fn send(router: &Router, method: &str, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())?;
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await?;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, json))
}

async fn router_with(h: Harness) -> (Router, DeviceProbe, TransferProbe) {
    let Harness {
        controller,
        device,
        transfer,
    } = h;
    (create_router(AppState::new(controller)), device, transfer)
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (router, _, _) = router_with(harness(test_config(ResponseMode::Binary))).await;

    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = router.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await?;
    assert_eq!(&body[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_initialize_and_get_session() -> Result<()> {
    let (router, _, _) = router_with(harness(test_config(ResponseMode::Binary))).await;

    let (status, snapshot) = send(&router, "GET", "/session").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "idle");
    assert_eq!(snapshot["language"], "Sinhala");
    assert_eq!(snapshot["grade"], "7");

    let (_, snapshot) = send(&router, "POST", "/session/initialize").await?;
    assert_eq!(snapshot["phase"], "ready");

    Ok(())
}

#[tokio::test]
async fn test_record_and_play_over_http() -> Result<()> {
    let h = ready_harness(test_config(ResponseMode::Binary)).await;
    h.device.script().durations_ms.push_back(65_000);
    h.transfer.push_reply(Scripted::Ok(audio_reply(b"reply")));
    let (router, device, _) = router_with(h).await;

    let (_, snapshot) = send(&router, "POST", "/session/recording/start").await?;
    assert_eq!(snapshot["phase"], "recording");

    let (_, snapshot) = send(&router, "POST", "/session/recording/stop").await?;
    assert_eq!(snapshot["phase"], "ready");
    assert_eq!(snapshot["recordings"][0]["duration"], "1:05");
    assert_eq!(snapshot["response_available"], true);
    assert_eq!(snapshot["response_source"]["kind"], "inline");

    let (_, snapshot) = send(&router, "POST", "/session/recordings/0/toggle").await?;
    assert_eq!(snapshot["phase"], "playing_local");
    assert_eq!(snapshot["playing"]["kind"], "recording");
    assert_eq!(snapshot["playing"]["index"], 0);

    let (_, snapshot) = send(&router, "POST", "/session/response/toggle").await?;
    assert_eq!(snapshot["phase"], "playing_response");
    assert_eq!(snapshot["playing"]["kind"], "response");
    assert_eq!(device.max_concurrent_playbacks(), 1);

    let (_, snapshot) = send(&router, "POST", "/session/playback/stop").await?;
    assert_eq!(snapshot["phase"], "ready");
    assert!(snapshot["playing"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_failures_are_reported_in_snapshot() -> Result<()> {
    let (router, _, _) = router_with(ready_harness(test_config(ResponseMode::Binary)).await).await;

    let (status, snapshot) = send(&router, "POST", "/session/recordings/3/toggle").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "ready");
    assert!(snapshot["last_message"].is_string());

    let (_, snapshot) = send(&router, "POST", "/session/message/dismiss").await?;
    assert!(snapshot["last_message"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_invalid_index_is_bad_request() -> Result<()> {
    let (router, _, _) = router_with(ready_harness(test_config(ResponseMode::Binary)).await).await;

    let (status, _) = send(&router, "POST", "/session/recordings/first/toggle").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
