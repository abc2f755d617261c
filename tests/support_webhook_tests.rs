mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{HOOK_SECRET, TestApp};
use serde_json::{Value, json};

async fn post_hook(t: &TestApp, uri: &str, secret_header: Option<&str>, payload: Value) -> common::Reply {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret_header {
        builder = builder.header("x-support-secret", secret);
    }
    t.send(
        builder
            .body(Body::from(payload.to_string()))
            .expect("failed to build request"),
    )
    .await
}

#[tokio::test]
async fn bad_secret_is_rejected() {
    let t = TestApp::spawn("hook-secret").await;
    let payload = json!({ "email": "fan@example.com", "title": "5 credits" });

    let none = post_hook(&t, "/webhooks/support", None, payload.clone()).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);

    let wrong = post_hook(&t, "/webhooks/support", Some("nope"), payload).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let statuses = t.support_statuses().await;
    assert!(statuses.is_empty());
}

#[tokio::test]
async fn missing_email_is_unprocessable_and_recorded() {
    let t = TestApp::spawn("hook-no-email").await;
    let reply = post_hook(
        &t,
        &format!("/webhooks/support?secret={HOOK_SECRET}"),
        None,
        json!({ "title": "5 credits" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let statuses = t.support_statuses().await;
    assert_eq!(statuses, vec!["ignored_no_email".to_string()]);
}

#[tokio::test]
async fn shop_purchase_credits_account_before_first_sign_in() {
    let t = TestApp::spawn("hook-credit").await;
    let reply = post_hook(
        &t,
        "/webhooks/support",
        Some(HOOK_SECRET),
        json!({ "type": "extra_purchase", "data": { "supporter_email": "Fan@Example.com", "title": "5 Credits", "quantity": 2 } }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["email"], "fan@example.com");
    assert_eq!(body["added_credits"], 10);
    assert_eq!(body["breakdown"]["shop"], 10);

    // the account already exists, so no sign-up credit on top
    let cookie = t.sign_in("fan@example.com").await;
    assert_eq!(t.credits(&cookie).await, 10);

    let statuses = t.support_statuses().await;
    assert_eq!(statuses, vec!["credited".to_string()]);
}

#[tokio::test]
async fn unmatched_payload_is_acknowledged_without_credit() {
    let t = TestApp::spawn("hook-unmatched").await;
    let reply = post_hook(
        &t,
        "/webhooks/support",
        Some(HOOK_SECRET),
        json!({ "email": "fan@example.com", "title": "Sticker pack" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["added_credits"], 0);

    let statuses = t.support_statuses().await;
    assert_eq!(statuses, vec!["ignored_unhandled".to_string()]);
}

#[tokio::test]
async fn oversized_counts_are_rejected_without_credit() {
    let t = TestApp::spawn_with("hook-overflow", |cfg| cfg.credits_per_coffee = 5).await;
    let reply = post_hook(
        &t,
        "/webhooks/support",
        Some(HOOK_SECRET),
        json!({ "email": "greedy@example.com", "support_coffees": 1e19 }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.error_code(), "UNPROCESSABLE");

    let reply = post_hook(
        &t,
        "/webhooks/support",
        Some(HOOK_SECRET),
        json!({ "email": "greedy@example.com", "title": "9223372036854775807 credits", "quantity": 2 }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(
        t.support_statuses().await,
        vec!["rejected_out_of_range".to_string(), "rejected_out_of_range".to_string()]
    );
    let accounts = t
        .count("SELECT COUNT(*) FROM accounts WHERE email = 'greedy@example.com'")
        .await;
    assert_eq!(accounts, 0);
}
