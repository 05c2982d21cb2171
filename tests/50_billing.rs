mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};

use penpals_api::database::Store;
use penpals_api::services::billing::{signature_header, CheckoutMode, PlanType};

use common::{spawn_app, TestApp, WEBHOOK_SECRET};

fn completed_checkout(event_id: &str, parent_id: i64, plan: &str) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_1",
                "metadata": { "parent_id": parent_id.to_string(), "plan_type": plan }
            }
        }
    })
}

async fn deliver(app: &TestApp, payload: &Value, signature: Option<String>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    app.send(builder.body(Body::from(payload.to_string()))?).await
}

fn sign(payload: &Value) -> String {
    signature_header(payload.to_string().as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp())
        .expect("signing should succeed")
}

#[tokio::test]
async fn checkout_builds_provider_request() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let (status, body) = app
        .post(
            "/api/subscriptions/create-checkout",
            Some(&family.parent_token),
            json!({ "planType": "monthly", "addons": ["video", "unicorn", "nicelist"] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
    assert_eq!(body["data"]["sessionId"], "cs_test_1");
    assert_eq!(body["data"]["url"], "https://checkout.test/cs_test_1");

    let recorded = app.payments.recorded();
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    assert_eq!(request.plan, PlanType::Monthly);
    assert_eq!(request.mode, CheckoutMode::Subscription);
    assert_eq!(request.parent_id as i64, family.parent_id);
    assert_eq!(request.customer_email.as_deref(), Some("pat@example.com"));
    assert_eq!(request.success_url, "https://penpals.test/success?session_id={CHECKOUT_SESSION_ID}");
    assert_eq!(request.cancel_url, "https://penpals.test/cancel");

    let items: Vec<_> = request.line_items.iter().map(|i| (i.name, i.unit_amount)).collect();
    assert_eq!(
        items,
        vec![("Monthly Magic", 999), ("Personalized Video", 1499), ("Nice List Certificate", 499)]
    );
    Ok(())
}

#[tokio::test]
async fn one_time_plan_uses_payment_mode() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let (status, _) = app
        .post("/api/subscriptions/create-checkout", Some(&family.parent_token), json!({ "planType": "forever" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let recorded = app.payments.recorded();
    assert_eq!(recorded[0].mode, CheckoutMode::Payment);
    assert_eq!(recorded[0].line_items.len(), 1);
    assert_eq!(recorded[0].line_items[0].unit_amount, 19999);
    Ok(())
}

#[tokio::test]
async fn unknown_plan_never_reaches_provider() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let (status, _) = app
        .post("/api/subscriptions/create-checkout", Some(&family.parent_token), json!({ "planType": "weekly" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/subscriptions/create-checkout", Some(&family.kid_token), json!({ "planType": "monthly" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(app.payments.recorded().is_empty());
    Ok(())
}

#[tokio::test]
async fn signed_completion_activates_subscription() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let payload = completed_checkout("evt_1", family.parent_id, "yearly");
    let (status, body) = deliver(&app, &payload, Some(sign(&payload))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["received"], true);

    let parent = app.store.find_parent(family.parent_id as i32).await?.unwrap();
    assert_eq!(parent.subscription_status.as_deref(), Some("active"));
    assert_eq!(parent.subscription_plan.as_deref(), Some("yearly"));
    assert!(parent.subscription_date.is_some());
    Ok(())
}

#[tokio::test]
async fn replayed_event_stays_idempotent() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;
    let payload = completed_checkout("evt_replay", family.parent_id, "monthly");

    for _ in 0..2 {
        let (status, _) = deliver(&app, &payload, Some(sign(&payload))).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let parent = app.store.find_parent(family.parent_id as i32).await?.unwrap();
    assert_eq!(parent.subscription_status.as_deref(), Some("active"));
    assert_eq!(parent.subscription_plan.as_deref(), Some("monthly"));
    Ok(())
}

#[tokio::test]
async fn bad_signature_changes_nothing() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;
    let payload = completed_checkout("evt_forged", family.parent_id, "forever");

    let forged = signature_header(payload.to_string().as_bytes(), "whsec_wrong", chrono::Utc::now().timestamp())?;
    let (status, body) = deliver(&app, &payload, Some(forged)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Webhook Error:"));

    let (status, _) = deliver(&app, &payload, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = signature_header(
        payload.to_string().as_bytes(),
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp() - 3600,
    )?;
    let (status, _) = deliver(&app, &payload, Some(stale)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let parent = app.store.find_parent(family.parent_id as i32).await?.unwrap();
    assert!(parent.subscription_status.is_none(), "forged events must not activate");
    Ok(())
}

#[tokio::test]
async fn other_events_are_acknowledged() -> Result<()> {
    let app = spawn_app().await;
    let payload = json!({
        "id": "evt_other",
        "type": "invoice.paid",
        "data": { "object": { "id": "in_1" } }
    });

    let (status, body) = deliver(&app, &payload, Some(sign(&payload))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["received"], true);
    Ok(())
}
