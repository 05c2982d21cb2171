mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{spawn_app, spawn_app_with, test_config, CannedCompletion};

#[tokio::test]
async fn parent_sees_letters_from_all_their_kids() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;
    let (sibling_token, _) = app.register_kid(&family.parent_code, "alex").await?;
    let stranger = app.family("other@example.com", "max").await?;

    for token in [&family.kid_token, &sibling_token, &stranger.kid_token] {
        app.select_elf(token, 1).await?;
    }
    app.send_letter(&family.kid_token, "from sam").await?;
    app.send_letter(&sibling_token, "from alex").await?;
    app.send_letter(&stranger.kid_token, "from max").await?;

    let (status, body) = app.get("/api/parent/letters", Some(&family.parent_token)).await?;
    assert_eq!(status, StatusCode::OK);
    let letters = body["data"].as_array().unwrap();
    assert_eq!(letters.len(), 2);
    assert_eq!(letters[0]["content"], "from alex", "newest first");
    assert_eq!(letters[0]["kid_name"], "Sam Kid");
    assert_eq!(letters[0]["elf_name"], "Jingle");
    assert!(letters.iter().all(|l| l["content"] != "from max"));

    let (_, body) = app.get("/api/parent/kids", Some(&family.parent_token)).await?;
    let usernames: Vec<_> = body["data"].as_array().unwrap().iter().map(|k| k["username"].clone()).collect();
    assert_eq!(usernames, vec![json!("sam"), json!("alex")]);
    assert!(body["data"][0].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn parent_response_overwrites_reply() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;
    app.select_elf(&family.kid_token, 1).await?;
    let letter = app.send_letter(&family.kid_token, "Hello").await?;
    assert_eq!(letter["responded_by"], "ai");

    let uri = format!("/api/parent/letters/{}/respond", letter["id"]);
    let (status, body) = app
        .post(&uri, Some(&family.parent_token), json!({ "response": "Love, Mom the Elf" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Response sent!");

    let (_, body) = app.get("/api/letters", Some(&family.kid_token)).await?;
    assert_eq!(body["data"][0]["response"], "Love, Mom the Elf");
    assert_eq!(body["data"][0]["responded_by"], "parent");
    Ok(())
}

#[tokio::test]
async fn ownership_is_not_checked_by_default() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;
    let stranger = app.family("other@example.com", "max").await?;
    app.select_elf(&family.kid_token, 1).await?;
    let letter = app.send_letter(&family.kid_token, "Hello").await?;

    let uri = format!("/api/parent/letters/{}/respond", letter["id"]);
    let (status, _) = app
        .post(&uri, Some(&stranger.parent_token), json!({ "response": "Not your parent" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let stored = app.store.letter(letter["id"].as_i64().unwrap() as i32).await.unwrap();
    assert_eq!(stored.response.as_deref(), Some("Not your parent"));
    Ok(())
}

#[tokio::test]
async fn ownership_is_enforced_when_restricted() -> Result<()> {
    let mut config = test_config();
    config.security.restrict_parent_responses = true;
    let app = spawn_app_with(config, Arc::new(CannedCompletion("auto".into()))).await;

    let family = app.family("pat@example.com", "sam").await?;
    let stranger = app.family("other@example.com", "max").await?;
    app.select_elf(&family.kid_token, 1).await?;
    let letter = app.send_letter(&family.kid_token, "Hello").await?;
    let uri = format!("/api/parent/letters/{}/respond", letter["id"]);

    let (status, _) = app
        .post(&uri, Some(&stranger.parent_token), json!({ "response": "Not your parent" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let stored = app.store.letter(letter["id"].as_i64().unwrap() as i32).await.unwrap();
    assert_eq!(stored.response.as_deref(), Some("auto"), "rejected write must not land");

    let (status, _) = app
        .post(&uri, Some(&family.parent_token), json!({ "response": "From home" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/parent/letters/4242/respond", Some(&family.parent_token), json!({ "response": "?" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn responding_to_unknown_letter_is_404() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let (status, body) = app
        .post("/api/parent/letters/4242/respond", Some(&family.parent_token), json!({ "response": "?" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Letter not found");

    let (status, _) = app
        .post("/api/parent/letters/abc/respond", Some(&family.parent_token), json!({ "response": "?" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn settings_reject_unknown_mode() -> Result<()> {
    let app = spawn_app().await;
    let family = app.family("pat@example.com", "sam").await?;

    let (status, _) = app
        .patch("/api/parent/settings", Some(&family.parent_token), json!({ "responseMode": "telepathy" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch("/api/parent/settings", Some(&family.parent_token), json!({ "responseMode": "ai" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Settings updated");
    Ok(())
}
