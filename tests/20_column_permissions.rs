mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn standard_user_cannot_write_admin_columns() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let user = ctx.create_user(false).await?;

    let res = ctx
        .client
        .post(ctx.server.url("/api/data-sources"))
        .bearer_auth(&user.token)
        .json(&json!({
            "entry_data": {
                "name": "Arrest logs",
                "approval_status": "approved"
            }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = res.json::<Value>().await?;
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("approval_status"), "message: {}", message);
    assert!(!message.contains("name"), "writable column reported: {}", message);
    Ok(())
}

#[tokio::test]
async fn admin_reads_more_columns_than_standard() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let admin = ctx.create_user(true).await?;
    let standard = ctx.create_user(false).await?;

    let res = ctx
        .client
        .post(ctx.server.url("/api/data-sources"))
        .bearer_auth(&admin.token)
        .json(&json!({
            "entry_data": {
                "name": "Use of force reports",
                "approval_status": "approved",
                "rejection_note": "n/a"
            }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let id = res.json::<Value>().await?["id"].as_i64().expect("id");

    let mut column_counts = Vec::new();
    for token in [&admin.token, &standard.token] {
        let res = ctx
            .client
            .get(ctx.server.url(&format!("/api/data-sources/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.json::<Value>().await?;
        let data = body["data"].as_object().expect("data object");
        column_counts.push(data.len());
        if token == &standard.token {
            assert!(!data.contains_key("rejection_note"));
            assert_eq!(data["approval_status"], "approved");
        } else {
            assert_eq!(data["rejection_note"], "n/a");
        }
    }
    assert!(column_counts[0] > column_counts[1], "counts: {:?}", column_counts);
    Ok(())
}

#[tokio::test]
async fn permissions_endpoint_reports_role_columns() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let standard = ctx.create_user(false).await?;

    let res = ctx
        .client
        .get(ctx.server.url("/api/permissions/agencies"))
        .bearer_auth(&standard.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["role"], "STANDARD");
    assert!(body["write"].as_array().expect("write list").is_empty());
    assert!(body["read"].as_array().expect("read list").contains(&json!("name")));
    Ok(())
}

#[tokio::test]
async fn unknown_filter_column_is_rejected() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let standard = ctx.create_user(false).await?;

    let res = ctx
        .client
        .get(ctx.server.url("/api/agencies?rejection_reason=spam"))
        .bearer_auth(&standard.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
