mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn get(ctx: &common::TestContext, token: &str, path: &str) -> Result<(StatusCode, Value)> {
    let res = ctx.client.get(ctx.server.url(path)).bearer_auth(token).send().await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn admin_list_has_more_columns_than_standard_list() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let admin = ctx.create_user(true).await?;
    let standard = ctx.create_user(false).await?;
    ctx.create_data_source(&admin, json!({ "name": "Dispatch audio", "approval_status": "approved" }))
        .await?;

    let (status, admin_body) = get(&ctx, &admin.token, "/api/data-sources?limit=1").await?;
    assert_eq!(status, StatusCode::OK);
    let (status, standard_body) = get(&ctx, &standard.token, "/api/data-sources?limit=1").await?;
    assert_eq!(status, StatusCode::OK);

    let admin_row = admin_body["data"][0].as_object().expect("admin row");
    let standard_row = standard_body["data"][0].as_object().expect("standard row");
    assert!(admin_row.len() > standard_row.len(), "{} vs {}", admin_row.len(), standard_row.len());
    assert!(admin_row.contains_key("submitter_contact_info"));
    assert!(!standard_row.contains_key("submitter_contact_info"));
    assert_eq!(admin_body["metadata"]["count"], 1);
    Ok(())
}

#[tokio::test]
async fn get_by_id_is_idempotent() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let admin = ctx.create_user(true).await?;
    let id = ctx
        .create_data_source(&admin, json!({ "name": "Court calendars", "tags": ["courts", "schedules"] }))
        .await?;

    let path = format!("/api/data-sources/{}", id);
    let (_, first) = get(&ctx, &admin.token, &path).await?;
    let (_, second) = get(&ctx, &admin.token, &path).await?;
    assert_eq!(first, second);
    assert_eq!(first["data"]["tags"], json!(["courts", "schedules"]));
    Ok(())
}

#[tokio::test]
async fn invalid_page_and_limit_are_rejected() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let user = ctx.create_user(false).await?;

    for query in ["page=0", "page=-2", "limit=0", "limit=-5", "page=two"] {
        let (status, body) = get(&ctx, &user.token, &format!("/api/data-sources?{}", query)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", query, body);
    }
    Ok(())
}

#[tokio::test]
async fn limit_is_capped_and_pages_do_not_overlap() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let admin = ctx.create_user(true).await?;
    for n in 0..(common::TEST_MAX_LIMIT * 2) {
        ctx.create_data_source(&admin, json!({ "name": format!("Stops {}", n) })).await?;
    }

    let (status, body) = get(&ctx, &admin.token, "/api/data-sources?limit=500").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["count"], common::TEST_MAX_LIMIT);

    let (_, first) = get(&ctx, &admin.token, "/api/data-sources?limit=2&page=1").await?;
    let (_, second) = get(&ctx, &admin.token, "/api/data-sources?limit=2&page=2").await?;
    let (first, second) = (ids(&first), ids(&second));
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert!(first.windows(2).all(|w| w[0] < w[1]), "{:?}", first);
    assert!(first[1] < second[0], "{:?} then {:?}", first, second);
    Ok(())
}

#[tokio::test]
async fn wrongly_typed_values_are_client_errors() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let admin = ctx.create_user(true).await?;

    for (field, value) in [
        ("coverage_start", json!(5)),
        ("agency_supplied", json!(1)),
        ("approval_status", json!(true)),
    ] {
        let res = ctx
            .client
            .post(ctx.server.url("/api/data-sources"))
            .bearer_auth(&admin.token)
            .json(&json!({ "entry_data": { "name": "Jail rosters", field: value } }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{} = {}", field, value);
        let body = res.json::<Value>().await?;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"][field].is_string(), "{}", body);
    }

    let res = ctx
        .client
        .post(ctx.server.url("/api/data-sources"))
        .bearer_auth(&admin.token)
        .json(&json!({ "entry_data": { "name": "Jail rosters", "approval_status": "sideways" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
