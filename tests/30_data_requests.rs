mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_request(ctx: &common::TestContext, token: &str, title: &str) -> Result<i64> {
    let res = ctx
        .client
        .post(ctx.server.url("/api/data-requests"))
        .bearer_auth(token)
        .json(&json!({
            "entry_data": {
                "title": title,
                "submission_notes": "Looking for dispatch records",
                "request_urgency": "urgent"
            }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Data request created");
    Ok(body["id"].as_i64().expect("id"))
}

#[tokio::test]
async fn created_request_reads_back_for_its_creator() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let creator = ctx.create_user(false).await?;
    let other = ctx.create_user(false).await?;

    let id = create_request(&ctx, &creator.token, "Dispatch logs 2023").await?;

    let res = ctx
        .client
        .get(ctx.server.url(&format!("/api/data-requests/{}", id)))
        .bearer_auth(&creator.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["title"], "Dispatch logs 2023");
    assert_eq!(body["data"]["request_urgency"], "urgent");
    assert_eq!(body["data"]["creator_user_id"], creator.id);

    // The creator column is only visible to the owner
    let res = ctx
        .client
        .get(ctx.server.url(&format!("/api/data-requests/{}", id)))
        .bearer_auth(&other.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert!(body["data"].get("creator_user_id").is_none());
    Ok(())
}

#[tokio::test]
async fn only_the_creator_may_delete_a_request() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let creator = ctx.create_user(false).await?;
    let other = ctx.create_user(false).await?;

    let id = create_request(&ctx, &creator.token, "Body camera policy").await?;
    let url = ctx.server.url(&format!("/api/data-requests/{}", id));

    let res = ctx.client.delete(&url).bearer_auth(&other.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = ctx.client.delete(&url).bearer_auth(&creator.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = ctx.client.get(&url).bearer_auth(&creator.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn creator_may_update_but_not_set_status() -> Result<()> {
    let Some(ctx) = common::setup().await? else { return Ok(()) };
    let creator = ctx.create_user(false).await?;
    let id = create_request(&ctx, &creator.token, "Jail roster").await?;
    let url = ctx.server.url(&format!("/api/data-requests/{}", id));

    let res = ctx
        .client
        .put(&url)
        .bearer_auth(&creator.token)
        .json(&json!({ "entry_data": { "title": "Jail roster, 2020 onward" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = ctx
        .client
        .put(&url)
        .bearer_auth(&creator.token)
        .json(&json!({ "entry_data": { "request_status": "Complete" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = ctx.client.get(&url).bearer_auth(&creator.token).send().await?.json::<Value>().await?;
    assert_eq!(body["data"]["title"], "Jail roster, 2020 onward");
    assert_eq!(body["data"]["request_status"], "Intake");
    Ok(())
}
