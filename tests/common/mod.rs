#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use data_catalog_api::auth::{generate_jwt_with_secret, Claims};
use reqwest::StatusCode;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
/// Row cap the spawned server applies to `limit`.
pub const TEST_MAX_LIMIT: i64 = 3;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/data-catalog-api");
        cmd.arg("serve")
            .env("CATALOG_API_PORT", port.to_string())
            .env("JWT_SECRET_KEY", TEST_JWT_SECRET)
            .env("CATALOG_PERMISSION_SOURCE", "static")
            .env("PAGINATION_MAX_LIMIT", TEST_MAX_LIMIT.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // DATABASE_URL is inherited from the test environment
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Everything a scenario needs: the running server, a pool on the same
/// database for seeding, and an HTTP client.
pub struct TestContext {
    pub server: &'static TestServer,
    pub pool: PgPool,
    pub client: reqwest::Client,
}

/// A seeded user and a bearer token for them.
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Start the server once per test binary. Returns `None` when no database
/// is configured or the schema has not been applied, so the suite can run
/// on machines without Postgres.
pub async fn setup() -> Result<Option<TestContext>> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    let schema_ready: bool = sqlx::query_scalar("SELECT to_regclass('public.data_sources') IS NOT NULL")
        .fetch_one(&pool)
        .await?;
    if !schema_ready {
        eprintln!("sql/schema.sql has not been applied; skipping integration test");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;

    Ok(Some(TestContext {
        server,
        pool,
        client: reqwest::Client::new(),
    }))
}

impl TestContext {
    /// Create a data source as `user` and return its id.
    pub async fn create_data_source(&self, user: &TestUser, entry_data: serde_json::Value) -> Result<i64> {
        let res = self
            .client
            .post(self.server.url("/api/data-sources"))
            .bearer_auth(&user.token)
            .json(&serde_json::json!({ "entry_data": entry_data }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "create failed with {}", res.status());
        let body = res.json::<serde_json::Value>().await?;
        body["id"].as_i64().context("response without id")
    }

    /// Insert a fresh user. `admin` grants the `db_write` permission.
    pub async fn create_user(&self, admin: bool) -> Result<TestUser> {
        let email = format!("test-{}@example.com", uuid::Uuid::new_v4().simple());
        let id: i32 = sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
            .bind(&email)
            .fetch_one(&self.pool)
            .await?;

        if admin {
            sqlx::query(
                "INSERT INTO user_permissions (user_id, permission_id) \
                 SELECT $1, permission_id FROM permissions WHERE permission_name = 'db_write'",
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
        }

        let id = i64::from(id);
        let token = generate_jwt_with_secret(&Claims::new(email.clone(), id), TEST_JWT_SECRET)?;
        Ok(TestUser { id, email, token })
    }
}
