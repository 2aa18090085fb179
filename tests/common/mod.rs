use std::env;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use hrtrack::auth::jwt::JwtService;
use hrtrack::auth::password;
use hrtrack::clock::Clock;
use hrtrack::config::AppConfig;
use hrtrack::db::{self, PgPool};
use hrtrack::geo::ReverseGeocoder;
use hrtrack::models::{Job, NewEmployee};
use hrtrack::routes;
use hrtrack::state::AppState;
use hrtrack::tracking::{OfficeHours, Tracker};
use once_cell::sync::Lazy;
use serde::Serialize;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

pub const ADMIN_EMAIL: &str = "hr@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Deterministic time source; every policy decision in the app goes through
/// this in tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    #[allow(dead_code)]
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }

    #[allow(dead_code)]
    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.now.lock().expect("clock lock poisoned");
        *guard = *guard + duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Local office time helper; the app's window is 10:30-18:30 Kolkata.
#[allow(dead_code)]
pub fn kolkata(hour: u32, minute: u32) -> DateTime<Utc> {
    Kolkata
        .with_ymd_and_hms(2026, 3, 9, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

#[derive(Default)]
pub struct FakeGeocoder {
    /// `None` simulates a geocoder outage, which must fall back to the
    /// coordinate string.
    pub address: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<String> {
        self.address
            .clone()
            .ok_or_else(|| anyhow!("geocoder unavailable"))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_geocoder(FakeGeocoder {
            address: Some("MG Road, Gurugram, Haryana".to_string()),
        })
        .await
    }

    pub async fn with_geocoder(geocoder: FakeGeocoder) -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_expiry_days: 30,
            refresh_cookie_secure: false,
            refresh_cookie_domain: None,
            cors_allowed_origin: None,
            admin_email: ADMIN_EMAIL.to_string(),
            admin_password_hash: password::hash_password(ADMIN_PASSWORD)?,
            office_timezone: "Asia/Kolkata".parse::<Tz>().expect("valid timezone"),
            office_start_minutes: 630,
            office_end_minutes: 1110,
            gate_poll_seconds: 60,
            sample_interval_seconds: 30,
            history_retention_days: 10,
            sweep_defer_seconds: 5,
            fallback_lat: 28.4595,
            fallback_lon: 77.0266,
            fallback_address: "Head Office, Sector 51, Gurugram, Haryana (Demo Location)"
                .to_string(),
            geocoder_endpoint: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        // Tests start mid-morning inside office hours unless they move it.
        let clock = Arc::new(ManualClock::starting_at(kolkata(11, 0)));
        let jwt = JwtService::from_config(&config)?;
        let tracker = Arc::new(Tracker::new(OfficeHours::from_config(&config)));
        let state = AppState::new(
            pool,
            config,
            jwt,
            clock.clone(),
            Arc::new(geocoder),
            tracker,
        );
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            clock,
            router,
        })
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    pub async fn insert_employee(
        &self,
        name: &str,
        code: &str,
        mobile: &str,
        password_input: &str,
    ) -> Result<Uuid> {
        let name = name.to_string();
        let code = code.to_string();
        let mobile = mobile.to_string();
        let password_input = password_input.to_string();
        self.with_conn(move |conn| {
            let employee = NewEmployee {
                id: Uuid::new_v4(),
                name,
                code,
                mobile,
                password_hash: password::hash_password(&password_input)?,
                designation: "Field Executive".to_string(),
                department: "Operations".to_string(),
                active: true,
                profile_image: None,
            };
            diesel::insert_into(hrtrack::schema::employees::table)
                .values(&employee)
                .execute(conn)
                .context("failed to insert employee")?;
            Ok(employee.id)
        })
        .await
    }

    pub async fn login_token(&self, identifier: &str, password_input: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            identifier: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload {
                    identifier,
                    password: password_input,
                },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login_token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    #[allow(dead_code)]
    pub async fn jobs_by_type(&self, ty: &str) -> Result<Vec<Job>> {
        let ty = ty.to_string();
        self.with_conn(move |conn| {
            use hrtrack::schema::jobs::dsl::{job_type as job_type_col, jobs as jobs_table};
            let rows = jobs_table
                .filter(job_type_col.eq(&ty))
                .load::<Job>(conn)
                .context("failed to load jobs")?;
            Ok(rows)
        })
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::PATCH)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

#[allow(dead_code)]
pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE jobs, refresh_tokens, holidays, salary_slips, notifications, \
         leave_balances, leave_approvers, leaves, location_history, employee_locations, \
         employees RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
