use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    auth::jwt::JwtService,
    clock::Clock,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
    geo::ReverseGeocoder,
    tracking::Tracker,
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub clock: Arc<dyn Clock>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub tracker: Arc<Tracker>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        jwt: JwtService,
        clock: Arc<dyn Clock>,
        geocoder: Arc<dyn ReverseGeocoder>,
        tracker: Arc<Tracker>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            clock,
            geocoder,
            tracker,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
