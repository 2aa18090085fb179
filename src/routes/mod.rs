use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod admin;
pub mod auth;
pub mod balances;
pub mod employees;
pub mod health;
pub mod holidays;
pub mod leaves;
pub mod locations;
pub mod notifications;
pub mod salary_slips;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let employees_routes = Router::new()
        .route(
            "/",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/import", post(employees::import_employees))
        .route(
            "/:id",
            get(employees::get_employee)
                .patch(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route("/:id/password", post(employees::reset_password));

    let locations_routes = Router::new()
        .route("/fix", post(locations::push_fix))
        .route("/sharing", post(locations::toggle_sharing))
        .route("/session", get(locations::session_status))
        .route("/current", get(locations::all_current_locations))
        .route("/current/:id", get(locations::current_location))
        .route("/history/:id", get(locations::location_history_for));

    let leaves_routes = Router::new()
        .route("/", get(leaves::list_all_leaves).post(leaves::apply_leave))
        .route("/mine", get(leaves::list_my_leaves))
        .route("/:id/approve", post(leaves::approve_leave))
        .route("/:id/reject", post(leaves::reject_leave));

    let balances_routes = Router::new()
        .route("/:id", get(balances::get_balances))
        .route("/:id/:bucket", patch(balances::update_balance));

    let notifications_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/unread-count", get(notifications::unread_count))
        .route("/:id/read", post(notifications::mark_read));

    let salary_slips_routes = Router::new()
        .route("/", get(salary_slips::list_all_slips))
        .route(
            "/employee/:id",
            get(salary_slips::list_slips_for).post(salary_slips::upload_slip),
        )
        .route("/:id/file", get(salary_slips::download_slip))
        .route("/:id", delete(salary_slips::delete_slip));

    let holidays_routes = Router::new()
        .route(
            "/",
            get(holidays::list_holidays).post(holidays::create_holiday),
        )
        .route("/:id", delete(holidays::delete_holiday));

    let admin_routes = Router::new().route("/overview", get(admin::overview));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/employees", employees_routes)
        .nest("/api/locations", locations_routes)
        .nest("/api/leaves", leaves_routes)
        .nest("/api/leave-balances", balances_routes)
        .nest("/api/notifications", notifications_routes)
        .nest("/api/salary-slips", salary_slips_routes)
        .nest("/api/holidays", holidays_routes)
        .nest("/api/admin", admin_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 32))
}
