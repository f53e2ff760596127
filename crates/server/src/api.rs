//! JSON API for the vehicle catalog and bookings.
//!
//! - `GET  /api/v1/vehicles?available=true`  list the catalog
//! - `GET  /api/v1/vehicles/featured?limit=3`  first vehicles for the home page
//! - `GET  /api/v1/vehicles/{id}`            vehicle detail
//! - `POST /api/v1/vehicles/{id}/bookings`   book a vehicle (bearer session required)
//! - `GET  /api/v1/bookings`                 bookings of the signed-in user

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rental_core::config::BookingConfig;
use rental_core::domain::booking::Booking;
use rental_core::domain::user::SessionToken;
use rental_core::domain::vehicle::{Vehicle, VehicleId};
use rental_core::{
    ApplicationError, BookingAttempt, BookingFlow, BookingFlowError, BookingRequestBuilder,
    Catalog, CatalogProvider, Clock, CollaboratorError, InterfaceError, RejectionReason,
    SessionResolver,
};
use rental_db::repositories::{
    BookingRepository, SqlBookingRepository, SqlSessionRepository, SqlVehicleRepository,
};
use rental_db::{CatalogAdapter, DbPool, SessionAdapter, SubmissionAdapter};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

type SqlBookingFlow = BookingFlow<
    CatalogAdapter<SqlVehicleRepository>,
    SessionAdapter<SqlSessionRepository>,
    SubmissionAdapter<SqlBookingRepository>,
>;

#[derive(Clone)]
pub struct ApiState {
    db_pool: DbPool,
    clock: Arc<dyn Clock>,
    booking: BookingConfig,
}

impl ApiState {
    pub fn new(db_pool: DbPool, clock: Arc<dyn Clock>, booking: BookingConfig) -> Self {
        Self { db_pool, clock, booking }
    }

    fn catalog(&self) -> CatalogAdapter<SqlVehicleRepository> {
        CatalogAdapter::new(SqlVehicleRepository::new(self.db_pool.clone()))
    }

    fn sessions(&self) -> SessionAdapter<SqlSessionRepository> {
        SessionAdapter::new(SqlSessionRepository::new(self.db_pool.clone()), self.clock.clone())
    }

    /// A flow bound to today's date, so the past-start check follows the clock.
    fn booking_flow(&self) -> SqlBookingFlow {
        BookingFlow::new(
            self.catalog(),
            self.sessions(),
            SubmissionAdapter::new(
                SqlBookingRepository::new(self.db_pool.clone()),
                self.clock.clone(),
            ),
            BookingRequestBuilder::new(self.clock.today())
                .with_max_rental_days(self.booking.max_rental_days),
        )
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/vehicles", get(list_vehicles))
        .route("/api/v1/vehicles/featured", get(featured_vehicles))
        .route("/api/v1/vehicles/{id}", get(vehicle_detail))
        .route("/api/v1/vehicles/{id}/bookings", post(create_booking))
        .route("/api/v1/bookings", get(list_bookings))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_vehicles(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<Vec<Vehicle>>, ApiFailure> {
    let correlation_id = correlation_id(&headers);
    let catalog = load_catalog(&state, &correlation_id).await?;

    let vehicles = match query.available {
        Some(wanted) => catalog
            .all()
            .iter()
            .filter(|vehicle| vehicle.is_available() == wanted)
            .cloned()
            .collect(),
        None => catalog.into_vehicles(),
    };

    Ok(Json(vehicles))
}

async fn featured_vehicles(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<Vehicle>>, ApiFailure> {
    let correlation_id = correlation_id(&headers);
    let catalog = load_catalog(&state, &correlation_id).await?;
    let limit = query.limit.unwrap_or(state.booking.featured_limit);

    Ok(Json(catalog.featured(limit).to_vec()))
}

async fn vehicle_detail(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vehicle>, ApiFailure> {
    let correlation_id = correlation_id(&headers);
    let vehicle_id = VehicleId(vehicle_id);

    let vehicle = state
        .catalog()
        .fetch_vehicle(&vehicle_id)
        .await
        .map_err(|e| collaborator_failure(e, &correlation_id))?;

    match vehicle {
        Some(vehicle) => Ok(Json(vehicle)),
        None => Err(failure(
            ApplicationError::NotFound(format!("vehicle `{vehicle_id}`"))
                .into_interface(correlation_id),
        )),
    }
}

async fn create_booking(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiFailure> {
    let correlation_id = correlation_id(&headers);
    let token = bearer_token(&headers);
    let vehicle_id = VehicleId(vehicle_id);

    let submitted = state
        .booking_flow()
        .submit(BookingAttempt {
            correlation_id: &correlation_id,
            token: token.as_ref(),
            vehicle_id: &vehicle_id,
            start_date: &body.start_date,
            end_date: &body.end_date,
        })
        .await
        .map_err(|e| flow_failure(e, &correlation_id))?;

    let booking = SqlBookingRepository::new(state.db_pool.clone())
        .find_by_id(&submitted.id)
        .await
        .map_err(|e| collaborator_failure(e.into(), &correlation_id))?;

    match booking {
        Some(booking) => {
            info!(
                event_name = "api.booking.created",
                correlation_id = %correlation_id,
                booking_id = %booking.id,
                vehicle_id = %vehicle_id,
                "booking created"
            );
            Ok((StatusCode::CREATED, Json(booking)))
        }
        None => Err(failure(
            ApplicationError::Persistence(format!("booking `{}` was not persisted", submitted.id))
                .into_interface(correlation_id),
        )),
    }
}

async fn list_bookings(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, ApiFailure> {
    let correlation_id = correlation_id(&headers);
    let not_authenticated =
        || flow_failure(RejectionReason::NotAuthenticated.into(), &correlation_id);

    let Some(token) = bearer_token(&headers) else {
        return Err(not_authenticated());
    };
    let Some(user_id) = state
        .sessions()
        .current_user(&token)
        .await
        .map_err(|e| collaborator_failure(e, &correlation_id))?
    else {
        return Err(not_authenticated());
    };

    let bookings = SqlBookingRepository::new(state.db_pool.clone())
        .list_for_user(&user_id)
        .await
        .map_err(|e| collaborator_failure(e.into(), &correlation_id))?;

    Ok(Json(bookings))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_catalog(state: &ApiState, correlation_id: &str) -> Result<Catalog, ApiFailure> {
    let vehicles = state
        .catalog()
        .list_vehicles()
        .await
        .map_err(|e| collaborator_failure(e, correlation_id))?;
    Ok(Catalog::new(vehicles))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req-{}", Uuid::new_v4().simple()))
}

fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(SessionToken::from_bearer_header)
}

fn failure(error: InterfaceError) -> ApiFailure {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(ApiError {
            error: error.kind().to_string(),
            message: error.user_message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

/// Rejections carry their own wording, which is more useful to the user than
/// the generic message of their interface category.
fn flow_failure(error: BookingFlowError, correlation_id: &str) -> ApiFailure {
    let rejection = match &error {
        BookingFlowError::Rejected(reason) => Some(*reason),
        _ => None,
    };

    let (status, Json(mut body)) =
        failure(ApplicationError::from(error).into_interface(correlation_id));
    if let Some(reason) = rejection {
        body.error = reason.kind().to_string();
        body.message = reason.user_message();
    }

    (status, Json(body))
}

fn collaborator_failure(error: CollaboratorError, correlation_id: &str) -> ApiFailure {
    error!(
        event_name = "api.collaborator.failed",
        correlation_id = %correlation_id,
        error = %error,
        "storage lookup failed"
    );
    failure(ApplicationError::Persistence(error.0).into_interface(correlation_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::{Path, Query, State},
        http::{header, HeaderMap, HeaderValue, Request, StatusCode},
        Json,
    };
    use chrono::NaiveDate;
    use rental_core::booking::FixedClock;
    use rental_core::config::BookingConfig;
    use rental_core::domain::booking::BookingStatus;
    use rental_core::domain::user::UserId;
    use rental_core::domain::vehicle::{Vehicle, VehicleRecord};
    use rental_db::repositories::{
        issue_session, SqlSessionRepository, SqlVehicleRepository, VehicleRepository,
    };
    use rental_db::{connect_with_settings, migrations, DbPool};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date")
    }

    async fn setup() -> (DbPool, String) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let vehicles = SqlVehicleRepository::new(pool.clone());
        for (id, name, price, available) in [
            ("veh-a", "Audi", Decimal::new(100, 0), true),
            ("veh-b", "BMW", Decimal::new(50, 0), true),
            ("veh-c", "Citroen", Decimal::new(40, 0), false),
            ("veh-d", "Dacia", Decimal::new(30, 0), true),
        ] {
            let vehicle = Vehicle::try_from(VehicleRecord {
                id: id.to_string(),
                name: name.to_string(),
                model: "Base".to_string(),
                year: 2024,
                price_per_day: price,
                available,
                description: String::new(),
                features: Vec::new(),
                image_url: String::new(),
            })
            .expect("valid vehicle");
            vehicles.save(vehicle).await.expect("seed vehicle");
        }

        let issued = issue_session(
            &SqlSessionRepository::new(pool.clone()),
            UserId("user-1".to_string()),
            24,
            FixedClock::on(today()).0,
        )
        .await
        .expect("issue session");

        (pool, issued.token.expose().to_string())
    }

    fn api_state(pool: DbPool) -> ApiState {
        ApiState::new(
            pool,
            Arc::new(FixedClock::on(today())),
            BookingConfig { max_rental_days: 90, featured_limit: 3 },
        )
    }

    fn auth_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers.insert(CORRELATION_HEADER, HeaderValue::from_static("req-test"));
        headers
    }

    fn booking_body(start: &str, end: &str) -> Json<CreateBookingRequest> {
        Json(CreateBookingRequest { start_date: start.to_string(), end_date: end.to_string() })
    }

    #[tokio::test]
    async fn list_vehicles_filters_on_availability() {
        let (pool, _) = setup().await;

        let Json(all) = list_vehicles(
            State(api_state(pool.clone())),
            HeaderMap::new(),
            Query(VehicleListQuery::default()),
        )
        .await
        .expect("list all");
        let Json(available) = list_vehicles(
            State(api_state(pool.clone())),
            HeaderMap::new(),
            Query(VehicleListQuery { available: Some(true) }),
        )
        .await
        .expect("list available");

        assert_eq!(all.len(), 4);
        assert_eq!(available.len(), 3);
        assert!(available.iter().all(Vehicle::is_available));
        pool.close().await;
    }

    #[tokio::test]
    async fn featured_defaults_to_configured_limit() {
        let (pool, _) = setup().await;

        let Json(featured) = featured_vehicles(
            State(api_state(pool.clone())),
            HeaderMap::new(),
            Query(FeaturedQuery::default()),
        )
        .await
        .expect("featured");
        let Json(two) = featured_vehicles(
            State(api_state(pool.clone())),
            HeaderMap::new(),
            Query(FeaturedQuery { limit: Some(2) }),
        )
        .await
        .expect("featured two");

        let names: Vec<&str> = featured.iter().map(Vehicle::name).collect();
        assert_eq!(names, vec!["Audi", "BMW", "Citroen"]);
        assert_eq!(two.len(), 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn vehicle_detail_returns_not_found_for_unknown_id() {
        let (pool, _) = setup().await;

        let result = vehicle_detail(
            State(api_state(pool.clone())),
            Path("veh-zzz".to_string()),
            auth_headers("ignored"),
        )
        .await;

        let (status, Json(body)) = result.expect_err("should be missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "not_found");
        assert_eq!(body.correlation_id, "req-test");
        pool.close().await;
    }

    #[tokio::test]
    async fn create_booking_prices_whole_days() {
        let (pool, token) = setup().await;

        let (status, Json(booking)) = create_booking(
            State(api_state(pool.clone())),
            Path("veh-a".to_string()),
            auth_headers(&token),
            booking_body("2030-01-01", "2030-01-04"),
        )
        .await
        .expect("booking accepted");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking.rental_days, 3);
        assert_eq!(booking.total_price, Decimal::new(300, 0));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.user_id, UserId("user-1".to_string()));
        pool.close().await;
    }

    #[tokio::test]
    async fn create_booking_maps_rejections_to_statuses() {
        let (pool, token) = setup().await;
        let cases = [
            ("veh-b", "2030-01-01", "2030-01-01", StatusCode::UNPROCESSABLE_ENTITY),
            ("veh-c", "2030-01-01", "2030-01-05", StatusCode::CONFLICT),
            ("veh-zzz", "2030-01-01", "2030-01-05", StatusCode::NOT_FOUND),
        ];

        for (vehicle_id, start, end, expected) in cases {
            let (status, Json(body)) = create_booking(
                State(api_state(pool.clone())),
                Path(vehicle_id.to_string()),
                auth_headers(&token),
                booking_body(start, end),
            )
            .await
            .expect_err("booking should be rejected");

            assert_eq!(status, expected, "vehicle {vehicle_id}: {body:?}");
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM booking")
            .fetch_one(&pool)
            .await
            .expect("count bookings");
        assert_eq!(count, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn create_booking_without_session_is_unauthorized() {
        let (pool, _) = setup().await;

        let (status, Json(body)) = create_booking(
            State(api_state(pool.clone())),
            Path("veh-a".to_string()),
            HeaderMap::new(),
            booking_body("garbage", "also garbage"),
        )
        .await
        .expect_err("anonymous booking should fail");

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "not_authenticated");
        assert_eq!(body.message, "Please log in to book a vehicle.");
        assert!(body.correlation_id.starts_with("req-"));
        pool.close().await;
    }

    #[tokio::test]
    async fn bookings_dashboard_lists_only_the_callers_bookings() {
        let (pool, token) = setup().await;
        create_booking(
            State(api_state(pool.clone())),
            Path("veh-b".to_string()),
            auth_headers(&token),
            booking_body("2030-02-01", "2030-02-03"),
        )
        .await
        .expect("booking accepted");

        let Json(mine) = list_bookings(State(api_state(pool.clone())), auth_headers(&token))
            .await
            .expect("list bookings");
        let anonymous = list_bookings(State(api_state(pool.clone())), HeaderMap::new()).await;

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].total_price, Decimal::new(100, 0));
        assert_eq!(anonymous.expect_err("needs session").0, StatusCode::UNAUTHORIZED);
        pool.close().await;
    }

    #[tokio::test]
    async fn router_serves_booking_round_trip_over_http() {
        let (pool, token) = setup().await;
        let app = router(api_state(pool.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/vehicles/veh-d/bookings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from(r#"{"start_date":"2030-01-02","end_date":"2030-01-04"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(payload["rental_days"], 2);
        assert_eq!(payload["total_price"], "60");
        assert_eq!(payload["status"], "pending");
        pool.close().await;
    }

    #[tokio::test]
    async fn featured_route_is_not_shadowed_by_vehicle_detail() {
        let (pool, _) = setup().await;

        let response = router(api_state(pool.clone()))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/vehicles/featured?limit=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
        pool.close().await;
    }

    async fn post_booking(
        pool: &DbPool,
        token: &str,
        vehicle_id: &str,
        body: &'static str,
    ) -> (StatusCode, serde_json::Value) {
        let response = router(api_state(pool.clone()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/vehicles/{vehicle_id}/bookings"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(CORRELATION_HEADER, "req-http")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn failed_insert_is_reported_as_bad_gateway() {
        let (pool, token) = setup().await;
        sqlx::query("DROP TABLE booking").execute(&pool).await.expect("drop booking table");

        let (status, payload) = post_booking(
            &pool,
            &token,
            "veh-a",
            r#"{"start_date":"2030-01-02","end_date":"2030-01-04"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(payload["error"], "submission_failed");
        assert_eq!(payload["message"], "Failed to create booking.");
        assert_eq!(payload["correlation_id"], "req-http");
        pool.close().await;
    }

    #[tokio::test]
    async fn unreadable_session_store_is_reported_as_service_unavailable() {
        let (pool, token) = setup().await;
        sqlx::query("DROP TABLE user_session").execute(&pool).await.expect("drop session table");

        let (status, payload) = post_booking(
            &pool,
            &token,
            "veh-a",
            r#"{"start_date":"2030-01-02","end_date":"2030-01-04"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["error"], "service_unavailable");
        pool.close().await;
    }

    #[tokio::test]
    async fn time_of_day_dates_are_unprocessable() {
        let (pool, token) = setup().await;

        let (status, payload) = post_booking(
            &pool,
            &token,
            "veh-a",
            r#"{"start_date":"2030-01-01T08:00","end_date":"2030-01-01T12:00"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(payload["error"], "invalid_date_range");
        assert_eq!(payload["message"], "Dates must be calendar dates (YYYY-MM-DD)");
        pool.close().await;
    }
}
