//! HTTP handler functions for the waterlog map API.

use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, web};
use waterlog_map_analytics::aggregate::{self, AggregationInput};
use waterlog_map_analytics::heatmap;
use waterlog_map_elevation::{ElevationError, TerrainProvider as _};
use waterlog_map_report_models::{Capability, NewReport, ReportPatch};
use waterlog_map_server_models::{
    ApiComment, ApiError, ApiHealth, ApiReport, ApiWard, ApiWardAnalytics, CommentRequest,
    CreateReportRequest, RecomputeParams, RecomputeResponse, ReportGeoJsonParams,
    ReportListResponse, ReportQueryParams, ResolutionImageParams, UpdateReportRequest,
    UpvoteResponse,
};
use waterlog_map_store::{IncidentStore as _, ReportFilter, StoreError};

use crate::AppState;
use crate::auth::{self, AuthError};
use crate::rate_limit::RateAction;
use crate::uploads::{self, UploadError};

/// Maps an authentication failure to its response: credential problems
/// are 401 (the caller must re-authenticate), capability problems 403.
fn auth_error(err: &AuthError) -> HttpResponse {
    match err {
        AuthError::MissingToken | AuthError::InvalidToken => {
            HttpResponse::Unauthorized().json(ApiError::new(err.to_string()))
        }
        AuthError::Forbidden => HttpResponse::Forbidden().json(ApiError::new(err.to_string())),
    }
}

/// Maps a store failure to its response.
fn store_error(err: &StoreError) -> HttpResponse {
    match err {
        StoreError::NotFound { .. } => HttpResponse::NotFound().json(ApiError::new(err.to_string())),
        StoreError::InvalidTransition { .. } => {
            HttpResponse::Conflict().json(ApiError::new(err.to_string()))
        }
    }
}

fn rate_limited() -> HttpResponse {
    HttpResponse::TooManyRequests().json(ApiError::new(
        "Rate limit exceeded. Please try again later.",
    ))
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /analytics/wards`
pub async fn wards(state: web::Data<AppState>) -> HttpResponse {
    let mut wards = state.store.wards().await;
    wards.sort_by_key(|w| w.id);

    let api_wards: Vec<ApiWard> = wards.into_iter().map(ApiWard::from).collect();
    HttpResponse::Ok().json(api_wards)
}

/// `GET /analytics/wards/{id}`
pub async fn ward_analytics(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let ward_id = path.into_inner();

    let ward = match state.store.ward(ward_id).await {
        Ok(ward) => ward,
        Err(e) => return store_error(&e),
    };

    let snapshot = state.store.snapshot().await;
    let analytics = aggregate::ward_analytics(&ward, &snapshot);
    HttpResponse::Ok().json(ApiWardAnalytics::from(analytics))
}

/// `GET /analytics/hotspots`
pub async fn hotspots(state: web::Data<AppState>) -> HttpResponse {
    let wards = state.store.wards().await;
    HttpResponse::Ok().json(heatmap::hotspot_collection(&wards, &state.shapes))
}

/// `GET /analytics/reports-geojson`
pub async fn reports_geojson(
    state: web::Data<AppState>,
    params: web::Query<ReportGeoJsonParams>,
) -> HttpResponse {
    let snapshot = state.store.snapshot().await;
    HttpResponse::Ok().json(heatmap::report_collection(&snapshot, params.status))
}

/// `POST /reports`
pub async fn create_report(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let user = match auth::require(state.auth.as_ref(), &req, Capability::SubmitReport) {
        Ok(user) => user,
        Err(e) => return auth_error(&e),
    };

    if !state
        .rate_limiter
        .is_allowed(user.user_id, RateAction::SubmitReport, state.reports_per_hour)
    {
        return rate_limited();
    }

    let body = body.into_inner();
    let new = NewReport {
        title: body.title,
        description: body.description,
        latitude: body.latitude,
        longitude: body.longitude,
        address: body.address,
        severity: body.severity.unwrap_or_default(),
        image_path: None,
    };

    if let Err(e) = new.validate() {
        return HttpResponse::BadRequest().json(ApiError::for_field(e.field, e.message));
    }

    let ward_id = state.index.assign_ward(new.longitude, new.latitude);

    match state.store.create_report(user.user_id, new, ward_id).await {
        Ok(report) => HttpResponse::Created().json(ApiReport::from(report)),
        Err(e) => store_error(&e),
    }
}

/// `GET /reports`
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let filter = ReportFilter {
        status: params.status,
        ward_id: params.ward_id,
        severity: params.severity,
        limit: params.limit.unwrap_or(0),
        offset: params.offset.unwrap_or(0),
    };

    match state.store.reports(&filter).await {
        Ok(page) => {
            let page_size = filter.effective_limit();
            HttpResponse::Ok().json(ReportListResponse {
                reports: page.reports.into_iter().map(ApiReport::from).collect(),
                total: page.total,
                page: filter.offset / page_size + 1,
                page_size,
            })
        }
        Err(e) => store_error(&e),
    }
}

/// `GET /reports/{id}`
pub async fn get_report(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match state.store.report(path.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => store_error(&e),
    }
}

/// `POST /reports/{id}/upvote`
///
/// Idempotent per (user, report): a repeat vote answers 200 without
/// touching the count.
pub async fn upvote_report(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    let user = match auth::require(state.auth.as_ref(), &req, Capability::Upvote) {
        Ok(user) => user,
        Err(e) => return auth_error(&e),
    };

    match state.store.upvote(path.into_inner(), user.user_id).await {
        Ok(true) => HttpResponse::Created().json(UpvoteResponse {
            message: "Upvoted successfully".to_string(),
            already_upvoted: false,
        }),
        Ok(false) => HttpResponse::Ok().json(UpvoteResponse {
            message: "Already upvoted this report".to_string(),
            already_upvoted: true,
        }),
        Err(e) => store_error(&e),
    }
}

/// `POST /reports/{id}/comments`
pub async fn add_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CommentRequest>,
) -> HttpResponse {
    let user = match auth::require(state.auth.as_ref(), &req, Capability::Comment) {
        Ok(user) => user,
        Err(e) => return auth_error(&e),
    };

    if !state
        .rate_limiter
        .is_allowed(user.user_id, RateAction::Comment, state.comments_per_hour)
    {
        return rate_limited();
    }

    let content = body.into_inner().content;
    if content.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiError::for_field("content", "must not be empty"));
    }

    match state
        .store
        .add_comment(path.into_inner(), user.user_id, content)
        .await
    {
        Ok(comment) => HttpResponse::Created().json(ApiComment::from(comment)),
        Err(e) => store_error(&e),
    }
}

/// `GET /reports/{id}/comments`
pub async fn list_comments(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match state.store.comments(path.into_inner()).await {
        Ok(comments) => {
            let api_comments: Vec<ApiComment> =
                comments.into_iter().map(ApiComment::from).collect();
            HttpResponse::Ok().json(api_comments)
        }
        Err(e) => store_error(&e),
    }
}

/// `PUT /authority/reports/{id}`
///
/// Partial update: only supplied fields change.
pub async fn update_report(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateReportRequest>,
) -> HttpResponse {
    let user = match auth::require(state.auth.as_ref(), &req, Capability::TriageReports) {
        Ok(user) => user,
        Err(e) => return auth_error(&e),
    };

    let patch: ReportPatch = body.into_inner().into();
    if patch.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("no fields supplied"));
    }

    match state
        .store
        .update_report(path.into_inner(), patch, user.user_id)
        .await
    {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => store_error(&e),
    }
}

/// `POST /authority/reports/{id}/resolution-image`
///
/// Raw image bytes in the body; the original filename (for its
/// extension) comes as a query parameter.
pub async fn upload_resolution_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    params: web::Query<ResolutionImageParams>,
    body: web::Bytes,
) -> HttpResponse {
    let user = match auth::require(state.auth.as_ref(), &req, Capability::TriageReports) {
        Ok(user) => user,
        Err(e) => return auth_error(&e),
    };

    let report_id = path.into_inner();
    if let Err(e) = state.store.report(report_id).await {
        return store_error(&e);
    }

    let saved = uploads::save_image(
        &state.upload_dir,
        "resolution",
        &params.filename,
        &body,
        state.max_upload_size,
    );

    let image_path = match saved {
        Ok(path) => path.display().to_string(),
        Err(e @ (UploadError::ExtensionNotAllowed | UploadError::TooLarge { .. })) => {
            return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
        }
        Err(UploadError::Io(e)) => {
            log::error!("Failed to write resolution image: {e}");
            return HttpResponse::InternalServerError()
                .json(ApiError::new("failed to store image"));
        }
    };

    match state
        .store
        .set_resolution_image(report_id, image_path.clone(), user.user_id)
        .await
    {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Resolution image uploaded successfully",
            "image_path": image_path,
        })),
        Err(e) => store_error(&e),
    }
}

/// `GET /authority/reports/{id}/audit-log`
pub async fn audit_log(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    if let Err(e) = auth::require(state.auth.as_ref(), &req, Capability::ViewAuditLog) {
        return auth_error(&e);
    }

    match state.store.audit_log(path.into_inner()).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => store_error(&e),
    }
}

/// `POST /authority/recompute`
///
/// Runs the aggregation pass over a snapshot and publishes the scores
/// atomically. With `?terrain=true`, fresh terrain statistics are
/// fetched per ward first; a terrain service outage surfaces as 503
/// rather than publishing a partially computed result.
pub async fn recompute(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<RecomputeParams>,
) -> HttpResponse {
    if let Err(e) = auth::require(state.auth.as_ref(), &req, Capability::RecomputeRisk) {
        return auth_error(&e);
    }

    let mut terrain = BTreeMap::new();
    if params.terrain.unwrap_or(false) {
        for shape in state.shapes.iter() {
            match state.terrain.ward_terrain(shape.ward_id, &shape.polygon).await {
                Ok(Some(stats)) => {
                    terrain.insert(shape.ward_id, stats);
                }
                Ok(None) => {}
                Err(e @ ElevationError::Transient { .. }) => {
                    log::error!("Terrain fetch failed for ward {}: {e}", shape.ward_id);
                    return HttpResponse::ServiceUnavailable()
                        .json(ApiError::new("elevation data unavailable"));
                }
                Err(e) => {
                    log::warn!(
                        "Skipping terrain for ward {}: {e}",
                        shape.ward_id
                    );
                }
            }
        }
    }

    let reports = state.store.snapshot().await;
    let wards = state.store.wards().await;

    let input = AggregationInput {
        reports: &reports,
        wards: &wards,
        shapes: &state.shapes,
        terrain: &terrain,
        weights: state.weights,
    };

    let scored = aggregate::recompute(&input, &state.index);
    let wards_scored = scored.len();
    state.store.publish_ward_scores(scored).await;

    HttpResponse::Ok().json(RecomputeResponse { wards_scored })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use geo::{Coord, LineString, MultiPolygon, Polygon};
    use waterlog_map_analytics_models::RiskWeights;
    use waterlog_map_elevation::StaticTerrain;
    use waterlog_map_geography_models::{TerrainStats, WardBoundary, WardShape};
    use waterlog_map_report_models::UserRole;
    use waterlog_map_server_models::{
        ApiComment, ApiError, ApiReport, ApiWard, ApiWardAnalytics, RecomputeResponse,
        ReportListResponse, UpvoteResponse,
    };
    use waterlog_map_spatial::WardIndex;
    use waterlog_map_store::{IncidentStore as _, MemoryStore};

    use crate::auth::{AuthUser, StaticTokenValidator};
    use crate::rate_limit::RateLimiter;
    use crate::{AppState, routes};

    const CITIZEN: (&str, &str) = ("Authorization", "Bearer citizen-token");
    const AUTHORITY: (&str, &str) = ("Authorization", "Bearer authority-token");

    fn square(min_x: f64, min_y: f64, side: f64) -> MultiPolygon<f64> {
        let ring = LineString::from(vec![
            Coord { x: min_x, y: min_y },
            Coord {
                x: min_x + side,
                y: min_y,
            },
            Coord {
                x: min_x + side,
                y: min_y + side,
            },
            Coord {
                x: min_x,
                y: min_y + side,
            },
            Coord { x: min_x, y: min_y },
        ]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    async fn test_state(reports_per_hour: u32) -> web::Data<AppState> {
        let store = Arc::new(MemoryStore::new());

        let boundaries = vec![WardBoundary {
            ward_number: "001".to_string(),
            ward_name: "Narela".to_string(),
            polygon: square(77.0, 28.0, 0.1),
        }];
        let registered = store.register_wards(&boundaries).await;
        let shapes: Vec<WardShape> = registered
            .iter()
            .zip(&boundaries)
            .map(|(ward, boundary)| WardShape {
                ward_id: ward.id,
                polygon: boundary.polygon.clone(),
            })
            .collect();
        let index = WardIndex::from_shapes(&shapes);

        let auth = StaticTokenValidator::new([
            (
                "citizen-token".to_string(),
                AuthUser {
                    user_id: 1,
                    role: UserRole::Citizen,
                },
            ),
            (
                "authority-token".to_string(),
                AuthUser {
                    user_id: 9,
                    role: UserRole::Authority,
                },
            ),
        ]);

        let terrain = StaticTerrain::new([(
            1,
            TerrainStats {
                elevation_avg: Some(205.0),
                slope_avg: Some(0.3),
            },
        )]);

        let upload_dir = std::env::temp_dir().join(format!(
            "waterlog-server-test-{}",
            uuid::Uuid::new_v4().simple()
        ));

        web::Data::new(AppState {
            store,
            index: Arc::new(index),
            shapes: Arc::new(shapes),
            auth: Arc::new(auth),
            terrain: Arc::new(terrain),
            rate_limiter: RateLimiter::new(),
            weights: RiskWeights::default(),
            reports_per_hour,
            comments_per_hour: 30,
            upload_dir,
            max_upload_size: 1024 * 1024,
        })
    }

    fn report_body(latitude: f64, longitude: f64) -> serde_json::Value {
        serde_json::json!({
            "title": "Knee-deep water at the underpass",
            "description": "Has not drained since last night's rain",
            "latitude": latitude,
            "longitude": longitude,
            "severity": "HIGH",
        })
    }

    #[actix_web::test]
    async fn health_answers_without_auth() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn submitting_a_valid_report_round_trips() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: ApiReport = test::read_body_json(resp).await;
        assert_eq!(created.ward_id, Some(1));
        assert_eq!(created.user_id, 1);

        let req = test::TestRequest::get()
            .uri(&format!("/reports/{}", created.id))
            .to_request();
        let fetched: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(fetched.title, "Knee-deep water at the underpass");
        assert_eq!(
            fetched.description,
            "Has not drained since last night's rain"
        );
        assert!((fetched.latitude - 28.05).abs() < f64::EPSILON);
        assert!((fetched.longitude - 77.05).abs() < f64::EPSILON);
        assert_eq!(fetched.severity.to_string(), "HIGH");
    }

    #[actix_web::test]
    async fn invalid_latitude_is_rejected_before_storage() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(95.0, 77.05))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.field.as_deref(), Some("latitude"));

        // Nothing was stored.
        let req = test::TestRequest::get().uri("/reports").to_request();
        let page: ReportListResponse =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(page.total, 0);
    }

    #[actix_web::test]
    async fn anonymous_submission_is_unauthorized() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(("Authorization", "Bearer no-such-token"))
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn citizens_cannot_reach_authority_endpoints() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let report = state
            .store
            .create_report(
                1,
                waterlog_map_report_models::NewReport {
                    title: "Flooded junction near depot".to_string(),
                    description: "Standing water across both lanes".to_string(),
                    latitude: 28.05,
                    longitude: 77.05,
                    address: None,
                    severity: waterlog_map_report_models::ReportSeverity::Medium,
                    image_path: None,
                },
                Some(1),
            )
            .await
            .unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/authority/reports/{}", report.id))
            .insert_header(CITIZEN)
            .set_json(serde_json::json!({ "status": "IN_PROGRESS" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/authority/reports/{}/audit-log", report.id))
            .insert_header(CITIZEN)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn upvote_is_idempotent_over_http() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let created: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::post()
            .uri(&format!("/reports/{}/upvote", created.id))
            .insert_header(CITIZEN)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&format!("/reports/{}/upvote", created.id))
            .insert_header(CITIZEN)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: UpvoteResponse = test::read_body_json(resp).await;
        assert!(body.already_upvoted);

        let req = test::TestRequest::get()
            .uri(&format!("/reports/{}", created.id))
            .to_request();
        let fetched: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(fetched.upvote_count, 1);
    }

    #[actix_web::test]
    async fn comments_come_back_in_insertion_order() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let created: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;

        for content in ["Still flooded this morning", "Pump truck arrived"] {
            let req = test::TestRequest::post()
                .uri(&format!("/reports/{}/comments", created.id))
                .insert_header(CITIZEN)
                .set_json(serde_json::json!({ "content": content }))
                .to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::CREATED
            );
        }

        let req = test::TestRequest::get()
            .uri(&format!("/reports/{}/comments", created.id))
            .to_request();
        let comments: Vec<ApiComment> =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "Still flooded this morning");
        assert_eq!(comments[1].content, "Pump truck arrived");
    }

    #[actix_web::test]
    async fn unknown_ward_analytics_is_not_found() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get()
            .uri("/analytics/wards/999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ApiError = test::read_body_json(resp).await;
        assert!(body.error.contains("ward 999"));
    }

    #[actix_web::test]
    async fn authority_resolution_flow_records_timestamp_and_audit() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let created: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::put()
            .uri(&format!("/authority/reports/{}", created.id))
            .insert_header(AUTHORITY)
            .set_json(serde_json::json!({
                "status": "RESOLVED",
                "assigned_agency": "PWD",
                "notes": "Drain cleared"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: ApiReport = test::read_body_json(resp).await;
        assert!(updated.resolved_at.is_some());
        assert_eq!(updated.assigned_agency.map(|a| a.to_string()), Some("PWD".to_string()));

        // Re-opening is rejected and leaves the timestamp alone.
        let req = test::TestRequest::put()
            .uri(&format!("/authority/reports/{}", created.id))
            .insert_header(AUTHORITY)
            .set_json(serde_json::json!({ "status": "OPEN" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CONFLICT
        );

        let req = test::TestRequest::get()
            .uri(&format!("/authority/reports/{}/audit-log", created.id))
            .insert_header(AUTHORITY)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let entries: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(entries.len(), 2);
    }

    #[actix_web::test]
    async fn rate_limit_blocks_excess_submissions() {
        let state = test_state(2).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/reports")
                .insert_header(CITIZEN)
                .set_json(report_body(28.05, 77.05))
                .to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::CREATED
            );
        }

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn recompute_publishes_scores_and_feeds_the_map() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        for _ in 0..3 {
            let req = test::TestRequest::post()
                .uri("/reports")
                .insert_header(CITIZEN)
                .set_json(report_body(28.05, 77.05))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/authority/recompute")
            .insert_header(AUTHORITY)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: RecomputeResponse = test::read_body_json(resp).await;
        assert_eq!(body.wards_scored, 1);

        let req = test::TestRequest::get().uri("/analytics/wards").to_request();
        let wards: Vec<ApiWard> = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(wards.len(), 1);
        assert!(wards[0].incident_density > 0.0);
        assert!(wards[0].risk_score > 0.0);

        let req = test::TestRequest::get()
            .uri("/analytics/hotspots")
            .to_request();
        let hotspots: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(hotspots["type"], "FeatureCollection");
        let properties = &hotspots["features"][0]["properties"];
        assert_eq!(properties["ward_name"], "Narela");
        assert!(properties["risk_category"].is_string());

        let req = test::TestRequest::get()
            .uri("/analytics/wards/1")
            .to_request();
        let analytics: ApiWardAnalytics =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(analytics.total_reports, 3);
        assert_eq!(analytics.open_reports, 3);
        assert!(
            analytics
                .recommendation
                .starts_with(&analytics.risk_category.to_string())
        );
    }

    #[actix_web::test]
    async fn recompute_with_terrain_uses_the_provider() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/authority/recompute?terrain=true")
            .insert_header(AUTHORITY)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/analytics/wards").to_request();
        let wards: Vec<ApiWard> = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(wards[0].elevation_avg, Some(205.0));
        assert_eq!(wards[0].slope_avg, Some(0.3));
    }

    #[actix_web::test]
    async fn reports_geojson_filters_by_status() {
        let state = test_state(10).await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let created: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.06, 77.06))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/authority/reports/{}", created.id))
            .insert_header(AUTHORITY)
            .set_json(serde_json::json!({ "status": "RESOLVED" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/analytics/reports-geojson?status=OPEN")
            .to_request();
        let open: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(open["features"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/analytics/reports-geojson")
            .to_request();
        let all: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(all["features"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn resolution_image_upload_validates_and_persists() {
        let state = test_state(10).await;
        let upload_dir = state.upload_dir.clone();
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(CITIZEN)
            .set_json(report_body(28.05, 77.05))
            .to_request();
        let created: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::post()
            .uri(&format!(
                "/authority/reports/{}/resolution-image?filename=after.exe",
                created.id
            ))
            .insert_header(AUTHORITY)
            .set_payload(vec![1_u8, 2, 3])
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::post()
            .uri(&format!(
                "/authority/reports/{}/resolution-image?filename=after.jpg",
                created.id
            ))
            .insert_header(AUTHORITY)
            .set_payload(vec![1_u8, 2, 3])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/reports/{}", created.id))
            .to_request();
        let fetched: ApiReport = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(fetched.resolution_image_path.is_some());

        let _ = std::fs::remove_dir_all(upload_dir);
    }
}
