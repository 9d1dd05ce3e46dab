#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the waterlog map platform.
//!
//! Serves the citizen reporting endpoints, the authority triage
//! endpoints, and the ward analytics / `GeoJSON` map endpoints. All
//! session-relevant state (store, spatial index, token table, rate
//! limiter) is built once at startup into [`AppState`]; nothing is
//! ambient or global.

pub mod auth;
pub mod config;
mod handlers;
pub mod rate_limit;
pub mod uploads;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use waterlog_map_analytics_models::RiskWeights;
use waterlog_map_elevation::{OpenTopodataClient, StaticTerrain, TerrainProvider};
use waterlog_map_geography::loader::load_ward_boundaries;
use waterlog_map_geography_models::WardShape;
use waterlog_map_report_models::UserRole;
use waterlog_map_spatial::WardIndex;
use waterlog_map_store::{IncidentStore, MemoryStore};

use crate::auth::{AuthUser, StaticTokenValidator, TokenValidator};
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

/// Shared application state.
pub struct AppState {
    /// Incident store.
    pub store: Arc<dyn IncidentStore>,
    /// Ward spatial index.
    pub index: Arc<WardIndex>,
    /// Registered ward geometries, for density and map output.
    pub shapes: Arc<Vec<WardShape>>,
    /// Bearer token validator.
    pub auth: Arc<dyn TokenValidator>,
    /// Terrain statistics provider for the recompute pass.
    pub terrain: Arc<dyn TerrainProvider>,
    /// Sliding-window limiter for citizen writes.
    pub rate_limiter: RateLimiter,
    /// Risk scoring weight policy.
    pub weights: RiskWeights,
    /// Report submissions allowed per user per hour.
    pub reports_per_hour: u32,
    /// Comments allowed per user per hour.
    pub comments_per_hour: u32,
    /// Directory for uploaded images.
    pub upload_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_upload_size: usize,
}

/// Registers every API route. Shared between [`run`] and the handler
/// tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/analytics")
                .route("/wards", web::get().to(handlers::wards))
                .route("/wards/{id}", web::get().to(handlers::ward_analytics))
                .route("/hotspots", web::get().to(handlers::hotspots))
                .route(
                    "/reports-geojson",
                    web::get().to(handlers::reports_geojson),
                ),
        )
        .service(
            web::scope("/reports")
                .route("", web::post().to(handlers::create_report))
                .route("", web::get().to(handlers::list_reports))
                .route("/{id}", web::get().to(handlers::get_report))
                .route("/{id}/upvote", web::post().to(handlers::upvote_report))
                .route("/{id}/comments", web::post().to(handlers::add_comment))
                .route("/{id}/comments", web::get().to(handlers::list_comments)),
        )
        .service(
            web::scope("/authority")
                .route("/reports/{id}", web::put().to(handlers::update_report))
                .route(
                    "/reports/{id}/resolution-image",
                    web::post().to(handlers::upload_resolution_image),
                )
                .route("/reports/{id}/audit-log", web::get().to(handlers::audit_log))
                .route("/recompute", web::post().to(handlers::recompute)),
        );
}

/// Builds the application state from configuration: loads ward
/// boundaries, registers them with the store, builds the spatial index,
/// and wires the auth and terrain seams.
///
/// # Errors
///
/// Returns an error when a configured boundary file cannot be loaded,
/// the upload directory cannot be created, or the elevation client
/// cannot be constructed.
pub async fn build_state(config: &ServerConfig) -> std::io::Result<AppState> {
    let store = Arc::new(MemoryStore::new());

    let boundaries = match &config.ward_geojson {
        Some(path) if path.exists() => {
            load_ward_boundaries(path).map_err(std::io::Error::other)?
        }
        Some(path) => {
            log::warn!(
                "Ward boundary file {} not found, starting without wards",
                path.display()
            );
            Vec::new()
        }
        None => {
            log::warn!("WARD_GEOJSON not set, starting without ward boundaries");
            Vec::new()
        }
    };

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

    let validator = if config.auth_tokens.is_empty() {
        dev_token_validator()
    } else {
        let validator = StaticTokenValidator::from_entries(&config.auth_tokens);
        log::info!("Loaded {} bearer tokens", validator.len());
        validator
    };

    let terrain: Arc<dyn TerrainProvider> = match &config.elevation_api_base {
        Some(base) => Arc::new(
            OpenTopodataClient::new(base, &config.elevation_dataset)
                .map_err(std::io::Error::other)?,
        ),
        None => Arc::new(StaticTerrain::default()),
    };

    std::fs::create_dir_all(&config.upload_dir)?;

    Ok(AppState {
        store,
        index: Arc::new(index),
        shapes: Arc::new(shapes),
        auth: Arc::new(validator),
        terrain,
        rate_limiter: RateLimiter::new(),
        weights: RiskWeights::default(),
        reports_per_hour: config.rate_limit_reports_per_hour,
        comments_per_hour: config.rate_limit_comments_per_hour,
        upload_dir: config.upload_dir.clone(),
        max_upload_size: config.max_upload_size,
    })
}

/// Mints throwaway dev tokens when `AUTH_TOKENS` is not configured, so a
/// fresh checkout is usable without an identity provider.
fn dev_token_validator() -> StaticTokenValidator {
    let citizen_token = uuid::Uuid::new_v4().simple().to_string();
    let authority_token = uuid::Uuid::new_v4().simple().to_string();

    log::info!("AUTH_TOKENS not set; minted dev tokens:");
    log::info!("  citizen   (user 1): {citizen_token}");
    log::info!("  authority (user 2): {authority_token}");

    StaticTokenValidator::new([
        (
            citizen_token,
            AuthUser {
                user_id: 1,
                role: UserRole::Citizen,
            },
        ),
        (
            authority_token,
            AuthUser {
                user_id: 2,
                role: UserRole::Authority,
            },
        ),
    ])
}

/// Builds the state and runs the HTTP server until shutdown.
///
/// # Errors
///
/// Returns an error when startup fails or the listener cannot bind.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(build_state(&config).await?);
    let upload_dir = config.upload_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
            // Serve uploaded report and resolution images
            .service(Files::new("/uploads", upload_dir.clone()))
    })
    .bind((config.bind_addr.clone(), config.port))?
    .run()
    .await
}
