//! # Server Configuration
//!
//! Router assembly and startup for the field-service API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::push::PushClient;
use crate::realtime::Hub;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub hub: Arc<Hub>,
    pub push: Arc<PushClient>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let push = Arc::new(PushClient::new(config.push_gateway_url.clone()));
        Self {
            config: Arc::new(config),
            db,
            hub: Arc::new(Hub::new()),
            push,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/push-token", post(handlers::auth::register_push_token))
        .route(
            "/techs",
            get(handlers::techs::list_techs).post(handlers::techs::create_tech),
        )
        .route(
            "/techs/{id}",
            get(handlers::techs::get_tech)
                .put(handlers::techs::update_tech)
                .delete(handlers::techs::delete_tech),
        )
        .route("/techs/{id}/position", post(handlers::techs::update_position))
        .route("/techs/{id}/status", post(handlers::techs::update_status))
        .route("/techs/{id}/pause", post(handlers::techs::update_pause))
        .route(
            "/interventions",
            get(handlers::interventions::list_interventions)
                .post(handlers::interventions::create_intervention),
        )
        .route(
            "/interventions/{id}",
            get(handlers::interventions::get_intervention)
                .put(handlers::interventions::update_intervention)
                .delete(handlers::interventions::delete_intervention),
        )
        .route(
            "/interventions/{id}/attribuer",
            post(handlers::interventions::attribuer_intervention),
        )
        .route(
            "/devis",
            get(handlers::devis::list_devis).post(handlers::devis::create_devis),
        )
        .route(
            "/devis/{id}",
            get(handlers::devis::get_devis)
                .put(handlers::devis::update_devis)
                .delete(handlers::devis::delete_devis),
        )
        .route("/devis/{id}/signer", post(handlers::devis::signer_devis))
        .route("/devis/{id}/refuser", post(handlers::devis::refuser_devis))
        .route("/devis/{id}/facturer", post(handlers::devis::facturer_devis))
        .route("/factures", get(handlers::factures::list_factures))
        .route("/factures/{id}", get(handlers::factures::get_facture))
        .route("/factures/{id}/payer", post(handlers::factures::payer_facture))
        .route(
            "/entreprise",
            get(handlers::entreprise::get_entreprise).put(handlers::entreprise::put_entreprise),
        )
        .route(
            "/lignes",
            get(handlers::lignes::list_lignes).post(handlers::lignes::create_ligne),
        )
        .route(
            "/lignes/{id}",
            put(handlers::lignes::update_ligne).delete(handlers::lignes::delete_ligne),
        )
        .route(
            "/depenses-pub",
            get(handlers::depenses::list_depenses).post(handlers::depenses::create_depense),
        )
        .route(
            "/depenses-pub/{id}",
            put(handlers::depenses::update_depense).delete(handlers::depenses::delete_depense),
        )
        .route("/stats/pub", get(handlers::stats::stats_pub));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/signature/{devis_id}", get(handlers::signature_page::signature_page))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
        // The back office and the signing page are served from other
        // origins; the API is token-gated, not origin-gated.
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let db = crate::db::init_pool(&config).await?;
    migration::Migrator::up(&db, None).await?;

    let addr = config.bind_addr()?;
    let profile = config.profile.clone();
    let state = AppState::new(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on: {}", addr);
    tracing::info!("Running in profile: {}", profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::auth::register_push_token,
        crate::handlers::techs::list_techs,
        crate::handlers::techs::create_tech,
        crate::handlers::techs::get_tech,
        crate::handlers::techs::update_tech,
        crate::handlers::techs::delete_tech,
        crate::handlers::techs::update_position,
        crate::handlers::techs::update_status,
        crate::handlers::techs::update_pause,
        crate::handlers::interventions::list_interventions,
        crate::handlers::interventions::create_intervention,
        crate::handlers::interventions::get_intervention,
        crate::handlers::interventions::update_intervention,
        crate::handlers::interventions::delete_intervention,
        crate::handlers::interventions::attribuer_intervention,
        crate::handlers::devis::list_devis,
        crate::handlers::devis::create_devis,
        crate::handlers::devis::get_devis,
        crate::handlers::devis::update_devis,
        crate::handlers::devis::delete_devis,
        crate::handlers::devis::signer_devis,
        crate::handlers::devis::refuser_devis,
        crate::handlers::devis::facturer_devis,
        crate::handlers::factures::list_factures,
        crate::handlers::factures::get_facture,
        crate::handlers::factures::payer_facture,
        crate::handlers::entreprise::get_entreprise,
        crate::handlers::entreprise::put_entreprise,
        crate::handlers::lignes::list_lignes,
        crate::handlers::lignes::create_ligne,
        crate::handlers::lignes::update_ligne,
        crate::handlers::lignes::delete_ligne,
        crate::handlers::depenses::list_depenses,
        crate::handlers::depenses::create_depense,
        crate::handlers::depenses::update_depense,
        crate::handlers::depenses::delete_depense,
        crate::handlers::stats::stats_pub,
        crate::handlers::signature_page::signature_page,
        crate::handlers::ws::ws_upgrade,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::error::ApiError,
            crate::models::technicien::Model,
            crate::models::intervention::Model,
            crate::models::devis::Model,
            crate::models::facture::Model,
            crate::models::entreprise::Model,
            crate::models::ligne::Model,
            crate::models::depense_pub::Model,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::PushTokenRequest,
            crate::handlers::techs::CreateTechDto,
            crate::handlers::techs::UpdateTechDto,
            crate::handlers::techs::PositionDto,
            crate::handlers::techs::StatusDto,
            crate::handlers::techs::PauseDto,
            crate::handlers::interventions::CreateInterventionDto,
            crate::handlers::interventions::UpdateInterventionDto,
            crate::handlers::interventions::AttribuerDto,
            crate::handlers::devis::CreateDevisDto,
            crate::handlers::devis::UpdateDevisDto,
            crate::handlers::devis::SignerDto,
            crate::handlers::devis::RefuserDto,
            crate::handlers::factures::PayerDto,
            crate::handlers::entreprise::EntrepriseDto,
            crate::handlers::lignes::CreateLigneDto,
            crate::handlers::lignes::UpdateLigneDto,
            crate::handlers::depenses::CreateDepenseDto,
            crate::handlers::depenses::UpdateDepenseDto,
            crate::handlers::stats::LigneStats,
            crate::handlers::stats::StatsTotaux,
            crate::handlers::stats::StatsPubResponse,
            crate::lifecycle::LigneDevis,
        )
    ),
    info(
        title = "Urgence API",
        description = "Field-service operations API: dispatch, quotes with e-signature, invoicing",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use migration::Migrator;
    use sea_orm::{ConnectOptions, Database};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let config = AppConfig {
            profile: "test".to_string(),
            ..AppConfig::default()
        };
        create_app(AppState::new(config, db))
    }

    #[tokio::test]
    async fn root_reports_the_service() {
        let app = test_app().await;
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["service"], "urgence-api");
    }

    #[tokio::test]
    async fn health_checks_the_store() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/api/devis/{id}/signer"].is_object());
        assert!(doc["paths"]["/api/stats/pub"].is_object());
    }
}
