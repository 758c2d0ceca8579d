//! # Technician API Handlers
//!
//! Account CRUD for the back office plus the mobile app's live updates
//! (position, online status, pause). The live updates are broadcast to
//! every realtime connection: dashboards track the whole fleet.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{hash_password, AuthTech};
use crate::error::{not_found, validation_error, ApiError};
use crate::models::technicien::Model as TechnicienModel;
use crate::realtime::Event;
use crate::repositories::technicien::{CreateTechnicienRequest, UpdateTechnicienRequest};
use crate::repositories::TechnicienRepository;
use crate::server::AppState;

/// Create payload for a technician account
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTechDto {
    pub nom: String,
    pub mdp: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    pub departements: Option<JsonValue>,
    #[serde(default = "default_pourcentage")]
    pub pourcentage_tech: f64,
}

fn default_role() -> String {
    "technicien".to_string()
}

fn default_pourcentage() -> f64 {
    50.0
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTechDto {
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub role: Option<String>,
    pub departements: Option<JsonValue>,
    pub pourcentage_tech: Option<f64>,
    pub actif: Option<bool>,
}

/// Position ping payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct PositionDto {
    pub latitude: f64,
    pub longitude: f64,
}

/// Online-status payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusDto {
    pub en_ligne: bool,
}

/// Pause payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct PauseDto {
    pub en_pause: bool,
}

/// List all technician accounts
#[utoipa::path(
    get,
    path = "/api/techs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = [TechnicienModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn list_techs(
    State(state): State<AppState>,
    _auth: AuthTech,
) -> Result<Json<Vec<TechnicienModel>>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    Ok(Json(repo.list().await?))
}

/// Create a technician account
#[utoipa::path(
    post,
    path = "/api/techs",
    security(("bearer_auth" = [])),
    request_body = CreateTechDto,
    responses(
        (status = 201, description = "Account created", body = TechnicienModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Login name already taken", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn create_tech(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<CreateTechDto>,
) -> Result<(StatusCode, Json<TechnicienModel>), ApiError> {
    let nom = request.nom.trim();
    if nom.is_empty() {
        return Err(validation_error(
            "Le nom est obligatoire",
            json!({"field": "nom"}),
        ));
    }
    if request.mdp.is_empty() {
        return Err(validation_error(
            "Le mot de passe est obligatoire",
            json!({"field": "mdp"}),
        ));
    }

    let mdp = hash_password(&request.mdp).map_err(|err| {
        tracing::error!("Password hashing failed: {}", err);
        ApiError::from(crate::error::ErrorType::InternalServerError)
    })?;

    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .create(CreateTechnicienRequest {
            nom: nom.to_string(),
            prenom: request.prenom,
            email: request.email,
            telephone: request.telephone,
            mdp,
            role: request.role,
            departements: request.departements,
            pourcentage_tech: request.pourcentage_tech,
        })
        .await
        .map_err(|err| match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                crate::error::conflict("Un compte porte déjà ce nom")
            }
            _ => err.into(),
        })?;

    Ok((StatusCode::CREATED, Json(tech)))
}

/// Fetch one technician account
#[utoipa::path(
    get,
    path = "/api/techs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    responses(
        (status = 200, description = "The account", body = TechnicienModel),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn get_tech(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("technicien", id))?;
    Ok(Json(tech))
}

/// Update a technician account
#[utoipa::path(
    put,
    path = "/api/techs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    request_body = UpdateTechDto,
    responses(
        (status = 200, description = "Updated account", body = TechnicienModel),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn update_tech(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTechDto>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .update(
            id,
            UpdateTechnicienRequest {
                prenom: request.prenom,
                email: request.email,
                telephone: request.telephone,
                role: request.role,
                departements: request.departements,
                pourcentage_tech: request.pourcentage_tech,
                actif: request.actif,
            },
        )
        .await?
        .ok_or_else(|| not_found("technicien", id))?;

    Ok(Json(tech))
}

/// Delete a technician account
#[utoipa::path(
    delete,
    path = "/api/techs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn delete_tech(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    if !repo.delete(id).await? {
        return Err(not_found("technicien", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Record a position ping and broadcast it to every dashboard
#[utoipa::path(
    post,
    path = "/api/techs/{id}/position",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    request_body = PositionDto,
    responses(
        (status = 200, description = "Position recorded", body = TechnicienModel),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn update_position(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<PositionDto>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .set_position(id, request.latitude, request.longitude)
        .await?
        .ok_or_else(|| not_found("technicien", id))?;

    state.hub.broadcast(&Event::tech_position_update(json!({
        "techId": tech.id,
        "latitude": tech.latitude,
        "longitude": tech.longitude,
    })));

    Ok(Json(tech))
}

/// Flip the online flag and broadcast it
#[utoipa::path(
    post,
    path = "/api/techs/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    request_body = StatusDto,
    responses(
        (status = 200, description = "Status recorded", body = TechnicienModel),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn update_status(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusDto>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .set_en_ligne(id, request.en_ligne)
        .await?
        .ok_or_else(|| not_found("technicien", id))?;

    state.hub.broadcast(&Event::tech_status_update(json!({
        "techId": tech.id,
        "enLigne": tech.en_ligne,
    })));

    Ok(Json(tech))
}

/// Flip the pause flag and broadcast it
#[utoipa::path(
    post,
    path = "/api/techs/{id}/pause",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Technician UUID")),
    request_body = PauseDto,
    responses(
        (status = 200, description = "Pause recorded", body = TechnicienModel),
        (status = 404, description = "No such account", body = ApiError)
    ),
    tag = "techs"
)]
pub async fn update_pause(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<PauseDto>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .set_en_pause(id, request.en_pause)
        .await?
        .ok_or_else(|| not_found("technicien", id))?;

    state.hub.broadcast(&Event::tech_pause_update(json!({
        "techId": tech.id,
        "enPause": tech.en_pause,
    })));

    Ok(Json(tech))
}
