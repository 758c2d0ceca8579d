//! # Ligne API Handlers
//!
//! Advertised phone lines; each one is a marketing channel whose
//! profitability is tracked in the stats report.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{not_found, validation_error, ApiError};
use crate::models::ligne::Model as LigneModel;
use crate::repositories::ligne::{CreateLigneRequest, UpdateLigneRequest};
use crate::repositories::LigneRepository;
use crate::server::AppState;

/// Create payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLigneDto {
    pub nom: String,
    pub service: Option<String>,
    pub numero: Option<String>,
}

/// List all advertised lines
#[utoipa::path(
    get,
    path = "/api/lignes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All lines", body = [LigneModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "lignes"
)]
pub async fn list_lignes(
    State(state): State<AppState>,
    _auth: AuthTech,
) -> Result<Json<Vec<LigneModel>>, ApiError> {
    let repo = LigneRepository::new(&state.db);
    Ok(Json(repo.list().await?))
}

/// Create an advertised line
#[utoipa::path(
    post,
    path = "/api/lignes",
    security(("bearer_auth" = [])),
    request_body = CreateLigneDto,
    responses(
        (status = 201, description = "Line created", body = LigneModel),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "lignes"
)]
pub async fn create_ligne(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<CreateLigneDto>,
) -> Result<(StatusCode, Json<LigneModel>), ApiError> {
    if request.nom.trim().is_empty() {
        return Err(validation_error(
            "Le nom de la ligne est obligatoire",
            json!({"field": "nom"}),
        ));
    }

    let repo = LigneRepository::new(&state.db);
    let ligne = repo
        .create(CreateLigneRequest {
            nom: request.nom.trim().to_string(),
            service: request.service,
            numero: request.numero,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ligne)))
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateLigneDto {
    pub nom: Option<String>,
    pub service: Option<String>,
    pub numero: Option<String>,
}

/// Update an advertised line
#[utoipa::path(
    put,
    path = "/api/lignes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Ligne UUID")),
    request_body = UpdateLigneDto,
    responses(
        (status = 200, description = "Updated line", body = LigneModel),
        (status = 404, description = "No such line", body = ApiError)
    ),
    tag = "lignes"
)]
pub async fn update_ligne(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLigneDto>,
) -> Result<Json<LigneModel>, ApiError> {
    let repo = LigneRepository::new(&state.db);
    let ligne = repo
        .update(
            id,
            UpdateLigneRequest {
                nom: request.nom,
                service: request.service,
                numero: request.numero,
            },
        )
        .await?
        .ok_or_else(|| not_found("ligne", id))?;
    Ok(Json(ligne))
}

/// Delete an advertised line
#[utoipa::path(
    delete,
    path = "/api/lignes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Ligne UUID")),
    responses(
        (status = 204, description = "Line deleted"),
        (status = 404, description = "No such line", body = ApiError)
    ),
    tag = "lignes"
)]
pub async fn delete_ligne(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = LigneRepository::new(&state.db);
    if !repo.delete(id).await? {
        return Err(not_found("ligne", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
