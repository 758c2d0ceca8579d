//! # Advertising Spend Handlers
//!
//! Spend entries recorded against advertised lines; raw input for the
//! profitability report.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{not_found, validation_error, ApiError};
use crate::models::depense_pub::Model as DepensePubModel;
use crate::repositories::depense_pub::{CreateDepenseRequest, UpdateDepenseRequest};
use crate::repositories::{DepensePubRepository, LigneRepository};
use crate::server::AppState;

/// Create payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepenseDto {
    pub ligne_id: Uuid,
    pub montant: f64,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date: Option<DateTimeWithTimeZone>,
}

/// List query filters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DepenseQuery {
    pub ligne_id: Option<Uuid>,
}

/// List spend entries, newest first
#[utoipa::path(
    get,
    path = "/api/depenses-pub",
    security(("bearer_auth" = [])),
    params(("ligne_id" = Option<Uuid>, Query, description = "Narrow to one advertised line")),
    responses(
        (status = 200, description = "Matching entries", body = [DepensePubModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "depenses"
)]
pub async fn list_depenses(
    State(state): State<AppState>,
    _auth: AuthTech,
    Query(query): Query<DepenseQuery>,
) -> Result<Json<Vec<DepensePubModel>>, ApiError> {
    let repo = DepensePubRepository::new(&state.db);
    Ok(Json(repo.list(query.ligne_id).await?))
}

/// Record a spend entry; the date defaults to now
#[utoipa::path(
    post,
    path = "/api/depenses-pub",
    security(("bearer_auth" = [])),
    request_body = CreateDepenseDto,
    responses(
        (status = 201, description = "Entry recorded", body = DepensePubModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "No such advertised line", body = ApiError)
    ),
    tag = "depenses"
)]
pub async fn create_depense(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<CreateDepenseDto>,
) -> Result<(StatusCode, Json<DepensePubModel>), ApiError> {
    if request.montant <= 0.0 {
        return Err(validation_error(
            "Le montant doit être positif",
            json!({"field": "montant"}),
        ));
    }

    let ligne_repo = LigneRepository::new(&state.db);
    if ligne_repo.find_by_id(request.ligne_id).await?.is_none() {
        return Err(not_found("ligne", request.ligne_id));
    }

    let repo = DepensePubRepository::new(&state.db);
    let depense = repo
        .create(CreateDepenseRequest {
            ligne_id: request.ligne_id,
            montant: request.montant,
            date: request.date.unwrap_or_else(|| chrono::Utc::now().into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(depense)))
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDepenseDto {
    pub montant: Option<f64>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date: Option<DateTimeWithTimeZone>,
}

/// Update a spend entry
#[utoipa::path(
    put,
    path = "/api/depenses-pub/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Depense UUID")),
    request_body = UpdateDepenseDto,
    responses(
        (status = 200, description = "Updated entry", body = DepensePubModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "No such entry", body = ApiError)
    ),
    tag = "depenses"
)]
pub async fn update_depense(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDepenseDto>,
) -> Result<Json<DepensePubModel>, ApiError> {
    if let Some(montant) = request.montant
        && montant <= 0.0
    {
        return Err(validation_error(
            "Le montant doit être positif",
            json!({"field": "montant"}),
        ));
    }

    let repo = DepensePubRepository::new(&state.db);
    let depense = repo
        .update(
            id,
            UpdateDepenseRequest {
                montant: request.montant,
                date: request.date,
            },
        )
        .await?
        .ok_or_else(|| not_found("depense", id))?;
    Ok(Json(depense))
}

/// Delete a spend entry
#[utoipa::path(
    delete,
    path = "/api/depenses-pub/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Depense UUID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "No such entry", body = ApiError)
    ),
    tag = "depenses"
)]
pub async fn delete_depense(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = DepensePubRepository::new(&state.db);
    if !repo.delete(id).await? {
        return Err(not_found("depense", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
