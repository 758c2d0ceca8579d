//! # Intervention API Handlers
//!
//! Dispatch CRUD. Every mutation is published on the realtime bus: to the
//! entity's own room and the dispatch mirror, deduplicated per connection.
//! Assignment additionally pushes a notification to the technician's
//! device, after the response is already on its way.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{not_found, validation_error, ApiError};
use crate::models::intervention::Model as InterventionModel;
use crate::realtime::{Event, DISPATCH_ROOM};
use crate::repositories::intervention::{
    CreateInterventionRequest, InterventionFilter, UpdateInterventionRequest,
};
use crate::repositories::{InterventionRepository, TechnicienRepository};
use crate::server::AppState;

/// Create payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInterventionDto {
    pub service: String,
    pub description: Option<String>,
    pub client_nom: Option<String>,
    pub adresse: Option<String>,
    pub cp: Option<String>,
    pub ville: Option<String>,
    pub telephone: Option<String>,
    pub prix: Option<f64>,
    pub ligne_id: Option<Uuid>,
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateInterventionDto {
    pub service: Option<String>,
    pub statut: Option<String>,
    pub description: Option<String>,
    pub client_nom: Option<String>,
    pub adresse: Option<String>,
    pub cp: Option<String>,
    pub ville: Option<String>,
    pub telephone: Option<String>,
    pub prix: Option<f64>,
    pub ligne_id: Option<Uuid>,
}

/// Assignment payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttribuerDto {
    pub tech_id: Uuid,
    #[serde(default = "default_mode")]
    pub mode_distribution: String,
}

fn default_mode() -> String {
    "manuel".to_string()
}

/// List query filters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InterventionQuery {
    pub statut: Option<String>,
    pub tech_id: Option<Uuid>,
}

fn rooms_for(id: Uuid) -> [String; 2] {
    [format!("intervention:{id}"), DISPATCH_ROOM.to_string()]
}

fn publish(state: &AppState, id: Uuid, event: &Event) {
    let rooms = rooms_for(id);
    state
        .hub
        .publish_rooms(&[rooms[0].as_str(), rooms[1].as_str()], event);
}

/// List interventions, newest first
#[utoipa::path(
    get,
    path = "/api/interventions",
    security(("bearer_auth" = [])),
    params(
        ("statut" = Option<String>, Query, description = "Filter by status"),
        ("tech_id" = Option<Uuid>, Query, description = "Filter by assigned technician")
    ),
    responses(
        (status = 200, description = "Matching interventions", body = [InterventionModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn list_interventions(
    State(state): State<AppState>,
    _auth: AuthTech,
    Query(query): Query<InterventionQuery>,
) -> Result<Json<Vec<InterventionModel>>, ApiError> {
    let repo = InterventionRepository::new(&state.db);
    let items = repo
        .list(InterventionFilter {
            statut: query.statut,
            tech_id: query.tech_id,
        })
        .await?;
    Ok(Json(items))
}

/// Create an intervention
#[utoipa::path(
    post,
    path = "/api/interventions",
    security(("bearer_auth" = [])),
    request_body = CreateInterventionDto,
    responses(
        (status = 201, description = "Intervention created", body = InterventionModel),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn create_intervention(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<CreateInterventionDto>,
) -> Result<(StatusCode, Json<InterventionModel>), ApiError> {
    if request.service.trim().is_empty() {
        return Err(validation_error(
            "Le service est obligatoire",
            json!({"field": "service"}),
        ));
    }

    let repo = InterventionRepository::new(&state.db);
    let intervention = repo
        .create(CreateInterventionRequest {
            service: request.service.trim().to_string(),
            description: request.description,
            client_nom: request.client_nom,
            adresse: request.adresse,
            cp: request.cp,
            ville: request.ville,
            telephone: request.telephone,
            prix: request.prix,
            ligne_id: request.ligne_id,
        })
        .await?;

    publish(
        &state,
        intervention.id,
        &Event::intervention_created(json!(intervention)),
    );

    Ok((StatusCode::CREATED, Json(intervention)))
}

/// Fetch one intervention
#[utoipa::path(
    get,
    path = "/api/interventions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Intervention UUID")),
    responses(
        (status = 200, description = "The intervention", body = InterventionModel),
        (status = 404, description = "No such intervention", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn get_intervention(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<Json<InterventionModel>, ApiError> {
    let repo = InterventionRepository::new(&state.db);
    let intervention = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("intervention", id))?;
    Ok(Json(intervention))
}

/// Update an intervention
#[utoipa::path(
    put,
    path = "/api/interventions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Intervention UUID")),
    request_body = UpdateInterventionDto,
    responses(
        (status = 200, description = "Updated intervention", body = InterventionModel),
        (status = 404, description = "No such intervention", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn update_intervention(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInterventionDto>,
) -> Result<Json<InterventionModel>, ApiError> {
    let repo = InterventionRepository::new(&state.db);
    let intervention = repo
        .update(
            id,
            UpdateInterventionRequest {
                service: request.service,
                statut: request.statut,
                description: request.description,
                client_nom: request.client_nom,
                adresse: request.adresse,
                cp: request.cp,
                ville: request.ville,
                telephone: request.telephone,
                prix: request.prix,
                ligne_id: request.ligne_id,
            },
        )
        .await?
        .ok_or_else(|| not_found("intervention", id))?;

    publish(
        &state,
        intervention.id,
        &Event::intervention_updated(json!(intervention)),
    );

    Ok(Json(intervention))
}

/// Delete an intervention
#[utoipa::path(
    delete,
    path = "/api/interventions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Intervention UUID")),
    responses(
        (status = 204, description = "Intervention deleted"),
        (status = 404, description = "No such intervention", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn delete_intervention(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = InterventionRepository::new(&state.db);
    if !repo.delete(id).await? {
        return Err(not_found("intervention", id));
    }

    publish(&state, id, &Event::intervention_deleted(id));
    Ok(StatusCode::NO_CONTENT)
}

/// Assign the intervention to a technician, notify the device
#[utoipa::path(
    post,
    path = "/api/interventions/{id}/attribuer",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Intervention UUID")),
    request_body = AttribuerDto,
    responses(
        (status = 200, description = "Assigned intervention", body = InterventionModel),
        (status = 404, description = "No such intervention or technician", body = ApiError)
    ),
    tag = "interventions"
)]
pub async fn attribuer_intervention(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<AttribuerDto>,
) -> Result<Json<InterventionModel>, ApiError> {
    let tech_repo = TechnicienRepository::new(&state.db);
    let tech = tech_repo
        .find_by_id(request.tech_id)
        .await?
        .ok_or_else(|| not_found("technicien", request.tech_id))?;

    let repo = InterventionRepository::new(&state.db);
    let intervention = repo
        .attribuer(id, tech.id, tech.nom.clone(), request.mode_distribution)
        .await?
        .ok_or_else(|| not_found("intervention", id))?;

    publish(
        &state,
        intervention.id,
        &Event::intervention_updated(json!(intervention)),
    );

    // Device notification is advisory; the assignment stands either way.
    state.push.spawn_send(
        tech.push_token.clone(),
        "Nouvelle intervention".to_string(),
        format!(
            "{} - {}",
            intervention.service,
            intervention.ville.as_deref().unwrap_or("adresse à confirmer")
        ),
        json!({"interventionId": intervention.id}),
    );

    Ok(Json(intervention))
}
