//! # Company Profile Handlers
//!
//! A single-row profile rendered onto the public signing page. Reads are
//! public so the page stays capability-only; writes need a staff token.

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;

use crate::auth::AuthTech;
use crate::error::{validation_error, ApiError};
use crate::models::entreprise::Model as EntrepriseModel;
use crate::repositories::entreprise::EntrepriseProfil;
use crate::repositories::EntrepriseRepository;
use crate::server::AppState;

/// Profile upsert payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntrepriseDto {
    pub nom: String,
    pub siret: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub logo_url: Option<String>,
    pub conditions_devis: Option<String>,
    pub mention_legale: Option<String>,
}

/// Fetch the company profile; `null` until one is configured
#[utoipa::path(
    get,
    path = "/api/entreprise",
    responses(
        (status = 200, description = "The profile, or null", body = Option<EntrepriseModel>)
    ),
    tag = "entreprise"
)]
pub async fn get_entreprise(
    State(state): State<AppState>,
) -> Result<Json<JsonValue>, ApiError> {
    let repo = EntrepriseRepository::new(&state.db);
    Ok(Json(json!(repo.get().await?)))
}

/// Create or replace the company profile
#[utoipa::path(
    put,
    path = "/api/entreprise",
    security(("bearer_auth" = [])),
    request_body = EntrepriseDto,
    responses(
        (status = 200, description = "Stored profile", body = EntrepriseModel),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "entreprise"
)]
pub async fn put_entreprise(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<EntrepriseDto>,
) -> Result<Json<EntrepriseModel>, ApiError> {
    if request.nom.trim().is_empty() {
        return Err(validation_error(
            "Le nom de l'entreprise est obligatoire",
            json!({"field": "nom"}),
        ));
    }

    let repo = EntrepriseRepository::new(&state.db);
    let profil = repo
        .upsert(EntrepriseProfil {
            nom: request.nom.trim().to_string(),
            siret: request.siret,
            telephone: request.telephone,
            email: request.email,
            adresse: request.adresse,
            logo_url: request.logo_url,
            conditions_devis: request.conditions_devis,
            mention_legale: request.mention_legale,
        })
        .await?;

    Ok(Json(profil))
}
