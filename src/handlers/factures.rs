//! # Facture API Handlers
//!
//! Invoices are created from signed quotes (`POST /api/devis/{id}/facturer`);
//! here they are listed, fetched and settled.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{not_found, validation_error, ApiError};
use crate::models::facture::Model as FactureModel;
use crate::repositories::facture::PaiementRequest;
use crate::repositories::FactureRepository;
use crate::server::AppState;

/// Payment payload; `montant_paye` defaults to the invoice total
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayerDto {
    pub mode_paiement: String,
    pub reference_paiement: Option<String>,
    pub montant_paye: Option<f64>,
}

/// List query filters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FactureQuery {
    pub statut: Option<String>,
}

/// List invoices, newest first
#[utoipa::path(
    get,
    path = "/api/factures",
    security(("bearer_auth" = [])),
    params(("statut" = Option<String>, Query, description = "Filter: impayee or payee")),
    responses(
        (status = 200, description = "Matching invoices", body = [FactureModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "factures"
)]
pub async fn list_factures(
    State(state): State<AppState>,
    _auth: AuthTech,
    Query(query): Query<FactureQuery>,
) -> Result<Json<Vec<FactureModel>>, ApiError> {
    if let Some(statut) = &query.statut
        && statut != "impayee"
        && statut != "payee"
    {
        return Err(validation_error(
            "Statut de facture inconnu",
            json!({"statut": statut}),
        ));
    }
    let repo = FactureRepository::new(&state.db);
    Ok(Json(repo.list(query.statut.clone()).await?))
}

/// Fetch one invoice
#[utoipa::path(
    get,
    path = "/api/factures/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Facture UUID")),
    responses(
        (status = 200, description = "The invoice", body = FactureModel),
        (status = 404, description = "No such invoice", body = ApiError)
    ),
    tag = "factures"
)]
pub async fn get_facture(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<Json<FactureModel>, ApiError> {
    let repo = FactureRepository::new(&state.db);
    let facture = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("facture", id))?;
    Ok(Json(facture))
}

/// Settle an invoice. Paying an already-paid invoice returns it unchanged.
#[utoipa::path(
    post,
    path = "/api/factures/{id}/payer",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Facture UUID")),
    request_body = PayerDto,
    responses(
        (status = 200, description = "Paid invoice", body = FactureModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "No such invoice", body = ApiError)
    ),
    tag = "factures"
)]
pub async fn payer_facture(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<PayerDto>,
) -> Result<Json<FactureModel>, ApiError> {
    if request.mode_paiement.trim().is_empty() {
        return Err(validation_error(
            "Le mode de paiement est obligatoire",
            json!({"field": "mode_paiement"}),
        ));
    }
    if let Some(montant) = request.montant_paye
        && montant <= 0.0
    {
        return Err(validation_error(
            "Le montant payé doit être positif",
            json!({"field": "montant_paye"}),
        ));
    }

    let repo = FactureRepository::new(&state.db);
    let facture = repo
        .payer(
            id,
            PaiementRequest {
                mode_paiement: request.mode_paiement.trim().to_string(),
                reference_paiement: request.reference_paiement,
                montant_paye: request.montant_paye,
            },
        )
        .await?
        .ok_or_else(|| not_found("facture", id))?;

    tracing::info!("Facture {} settled via {:?}", facture.id, facture.mode_paiement);
    Ok(Json(facture))
}
