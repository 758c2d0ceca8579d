//! # Devis API Handlers
//!
//! Quote CRUD plus the lifecycle operations. Transitions never write the
//! status column free-form: the staff-facing paths validate against the
//! lifecycle engine, and the store-level conditional updates settle races.
//! `signer` and `refuser` are public; knowing the quote's UUID is the
//! capability the signing link hands out.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{conflict, not_found, validation_error, ApiError};
use crate::lifecycle::{
    self, can_advance, compute_totaux, validate_lignes, verify_totaux, DevisEvent, DevisStatut,
    LigneDevis, Totaux,
};
use crate::models::devis::Model as DevisModel;
use crate::models::facture::Model as FactureModel;
use crate::realtime::{Event, DISPATCH_ROOM};
use crate::repositories::devis::{CreateDevisRequest, UpdateDevisRequest};
use crate::repositories::{DevisRepository, FactureRepository, TechnicienRepository};
use crate::server::AppState;
use crate::signature::{validate_signer_name, SignatureArtifact};

/// Create payload for a quote
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDevisDto {
    pub intervention_id: Option<Uuid>,
    pub client_nom: String,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,
    pub lignes: Vec<LigneDevis>,
    pub total_ht: Option<f64>,
    pub total_tva: Option<f64>,
    pub total_ttc: Option<f64>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_validite: Option<DateTimeWithTimeZone>,
}

/// Partial update payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDevisDto {
    pub client_nom: Option<String>,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,
    pub lignes: Option<Vec<LigneDevis>>,
    pub total_ht: Option<f64>,
    pub total_tva: Option<f64>,
    pub total_ttc: Option<f64>,
    pub statut: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_validite: Option<DateTimeWithTimeZone>,
}

/// Public signature submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignerDto {
    pub signature_data: Option<String>,
    pub signe_par: Option<String>,
}

/// Public refusal submission
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefuserDto {
    pub motif: Option<String>,
}

/// List query filters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DevisQuery {
    pub statut: Option<String>,
}

/// Resolve totals: verify the caller's arithmetic when supplied, recompute
/// otherwise.
fn resolve_totaux(
    lignes: &[LigneDevis],
    total_ht: Option<f64>,
    total_tva: Option<f64>,
    total_ttc: Option<f64>,
) -> Result<Totaux, ApiError> {
    validate_lignes(lignes)?;
    match (total_ht, total_tva, total_ttc) {
        (Some(ht), Some(tva), Some(ttc)) => Ok(verify_totaux(lignes, ht, tva, ttc)?),
        _ => Ok(compute_totaux(lignes)),
    }
}

fn publish_devis(state: &AppState, devis: &DevisModel) {
    let room = format!("devis:{}", devis.id);
    state
        .hub
        .publish_rooms(&[room.as_str(), DISPATCH_ROOM], &Event::devis_updated(json!(devis)));
}

/// Fan a notification out to every admin/teleop device. Advisory, like all
/// push traffic: a token lookup failure is logged and dropped.
async fn notify_back_office(state: &AppState, devis: &DevisModel, title: &str, body: String) {
    let tokens = match TechnicienRepository::new(&state.db).admin_push_tokens().await {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::warn!("Back-office token lookup failed: {}", err);
            return;
        }
    };

    for token in tokens {
        state.push.spawn_send(
            Some(token),
            title.to_string(),
            body.clone(),
            json!({"devisId": devis.id}),
        );
    }
}

/// List quotes, newest first
#[utoipa::path(
    get,
    path = "/api/devis",
    security(("bearer_auth" = [])),
    params(("statut" = Option<String>, Query, description = "Filter by lifecycle status")),
    responses(
        (status = 200, description = "Matching quotes", body = [DevisModel]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn list_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Query(query): Query<DevisQuery>,
) -> Result<Json<Vec<DevisModel>>, ApiError> {
    if let Some(statut) = &query.statut {
        DevisStatut::parse(statut)?;
    }
    let repo = DevisRepository::new(&state.db);
    Ok(Json(repo.list(query.statut).await?))
}

/// Create a quote in `brouillon`
#[utoipa::path(
    post,
    path = "/api/devis",
    security(("bearer_auth" = [])),
    request_body = CreateDevisDto,
    responses(
        (status = 201, description = "Quote created", body = DevisModel),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn create_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Json(request): Json<CreateDevisDto>,
) -> Result<(StatusCode, Json<DevisModel>), ApiError> {
    if request.client_nom.trim().is_empty() {
        return Err(validation_error(
            "Le nom du client est obligatoire",
            json!({"field": "client_nom"}),
        ));
    }
    if request.lignes.is_empty() {
        return Err(validation_error(
            "Au moins une ligne est requise",
            json!({"field": "lignes"}),
        ));
    }

    let totaux = resolve_totaux(
        &request.lignes,
        request.total_ht,
        request.total_tva,
        request.total_ttc,
    )?;

    let repo = DevisRepository::new(&state.db);
    let devis = repo
        .create(CreateDevisRequest {
            intervention_id: request.intervention_id,
            client_nom: request.client_nom.trim().to_string(),
            client_prenom: request.client_prenom,
            client_email: request.client_email,
            client_tel: request.client_tel,
            client_adresse: request.client_adresse,
            client_cp: request.client_cp,
            client_ville: request.client_ville,
            lignes: request.lignes,
            totaux,
            date_validite: request.date_validite,
        })
        .await?;

    // No broadcast on create: a brouillon is invisible to the dashboards
    // until it is sent.
    Ok((StatusCode::CREATED, Json(devis)))
}

/// Fetch one quote
#[utoipa::path(
    get,
    path = "/api/devis/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Devis UUID")),
    responses(
        (status = 200, description = "The quote", body = DevisModel),
        (status = 404, description = "No such quote", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn get_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<Json<DevisModel>, ApiError> {
    let repo = DevisRepository::new(&state.db);
    let devis = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("devis", id))?;
    Ok(Json(devis))
}

/// Update a quote. Monetary fields are immutable once signed; status moves
/// only forward, and the signature/invoice transitions have their own
/// endpoints.
#[utoipa::path(
    put,
    path = "/api/devis/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Devis UUID")),
    request_body = UpdateDevisDto,
    responses(
        (status = 200, description = "Updated quote", body = DevisModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "No such quote", body = ApiError),
        (status = 409, description = "Lifecycle conflict", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn update_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDevisDto>,
) -> Result<Json<DevisModel>, ApiError> {
    let repo = DevisRepository::new(&state.db);
    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("devis", id))?;
    let current_statut = DevisStatut::parse(&current.statut)?;

    let lignes = match request.lignes {
        Some(lignes) => {
            if current_statut.is_locked() {
                return Err(lifecycle::TransitionError::MonetaryFieldsLocked {
                    statut: current_statut,
                }
                .into());
            }
            if lignes.is_empty() {
                return Err(validation_error(
                    "Au moins une ligne est requise",
                    json!({"field": "lignes"}),
                ));
            }
            let totaux = resolve_totaux(
                &lignes,
                request.total_ht,
                request.total_tva,
                request.total_ttc,
            )?;
            Some((lignes, totaux))
        }
        None => None,
    };

    // Status changes through PUT are limited to the staff-driven moves;
    // signing, refusing and invoicing have dedicated endpoints.
    if let Some(target) = &request.statut {
        let target = DevisStatut::parse(target)?;
        can_advance(current_statut, target)?;
        match target {
            t if t == current_statut => {}
            DevisStatut::Envoye => {
                if !repo.envoyer(id).await? {
                    return Err(conflict("Le devis a changé d'état, réessayez"));
                }
            }
            DevisStatut::Vu => {
                if !repo.mark_vu(id).await? {
                    return Err(conflict("Le devis a changé d'état, réessayez"));
                }
            }
            _ => {
                return Err(validation_error(
                    "Ce changement de statut passe par son endpoint dédié",
                    json!({"statut": target.as_str()}),
                ));
            }
        }
    }

    let devis = repo
        .update(
            id,
            UpdateDevisRequest {
                client_nom: request.client_nom,
                client_prenom: request.client_prenom,
                client_email: request.client_email,
                client_tel: request.client_tel,
                client_adresse: request.client_adresse,
                client_cp: request.client_cp,
                client_ville: request.client_ville,
                lignes,
                date_validite: request.date_validite,
            },
        )
        .await?
        .ok_or_else(|| not_found("devis", id))?;

    publish_devis(&state, &devis);
    Ok(Json(devis))
}

/// Delete a quote (only before it is signed)
#[utoipa::path(
    delete,
    path = "/api/devis/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Devis UUID")),
    responses(
        (status = 204, description = "Quote deleted"),
        (status = 404, description = "No such quote", body = ApiError),
        (status = 409, description = "Signed quotes cannot be deleted", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn delete_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = DevisRepository::new(&state.db);
    let devis = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("devis", id))?;

    if DevisStatut::parse(&devis.statut)?.is_locked() {
        return Err(conflict("Un devis signé ou facturé ne peut pas être supprimé"));
    }

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record the client's signature (public endpoint behind the signing link)
#[utoipa::path(
    post,
    path = "/api/devis/{id}/signer",
    params(("id" = Uuid, Path, description = "Devis UUID")),
    request_body = SignerDto,
    responses(
        (status = 200, description = "Signed quote", body = DevisModel),
        (status = 400, description = "Artifact or signer name rejected", body = ApiError),
        (status = 404, description = "No such quote", body = ApiError),
        (status = 409, description = "Quote is not in a signable state", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn signer_devis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SignerDto>,
) -> Result<Json<DevisModel>, ApiError> {
    let artifact = SignatureArtifact::parse(request.signature_data.as_deref())?;
    let signe_par = validate_signer_name(request.signe_par.as_deref())?;

    let repo = DevisRepository::new(&state.db);
    let signed = repo
        .sign(id, artifact.into_data_uri(), signe_par)
        .await?;

    match signed {
        Some(devis) => {
            tracing::info!("Devis {} signed by {:?}", devis.numero, devis.signe_par);
            publish_devis(&state, &devis);
            notify_back_office(
                &state,
                &devis,
                "Devis signé",
                format!(
                    "Devis {} signé par {}",
                    devis.numero,
                    devis.signe_par.as_deref().unwrap_or("le client")
                ),
            )
            .await;
            Ok(Json(devis))
        }
        None => {
            // Lost the race or never signable; report the precise conflict.
            let devis = repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| not_found("devis", id))?;
            let statut = DevisStatut::parse(&devis.statut)?;
            match lifecycle::apply(statut, DevisEvent::Signer) {
                Err(err) => Err(err.into()),
                // The row moved under us between the update and the re-read.
                Ok(_) => Err(conflict("Le devis a changé d'état, réessayez")),
            }
        }
    }
}

/// Record the client's refusal (public endpoint behind the signing link)
#[utoipa::path(
    post,
    path = "/api/devis/{id}/refuser",
    params(("id" = Uuid, Path, description = "Devis UUID")),
    request_body = RefuserDto,
    responses(
        (status = 200, description = "Refused quote", body = DevisModel),
        (status = 404, description = "No such quote", body = ApiError),
        (status = 409, description = "Quote can no longer be refused", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn refuser_devis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RefuserDto>,
) -> Result<Json<DevisModel>, ApiError> {
    let motif = request
        .motif
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let repo = DevisRepository::new(&state.db);
    match repo.refuse(id, motif).await? {
        Some(devis) => {
            tracing::info!("Devis {} refused", devis.numero);
            publish_devis(&state, &devis);
            Ok(Json(devis))
        }
        None => {
            let devis = repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| not_found("devis", id))?;
            let statut = DevisStatut::parse(&devis.statut)?;
            match lifecycle::apply(statut, DevisEvent::Refuser) {
                Err(err) => Err(err.into()),
                Ok(_) => Err(conflict("Le devis a changé d'état, réessayez")),
            }
        }
    }
}

/// Turn a signed quote into an invoice. Idempotent: retrying after success
/// returns the invoice created the first time.
#[utoipa::path(
    post,
    path = "/api/devis/{id}/facturer",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Devis UUID")),
    responses(
        (status = 201, description = "Invoice created", body = FactureModel),
        (status = 200, description = "Invoice already existed", body = FactureModel),
        (status = 404, description = "No such quote", body = ApiError),
        (status = 409, description = "Quote is not signed", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn facturer_devis(
    State(state): State<AppState>,
    _auth: AuthTech,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<FactureModel>), ApiError> {
    let repo = DevisRepository::new(&state.db);
    let facture_repo = FactureRepository::new(&state.db);

    let devis = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("devis", id))?;
    let statut = DevisStatut::parse(&devis.statut)?;

    // A retry after a completed facturation is answered with the existing
    // invoice rather than a conflict.
    if statut == DevisStatut::Facture
        && let Some(existing) = facture_repo.find_by_devis(id).await?
    {
        return Ok((StatusCode::OK, Json(existing)));
    }

    lifecycle::apply(statut, DevisEvent::Facturer)?;

    let facture = facture_repo.create_for_devis(&devis).await?;
    repo.mark_facture(id).await?;

    let devis = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("devis", id))?;
    tracing::info!("Devis {} invoiced as facture {}", devis.numero, facture.id);
    publish_devis(&state, &devis);

    Ok((StatusCode::CREATED, Json(facture)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup_state() -> AppState {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        AppState::new(AppConfig::default(), db)
    }

    fn staff() -> AuthTech {
        AuthTech {
            id: Uuid::new_v4(),
            nom: "admin".to_string(),
            role: "admin".to_string(),
        }
    }

    fn draft_dto() -> CreateDevisDto {
        CreateDevisDto {
            intervention_id: None,
            client_nom: "Durand".to_string(),
            client_prenom: None,
            client_email: None,
            client_tel: None,
            client_adresse: None,
            client_cp: None,
            client_ville: None,
            lignes: vec![LigneDevis {
                description: "Ouverture de porte".to_string(),
                quantite: 1.0,
                prix_unitaire: 80.0,
                tva_taux: 20.0,
            }],
            total_ht: None,
            total_tva: None,
            total_ttc: None,
            date_validite: None,
        }
    }

    #[tokio::test]
    async fn creating_a_draft_stays_off_the_wire() {
        let state = setup_state().await;
        let (conn_id, mut frames) = state.hub.register();
        state.hub.join(conn_id, DISPATCH_ROOM);

        let (status, Json(devis)) =
            create_devis(State(state.clone()), staff(), Json(draft_dto()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(devis.statut, "brouillon");
        assert!(frames.try_recv().is_err());

        // Sending it is where the dashboards first hear about it.
        let Json(sent) = update_devis(
            State(state.clone()),
            staff(),
            Path(devis.id),
            Json(UpdateDevisDto {
                statut: Some("envoye".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(sent.statut, "envoye");

        let frame = frames.try_recv().unwrap();
        assert!(frame.contains("devis:updated"));
    }

    #[tokio::test]
    async fn repeating_the_current_status_is_a_noop() {
        let state = setup_state().await;

        let (_, Json(devis)) = create_devis(State(state.clone()), staff(), Json(draft_dto()))
            .await
            .unwrap();

        let envoye_dto = || UpdateDevisDto {
            statut: Some("envoye".to_string()),
            ..Default::default()
        };

        update_devis(State(state.clone()), staff(), Path(devis.id), Json(envoye_dto()))
            .await
            .unwrap();

        // Re-asserting the status the row already holds must not trip the
        // conditional-update conflict path.
        let Json(unchanged) =
            update_devis(State(state.clone()), staff(), Path(devis.id), Json(envoye_dto()))
                .await
                .unwrap();
        assert_eq!(unchanged.statut, "envoye");
    }
}
