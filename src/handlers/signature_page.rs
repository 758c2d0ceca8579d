//! # Public Signing Page
//!
//! Serves the HTML signature surface for a quote. The URL is the
//! capability: anyone holding the devis UUID can open it. First open of a
//! sent quote flips it to `vu` so the back office sees the consultation.

use axum::extract::{Path, State};
use axum::response::Html;
use serde_json::json;
use uuid::Uuid;

use crate::error::{not_found, ApiError};
use crate::realtime::{Event, DISPATCH_ROOM};
use crate::render::render_signature_page;
use crate::repositories::{DevisRepository, EntrepriseRepository};
use crate::server::AppState;

/// Signing surface for one quote
#[utoipa::path(
    get,
    path = "/signature/{devis_id}",
    params(("devis_id" = Uuid, Path, description = "Devis UUID, acts as the access capability")),
    responses(
        (status = 200, description = "Signing page HTML", content_type = "text/html"),
        (status = 404, description = "No such quote", body = ApiError)
    ),
    tag = "devis"
)]
pub async fn signature_page(
    State(state): State<AppState>,
    Path(devis_id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let repo = DevisRepository::new(&state.db);
    let mut devis = repo
        .find_by_id(devis_id)
        .await?
        .ok_or_else(|| not_found("devis", devis_id))?;

    // First consultation of a sent quote is a lifecycle event. The
    // conditional update is a no-op on every other status.
    if devis.statut == "envoye" && repo.mark_vu(devis_id).await? {
        devis = repo
            .find_by_id(devis_id)
            .await?
            .ok_or_else(|| not_found("devis", devis_id))?;

        let room = format!("devis:{devis_id}");
        state.hub.publish_rooms(
            &[room.as_str(), DISPATCH_ROOM],
            &Event::devis_updated(json!(devis)),
        );
    }

    let entreprise = EntrepriseRepository::new(&state.db).get().await?;
    Ok(Html(render_signature_page(&devis, entreprise.as_ref())))
}
