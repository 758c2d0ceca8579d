//! # Auth API Handlers
//!
//! Login/logout for staff accounts plus device push-token registration.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{check_password, hash_password, issue_token, AuthTech, PasswordCheck};
use crate::error::{unauthorized, ApiError};
use crate::models::technicien::Model as TechnicienModel;
use crate::repositories::TechnicienRepository;
use crate::server::AppState;

/// Login request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub nom: String,
    pub mdp: String,
}

/// Login response: bearer token plus the authenticated account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub technicien: TechnicienModel,
}

/// Push-token registration payload; `null` clears the stored token
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushTokenRequest {
    pub push_token: Option<String>,
}

/// Authenticate a staff account and issue a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Unknown account or wrong password", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);

    let tech = repo
        .find_by_nom(request.nom.trim())
        .await?
        .filter(|t| t.actif)
        .ok_or_else(|| unauthorized(Some("Identifiants invalides")))?;

    match check_password(&request.mdp, &tech.mdp) {
        PasswordCheck::Hashed => {}
        PasswordCheck::LegacyPlaintext => {
            // Legacy row: replace the plaintext with a hash now that we
            // hold the password.
            match hash_password(&request.mdp) {
                Ok(hash) => repo.set_mdp(tech.id, hash).await?,
                Err(err) => tracing::warn!("Password upgrade failed: {}", err),
            }
        }
        PasswordCheck::Mismatch => {
            return Err(unauthorized(Some("Identifiants invalides")));
        }
    }

    repo.touch_connexion(tech.id).await?;

    let token = issue_token(&tech, &state.config.jwt_secret, state.config.jwt_ttl_days)
        .map_err(|err| {
            tracing::error!("Token issuance failed: {}", err);
            ApiError::from(crate::error::ErrorType::InternalServerError)
        })?;

    // Re-read so the response reflects en_ligne/derniere_connexion.
    let technicien = repo
        .find_by_id(tech.id)
        .await?
        .ok_or_else(|| crate::error::not_found("technicien", tech.id))?;

    tracing::info!("Technicien {} logged in", technicien.nom);
    Ok(Json(LoginResponse { token, technicien }))
}

/// Mark the account offline and clear its push token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthTech,
) -> Result<axum::http::StatusCode, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    repo.set_en_ligne(auth.id, false).await?;
    repo.set_push_token(auth.id, None).await?;

    tracing::info!("Technicien {} logged out", auth.nom);
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// The account behind the presented token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = TechnicienModel),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Account no longer exists", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthTech,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| crate::error::not_found("technicien", auth.id))?;

    Ok(Json(tech))
}

/// Register (or clear) the device push token for the current account
#[utoipa::path(
    post,
    path = "/api/auth/push-token",
    security(("bearer_auth" = [])),
    request_body = PushTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = TechnicienModel),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register_push_token(
    State(state): State<AppState>,
    auth: AuthTech,
    Json(request): Json<PushTokenRequest>,
) -> Result<Json<TechnicienModel>, ApiError> {
    let repo = TechnicienRepository::new(&state.db);
    let tech = repo
        .set_push_token(auth.id, request.push_token)
        .await?
        .ok_or_else(|| crate::error::not_found("technicien", auth.id))?;

    Ok(Json(tech))
}
