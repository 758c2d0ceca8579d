//! Devis entity model
//!
//! The quote. Client contact data is a snapshot copied at creation time,
//! not a live reference: the devis must stay valid even if the client
//! record later changes. The row is also the blob store for the signature
//! artifact (inline data URI).

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Devis)]
#[sea_orm(table_name = "devis")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-facing reference, unique (e.g. DEV-20250114-3F2A)
    pub numero: String,

    pub intervention_id: Option<Uuid>,

    /// Client snapshot
    pub client_nom: String,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,

    /// Ordered line items, JSON array of [`crate::lifecycle::LigneDevis`]
    #[sea_orm(column_type = "Json")]
    pub lignes: JsonValue,

    pub total_ht: f64,
    pub total_tva: f64,
    pub total_ttc: f64,

    /// Lifecycle status, see [`crate::lifecycle::DevisStatut`]
    pub statut: String,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_validite: Option<DateTimeWithTimeZone>,

    /// Signature artifact: PNG data URI, absent until signed, immutable
    /// thereafter
    #[sea_orm(column_type = "Text", nullable)]
    pub signature_data: Option<String>,
    pub signe_par: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub signe_le: Option<DateTimeWithTimeZone>,

    /// Refusal reason (free text)
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
