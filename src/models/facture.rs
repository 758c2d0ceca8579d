//! Facture entity model
//!
//! Snapshot copy of a signed devis. Created exactly once per devis through
//! the `facturer` transition (the unique index on `devis_id` backs the
//! idempotence), never directly.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Facture)]
#[sea_orm(table_name = "factures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source devis (unique)
    pub devis_id: Uuid,
    pub intervention_id: Option<Uuid>,

    /// Client snapshot copied from the devis
    pub client_nom: String,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,

    #[sea_orm(column_type = "Json")]
    pub lignes: JsonValue,

    pub total_ht: f64,
    pub total_tva: f64,
    pub total_ttc: f64,

    /// Payment state: impayee or payee
    pub statut: String,

    pub mode_paiement: Option<String>,
    pub reference_paiement: Option<String>,
    pub montant_paye: Option<f64>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub payee_le: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
