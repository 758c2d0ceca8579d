//! Intervention entity model
//!
//! A dispatched field-service job. Its status vocabulary ("En attente",
//! "Attribuée", "Terminée", ...) is free-form and independent of the devis
//! state machine; both emit events on the same realtime bus.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Intervention)]
#[sea_orm(table_name = "interventions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Service type (serrurerie, plomberie, ...)
    pub service: String,

    pub statut: String,
    pub description: Option<String>,

    pub client_nom: Option<String>,
    pub adresse: Option<String>,
    pub cp: Option<String>,
    pub ville: Option<String>,
    pub telephone: Option<String>,

    /// Agreed price, feeds the profitability report
    pub prix: Option<f64>,

    /// Assignment
    pub tech_id: Option<Uuid>,
    pub tech_nom: Option<String>,
    pub mode_distribution: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_attribution: Option<DateTimeWithTimeZone>,

    /// Ad line that generated the call (optional)
    pub ligne_id: Option<Uuid>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
