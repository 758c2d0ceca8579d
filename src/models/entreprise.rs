//! Company profile entity (single row), rendered on the signing surface.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Entreprise)]
#[sea_orm(table_name = "entreprise_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub nom: String,
    pub siret: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub logo_url: Option<String>,

    /// Terms shown above the signature block
    #[sea_orm(column_type = "Text", nullable)]
    pub conditions_devis: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mention_legale: Option<String>,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
