//! Technician entity model
//!
//! Staff, dispatchers and field technicians. Mutated by the technician
//! itself (status/position pings) and by dispatchers (assignment).

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Technicien)]
#[sea_orm(table_name = "techniciens")]
pub struct Model {
    /// Unique identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Login name, unique
    pub nom: String,

    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,

    /// Argon2 password hash (legacy rows may still hold plaintext until
    /// their next successful login)
    #[serde(skip_serializing)]
    pub mdp: String,

    /// Role: admin, teleop or technicien
    pub role: String,

    /// Départements covered, stored as a JSON array of strings
    #[sea_orm(column_type = "Json")]
    pub departements: Option<JsonValue>,

    /// Revenue share percentage for completed interventions
    pub pourcentage_tech: f64,

    pub en_ligne: bool,
    pub en_pause: bool,
    pub actif: bool,

    /// Last known coordinates
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub derniere_connexion: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub derniere_position: Option<DateTimeWithTimeZone>,

    /// Push-notification device token
    pub push_token: Option<String>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
