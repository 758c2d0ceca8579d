//! # Data Models
//!
//! SeaORM entities for the durable record store, plus small shared response
//! types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod depense_pub;
pub mod devis;
pub mod entreprise;
pub mod facture;
pub mod intervention;
pub mod ligne;
pub mod technicien;

pub use depense_pub::Entity as DepensePub;
pub use devis::Entity as Devis;
pub use entreprise::Entity as Entreprise;
pub use facture::Entity as Facture;
pub use intervention::Entity as Intervention;
pub use ligne::Entity as Ligne;
pub use technicien::Entity as Technicien;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "urgence-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
