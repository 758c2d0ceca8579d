//! # Repository Layer
//!
//! Repositories encapsulate the SeaORM operations for each entity. They
//! return [`sea_orm::DbErr`] and stay free of HTTP vocabulary; handlers map
//! the result through the conversions in [`crate::error`].

pub mod depense_pub;
pub mod devis;
pub mod entreprise;
pub mod facture;
pub mod intervention;
pub mod ligne;
pub mod technicien;

pub use depense_pub::DepensePubRepository;
pub use devis::DevisRepository;
pub use entreprise::EntrepriseRepository;
pub use facture::FactureRepository;
pub use intervention::InterventionRepository;
pub use ligne::LigneRepository;
pub use technicien::TechnicienRepository;
