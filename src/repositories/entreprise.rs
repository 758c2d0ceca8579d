//! # Entreprise Repository
//!
//! Single-row company profile. `get` returns the row if one exists;
//! `upsert` creates it on first save and updates it afterwards.

use crate::models::entreprise::{
    ActiveModel as EntrepriseActiveModel, Entity as Entreprise, Model as EntrepriseModel,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

/// Company profile fields as submitted by the back office
#[derive(Debug, Clone)]
pub struct EntrepriseProfil {
    pub nom: String,
    pub siret: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub logo_url: Option<String>,
    pub conditions_devis: Option<String>,
    pub mention_legale: Option<String>,
}

/// Repository for the company profile row
pub struct EntrepriseRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EntrepriseRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self) -> Result<Option<EntrepriseModel>, DbErr> {
        Entreprise::find().one(self.db).await
    }

    pub async fn upsert(&self, profil: EntrepriseProfil) -> Result<EntrepriseModel, DbErr> {
        let now = Utc::now();

        match self.get().await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.nom = Set(profil.nom);
                active.siret = Set(profil.siret);
                active.telephone = Set(profil.telephone);
                active.email = Set(profil.email);
                active.adresse = Set(profil.adresse);
                active.logo_url = Set(profil.logo_url);
                active.conditions_devis = Set(profil.conditions_devis);
                active.mention_legale = Set(profil.mention_legale);
                active.updated_at = Set(now.into());
                active.update(self.db).await
            }
            None => {
                let fresh = EntrepriseActiveModel {
                    id: Set(Uuid::new_v4()),
                    nom: Set(profil.nom),
                    siret: Set(profil.siret),
                    telephone: Set(profil.telephone),
                    email: Set(profil.email),
                    adresse: Set(profil.adresse),
                    logo_url: Set(profil.logo_url),
                    conditions_devis: Set(profil.conditions_devis),
                    mention_legale: Set(profil.mention_legale),
                    updated_at: Set(now.into()),
                };
                fresh.insert(self.db).await
            }
        }
    }
}
