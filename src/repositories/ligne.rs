//! # Ligne Repository
//!
//! Data access for advertised phone lines.

use crate::models::ligne::{
    ActiveModel as LigneActiveModel, Column, Entity as Ligne, Model as LigneModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, ModelTrait,
    QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateLigneRequest {
    pub nom: String,
    pub service: Option<String>,
    pub numero: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLigneRequest {
    pub nom: Option<String>,
    pub service: Option<String>,
    pub numero: Option<String>,
}

pub struct LigneRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LigneRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateLigneRequest) -> Result<LigneModel, DbErr> {
        let ligne = LigneActiveModel {
            id: Set(Uuid::new_v4()),
            nom: Set(request.nom),
            service: Set(request.service),
            numero: Set(request.numero),
            created_at: Set(Utc::now().into()),
        };

        ligne.insert(self.db).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LigneModel>, DbErr> {
        Ligne::find_by_id(id).one(self.db).await
    }

    pub async fn list(&self) -> Result<Vec<LigneModel>, DbErr> {
        Ligne::find().order_by_asc(Column::Nom).all(self.db).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateLigneRequest,
    ) -> Result<Option<LigneModel>, DbErr> {
        let Some(ligne) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = ligne.into_active_model();
        if let Some(nom) = request.nom {
            active.nom = Set(nom);
        }
        if let Some(service) = request.service {
            active.service = Set(Some(service));
        }
        if let Some(numero) = request.numero {
            active.numero = Set(Some(numero));
        }

        active.update(self.db).await.map(Some)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let Some(ligne) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        ligne.delete(self.db).await?;
        Ok(true)
    }
}
