//! # Intervention Repository
//!
//! Data access for field-service jobs. Listing supports the dispatch
//! board's filters (status, assigned technician); assignment stamps the
//! technician snapshot and the attribution time in one update.

use crate::models::intervention::{
    ActiveModel as InterventionActiveModel, Column, Entity as Intervention,
    Model as InterventionModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for creating an intervention
#[derive(Debug, Clone)]
pub struct CreateInterventionRequest {
    pub service: String,
    pub description: Option<String>,
    pub client_nom: Option<String>,
    pub adresse: Option<String>,
    pub cp: Option<String>,
    pub ville: Option<String>,
    pub telephone: Option<String>,
    pub prix: Option<f64>,
    pub ligne_id: Option<Uuid>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateInterventionRequest {
    pub service: Option<String>,
    pub statut: Option<String>,
    pub description: Option<String>,
    pub client_nom: Option<String>,
    pub adresse: Option<String>,
    pub cp: Option<String>,
    pub ville: Option<String>,
    pub telephone: Option<String>,
    pub prix: Option<f64>,
    pub ligne_id: Option<Uuid>,
}

/// List filters for the dispatch board
#[derive(Debug, Clone, Default)]
pub struct InterventionFilter {
    pub statut: Option<String>,
    pub tech_id: Option<Uuid>,
}

/// Repository for intervention database operations
pub struct InterventionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> InterventionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        request: CreateInterventionRequest,
    ) -> Result<InterventionModel, sea_orm::DbErr> {
        let now = Utc::now();

        let intervention = InterventionActiveModel {
            id: Set(Uuid::new_v4()),
            service: Set(request.service),
            statut: Set("En attente".to_string()),
            description: Set(request.description),
            client_nom: Set(request.client_nom),
            adresse: Set(request.adresse),
            cp: Set(request.cp),
            ville: Set(request.ville),
            telephone: Set(request.telephone),
            prix: Set(request.prix),
            tech_id: Set(None),
            tech_nom: Set(None),
            mode_distribution: Set(None),
            date_attribution: Set(None),
            ligne_id: Set(request.ligne_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        intervention.insert(self.db).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InterventionModel>, sea_orm::DbErr> {
        Intervention::find_by_id(id).one(self.db).await
    }

    /// List newest first, optionally narrowed by status and/or technician
    pub async fn list(
        &self,
        filter: InterventionFilter,
    ) -> Result<Vec<InterventionModel>, sea_orm::DbErr> {
        let mut query = Intervention::find().order_by_desc(Column::CreatedAt);
        if let Some(statut) = filter.statut {
            query = query.filter(Column::Statut.eq(statut));
        }
        if let Some(tech_id) = filter.tech_id {
            query = query.filter(Column::TechId.eq(tech_id));
        }
        query.all(self.db).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateInterventionRequest,
    ) -> Result<Option<InterventionModel>, sea_orm::DbErr> {
        let Some(intervention) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = intervention.into_active_model();
        if let Some(service) = request.service {
            active.service = Set(service);
        }
        if let Some(statut) = request.statut {
            active.statut = Set(statut);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(client_nom) = request.client_nom {
            active.client_nom = Set(Some(client_nom));
        }
        if let Some(adresse) = request.adresse {
            active.adresse = Set(Some(adresse));
        }
        if let Some(cp) = request.cp {
            active.cp = Set(Some(cp));
        }
        if let Some(ville) = request.ville {
            active.ville = Set(Some(ville));
        }
        if let Some(telephone) = request.telephone {
            active.telephone = Set(Some(telephone));
        }
        if let Some(prix) = request.prix {
            active.prix = Set(Some(prix));
        }
        if let Some(ligne_id) = request.ligne_id {
            active.ligne_id = Set(Some(ligne_id));
        }
        active.updated_at = Set(Utc::now().into());

        active.update(self.db).await.map(Some)
    }

    /// Assign the job to a technician
    pub async fn attribuer(
        &self,
        id: Uuid,
        tech_id: Uuid,
        tech_nom: String,
        mode_distribution: String,
    ) -> Result<Option<InterventionModel>, sea_orm::DbErr> {
        let Some(intervention) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut active = intervention.into_active_model();
        active.statut = Set("Attribuée".to_string());
        active.tech_id = Set(Some(tech_id));
        active.tech_nom = Set(Some(tech_nom));
        active.mode_distribution = Set(Some(mode_distribution));
        active.date_attribution = Set(Some(now.into()));
        active.updated_at = Set(now.into());

        active.update(self.db).await.map(Some)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sea_orm::DbErr> {
        let Some(intervention) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        intervention.delete(self.db).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn sample_request(service: &str) -> CreateInterventionRequest {
        CreateInterventionRequest {
            service: service.to_string(),
            description: Some("Porte claquée".to_string()),
            client_nom: Some("Mme Durand".to_string()),
            adresse: Some("12 rue de la Paix".to_string()),
            cp: Some("75002".to_string()),
            ville: Some("Paris".to_string()),
            telephone: Some("0601020304".to_string()),
            prix: Some(180.0),
            ligne_id: None,
        }
    }

    #[tokio::test]
    async fn create_starts_en_attente() {
        let db = setup_test_db().await;
        let repo = InterventionRepository::new(&db);

        let created = repo.create(sample_request("serrurerie")).await.unwrap();
        assert_eq!(created.statut, "En attente");
        assert!(created.tech_id.is_none());
    }

    #[tokio::test]
    async fn attribuer_stamps_assignment() {
        let db = setup_test_db().await;
        let repo = InterventionRepository::new(&db);

        let created = repo.create(sample_request("plomberie")).await.unwrap();
        let tech_id = Uuid::new_v4();
        let assigned = repo
            .attribuer(created.id, tech_id, "Karim".to_string(), "manuel".to_string())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assigned.statut, "Attribuée");
        assert_eq!(assigned.tech_id, Some(tech_id));
        assert_eq!(assigned.tech_nom, Some("Karim".to_string()));
        assert!(assigned.date_attribution.is_some());
    }

    #[tokio::test]
    async fn list_filters_by_statut_and_tech() {
        let db = setup_test_db().await;
        let repo = InterventionRepository::new(&db);

        let a = repo.create(sample_request("serrurerie")).await.unwrap();
        let b = repo.create(sample_request("plomberie")).await.unwrap();
        let tech_id = Uuid::new_v4();
        repo.attribuer(b.id, tech_id, "Karim".to_string(), "auto".to_string())
            .await
            .unwrap();

        let pending = repo
            .list(InterventionFilter {
                statut: Some("En attente".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let mine = repo
            .list(InterventionFilter {
                tech_id: Some(tech_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, b.id);
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let db = setup_test_db().await;
        let repo = InterventionRepository::new(&db);

        let result = repo
            .update(Uuid::new_v4(), UpdateInterventionRequest::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
