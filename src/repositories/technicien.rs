//! # Technician Repository
//!
//! Data access for technician accounts: CRUD for the back office, plus the
//! narrow field updates driven by the mobile app (position pings, pause and
//! online flags, push token registration).

use crate::models::technicien::{
    ActiveModel as TechnicienActiveModel, Column, Entity as Technicien, Model as TechnicienModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Request data for creating a technician account
#[derive(Debug, Clone)]
pub struct CreateTechnicienRequest {
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    /// Argon2 hash, never the plaintext
    pub mdp: String,
    pub role: String,
    pub departements: Option<JsonValue>,
    pub pourcentage_tech: f64,
}

/// Partial update for a technician; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTechnicienRequest {
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub role: Option<String>,
    pub departements: Option<JsonValue>,
    pub pourcentage_tech: Option<f64>,
    pub actif: Option<bool>,
}

/// Repository for technician database operations
pub struct TechnicienRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TechnicienRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a technician account
    pub async fn create(
        &self,
        request: CreateTechnicienRequest,
    ) -> Result<TechnicienModel, sea_orm::DbErr> {
        let now = Utc::now();

        let tech = TechnicienActiveModel {
            id: Set(Uuid::new_v4()),
            nom: Set(request.nom),
            prenom: Set(request.prenom),
            email: Set(request.email),
            telephone: Set(request.telephone),
            mdp: Set(request.mdp),
            role: Set(request.role),
            departements: Set(request.departements),
            pourcentage_tech: Set(request.pourcentage_tech),
            en_ligne: Set(false),
            en_pause: Set(false),
            actif: Set(true),
            latitude: Set(None),
            longitude: Set(None),
            derniere_connexion: Set(None),
            derniere_position: Set(None),
            push_token: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        tech.insert(self.db).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        Technicien::find_by_id(id).one(self.db).await
    }

    /// Look a technician up by login name (unique)
    pub async fn find_by_nom(&self, nom: &str) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        Technicien::find()
            .filter(Column::Nom.eq(nom))
            .one(self.db)
            .await
    }

    pub async fn list(&self) -> Result<Vec<TechnicienModel>, sea_orm::DbErr> {
        Technicien::find()
            .order_by_asc(Column::Nom)
            .all(self.db)
            .await
    }

    /// Device tokens of back-office roles, for devis event fan-out. Both
    /// capitalizations survive in historical rows.
    pub async fn admin_push_tokens(&self) -> Result<Vec<String>, sea_orm::DbErr> {
        let rows = Technicien::find()
            .filter(Column::Role.is_in(["admin", "teleop", "Admin", "Teleop"]))
            .filter(Column::PushToken.is_not_null())
            .all(self.db)
            .await?;

        Ok(rows.into_iter().filter_map(|t| t.push_token).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateTechnicienRequest,
    ) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = tech.into_active_model();
        if let Some(prenom) = request.prenom {
            active.prenom = Set(Some(prenom));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(telephone) = request.telephone {
            active.telephone = Set(Some(telephone));
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(departements) = request.departements {
            active.departements = Set(Some(departements));
        }
        if let Some(pourcentage) = request.pourcentage_tech {
            active.pourcentage_tech = Set(pourcentage);
        }
        if let Some(actif) = request.actif {
            active.actif = Set(actif);
        }
        active.updated_at = Set(Utc::now().into());

        active.update(self.db).await.map(Some)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        tech.delete(self.db).await?;
        Ok(true)
    }

    /// Replace the stored password hash (also used to upgrade legacy
    /// plaintext rows on successful login)
    pub async fn set_mdp(&self, id: Uuid, mdp_hash: String) -> Result<(), sea_orm::DbErr> {
        if let Some(tech) = self.find_by_id(id).await? {
            let mut active = tech.into_active_model();
            active.mdp = Set(mdp_hash);
            active.updated_at = Set(Utc::now().into());
            active.update(self.db).await?;
        }
        Ok(())
    }

    /// Record a successful login
    pub async fn touch_connexion(&self, id: Uuid) -> Result<(), sea_orm::DbErr> {
        if let Some(tech) = self.find_by_id(id).await? {
            let now = Utc::now();
            let mut active = tech.into_active_model();
            active.en_ligne = Set(true);
            active.derniere_connexion = Set(Some(now.into()));
            active.updated_at = Set(now.into());
            active.update(self.db).await?;
        }
        Ok(())
    }

    /// Store the device push token (cleared with `None` on logout)
    pub async fn set_push_token(
        &self,
        id: Uuid,
        push_token: Option<String>,
    ) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = tech.into_active_model();
        active.push_token = Set(push_token);
        active.updated_at = Set(Utc::now().into());
        active.update(self.db).await.map(Some)
    }

    /// Position ping from the field
    pub async fn set_position(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut active = tech.into_active_model();
        active.latitude = Set(Some(latitude));
        active.longitude = Set(Some(longitude));
        active.derniere_position = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(self.db).await.map(Some)
    }

    /// Online/offline toggle
    pub async fn set_en_ligne(
        &self,
        id: Uuid,
        en_ligne: bool,
    ) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = tech.into_active_model();
        active.en_ligne = Set(en_ligne);
        active.updated_at = Set(Utc::now().into());
        active.update(self.db).await.map(Some)
    }

    /// Pause toggle
    pub async fn set_en_pause(
        &self,
        id: Uuid,
        en_pause: bool,
    ) -> Result<Option<TechnicienModel>, sea_orm::DbErr> {
        let Some(tech) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = tech.into_active_model();
        active.en_pause = Set(en_pause);
        active.updated_at = Set(Utc::now().into());
        active.update(self.db).await.map(Some)
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

    fn sample_request(nom: &str) -> CreateTechnicienRequest {
        CreateTechnicienRequest {
            nom: nom.to_string(),
            prenom: Some("Karim".to_string()),
            email: None,
            telephone: None,
            mdp: "$argon2id$stub".to_string(),
            role: "technicien".to_string(),
            departements: Some(serde_json::json!(["75", "92"])),
            pourcentage_tech: 50.0,
        }
    }

    #[tokio::test]
    async fn create_and_find_by_nom() {
        let db = setup_test_db().await;
        let repo = TechnicienRepository::new(&db);

        let created = repo.create(sample_request("karim")).await.unwrap();
        assert_eq!(created.role, "technicien");
        assert!(!created.en_ligne);

        let found = repo.find_by_nom("karim").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(created.id));

        let missing = repo.find_by_nom("nobody").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn nom_is_unique() {
        let db = setup_test_db().await;
        let repo = TechnicienRepository::new(&db);

        repo.create(sample_request("karim")).await.unwrap();
        let duplicate = repo.create(sample_request("karim")).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn position_ping_updates_coordinates() {
        let db = setup_test_db().await;
        let repo = TechnicienRepository::new(&db);

        let created = repo.create(sample_request("karim")).await.unwrap();
        let updated = repo
            .set_position(created.id, 48.8566, 2.3522)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.latitude, Some(48.8566));
        assert_eq!(updated.longitude, Some(2.3522));
        assert!(updated.derniere_position.is_some());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let db = setup_test_db().await;
        let repo = TechnicienRepository::new(&db);

        let created = repo.create(sample_request("karim")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                UpdateTechnicienRequest {
                    role: Some("teleop".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, "teleop");
        assert_eq!(updated.prenom, Some("Karim".to_string()));
        assert_eq!(updated.pourcentage_tech, 50.0);
    }

    #[tokio::test]
    async fn delete_missing_returns_false() {
        let db = setup_test_db().await;
        let repo = TechnicienRepository::new(&db);

        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());

        let created = repo.create(sample_request("karim")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
    }
}
