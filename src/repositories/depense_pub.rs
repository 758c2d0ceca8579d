//! # Advertising Spend Repository
//!
//! Data access for per-line advertising spend entries; feeds the
//! profitability report.

use crate::models::depense_pub::{
    ActiveModel as DepensePubActiveModel, Column, Entity as DepensePub, Model as DepensePubModel,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateDepenseRequest {
    pub ligne_id: Uuid,
    pub montant: f64,
    pub date: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDepenseRequest {
    pub montant: Option<f64>,
    pub date: Option<DateTimeWithTimeZone>,
}

pub struct DepensePubRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DepensePubRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateDepenseRequest) -> Result<DepensePubModel, DbErr> {
        let depense = DepensePubActiveModel {
            id: Set(Uuid::new_v4()),
            ligne_id: Set(request.ligne_id),
            montant: Set(request.montant),
            date: Set(request.date),
            created_at: Set(Utc::now().into()),
        };

        depense.insert(self.db).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DepensePubModel>, DbErr> {
        DepensePub::find_by_id(id).one(self.db).await
    }

    /// List newest first, optionally narrowed to one line
    pub async fn list(&self, ligne_id: Option<Uuid>) -> Result<Vec<DepensePubModel>, DbErr> {
        let mut query = DepensePub::find().order_by_desc(Column::Date);
        if let Some(ligne_id) = ligne_id {
            query = query.filter(Column::LigneId.eq(ligne_id));
        }
        query.all(self.db).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDepenseRequest,
    ) -> Result<Option<DepensePubModel>, DbErr> {
        let Some(depense) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = depense.into_active_model();
        if let Some(montant) = request.montant {
            active.montant = Set(montant);
        }
        if let Some(date) = request.date {
            active.date = Set(date);
        }

        active.update(self.db).await.map(Some)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let Some(depense) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        depense.delete(self.db).await?;
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

    #[tokio::test]
    async fn list_filters_by_ligne() {
        let db = setup_test_db().await;
        let repo = DepensePubRepository::new(&db);

        let ligne_a = Uuid::new_v4();
        let ligne_b = Uuid::new_v4();
        let now = Utc::now();

        repo.create(CreateDepenseRequest {
            ligne_id: ligne_a,
            montant: 150.0,
            date: now.into(),
        })
        .await
        .unwrap();
        repo.create(CreateDepenseRequest {
            ligne_id: ligne_b,
            montant: 90.0,
            date: now.into(),
        })
        .await
        .unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_a = repo.list(Some(ligne_a)).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].montant, 150.0);
    }
}
