//! # Facture Repository
//!
//! Data access for invoices. An invoice is only ever created as a snapshot
//! of a signed devis; the unique index on `devis_id` turns a concurrent
//! duplicate insert into a fetch of the row the winner created.

use crate::models::devis::Model as DevisModel;
use crate::models::facture::{
    ActiveModel as FactureActiveModel, Column, Entity as Facture, Model as FactureModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

/// Payment details recorded by `payer`
#[derive(Debug, Clone)]
pub struct PaiementRequest {
    pub mode_paiement: String,
    pub reference_paiement: Option<String>,
    pub montant_paye: Option<f64>,
}

/// Repository for facture database operations
pub struct FactureRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FactureRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Snapshot a signed devis into an invoice. Idempotent: when an invoice
    /// for this devis already exists (including a concurrent insert racing
    /// this one), the existing row is returned instead.
    pub async fn create_for_devis(&self, devis: &DevisModel) -> Result<FactureModel, DbErr> {
        if let Some(existing) = self.find_by_devis(devis.id).await? {
            return Ok(existing);
        }

        let facture = FactureActiveModel {
            id: Set(Uuid::new_v4()),
            devis_id: Set(devis.id),
            intervention_id: Set(devis.intervention_id),
            client_nom: Set(devis.client_nom.clone()),
            client_prenom: Set(devis.client_prenom.clone()),
            client_email: Set(devis.client_email.clone()),
            client_tel: Set(devis.client_tel.clone()),
            client_adresse: Set(devis.client_adresse.clone()),
            client_cp: Set(devis.client_cp.clone()),
            client_ville: Set(devis.client_ville.clone()),
            lignes: Set(devis.lignes.clone()),
            total_ht: Set(devis.total_ht),
            total_tva: Set(devis.total_tva),
            total_ttc: Set(devis.total_ttc),
            statut: Set("impayee".to_string()),
            mode_paiement: Set(None),
            reference_paiement: Set(None),
            montant_paye: Set(None),
            payee_le: Set(None),
            created_at: Set(Utc::now().into()),
        };

        match facture.insert(self.db).await {
            Ok(model) => Ok(model),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.find_by_devis(devis.id)
                    .await?
                    .ok_or_else(|| DbErr::Custom("facture vanished after unique conflict".to_string()))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FactureModel>, DbErr> {
        Facture::find_by_id(id).one(self.db).await
    }

    pub async fn find_by_devis(&self, devis_id: Uuid) -> Result<Option<FactureModel>, DbErr> {
        Facture::find()
            .filter(Column::DevisId.eq(devis_id))
            .one(self.db)
            .await
    }

    /// List newest first, optionally narrowed by payment status
    pub async fn list(&self, statut: Option<String>) -> Result<Vec<FactureModel>, DbErr> {
        let mut query = Facture::find().order_by_desc(Column::CreatedAt);
        if let Some(statut) = statut {
            query = query.filter(Column::Statut.eq(statut));
        }
        query.all(self.db).await
    }

    /// Record a payment. Returns `Ok(None)` when the facture does not
    /// exist; an already-paid facture is left untouched and reported as a
    /// conflict by the caller.
    pub async fn payer(
        &self,
        id: Uuid,
        request: PaiementRequest,
    ) -> Result<Option<FactureModel>, DbErr> {
        let Some(facture) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if facture.statut == "payee" {
            return Ok(Some(facture));
        }

        let montant = request.montant_paye.unwrap_or(facture.total_ttc);
        let mut active = facture.into_active_model();
        active.statut = Set("payee".to_string());
        active.mode_paiement = Set(Some(request.mode_paiement));
        active.reference_paiement = Set(request.reference_paiement);
        active.montant_paye = Set(Some(montant));
        active.payee_le = Set(Some(Utc::now().into()));

        active.update(self.db).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{compute_totaux, LigneDevis};
    use crate::repositories::devis::{CreateDevisRequest, DevisRepository};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn signed_devis(db: &DatabaseConnection) -> DevisModel {
        let repo = DevisRepository::new(db);
        let lignes = vec![LigneDevis {
            description: "Remplacement cylindre".to_string(),
            quantite: 1.0,
            prix_unitaire: 120.0,
            tva_taux: 20.0,
        }];
        let totaux = compute_totaux(&lignes);
        let devis = repo
            .create(CreateDevisRequest {
                intervention_id: None,
                client_nom: "Durand".to_string(),
                client_prenom: None,
                client_email: None,
                client_tel: None,
                client_adresse: None,
                client_cp: None,
                client_ville: None,
                lignes,
                totaux,
                date_validite: None,
            })
            .await
            .unwrap();
        repo.envoyer(devis.id).await.unwrap();
        repo.sign(devis.id, "data:image/png;base64,AAAA".to_string(), "Marie".to_string())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn create_snapshots_the_devis() {
        let db = setup_test_db().await;
        let devis = signed_devis(&db).await;
        let repo = FactureRepository::new(&db);

        let facture = repo.create_for_devis(&devis).await.unwrap();
        assert_eq!(facture.devis_id, devis.id);
        assert_eq!(facture.client_nom, "Durand");
        assert_eq!(facture.total_ttc, devis.total_ttc);
        assert_eq!(facture.statut, "impayee");
    }

    #[tokio::test]
    async fn create_is_idempotent_per_devis() {
        let db = setup_test_db().await;
        let devis = signed_devis(&db).await;
        let repo = FactureRepository::new(&db);

        let first = repo.create_for_devis(&devis).await.unwrap();
        let second = repo.create_for_devis(&devis).await.unwrap();
        assert_eq!(first.id, second.id);

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn payer_defaults_to_full_amount() {
        let db = setup_test_db().await;
        let devis = signed_devis(&db).await;
        let repo = FactureRepository::new(&db);

        let facture = repo.create_for_devis(&devis).await.unwrap();
        let paid = repo
            .payer(
                facture.id,
                PaiementRequest {
                    mode_paiement: "cb".to_string(),
                    reference_paiement: Some("TX-42".to_string()),
                    montant_paye: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paid.statut, "payee");
        assert_eq!(paid.montant_paye, Some(devis.total_ttc));
        assert!(paid.payee_le.is_some());
    }

    #[tokio::test]
    async fn payer_missing_returns_none() {
        let db = setup_test_db().await;
        let repo = FactureRepository::new(&db);

        let result = repo
            .payer(
                Uuid::new_v4(),
                PaiementRequest {
                    mode_paiement: "cb".to_string(),
                    reference_paiement: None,
                    montant_paye: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
