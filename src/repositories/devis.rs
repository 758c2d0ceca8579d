//! # Devis Repository
//!
//! Data access for quotes. Every lifecycle transition is written as a
//! conditional `UPDATE ... WHERE statut IN (...)` so that two concurrent
//! requests cannot both win a transition: the filter re-checks the
//! precondition inside the store, and a zero row count tells the caller
//! the quote had already moved on.

use crate::lifecycle::{LigneDevis, Totaux};
use crate::models::devis::{
    ActiveModel as DevisActiveModel, Column, Entity as Devis, Model as DevisModel,
};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Request data for creating a devis; lignes and totals are expected to have
/// been validated by the lifecycle module already
#[derive(Debug, Clone)]
pub struct CreateDevisRequest {
    pub intervention_id: Option<Uuid>,
    pub client_nom: String,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,
    pub lignes: Vec<LigneDevis>,
    pub totaux: Totaux,
    pub date_validite: Option<DateTimeWithTimeZone>,
}

/// Partial update for a devis; monetary fields travel together so the
/// stored totals always match the stored lignes
#[derive(Debug, Clone, Default)]
pub struct UpdateDevisRequest {
    pub client_nom: Option<String>,
    pub client_prenom: Option<String>,
    pub client_email: Option<String>,
    pub client_tel: Option<String>,
    pub client_adresse: Option<String>,
    pub client_cp: Option<String>,
    pub client_ville: Option<String>,
    pub lignes: Option<(Vec<LigneDevis>, Totaux)>,
    pub date_validite: Option<DateTimeWithTimeZone>,
}

/// Repository for devis database operations
pub struct DevisRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DevisRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a devis in `brouillon` with a fresh human-facing reference
    pub async fn create(&self, request: CreateDevisRequest) -> Result<DevisModel, DbErr> {
        let lignes = serde_json::to_value(&request.lignes)
            .map_err(|e| DbErr::Custom(format!("lignes serialization failed: {e}")))?;

        // Retry on the off chance the random suffix collides with an
        // existing numero.
        for _ in 0..3 {
            let now = Utc::now();
            let devis = DevisActiveModel {
                id: Set(Uuid::new_v4()),
                numero: Set(generate_numero()),
                intervention_id: Set(request.intervention_id),
                client_nom: Set(request.client_nom.clone()),
                client_prenom: Set(request.client_prenom.clone()),
                client_email: Set(request.client_email.clone()),
                client_tel: Set(request.client_tel.clone()),
                client_adresse: Set(request.client_adresse.clone()),
                client_cp: Set(request.client_cp.clone()),
                client_ville: Set(request.client_ville.clone()),
                lignes: Set(lignes.clone()),
                total_ht: Set(request.totaux.total_ht),
                total_tva: Set(request.totaux.total_tva),
                total_ttc: Set(request.totaux.total_ttc),
                statut: Set("brouillon".to_string()),
                date_validite: Set(request.date_validite),
                signature_data: Set(None),
                signe_par: Set(None),
                signe_le: Set(None),
                notes: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };

            match devis.insert(self.db).await {
                Ok(model) => return Ok(model),
                Err(err) if matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => {
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        Err(DbErr::Custom("could not allocate a unique numero".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DevisModel>, DbErr> {
        Devis::find_by_id(id).one(self.db).await
    }

    /// List newest first, optionally narrowed by lifecycle status
    pub async fn list(&self, statut: Option<String>) -> Result<Vec<DevisModel>, DbErr> {
        let mut query = Devis::find().order_by_desc(Column::CreatedAt);
        if let Some(statut) = statut {
            query = query.filter(Column::Statut.eq(statut));
        }
        query.all(self.db).await
    }

    /// Update editable fields; the caller is responsible for checking the
    /// lifecycle lock before touching monetary data
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDevisRequest,
    ) -> Result<Option<DevisModel>, DbErr> {
        let Some(devis) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = devis.into_active_model();
        if let Some(client_nom) = request.client_nom {
            active.client_nom = Set(client_nom);
        }
        if let Some(client_prenom) = request.client_prenom {
            active.client_prenom = Set(Some(client_prenom));
        }
        if let Some(client_email) = request.client_email {
            active.client_email = Set(Some(client_email));
        }
        if let Some(client_tel) = request.client_tel {
            active.client_tel = Set(Some(client_tel));
        }
        if let Some(client_adresse) = request.client_adresse {
            active.client_adresse = Set(Some(client_adresse));
        }
        if let Some(client_cp) = request.client_cp {
            active.client_cp = Set(Some(client_cp));
        }
        if let Some(client_ville) = request.client_ville {
            active.client_ville = Set(Some(client_ville));
        }
        if let Some((lignes, totaux)) = request.lignes {
            let lignes = serde_json::to_value(&lignes)
                .map_err(|e| DbErr::Custom(format!("lignes serialization failed: {e}")))?;
            active.lignes = Set(lignes);
            active.total_ht = Set(totaux.total_ht);
            active.total_tva = Set(totaux.total_tva);
            active.total_ttc = Set(totaux.total_ttc);
        }
        if let Some(date_validite) = request.date_validite {
            active.date_validite = Set(Some(date_validite));
        }
        active.updated_at = Set(Utc::now().into());

        active.update(self.db).await.map(Some)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let Some(devis) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        devis.delete(self.db).await?;
        Ok(true)
    }

    /// brouillon -> envoye
    pub async fn envoyer(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = Devis::update_many()
            .col_expr(Column::Statut, Expr::value("envoye"))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Statut.eq("brouillon"))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// envoye -> vu, recorded the first time the client opens the page
    pub async fn mark_vu(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = Devis::update_many()
            .col_expr(Column::Statut, Expr::value("vu"))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Statut.eq("envoye"))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// {envoye, vu} -> signe, storing the signature artifact atomically with
    /// the transition. Returns the updated row, or `None` when the
    /// precondition did not hold (already signed, refused, still a draft).
    pub async fn sign(
        &self,
        id: Uuid,
        signature_data: String,
        signe_par: String,
    ) -> Result<Option<DevisModel>, DbErr> {
        let now = Utc::now();
        let result = Devis::update_many()
            .col_expr(Column::Statut, Expr::value("signe"))
            .col_expr(Column::SignatureData, Expr::value(signature_data))
            .col_expr(Column::SignePar, Expr::value(signe_par))
            .col_expr(Column::SigneLe, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Statut.is_in(["envoye", "vu"]))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// {brouillon, envoye, vu} -> refuse, with an optional reason
    pub async fn refuse(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<DevisModel>, DbErr> {
        let result = Devis::update_many()
            .col_expr(Column::Statut, Expr::value("refuse"))
            .col_expr(Column::Notes, Expr::value(notes))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Statut.is_in(["brouillon", "envoye", "vu"]))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// signe -> facture, the terminal transition
    pub async fn mark_facture(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = Devis::update_many()
            .col_expr(Column::Statut, Expr::value("facture"))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Statut.eq("signe"))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

/// Human-facing quote reference, e.g. `DEV-20250114-3F2A`
fn generate_numero() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    format!("DEV-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}
