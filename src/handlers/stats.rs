//! # Advertising Profitability Report
//!
//! Joins spend entries with completed-intervention revenue per advertised
//! line. The row counts stay small for a field-service operation, so the
//! aggregation runs in process over the full lists.

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthTech;
use crate::error::{validation_error, ApiError};
use crate::models::depense_pub::Model as DepensePubModel;
use crate::models::intervention::Model as InterventionModel;
use crate::models::ligne::Model as LigneModel;
use crate::repositories::intervention::InterventionFilter;
use crate::repositories::{DepensePubRepository, InterventionRepository, LigneRepository};
use crate::server::AppState;

/// Intervention statuses that count as revenue. Both spellings exist in
/// historical rows.
const STATUTS_TERMINES: [&str; 2] = ["Terminée", "Terminé"];

/// Optional reporting window; dates or RFC 3339 timestamps
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatsQuery {
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
}

/// One advertised line's spend vs revenue
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LigneStats {
    pub ligne_id: Uuid,
    pub ligne_nom: String,
    pub service: Option<String>,
    pub depenses: f64,
    pub ca: f64,
    pub profit: f64,
    pub rentable: bool,
}

/// Company-wide rollup of the per-line rows
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsTotaux {
    pub depenses: f64,
    pub ca: f64,
    pub profit: f64,
    pub rentable: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsPubResponse {
    pub par_ligne: Vec<LigneStats>,
    pub totaux: StatsTotaux,
}

/// Accepts `2024-03-01` or a full RFC 3339 timestamp. A bare date is read
/// as midnight UTC; the exclusive upper bound is the caller's problem, as
/// in the reporting UI.
fn parse_bound(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    Err(validation_error(
        "Date invalide, attendu AAAA-MM-JJ ou RFC 3339",
        json!({"field": field, "value": raw}),
    ))
}

fn within(ts: DateTime<Utc>, debut: Option<DateTime<Utc>>, fin: Option<DateTime<Utc>>) -> bool {
    if let Some(debut) = debut
        && ts < debut
    {
        return false;
    }
    if let Some(fin) = fin
        && ts > fin
    {
        return false;
    }
    true
}

fn aggregate(
    lignes: &[LigneModel],
    depenses: &[DepensePubModel],
    interventions: &[InterventionModel],
) -> StatsPubResponse {
    let par_ligne: Vec<LigneStats> = lignes
        .iter()
        .map(|ligne| {
            let ligne_depenses: f64 = depenses
                .iter()
                .filter(|d| d.ligne_id == ligne.id)
                .map(|d| d.montant)
                .sum();
            let ligne_ca: f64 = interventions
                .iter()
                .filter(|i| i.ligne_id == Some(ligne.id))
                .filter_map(|i| i.prix)
                .sum();

            LigneStats {
                ligne_id: ligne.id,
                ligne_nom: ligne.nom.clone(),
                service: ligne.service.clone(),
                depenses: ligne_depenses,
                ca: ligne_ca,
                profit: ligne_ca - ligne_depenses,
                rentable: ligne_ca >= ligne_depenses,
            }
        })
        .collect();

    let depenses_total: f64 = par_ligne.iter().map(|s| s.depenses).sum();
    let ca_total: f64 = par_ligne.iter().map(|s| s.ca).sum();

    StatsPubResponse {
        par_ligne,
        totaux: StatsTotaux {
            depenses: depenses_total,
            ca: ca_total,
            profit: ca_total - depenses_total,
            rentable: ca_total >= depenses_total,
        },
    }
}

/// Spend vs revenue per advertised line over an optional window
#[utoipa::path(
    get,
    path = "/api/stats/pub",
    security(("bearer_auth" = [])),
    params(
        ("date_debut" = Option<String>, Query, description = "Window start, AAAA-MM-JJ or RFC 3339"),
        ("date_fin" = Option<String>, Query, description = "Window end, AAAA-MM-JJ or RFC 3339")
    ),
    responses(
        (status = 200, description = "Profitability report", body = StatsPubResponse),
        (status = 400, description = "Unparseable window bound", body = ApiError)
    ),
    tag = "stats"
)]
pub async fn stats_pub(
    State(state): State<AppState>,
    _auth: AuthTech,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsPubResponse>, ApiError> {
    let debut = query
        .date_debut
        .as_deref()
        .map(|raw| parse_bound("date_debut", raw))
        .transpose()?;
    let fin = query
        .date_fin
        .as_deref()
        .map(|raw| parse_bound("date_fin", raw))
        .transpose()?;

    let lignes = LigneRepository::new(&state.db).list().await?;
    let depenses: Vec<DepensePubModel> = DepensePubRepository::new(&state.db)
        .list(None)
        .await?
        .into_iter()
        .filter(|d| within(d.date.with_timezone(&Utc), debut, fin))
        .collect();
    let interventions: Vec<InterventionModel> = InterventionRepository::new(&state.db)
        .list(InterventionFilter::default())
        .await?
        .into_iter()
        .filter(|i| STATUTS_TERMINES.contains(&i.statut.as_str()))
        .filter(|i| within(i.created_at.with_timezone(&Utc), debut, fin))
        .collect();

    Ok(Json(aggregate(&lignes, &depenses, &interventions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ligne(nom: &str) -> LigneModel {
        LigneModel {
            id: Uuid::new_v4(),
            nom: nom.to_string(),
            service: Some("serrurerie".to_string()),
            numero: None,
            created_at: Utc::now().into(),
        }
    }

    fn depense(ligne_id: Uuid, montant: f64) -> DepensePubModel {
        DepensePubModel {
            id: Uuid::new_v4(),
            ligne_id,
            montant,
            date: Utc::now().into(),
            created_at: Utc::now().into(),
        }
    }

    fn intervention_terminee(ligne_id: Uuid, prix: f64) -> InterventionModel {
        InterventionModel {
            id: Uuid::new_v4(),
            service: "serrurerie".to_string(),
            statut: "Terminée".to_string(),
            description: None,
            client_nom: None,
            adresse: None,
            cp: None,
            ville: None,
            telephone: None,
            prix: Some(prix),
            ligne_id: Some(ligne_id),
            tech_id: None,
            tech_nom: None,
            mode_distribution: None,
            date_attribution: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn profit_and_rentability_per_line() {
        let ligne_a = ligne("Paris 11e");
        let ligne_b = ligne("Lyon 3e");

        let depenses = vec![depense(ligne_a.id, 300.0), depense(ligne_b.id, 50.0)];
        let interventions = vec![
            intervention_terminee(ligne_a.id, 120.0),
            intervention_terminee(ligne_b.id, 480.0),
        ];

        let report = aggregate(
            &[ligne_a.clone(), ligne_b.clone()],
            &depenses,
            &interventions,
        );

        let a = report
            .par_ligne
            .iter()
            .find(|s| s.ligne_id == ligne_a.id)
            .unwrap();
        assert_eq!(a.profit, -180.0);
        assert!(!a.rentable);

        let b = report
            .par_ligne
            .iter()
            .find(|s| s.ligne_id == ligne_b.id)
            .unwrap();
        assert_eq!(b.profit, 430.0);
        assert!(b.rentable);

        assert_eq!(report.totaux.ca, 600.0);
        assert_eq!(report.totaux.depenses, 350.0);
        assert_eq!(report.totaux.profit, 250.0);
        assert!(report.totaux.rentable);
    }

    #[test]
    fn line_without_activity_reports_zeroes_as_rentable() {
        let l = ligne("Sans pub");
        let report = aggregate(&[l], &[], &[]);
        assert_eq!(report.par_ligne[0].profit, 0.0);
        assert!(report.par_ligne[0].rentable);
    }

    #[test]
    fn window_bounds_parse_dates_and_timestamps() {
        let midnight = parse_bound("date_debut", "2024-03-01").unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        assert!(parse_bound("date_fin", "2024-03-01T12:30:00Z").is_ok());
        assert!(parse_bound("date_fin", "hier").is_err());
    }

    #[test]
    fn within_honors_both_bounds() {
        let debut = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let fin = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();

        assert!(within(inside, Some(debut), Some(fin)));
        assert!(!within(before, Some(debut), Some(fin)));
        assert!(within(before, None, Some(fin)));
    }
}
