//! # Devis Lifecycle Engine
//!
//! Owns the devis state machine and the money arithmetic. Every mutating
//! endpoint goes through [`apply`] instead of writing the `statut` column
//! free-form, so the transition graph lives in exactly one place.
//!
//! The engine is deliberately network-free: it validates and computes, the
//! handlers persist and broadcast.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use utoipa::ToSchema;

/// Tolerance used when comparing caller-supplied totals against recomputed
/// ones, in currency units.
pub const TOTALS_EPSILON: f64 = 0.01;

/// Lifecycle states of a devis.
///
/// The graph is forward-only: once a devis leaves `brouillon` it never goes
/// back, `facture` and `refuse` are terminal, and `signe` can only advance
/// to `facture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DevisStatut {
    Brouillon,
    Envoye,
    Vu,
    Signe,
    Refuse,
    Facture,
}

impl DevisStatut {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevisStatut::Brouillon => "brouillon",
            DevisStatut::Envoye => "envoye",
            DevisStatut::Vu => "vu",
            DevisStatut::Signe => "signe",
            DevisStatut::Refuse => "refuse",
            DevisStatut::Facture => "facture",
        }
    }

    pub fn parse(value: &str) -> Result<Self, TransitionError> {
        match value {
            "brouillon" => Ok(DevisStatut::Brouillon),
            "envoye" => Ok(DevisStatut::Envoye),
            "vu" => Ok(DevisStatut::Vu),
            "signe" => Ok(DevisStatut::Signe),
            "refuse" => Ok(DevisStatut::Refuse),
            "facture" => Ok(DevisStatut::Facture),
            other => Err(TransitionError::UnknownStatut {
                statut: other.to_string(),
            }),
        }
    }

    /// True once monetary fields (lignes, totals) must no longer change.
    pub fn is_locked(&self) -> bool {
        matches!(self, DevisStatut::Signe | DevisStatut::Facture)
    }
}

impl std::fmt::Display for DevisStatut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a devis can receive. `Consulter` is what the signing surface
/// emits when the customer first opens the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevisEvent {
    Envoyer,
    Consulter,
    Signer,
    Refuser,
    Facturer,
}

impl std::fmt::Display for DevisEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DevisEvent::Envoyer => "envoyer",
            DevisEvent::Consulter => "consulter",
            DevisEvent::Signer => "signer",
            DevisEvent::Refuser => "refuser",
            DevisEvent::Facturer => "facturer",
        };
        f.write_str(name)
    }
}

/// Errors produced by the lifecycle engine.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("cannot apply '{event}' to a devis in status '{from}'")]
    IllegalTransition { from: DevisStatut, event: DevisEvent },
    #[error("unknown devis status '{statut}'")]
    UnknownStatut { statut: String },
    #[error("monetary fields are immutable once the devis is {statut}")]
    MonetaryFieldsLocked { statut: DevisStatut },
}

/// The single transition function of the state machine.
pub fn apply(current: DevisStatut, event: DevisEvent) -> Result<DevisStatut, TransitionError> {
    use DevisEvent::*;
    use DevisStatut::*;

    let next = match (current, event) {
        (Brouillon, Envoyer) => Envoye,
        (Envoye, Consulter) => Vu,
        // Re-opening the page after it was already viewed is a no-op.
        (Vu, Consulter) => Vu,
        (Envoye | Vu, Signer) => Signe,
        (Brouillon | Envoye | Vu, Refuser) => Refuse,
        (Signe, Facturer) => Facture,
        (from, event) => return Err(TransitionError::IllegalTransition { from, event }),
    };
    Ok(next)
}

/// Validates a caller-supplied status change (PUT /api/devis/{id}) against
/// the transition graph. Keeping the same status is always allowed.
pub fn can_advance(from: DevisStatut, to: DevisStatut) -> Result<(), TransitionError> {
    if from == to {
        return Ok(());
    }
    let event = match to {
        DevisStatut::Envoye => DevisEvent::Envoyer,
        DevisStatut::Vu => DevisEvent::Consulter,
        DevisStatut::Signe => DevisEvent::Signer,
        DevisStatut::Refuse => DevisEvent::Refuser,
        DevisStatut::Facture => DevisEvent::Facturer,
        // Nothing transitions back to brouillon once sent.
        DevisStatut::Brouillon => {
            return Err(TransitionError::IllegalTransition {
                from,
                event: DevisEvent::Envoyer,
            });
        }
    };
    apply(from, event).map(|_| ())
}

/// One priced row of a devis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LigneDevis {
    pub description: String,
    pub quantite: f64,
    pub prix_unitaire: f64,
    #[serde(default)]
    pub tva_taux: f64,
}

/// Computed devis totals, rounded to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Totaux {
    pub total_ht: f64,
    pub total_tva: f64,
    pub total_ttc: f64,
}

/// Errors raised while validating line items and totals.
#[derive(Debug, Error, PartialEq)]
pub enum LignesError {
    #[error("line {index}: {field} must be a non-negative number")]
    NegativeValue { index: usize, field: &'static str },
    #[error("line {index}: description is required")]
    BlankDescription { index: usize },
    #[error("lignes payload is not a valid line-item array: {message}")]
    Malformed { message: String },
    #[error(
        "totals do not match line items (expected ht={expected_ht:.2} tva={expected_tva:.2} ttc={expected_ttc:.2})"
    )]
    TotalsMismatch {
        expected_ht: f64,
        expected_tva: f64,
        expected_ttc: f64,
    },
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Decodes the JSON `lignes` column into typed line items.
pub fn lignes_from_json(value: &JsonValue) -> Result<Vec<LigneDevis>, LignesError> {
    serde_json::from_value(value.clone()).map_err(|e| LignesError::Malformed {
        message: e.to_string(),
    })
}

/// Rejects malformed pricing fields before anything is persisted.
pub fn validate_lignes(lignes: &[LigneDevis]) -> Result<(), LignesError> {
    for (index, ligne) in lignes.iter().enumerate() {
        if ligne.description.trim().is_empty() {
            return Err(LignesError::BlankDescription { index });
        }
        if !ligne.quantite.is_finite() || ligne.quantite < 0.0 {
            return Err(LignesError::NegativeValue {
                index,
                field: "quantite",
            });
        }
        if !ligne.prix_unitaire.is_finite() || ligne.prix_unitaire < 0.0 {
            return Err(LignesError::NegativeValue {
                index,
                field: "prix_unitaire",
            });
        }
        if !ligne.tva_taux.is_finite() || ligne.tva_taux < 0.0 {
            return Err(LignesError::NegativeValue {
                index,
                field: "tva_taux",
            });
        }
    }
    Ok(())
}

/// `total_ht = Σ(quantite × prix_unitaire)`, `total_tva = Σ(ligne_total ×
/// tva_taux/100)`, `total_ttc = total_ht + total_tva`.
pub fn compute_totaux(lignes: &[LigneDevis]) -> Totaux {
    let mut total_ht = 0.0;
    let mut total_tva = 0.0;
    for ligne in lignes {
        let ligne_total = ligne.quantite * ligne.prix_unitaire;
        total_ht += ligne_total;
        total_tva += ligne_total * ligne.tva_taux / 100.0;
    }
    let total_ht = round_cents(total_ht);
    let total_tva = round_cents(total_tva);
    Totaux {
        total_ht,
        total_tva,
        total_ttc: round_cents(total_ht + total_tva),
    }
}

/// Checks caller-supplied totals against the recomputed ones within
/// [`TOTALS_EPSILON`].
pub fn verify_totaux(
    lignes: &[LigneDevis],
    total_ht: f64,
    total_tva: f64,
    total_ttc: f64,
) -> Result<Totaux, LignesError> {
    let expected = compute_totaux(lignes);
    let ok = (expected.total_ht - total_ht).abs() <= TOTALS_EPSILON
        && (expected.total_tva - total_tva).abs() <= TOTALS_EPSILON
        && (expected.total_ttc - total_ttc).abs() <= TOTALS_EPSILON;
    if ok {
        Ok(expected)
    } else {
        Err(LignesError::TotalsMismatch {
            expected_ht: expected.total_ht,
            expected_tva: expected.total_tva,
            expected_ttc: expected.total_ttc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ligne(description: &str, quantite: f64, prix_unitaire: f64, tva_taux: f64) -> LigneDevis {
        LigneDevis {
            description: description.to_string(),
            quantite,
            prix_unitaire,
            tva_taux,
        }
    }

    #[test]
    fn diagnostic_scenario_totals() {
        // create quote with [{desc:"Diagnostic", qty:1, unit_price:80, tva:20}]
        let lignes = vec![ligne("Diagnostic", 1.0, 80.0, 20.0)];
        let totaux = compute_totaux(&lignes);
        assert_eq!(totaux.total_ht, 80.00);
        assert_eq!(totaux.total_tva, 16.00);
        assert_eq!(totaux.total_ttc, 96.00);
    }

    #[test]
    fn totals_sum_per_line_within_epsilon() {
        let lignes = vec![
            ligne("Déplacement", 1.0, 45.50, 20.0),
            ligne("Main d'oeuvre", 2.5, 60.0, 20.0),
            ligne("Fourniture serrure", 1.0, 129.99, 10.0),
            ligne("Geste commercial", 1.0, 0.0, 0.0),
        ];
        let totaux = compute_totaux(&lignes);

        let expected_ht: f64 = lignes.iter().map(|l| l.quantite * l.prix_unitaire).sum();
        let expected_tva: f64 = lignes
            .iter()
            .map(|l| l.quantite * l.prix_unitaire * l.tva_taux / 100.0)
            .sum();

        assert!((totaux.total_ht - expected_ht).abs() <= TOTALS_EPSILON);
        assert!((totaux.total_tva - expected_tva).abs() <= TOTALS_EPSILON);
        assert!((totaux.total_ttc - (expected_ht + expected_tva)).abs() <= TOTALS_EPSILON);
    }

    #[test]
    fn verify_totaux_rejects_drifted_amounts() {
        let lignes = vec![ligne("Diagnostic", 1.0, 80.0, 20.0)];
        assert!(verify_totaux(&lignes, 80.0, 16.0, 96.0).is_ok());
        // Within the rounding epsilon is still accepted.
        assert!(verify_totaux(&lignes, 80.004, 16.0, 96.004).is_ok());

        let err = verify_totaux(&lignes, 70.0, 16.0, 86.0).unwrap_err();
        assert!(matches!(err, LignesError::TotalsMismatch { .. }));
    }

    #[test]
    fn validate_lignes_rejects_negative_amounts() {
        let bad = vec![ligne("Diagnostic", -1.0, 80.0, 20.0)];
        assert_eq!(
            validate_lignes(&bad),
            Err(LignesError::NegativeValue {
                index: 0,
                field: "quantite"
            })
        );

        let blank = vec![ligne("  ", 1.0, 80.0, 20.0)];
        assert_eq!(
            validate_lignes(&blank),
            Err(LignesError::BlankDescription { index: 0 })
        );
    }

    #[test]
    fn lignes_round_trip_through_json_column() {
        let raw = json!([
            {"description": "Diagnostic", "quantite": 1.0, "prix_unitaire": 80.0, "tva_taux": 20.0}
        ]);
        let lignes = lignes_from_json(&raw).unwrap();
        assert_eq!(lignes.len(), 1);
        assert_eq!(lignes[0].description, "Diagnostic");

        assert!(lignes_from_json(&json!({"not": "an array"})).is_err());
    }

    #[test]
    fn happy_path_walks_the_full_graph() {
        let mut statut = DevisStatut::Brouillon;
        for event in [
            DevisEvent::Envoyer,
            DevisEvent::Consulter,
            DevisEvent::Signer,
            DevisEvent::Facturer,
        ] {
            statut = apply(statut, event).unwrap();
        }
        assert_eq!(statut, DevisStatut::Facture);
    }

    #[test]
    fn sign_requires_envoye_or_vu() {
        assert!(apply(DevisStatut::Envoye, DevisEvent::Signer).is_ok());
        assert!(apply(DevisStatut::Vu, DevisEvent::Signer).is_ok());
        assert!(apply(DevisStatut::Brouillon, DevisEvent::Signer).is_err());
        assert!(apply(DevisStatut::Refuse, DevisEvent::Signer).is_err());
        assert!(apply(DevisStatut::Facture, DevisEvent::Signer).is_err());
    }

    #[test]
    fn second_sign_is_a_conflict() {
        // Pinned behavior: a devis already signed rejects a second signature
        // instead of silently overwriting the artifact.
        let signed = apply(DevisStatut::Envoye, DevisEvent::Signer).unwrap();
        let err = apply(signed, DevisEvent::Signer).unwrap_err();
        assert_eq!(
            err,
            TransitionError::IllegalTransition {
                from: DevisStatut::Signe,
                event: DevisEvent::Signer
            }
        );
    }

    #[test]
    fn refuse_allowed_from_pre_signature_states() {
        assert!(apply(DevisStatut::Brouillon, DevisEvent::Refuser).is_ok());
        assert!(apply(DevisStatut::Envoye, DevisEvent::Refuser).is_ok());
        assert!(apply(DevisStatut::Vu, DevisEvent::Refuser).is_ok());
        assert!(apply(DevisStatut::Signe, DevisEvent::Refuser).is_err());
    }

    #[test]
    fn facture_is_terminal_and_only_reachable_from_signe() {
        assert!(apply(DevisStatut::Signe, DevisEvent::Facturer).is_ok());
        assert!(apply(DevisStatut::Vu, DevisEvent::Facturer).is_err());
        for event in [
            DevisEvent::Envoyer,
            DevisEvent::Consulter,
            DevisEvent::Signer,
            DevisEvent::Refuser,
            DevisEvent::Facturer,
        ] {
            assert!(apply(DevisStatut::Facture, event).is_err());
        }
    }

    #[test]
    fn viewing_twice_is_idempotent() {
        assert_eq!(
            apply(DevisStatut::Vu, DevisEvent::Consulter),
            Ok(DevisStatut::Vu)
        );
    }

    #[test]
    fn can_advance_rejects_backward_moves() {
        assert!(can_advance(DevisStatut::Brouillon, DevisStatut::Envoye).is_ok());
        assert!(can_advance(DevisStatut::Envoye, DevisStatut::Envoye).is_ok());
        assert!(can_advance(DevisStatut::Envoye, DevisStatut::Brouillon).is_err());
        assert!(can_advance(DevisStatut::Signe, DevisStatut::Vu).is_err());
    }

    #[test]
    fn statut_serde_matches_column_values() {
        for statut in [
            DevisStatut::Brouillon,
            DevisStatut::Envoye,
            DevisStatut::Vu,
            DevisStatut::Signe,
            DevisStatut::Refuse,
            DevisStatut::Facture,
        ] {
            assert_eq!(DevisStatut::parse(statut.as_str()), Ok(statut));
        }
        assert!(DevisStatut::parse("paye").is_err());
    }
}
