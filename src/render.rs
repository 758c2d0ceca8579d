//! # Signing Page Renderer
//!
//! Server-rendered HTML for the public quote page. The page is the only
//! surface a client ever sees: it shows the quote, and depending on its
//! lifecycle status either offers the signature pad, the recorded
//! signature, or the refusal notice. All dynamic values are HTML-escaped
//! before interpolation.

use chrono::Datelike;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

use crate::models::devis::Model as DevisModel;
use crate::models::entreprise::Model as EntrepriseModel;

/// Human label for a lifecycle status as shown in the badge
pub fn status_label(statut: &str) -> &str {
    match statut {
        "brouillon" => "\u{1F4DD} Brouillon",
        "envoye" => "\u{1F4E4} En attente de signature",
        "vu" => "\u{1F441}\u{FE0F} Consulté",
        "signe" => "\u{2705} Signé",
        "refuse" => "\u{274C} Refusé",
        "facture" => "\u{1F4B0} Facturé",
        other => other,
    }
}

/// Escape a value for interpolation into HTML text or attributes
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const MOIS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// French long-form date, `-` when absent
fn format_date(date: Option<&DateTimeWithTimeZone>) -> String {
    match date {
        Some(d) => format!(
            "{:02} {} {}",
            d.day(),
            MOIS[(d.month0() as usize).min(11)],
            d.year()
        ),
        None => "-".to_string(),
    }
}

/// French price formatting: comma decimals, narrow thousands groups
fn format_price(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{202F}');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped},{frac:02} €")
}

/// Table rows for the stored lignes JSON array
fn lignes_rows(lignes: &JsonValue) -> String {
    let Some(items) = lignes.as_array() else {
        return String::new();
    };

    let mut rows = String::new();
    for ligne in items {
        let description = ligne
            .get("description")
            .and_then(JsonValue::as_str)
            .unwrap_or("");
        let quantite = ligne
            .get("quantite")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        let prix_unitaire = ligne
            .get("prix_unitaire")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        let tva_taux = ligne
            .get("tva_taux")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        let total = quantite * prix_unitaire;

        rows.push_str(&format!(
            "<tr>\
             <td>{}</td>\
             <td>{}</td>\
             <td>{:.2} €</td>\
             <td>{}%</td>\
             <td><strong>{:.2} €</strong></td>\
             </tr>",
            escape_html(description),
            quantite,
            prix_unitaire,
            tva_taux,
            total
        ));
    }
    rows
}

/// The status-dependent signature block
fn signature_section(devis: &DevisModel) -> String {
    match devis.statut.as_str() {
        "signe" => {
            // The stored artifact is a validated PNG data URI, safe to use
            // as an img src.
            let image = devis
                .signature_data
                .as_deref()
                .map(|data| format!(r#"<img src="{data}" class="signature-image" alt="Signature">"#))
                .unwrap_or_default();
            let signe_par = escape_html(devis.signe_par.as_deref().unwrap_or("Client"));

            format!(
                r#"<div class="signature-section signed">
  <div class="signature-title">&#9989; Devis signé</div>
  {image}
  <div class="signature-info">Signé le {} par {signe_par}</div>
</div>"#,
                format_date(devis.signe_le.as_ref())
            )
        }
        "refuse" => {
            let notes = escape_html(
                devis
                    .notes
                    .as_deref()
                    .unwrap_or("Le client a refusé ce devis."),
            );

            format!(
                r#"<div class="signature-section refused">
  <div class="signature-title">&#10060; Devis refusé</div>
  <div class="signature-info">{notes}</div>
</div>"#
            )
        }
        _ => format!(
            r#"<div class="signature-section" id="signatureSection">
  <div class="signature-title">&#9997;&#65039; Signature</div>
  <p style="color: #666; margin-bottom: 15px;">En signant ce devis, vous acceptez les conditions ci-dessus.</p>
  <input type="text" class="name-input" id="signerName" placeholder="Votre nom complet" required>
  <div class="signature-canvas-container"><canvas id="signatureCanvas"></canvas></div>
  <div class="btn-group">
    <button class="btn btn-secondary" onclick="clearSignature()">Effacer</button>
    <button class="btn btn-primary" onclick="submitSignature()" id="btnSign">&#9989; Signer le devis</button>
  </div>
  <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee;">
    <p style="color: #666; margin-bottom: 15px;">Vous ne souhaitez pas accepter ce devis ?</p>
    <button class="btn btn-danger" onclick="refuseDevis()" id="btnRefuse">&#10060; Refuser le devis</button>
  </div>
</div>"#
        ),
    }
}

/// Render the full signing page for a quote
pub fn render_signature_page(devis: &DevisModel, entreprise: Option<&EntrepriseModel>) -> String {
    let numero = escape_html(&devis.numero);
    let statut = escape_html(&devis.statut);
    let badge = escape_html(status_label(&devis.statut));

    let company_name = escape_html(entreprise.map(|e| e.nom.as_str()).unwrap_or("Entreprise"));
    let logo = entreprise
        .and_then(|e| e.logo_url.as_deref())
        .map(|url| format!(r#"<img src="{}" class="logo" alt="Logo">"#, escape_html(url)))
        .unwrap_or_default();

    let client_nom = escape_html(&devis.client_nom);
    let client_prenom = escape_html(devis.client_prenom.as_deref().unwrap_or(""));
    let client_adresse = escape_html(devis.client_adresse.as_deref().unwrap_or(""));
    let client_cp = escape_html(devis.client_cp.as_deref().unwrap_or(""));
    let client_ville = escape_html(devis.client_ville.as_deref().unwrap_or(""));

    let conditions = escape_html(
        entreprise
            .and_then(|e| e.conditions_devis.as_deref())
            .unwrap_or("Devis valable 30 jours."),
    );
    let mention_legale = escape_html(
        entreprise
            .and_then(|e| e.mention_legale.as_deref())
            .unwrap_or(""),
    );

    let siret = escape_html(entreprise.and_then(|e| e.siret.as_deref()).unwrap_or(""));
    let telephone = escape_html(entreprise.and_then(|e| e.telephone.as_deref()).unwrap_or(""));
    let email = escape_html(entreprise.and_then(|e| e.email.as_deref()).unwrap_or(""));

    let rows = lignes_rows(&devis.lignes);
    let signature = signature_section(devis);

    // Terminal statuses serve a read-only page: no pad CSS, no signing
    // script, nothing for the client to click.
    let interactive = !matches!(devis.statut.as_str(), "signe" | "refuse");
    let style = if interactive {
        format!("{STYLE}{SIGNING_STYLE}")
    } else {
        STYLE.to_string()
    };
    let script = if interactive {
        format!("<script>\nconst devisId = '{}';\n</script>\n<script>{SCRIPT}</script>", devis.id)
    } else {
        String::new()
    };

    let total_ht = format_price(devis.total_ht);
    let total_tva = format_price(devis.total_tva);
    let total_ttc = format_price(devis.total_ttc);
    let date_creation = format_date(Some(&devis.created_at));
    let date_validite = format_date(devis.date_validite.as_ref());

    let mut page = String::with_capacity(16 * 1024);
    page.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Devis {numero} - Signature</title>
<style>{style}</style>
</head>
<body>
<div class="container">
  <div class="header">
    {logo}
    <div class="company-name">{company_name}</div>
    <div class="devis-number">Devis {numero}</div>
  </div>
  <div class="content">
    <div id="messageContainer"></div>
    <span class="status-badge status-{statut}" id="statusBadge">{badge}</span>
    <div class="section">
      <div class="section-title">&#128203; Informations</div>
      <div class="info-grid">
        <div class="info-box">
          <div class="info-label">Client</div>
          <div class="info-value">
            <div class="info-name">{client_nom} {client_prenom}</div>
            {client_adresse}<br>
            {client_cp} {client_ville}
          </div>
        </div>
        <div class="info-box">
          <div class="info-label">Détails</div>
          <div class="info-value">
            <strong>Date:</strong> {date_creation}<br>
            <strong>Validité:</strong> {date_validite}
          </div>
        </div>
      </div>
    </div>
    <div class="section">
      <div class="section-title">&#128221; Prestations</div>
      <table class="prestations-table">
        <thead>
          <tr><th>Description</th><th>Qté</th><th>Prix unit. HT</th><th>TVA</th><th>Total HT</th></tr>
        </thead>
        <tbody>{rows}</tbody>
      </table>
      <div class="totals">
        <div class="total-row"><span>Total HT</span><span>{total_ht}</span></div>
        <div class="total-row"><span>TVA</span><span>{total_tva}</span></div>
        <div class="total-row final"><span>Total TTC</span><span>{total_ttc}</span></div>
      </div>
    </div>
    <div class="conditions">
      <div class="conditions-title">&#128204; Conditions</div>
      <div class="conditions-text">{conditions}<br>{mention_legale}</div>
    </div>
    {signature}
  </div>
  <div class="footer">
    {company_name} - SIRET: {siret}<br>
    {telephone} | {email}
  </div>
</div>
{script}
</body>
</html>"#
    ));
    page
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); min-height: 100vh; padding: 20px; }
.container { max-width: 800px; margin: 0 auto; background: white; border-radius: 16px; box-shadow: 0 20px 60px rgba(0,0,0,0.3); overflow: hidden; }
.header { background: linear-gradient(135deg, #0066FF 0%, #0052CC 100%); color: white; padding: 30px; text-align: center; }
.logo { max-width: 180px; max-height: 60px; margin-bottom: 15px; }
.company-name { font-size: 24px; font-weight: 700; margin-bottom: 5px; }
.devis-number { font-size: 18px; opacity: 0.9; }
.content { padding: 30px; }
.status-badge { display: inline-block; padding: 8px 16px; border-radius: 20px; font-size: 14px; font-weight: 600; margin-bottom: 20px; }
.status-envoye, .status-vu { background: #E3F2FD; color: #1976D2; }
.status-signe { background: #E8F5E9; color: #388E3C; }
.status-refuse { background: #FFEBEE; color: #D32F2F; }
.section { margin-bottom: 30px; }
.section-title { font-size: 16px; font-weight: 600; color: #333; margin-bottom: 15px; padding-bottom: 10px; border-bottom: 2px solid #f0f0f0; }
.info-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; }
@media (max-width: 600px) { .info-grid { grid-template-columns: 1fr; } }
.info-box { background: #f8f9fa; padding: 20px; border-radius: 12px; }
.info-label { font-size: 12px; text-transform: uppercase; color: #666; margin-bottom: 8px; font-weight: 600; }
.info-value { font-size: 15px; color: #333; line-height: 1.6; }
.info-name { font-weight: 600; font-size: 17px; margin-bottom: 5px; }
.prestations-table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
.prestations-table th { background: #0066FF; color: white; padding: 12px; text-align: left; font-size: 13px; font-weight: 600; }
.prestations-table td { padding: 15px 12px; border-bottom: 1px solid #eee; font-size: 14px; }
.totals { background: #f8f9fa; padding: 20px; border-radius: 12px; margin-left: auto; max-width: 300px; }
.total-row { display: flex; justify-content: space-between; padding: 8px 0; font-size: 15px; }
.total-row.final { border-top: 2px solid #0066FF; margin-top: 10px; padding-top: 15px; font-size: 20px; font-weight: 700; color: #0066FF; }
.conditions { background: #fff8e1; border-left: 4px solid #ffc107; padding: 15px 20px; border-radius: 0 8px 8px 0; margin-bottom: 30px; }
.conditions-title { font-weight: 600; margin-bottom: 8px; color: #333; }
.conditions-text { font-size: 13px; color: #666; line-height: 1.6; }
.signature-section { border: 2px dashed #ddd; border-radius: 12px; padding: 25px; text-align: center; }
.signature-section.signed { border-color: #4CAF50; background: #E8F5E9; }
.signature-section.refused { border-color: #f44336; background: #FFEBEE; }
.signature-title { font-size: 18px; font-weight: 600; margin-bottom: 15px; color: #333; }
.signature-image { max-width: 100%; max-height: 150px; margin: 20px 0; }
.signature-info { font-size: 13px; color: #666; margin-top: 10px; }
.footer { text-align: center; padding: 20px; background: #f8f9fa; font-size: 12px; color: #666; }
"#;

/// Pad, buttons and feedback styling, only served while the quote can
/// still be signed or refused
const SIGNING_STYLE: &str = r#"
.signature-canvas-container { background: white; border: 1px solid #ddd; border-radius: 8px; margin-bottom: 15px; position: relative; }
#signatureCanvas { width: 100%; height: 200px; cursor: crosshair; touch-action: none; }
.btn-group { display: flex; gap: 15px; margin-top: 20px; flex-wrap: wrap; justify-content: center; }
.btn { padding: 14px 30px; border-radius: 8px; font-size: 16px; font-weight: 600; cursor: pointer; border: none; transition: all 0.2s; }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn-primary { background: linear-gradient(135deg, #4CAF50 0%, #388E3C 100%); color: white; }
.btn-secondary { background: #f0f0f0; color: #333; }
.btn-danger { background: linear-gradient(135deg, #f44336 0%, #d32f2f 100%); color: white; }
.name-input { width: 100%; max-width: 300px; padding: 12px 16px; border: 2px solid #ddd; border-radius: 8px; font-size: 16px; margin-bottom: 15px; text-align: center; }
.name-input:focus { outline: none; border-color: #0066FF; }
.message { padding: 15px 20px; border-radius: 8px; margin-bottom: 20px; font-weight: 500; }
.message-success { background: #E8F5E9; color: #2E7D32; border: 1px solid #A5D6A7; }
.message-error { background: #FFEBEE; color: #C62828; border: 1px solid #EF9A9A; }
.loading { display: inline-block; width: 20px; height: 20px; border: 3px solid #fff; border-radius: 50%; border-top-color: transparent; animation: spin 1s linear infinite; margin-right: 10px; }
@keyframes spin { to { transform: rotate(360deg); } }
"#;

const SCRIPT: &str = r#"
let canvas, ctx, isDrawing = false, lastX = 0, lastY = 0;

document.addEventListener('DOMContentLoaded', function() {
  canvas = document.getElementById('signatureCanvas');
  if (!canvas) return;
  ctx = canvas.getContext('2d');
  const container = canvas.parentElement;
  canvas.width = container.offsetWidth - 2;
  canvas.height = 200;
  ctx.strokeStyle = '#000';
  ctx.lineWidth = 2;
  ctx.lineCap = 'round';
  ctx.lineJoin = 'round';
  canvas.addEventListener('mousedown', startDrawing);
  canvas.addEventListener('mousemove', draw);
  canvas.addEventListener('mouseup', stopDrawing);
  canvas.addEventListener('mouseout', stopDrawing);
  canvas.addEventListener('touchstart', handleTouchStart, { passive: false });
  canvas.addEventListener('touchmove', handleTouchMove, { passive: false });
  canvas.addEventListener('touchend', stopDrawing);
});

function startDrawing(e) {
  isDrawing = true;
  const rect = canvas.getBoundingClientRect();
  lastX = e.clientX - rect.left;
  lastY = e.clientY - rect.top;
}

function draw(e) {
  if (!isDrawing) return;
  const rect = canvas.getBoundingClientRect();
  const x = e.clientX - rect.left;
  const y = e.clientY - rect.top;
  ctx.beginPath();
  ctx.moveTo(lastX, lastY);
  ctx.lineTo(x, y);
  ctx.stroke();
  lastX = x;
  lastY = y;
}

function handleTouchStart(e) {
  e.preventDefault();
  const touch = e.touches[0];
  const rect = canvas.getBoundingClientRect();
  lastX = touch.clientX - rect.left;
  lastY = touch.clientY - rect.top;
  isDrawing = true;
}

function handleTouchMove(e) {
  e.preventDefault();
  if (!isDrawing) return;
  const touch = e.touches[0];
  const rect = canvas.getBoundingClientRect();
  const x = touch.clientX - rect.left;
  const y = touch.clientY - rect.top;
  ctx.beginPath();
  ctx.moveTo(lastX, lastY);
  ctx.lineTo(x, y);
  ctx.stroke();
  lastX = x;
  lastY = y;
}

function stopDrawing() { isDrawing = false; }

function clearSignature() {
  if (ctx) { ctx.clearRect(0, 0, canvas.width, canvas.height); }
}

function isCanvasEmpty() {
  const pixelData = ctx.getImageData(0, 0, canvas.width, canvas.height).data;
  for (let i = 3; i < pixelData.length; i += 4) {
    if (pixelData[i] !== 0) return false;
  }
  return true;
}

function showMessage(text, type) {
  const container = document.getElementById('messageContainer');
  container.innerHTML = '<div class="message message-' + type + '">' + text + '</div>';
  container.scrollIntoView({ behavior: 'smooth' });
}

async function submitSignature() {
  const signerName = document.getElementById('signerName').value.trim();
  if (!signerName) {
    showMessage('Veuillez entrer votre nom', 'error');
    return;
  }
  if (isCanvasEmpty()) {
    showMessage('Veuillez signer dans le cadre', 'error');
    return;
  }
  const btn = document.getElementById('btnSign');
  btn.disabled = true;
  btn.innerHTML = '<span class="loading"></span>Signature en cours...';
  try {
    const signatureData = canvas.toDataURL('image/png');
    const response = await fetch('/api/devis/' + devisId + '/signer', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ signature_data: signatureData, signe_par: signerName })
    });
    if (!response.ok) throw new Error('Erreur');
    showMessage('Devis signé avec succès ! Merci pour votre confiance.', 'success');
    setTimeout(() => location.reload(), 2000);
  } catch (error) {
    showMessage('Erreur lors de la signature. Veuillez réessayer.', 'error');
    btn.disabled = false;
    btn.innerHTML = 'Signer le devis';
  }
}

async function refuseDevis() {
  const motif = prompt('Motif du refus (optionnel):');
  const btn = document.getElementById('btnRefuse');
  btn.disabled = true;
  btn.innerHTML = '<span class="loading"></span>En cours...';
  try {
    const response = await fetch('/api/devis/' + devisId + '/refuser', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ motif })
    });
    if (!response.ok) throw new Error('Erreur');
    showMessage('Le devis a été refusé.', 'success');
    setTimeout(() => location.reload(), 2000);
  } catch (error) {
    showMessage('Erreur. Veuillez réessayer.', 'error');
    btn.disabled = false;
    btn.innerHTML = 'Refuser le devis';
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn sample_devis(statut: &str) -> DevisModel {
        let created = Utc.with_ymd_and_hms(2025, 1, 14, 10, 0, 0).unwrap();
        DevisModel {
            id: Uuid::new_v4(),
            numero: "DEV-20250114-3F2A".to_string(),
            intervention_id: None,
            client_nom: "Durand".to_string(),
            client_prenom: Some("Marie".to_string()),
            client_email: None,
            client_tel: None,
            client_adresse: Some("12 rue de la Paix".to_string()),
            client_cp: Some("75002".to_string()),
            client_ville: Some("Paris".to_string()),
            lignes: json!([
                {"description": "Ouverture de porte", "quantite": 1.0, "prix_unitaire": 80.0, "tva_taux": 20.0}
            ]),
            total_ht: 80.0,
            total_tva: 16.0,
            total_ttc: 96.0,
            statut: statut.to_string(),
            date_validite: None,
            signature_data: None,
            signe_par: None,
            signe_le: None,
            notes: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    #[test]
    fn price_uses_french_formatting() {
        assert_eq!(format_price(96.0), "96,00 €");
        assert_eq!(format_price(1234.5), "1\u{202F}234,50 €");
        assert_eq!(format_price(0.0), "0,00 €");
    }

    #[test]
    fn date_uses_french_months() {
        let d = Utc.with_ymd_and_hms(2025, 1, 14, 10, 0, 0).unwrap().into();
        assert_eq!(format_date(Some(&d)), "14 janvier 2025");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn escaping_covers_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("O'Brien & fils"), "O&#39;Brien &amp; fils");
    }

    #[test]
    fn signable_page_has_pad_and_both_actions() {
        let devis = sample_devis("envoye");
        let html = render_signature_page(&devis, None);

        assert!(html.contains("signatureCanvas"));
        assert!(html.contains("signerName"));
        assert!(html.contains("/signer"));
        assert!(html.contains("/refuser"));
        assert!(html.contains("isCanvasEmpty"));
        assert!(html.contains("DEV-20250114-3F2A"));
        assert!(html.contains("96,00 €"));
    }

    #[test]
    fn signed_page_shows_artifact_not_pad() {
        let mut devis = sample_devis("signe");
        devis.signature_data = Some("data:image/png;base64,AAAA".to_string());
        devis.signe_par = Some("Marie Durand".to_string());
        devis.signe_le = Some(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap().into());

        let html = render_signature_page(&devis, None);
        assert!(html.contains("Devis signé"));
        assert!(html.contains("data:image/png;base64,AAAA"));
        assert!(html.contains("Marie Durand"));
        assert!(html.contains("15 janvier 2025"));
        assert!(!html.contains("signatureCanvas"));
        assert!(!html.contains("btnSign"));
        assert!(!html.contains("submitSignature"));
    }

    #[test]
    fn refused_page_shows_reason_not_pad() {
        let mut devis = sample_devis("refuse");
        devis.notes = Some("Trop cher".to_string());

        let html = render_signature_page(&devis, None);
        assert!(html.contains("Devis refusé"));
        assert!(html.contains("Trop cher"));
        assert!(!html.contains("signatureCanvas"));
        assert!(!html.contains("btnRefuse"));
        assert!(!html.contains("refuseDevis"));
    }

    #[test]
    fn client_data_is_escaped() {
        let mut devis = sample_devis("envoye");
        devis.client_nom = "<script>steal()</script>".to_string();

        let html = render_signature_page(&devis, None);
        assert!(!html.contains("<script>steal()"));
        assert!(html.contains("&lt;script&gt;steal()"));
    }

    #[test]
    fn company_profile_feeds_header_and_footer() {
        let devis = sample_devis("envoye");
        let entreprise = EntrepriseModel {
            id: Uuid::new_v4(),
            nom: "Urgence Serrurerie".to_string(),
            siret: Some("123 456 789 00010".to_string()),
            telephone: Some("01 42 00 00 00".to_string()),
            email: Some("contact@example.com".to_string()),
            adresse: None,
            logo_url: None,
            conditions_devis: Some("Acompte de 30% à la signature.".to_string()),
            mention_legale: None,
            updated_at: Utc::now().into(),
        };

        let html = render_signature_page(&devis, Some(&entreprise));
        assert!(html.contains("Urgence Serrurerie"));
        assert!(html.contains("123 456 789 00010"));
        assert!(html.contains("Acompte de 30%"));
    }
}
