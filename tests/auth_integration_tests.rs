//! Integration tests for staff authentication.

use reqwest::StatusCode;
use serde_json::{json, Value};
use urgence_api::repositories::technicien::CreateTechnicienRequest;
use urgence_api::repositories::TechnicienRepository;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{create_staff, spawn_test_app, test_config};

#[tokio::test]
async fn public_endpoints_need_no_auth() {
    let (server_url, _db, handle) = spawn_test_app(test_config()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/", server_url)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["service"], "urgence-api");

    let response = client
        .get(format!("{}/health", server_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/openapi.json", server_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let config = test_config();
    let (server_url, db, handle) = spawn_test_app(config).await;
    let tech = create_staff(&db, "karim", "s3cret!", "admin").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", server_url))
        .json(&json!({"nom": "karim", "mdp": "s3cret!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().expect("token in login response");
    assert_eq!(body["technicien"]["nom"], "karim");
    assert_eq!(body["technicien"]["en_ligne"], true);
    assert!(
        body["technicien"].get("mdp").is_none(),
        "password column must never be serialized"
    );

    let response = client
        .get(format!("{}/api/auth/me", server_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["id"], json!(tech.id));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn wrong_password_and_unknown_account_both_401() {
    let (server_url, db, handle) = spawn_test_app(test_config()).await;
    create_staff(&db, "karim", "s3cret!", "technicien").await;
    let client = reqwest::Client::new();

    for payload in [
        json!({"nom": "karim", "mdp": "wrong"}),
        json!({"nom": "nobody", "mdp": "s3cret!"}),
    ] {
        let response = client
            .post(format!("{}/api/auth/login", server_url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        // Same message for both failure modes; no account enumeration.
        assert_eq!(body["message"], "Identifiants invalides");
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn legacy_plaintext_password_is_upgraded_on_login() {
    let (server_url, db, handle) = spawn_test_app(test_config()).await;

    // A row imported from the legacy system still holds plaintext.
    let repo = TechnicienRepository::new(&db);
    let tech = repo
        .create(CreateTechnicienRequest {
            nom: "ancien".to_string(),
            prenom: None,
            email: None,
            telephone: None,
            mdp: "motdepasse".to_string(),
            role: "technicien".to_string(),
            departements: None,
            pourcentage_tech: 50.0,
        })
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/auth/login", server_url))
        .json(&json!({"nom": "ancien", "mdp": "motdepasse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = repo.find_by_id(tech.id).await.unwrap().unwrap();
    assert!(
        stored.mdp.starts_with("$argon2"),
        "plaintext must be replaced by a hash after a successful login"
    );

    // The upgraded hash still accepts the same password.
    let response = client
        .post(format!("{}/api/auth/login", server_url))
        .json(&json!({"nom": "ancien", "mdp": "motdepasse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn inactive_accounts_cannot_log_in() {
    let (server_url, db, handle) = spawn_test_app(test_config()).await;
    let tech = create_staff(&db, "parti", "s3cret!", "technicien").await;

    let repo = TechnicienRepository::new(&db);
    repo.update(
        tech.id,
        urgence_api::repositories::technicien::UpdateTechnicienRequest {
            actif: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/auth/login", server_url))
        .json(&json!({"nom": "parti", "mdp": "s3cret!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let (server_url, _db, handle) = spawn_test_app(test_config()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/devis", server_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/api/devis", server_url))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn logout_goes_offline_and_clears_push_token() {
    let config = test_config();
    let (server_url, db, handle) = spawn_test_app(config.clone()).await;
    let tech = create_staff(&db, "karim", "s3cret!", "technicien").await;
    let auth = test_utils::bearer_for(&config, &tech);
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/push-token", server_url))
        .header("Authorization", &auth)
        .json(&json!({"push_token": "ExponentPushToken[abc123]"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/api/auth/logout", server_url))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let repo = TechnicienRepository::new(&db);
    let stored = repo.find_by_id(tech.id).await.unwrap().unwrap();
    assert!(!stored.en_ligne);
    assert!(stored.push_token.is_none());

    handle.shutdown().await.unwrap();
}
