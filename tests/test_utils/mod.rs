//! Test utilities shared by the integration suites: an in-memory database
//! with migrations applied and a real server bound to a random port.

use anyhow::{Context, Result as AnyhowResult};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use urgence_api::auth::hash_password;
use urgence_api::config::AppConfig;
use urgence_api::models::technicien::Model as TechnicienModel;
use urgence_api::repositories::technicien::CreateTechnicienRequest;
use urgence_api::repositories::TechnicienRepository;
use urgence_api::server::{create_app, AppState};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> AnyhowResult<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

pub struct TestServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<AnyhowResult<()>>>,
}

impl TestServerHandle {
    pub async fn shutdown(mut self) -> AnyhowResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.take() {
            handle.await.context("server task join failed")??;
        }

        Ok(())
    }
}

impl Drop for TestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns the full application on a random local port.
pub async fn spawn_test_app(config: AppConfig) -> (String, DatabaseConnection, TestServerHandle) {
    let db = setup_test_db().await.expect("test database");
    let state = AppState::new(config, db.clone());
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_url = format!("http://{}", addr);

    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let _ = ready_tx.send(());

        server.await.context("axum server error")
    });

    ready_rx.await.expect("server task to signal readiness");

    (
        server_url,
        db,
        TestServerHandle {
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(server_task),
        },
    )
}

/// Test configuration with a fixed JWT secret and no push gateway.
pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "integration-test-secret".to_string(),
        ..AppConfig::default()
    }
}

/// Inserts a staff account with a hashed password and returns its row.
#[allow(dead_code)]
pub async fn create_staff(
    db: &DatabaseConnection,
    nom: &str,
    mdp: &str,
    role: &str,
) -> TechnicienModel {
    let repo = TechnicienRepository::new(db);
    repo.create(CreateTechnicienRequest {
        nom: nom.to_string(),
        prenom: None,
        email: None,
        telephone: None,
        mdp: hash_password(mdp).unwrap(),
        role: role.to_string(),
        departements: None,
        pourcentage_tech: 50.0,
    })
    .await
    .expect("staff account")
}

/// Issues a bearer token for the given account against the test secret.
#[allow(dead_code)]
pub fn bearer_for(config: &AppConfig, tech: &TechnicienModel) -> String {
    let token = urgence_api::auth::issue_token(tech, &config.jwt_secret, config.jwt_ttl_days)
        .expect("token");
    format!("Bearer {}", token)
}
