//! End-to-end ingestion tests against a mock upstream API

use mockito::{Matcher, Server};
use serde_json::json;
use shroud::adapters::sqlite::UserStore;
use shroud::anonymization::KeyMaterial;
use shroud::auth::CredentialStore;
use shroud::config::{secret_string, ShroudConfig};
use shroud::core::ingest::IngestCoordinator;
use shroud::domain::{ShroudError, SourceError};
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn person(first: &str, email: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "firstname": first,
        "lastname": "Doe",
        "email": email,
        "phone": "+15551234567",
        "birthday": "1990-05-01",
        "gender": "female",
        "address": {
            "id": 0,
            "street": "12 Elm St",
            "streetName": "Elm St",
            "buildingNumber": "12",
            "city": "Springfield",
            "zipcode": "12345",
            "country": "United States",
            "county_code": "US",
            "latitude": 39.78,
            "longitude": -89.65
        },
        "website": "http://example.com",
        "image": "http://placeimg.com/640/480/people"
    })
}

fn body(people: Vec<serde_json::Value>) -> String {
    json!({
        "status": "OK",
        "code": 200,
        "total": people.len(),
        "data": people
    })
    .to_string()
}

fn config(dir: &Path, url: String) -> ShroudConfig {
    let mut config = ShroudConfig::default();
    config.source.url = url;
    config.source.gender = Some("female".to_string());
    config.source.retry.initial_delay_ms = 1;
    config.source.retry.max_delay_ms = 5;
    config.storage.database_path = dir.join("data").join("users.db");
    config.keys.path = dir.join("keys").join("identity_keys.json");
    config.auth.credentials_path = dir.join("keys").join("credentials.json");
    config.auth.admin_key = Some(secret_string("admin".to_string()));
    config.auth.database_key = Some(secret_string("db".to_string()));
    config.anonymization.audit.log_path = dir.join("audit").join("anonymization.log");
    config.logging.local_enabled = false;
    config
}

/// Temp dir with key material and credential hashes in place
fn provisioned(url: String) -> (TempDir, ShroudConfig) {
    let dir = tempdir().unwrap();
    let config = config(dir.path(), url);
    KeyMaterial::create(&config.keys.path).unwrap();
    CredentialStore::load(&config.auth.credentials_path)
        .unwrap()
        .set_keys(
            &secret_string("admin".to_string()),
            &secret_string("db".to_string()),
        )
        .unwrap();
    (dir, config)
}

#[tokio::test]
async fn test_ingest_twice_is_idempotent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![
            person("Anna", "anna@example.com"),
            person("Bob", "bob@example.com"),
        ]))
        .expect(2)
        .create_async()
        .await;

    let (_dir, config) = provisioned(format!("{}/persons", server.url()));

    let first = IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.fetched, 2);
    assert_eq!(first.inserted, 2);
    assert_eq!(first.last_id, 2);

    let second = IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.last_id, 2);

    mock.assert_async().await;

    let store = UserStore::open(&config.storage.database_path).unwrap();
    assert_eq!(store.count().unwrap(), 2);

    let user = store.find_user(1).unwrap().unwrap();
    assert_eq!(user.email, "****@example.com");

    let keys = KeyMaterial::load(&config.keys.path).unwrap();
    let ciphertext = store.find_ciphertext(1).unwrap().unwrap();
    assert_eq!(keys.decrypt(&ciphertext).unwrap(), "anna@example.com");
}

#[tokio::test]
async fn test_audit_log_has_no_plaintext() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![person("Anna", "anna@example.com")]))
        .create_async()
        .await;

    let (_dir, config) = provisioned(format!("{}/persons", server.url()));
    IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    let audit = std::fs::read_to_string(&config.anonymization.audit.log_path).unwrap();
    assert_eq!(audit.lines().count(), 1);
    assert!(!audit.contains("anna@example.com"));
    assert!(!audit.contains("Anna"));
    assert!(audit.contains("firstname"));
}

#[tokio::test]
async fn test_chunked_fetch_requests_remaining_quantity() {
    let mut server = Server::new_async().await;
    let first_chunk = server
        .mock("GET", "/persons")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("_quantity".into(), "2".into()),
            Matcher::UrlEncoded("_gender".into(), "female".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![
            person("Anna", "anna@example.com"),
            person("Bob", "bob@example.com"),
        ]))
        .expect(1)
        .create_async()
        .await;
    let last_chunk = server
        .mock("GET", "/persons")
        .match_query(Matcher::UrlEncoded("_quantity".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![person("Cleo", "cleo@example.com")]))
        .expect(1)
        .create_async()
        .await;

    let (_dir, mut config) = provisioned(format!("{}/persons", server.url()));
    config.source.max_records = Some(3);
    config.source.chunk_size = Some(2);

    let summary = IngestCoordinator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    first_chunk.assert_async().await;
    last_chunk.assert_async().await;
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.inserted, 3);
}

#[tokio::test]
async fn test_server_errors_are_retried_then_abort() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .expect(3)
        .create_async()
        .await;

    let (_dir, config) = provisioned(format!("{}/persons", server.url()));
    let result = IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await;

    mock.assert_async().await;
    assert!(matches!(
        result,
        Err(ShroudError::Source(SourceError::ServerError { status: 503, .. }))
    ));
    assert!(!config.storage.database_path.exists());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let (_dir, config) = provisioned(format!("{}/persons", server.url()));
    let result = IngestCoordinator::from_config(config)
        .unwrap()
        .run()
        .await;

    mock.assert_async().await;
    assert!(matches!(
        result,
        Err(ShroudError::Source(SourceError::ClientError { status: 404, .. }))
    ));
}

#[tokio::test]
async fn test_quality_gate_blocks_insert() {
    let mut server = Server::new_async().await;
    let mut incomplete = person("Bob", "bob@example.com");
    incomplete.as_object_mut().unwrap().remove("email");

    server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![person("Anna", "anna@example.com"), incomplete]))
        .create_async()
        .await;

    let (_dir, config) = provisioned(format!("{}/persons", server.url()));
    let result = IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await;

    assert!(matches!(result, Err(ShroudError::Validation(_))));
    assert!(!config.storage.database_path.exists());
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/persons")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body(vec![person("Anna", "anna@example.com")]))
        .create_async()
        .await;

    let (_dir, mut config) = provisioned(format!("{}/persons", server.url()));
    config.application.dry_run = true;
    config.auth.admin_key = None;

    let summary = IngestCoordinator::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.dry_run);
    let report = summary.report.unwrap();
    assert_eq!(report.total_records, 1);
    assert_eq!(report.records_with_identity, 1);
    assert!(!config.storage.database_path.exists());
}
