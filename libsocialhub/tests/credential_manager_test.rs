use libsocialhub::credentials::{
    CredentialConfig, CredentialManager, CredentialStore, StorageBackend,
};
use libsocialhub::error::StoreError;
use libsocialhub::{Config, PlatformCredentials, PlatformId, SocialHub};
use serial_test::serial;
use tempfile::TempDir;

fn encrypted_config(temp_dir: &TempDir, password: Option<&str>) -> CredentialConfig {
    CredentialConfig {
        storage: StorageBackend::Encrypted,
        path: temp_dir.path().to_str().unwrap().to_string(),
        master_password: password.map(str::to_string),
    }
}

fn manager_with(temp_dir: &TempDir, password: &str) -> CredentialManager {
    CredentialManager::new(encrypted_config(temp_dir, Some(password))).unwrap()
}

#[test]
fn test_credential_manager_encrypted_storage() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_with(&temp_dir, "test-password-12345");

    let creds = PlatformCredentials::default()
        .with_bluesky("alice.bsky.social", "pw")
        .with_threads("42", "token");

    manager.save(&creds).unwrap();
    assert!(manager.exists().unwrap());

    // A second manager over the same directory sees the same record
    let reopened = manager_with(&temp_dir, "test-password-12345");
    let loaded = reopened.load().unwrap();
    assert_eq!(loaded, creds);
    assert_eq!(
        loaded.configured_platforms(),
        vec![PlatformId::Bluesky, PlatformId::Threads]
    );

    reopened.delete().unwrap();
    assert!(!manager.exists().unwrap());
}

#[test]
fn test_credential_manager_wrong_password() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_with(&temp_dir, "test-password-12345");
    manager
        .save(&PlatformCredentials::default().with_bluesky("alice", "pw"))
        .unwrap();

    let intruder = manager_with(&temp_dir, "wrong-password-000");
    assert!(matches!(intruder.load(), Err(StoreError::DecryptionFailed)));
}

#[test]
#[serial]
fn test_service_reads_master_password_from_env() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_var("SOCIALHUB_MASTER_PASSWORD", "env-password-123");

    let mut config = Config::default();
    config.credentials = encrypted_config(&temp_dir, None);

    let hub = SocialHub::from_config(config).unwrap();
    assert_eq!(hub.backend_name(), "encrypted_file");

    hub.save_credentials(&PlatformCredentials::default().with_x("a", "b", "c", "d"))
        .unwrap();
    assert!(hub.credentials_exist());
    assert!(temp_dir.path().join("credentials.age").exists());

    std::env::remove_var("SOCIALHUB_MASTER_PASSWORD");
}

#[test]
#[serial]
fn test_service_weak_env_password_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_var("SOCIALHUB_MASTER_PASSWORD", "short");

    let mut config = Config::default();
    config.credentials = encrypted_config(&temp_dir, None);

    let result = SocialHub::from_config(config);
    std::env::remove_var("SOCIALHUB_MASTER_PASSWORD");

    assert!(matches!(
        result,
        Err(libsocialhub::SocialHubError::Store(StoreError::WeakPassword))
    ));
}
