use super::*;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

const TEST_PASSWORD: &str = "test_password_123";

fn sample_credentials() -> PlatformCredentials {
    PlatformCredentials::default()
        .with_bluesky("alice.bsky.social", "app-pass-1234")
        .with_x("ckey", "csecret", "atoken", "asecret")
        .with_threads("1789", "threads-token")
}

// Helper function to create a test config with encrypted storage
fn test_config(temp_dir: &TempDir) -> CredentialConfig {
    CredentialConfig {
        storage: StorageBackend::Encrypted,
        path: temp_dir.path().to_string_lossy().to_string(),
        master_password: Some(TEST_PASSWORD.to_string()),
    }
}

#[cfg(test)]
mod record_tests {
    use super::*;

    #[test]
    fn test_debug_masks_secrets() {
        let debug = format!("{:?}", sample_credentials());
        assert!(debug.contains("alice.bsky.social"));
        assert!(!debug.contains("app-pass-1234"));
        assert!(!debug.contains("csecret"));
        assert!(!debug.contains("threads-token"));
        assert!(debug.contains("********"));
    }

    #[test]
    fn test_configured_platforms() {
        let creds = PlatformCredentials::default().with_threads("1789", "token");
        assert_eq!(creds.configured_platforms(), vec![PlatformId::Threads]);

        assert_eq!(
            sample_credentials().configured_platforms(),
            PlatformId::ALL.to_vec()
        );
        assert!(PlatformCredentials::default()
            .configured_platforms()
            .is_empty());
    }

    #[test]
    fn test_missing_fields_are_named() {
        let mut creds = PlatformCredentials::default();
        creds.x_consumer_key = "ckey".to_string();
        creds.x_access_token = "   ".to_string();

        assert_eq!(
            creds.missing_fields(PlatformId::X),
            vec!["x_consumer_secret", "x_access_token", "x_access_token_secret"]
        );

        match creds.x() {
            Err(PlatformError::Credentials(reason)) => {
                assert!(reason.contains("X requires"));
                assert!(reason.contains("x_consumer_secret"));
            }
            other => panic!("Expected Credentials error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_extraction_trims_identifiers() {
        let creds = PlatformCredentials::default().with_bluesky("  alice.bsky.social \n", "pw");
        let bluesky = creds.bluesky().unwrap();
        assert_eq!(bluesky.identifier, "alice.bsky.social");
        assert_eq!(bluesky.app_password, "pw");
    }

    #[test]
    fn test_field_access_by_name() {
        let mut creds = PlatformCredentials::default();
        for (name, _, _) in CREDENTIAL_FIELDS {
            assert!(creds.set_field(name, format!("value-{}", name)));
        }
        assert!(!creds.set_field("mastodon_token", "nope".to_string()));

        assert_eq!(creds.field("threads_user_id"), Some("value-threads_user_id"));
        assert_eq!(creds.field("mastodon_token"), None);
        assert_eq!(creds.configured_platforms(), PlatformId::ALL.to_vec());
    }

    #[test]
    fn test_partial_record_deserializes() {
        let creds: PlatformCredentials =
            serde_json::from_str(r#"{"threads_user_id":"42","threads_access_token":"t"}"#)
                .unwrap();
        assert_eq!(creds.threads_user_id, "42");
        assert!(creds.bluesky_identifier.is_empty());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "<empty>");
        assert_eq!(mask("secret"), "********");
    }
}

#[cfg(test)]
mod keyring_store_tests {
    use super::*;

    const TEST_SERVICE: &str = "socialhub.test";

    #[test]
    #[serial] // Serialize keyring tests to avoid conflicts
    #[ignore = "requires OS keyring"]
    fn test_keyring_store_operations() {
        let store = KeyringStore::with_service(TEST_SERVICE, "roundtrip")
            .expect("Failed to create KeyringStore");

        let _ = store.delete();

        store
            .save(&sample_credentials())
            .expect("Failed to save");

        assert!(
            store.exists().expect("Failed to check exists"),
            "Record should exist after saving"
        );

        let loaded = store.load().expect("Failed to load");
        assert_eq!(loaded, sample_credentials());

        store.delete().expect("Failed to delete");
        assert!(
            !store.exists().expect("Failed to check exists after delete"),
            "Record should not exist after deletion"
        );
    }

    #[test]
    #[serial]
    #[ignore = "requires OS keyring"]
    fn test_keyring_load_nonexistent() {
        let store = KeyringStore::with_service(TEST_SERVICE, "missing").unwrap();
        let _ = store.delete();

        match store.load() {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("Expected NotFound error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    #[serial]
    #[ignore = "requires OS keyring"]
    fn test_keyring_delete_missing_is_ok() {
        let store = KeyringStore::with_service(TEST_SERVICE, "never-saved").unwrap();
        store.delete().expect("first delete");
        store.delete().expect("second delete");
    }

    #[test]
    fn test_keyring_access_check() {
        assert!(check_keyring_access(Ok("{}".to_string())).is_ok());
        assert!(check_keyring_access(Err(keyring::Error::NoEntry)).is_ok());

        let no_dbus = keyring::Error::PlatformFailure(
            "no secret service provider or dbus session found".into(),
        );
        match check_keyring_access(Err(no_dbus)) {
            Err(StoreError::KeyringUnavailable(reason)) => assert!(reason.contains("dbus")),
            other => panic!("Expected KeyringUnavailable, got {:?}", other),
        }

        let locked = keyring::Error::NoStorageAccess("keychain is locked".into());
        assert!(matches!(
            check_keyring_access(Err(locked)),
            Err(StoreError::KeyringUnavailable(_))
        ));
    }

    #[test]
    fn test_keyring_record_naming() {
        assert_eq!(KEYRING_SERVICE, "socialhub.credentials");
        assert_eq!(KEYRING_ACCOUNT, "default");
    }
}

#[cfg(test)]
mod encrypted_store_tests {
    use super::*;

    #[test]
    fn test_encrypted_store_operations() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();

        assert!(!store.exists().unwrap());

        store.save(&sample_credentials()).expect("Failed to save");
        assert!(store.exists().unwrap());
        assert!(temp_dir.path().join("credentials.age").exists());

        let loaded = store.load().expect("Failed to load");
        assert_eq!(loaded, sample_credentials());

        store.delete().expect("Failed to delete");
        assert!(!store.exists().unwrap());
    }

    #[test]
    fn test_encrypted_store_save_replaces_whole_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();

        store.save(&sample_credentials()).unwrap();

        let replacement = PlatformCredentials::default().with_bluesky("bob.bsky.social", "pw2");
        store.save(&replacement).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, replacement);
        assert!(loaded.x_consumer_key.is_empty());

        // No temporary files left behind
        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["credentials.age".to_string()]);
    }

    #[test]
    fn test_encrypted_store_concurrent_saves() {
        let temp_dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(
            EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let record = PlatformCredentials::default()
                        .with_bluesky(&format!("user{}.bsky.social", i), "pw");
                    store.save(&record)
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().expect("every save should succeed");
        }

        // Whichever save landed last, the record is whole
        let loaded = store.load().unwrap();
        assert!(loaded.bluesky_identifier.starts_with("user"));
        assert_eq!(loaded.bluesky_app_password, "pw");

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["credentials.age".to_string()]);
    }

    #[test]
    fn test_encrypted_store_file_is_not_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();
        store.save(&sample_credentials()).unwrap();

        let raw = fs::read(store.file_path()).unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(!raw.contains("app-pass-1234"));
        assert!(!raw.contains("alice.bsky.social"));
    }

    #[test]
    fn test_encrypted_store_weak_password() {
        let temp_dir = TempDir::new().unwrap();
        let result = EncryptedFileStore::new(temp_dir.path().to_path_buf(), "short");
        assert!(matches!(result, Err(StoreError::WeakPassword)));
    }

    #[test]
    fn test_encrypted_store_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();
        store.save(&sample_credentials()).unwrap();

        let other =
            EncryptedFileStore::new(temp_dir.path().to_path_buf(), "another_password").unwrap();
        assert!(matches!(other.load(), Err(StoreError::DecryptionFailed)));
    }

    #[test]
    fn test_encrypted_store_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));
        store.delete().expect("deleting a missing record is not an error");
    }

    #[test]
    #[cfg(unix)]
    fn test_encrypted_store_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();
        store.save(&sample_credentials()).unwrap();

        let mode = fs::metadata(store.file_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "File should have 600 permissions");
    }

    #[test]
    #[cfg(unix)]
    fn test_encrypted_store_rejects_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let real_dir = temp_dir.path().join("real");
        let link_dir = temp_dir.path().join("link");

        let real = EncryptedFileStore::new(real_dir.clone(), TEST_PASSWORD).unwrap();
        real.save(&sample_credentials()).unwrap();

        fs::create_dir_all(&link_dir).unwrap();
        std::os::unix::fs::symlink(real.file_path(), link_dir.join(ENCRYPTED_FILE_NAME)).unwrap();

        let linked = EncryptedFileStore::new(link_dir, TEST_PASSWORD).unwrap();
        assert!(matches!(linked.load(), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_encrypted_store_corrupted_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();

        fs::write(store.file_path(), b"not an age file").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Encryption(_))));
    }

    #[test]
    fn test_encrypted_store_backend_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();
        assert_eq!(store.backend_name(), "encrypted_file");
    }
}

#[cfg(test)]
mod memory_store_tests {
    use super::*;

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        assert!(!store.exists().unwrap());
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));

        store.save(&sample_credentials()).unwrap();
        assert!(store.exists().unwrap());
        assert_eq!(store.load().unwrap(), sample_credentials());

        store.delete().unwrap();
        assert!(!store.exists().unwrap());
        assert_eq!(store.backend_name(), "memory");
    }
}

#[cfg(test)]
mod credential_manager_tests {
    use super::*;

    #[test]
    fn test_credential_manager_encrypted_backend() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CredentialManager::new(test_config(&temp_dir)).unwrap();

        assert_eq!(manager.backends(), vec!["encrypted_file"]);
        assert_eq!(manager.backend_name(), "encrypted_file");

        manager.save(&sample_credentials()).unwrap();
        assert!(manager.exists().unwrap());
        assert_eq!(manager.load().unwrap(), sample_credentials());

        manager.delete().unwrap();
        assert!(!manager.exists().unwrap());
    }

    #[test]
    fn test_credential_manager_falls_back_when_keyring_unreachable() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.storage = StorageBackend::Keyring;

        let manager = CredentialManager::with_keyring(config, || {
            Err(StoreError::KeyringUnavailable(
                "no secret service provider or dbus session found".to_string(),
            ))
        })
        .unwrap();

        assert_eq!(manager.backends(), vec!["encrypted_file"]);

        manager.save(&sample_credentials()).unwrap();
        assert!(manager.exists().unwrap());
        assert_eq!(manager.load().unwrap(), sample_credentials());
        assert!(temp_dir.path().join(ENCRYPTED_FILE_NAME).exists());
    }

    #[test]
    #[serial]
    fn test_credential_manager_default_config_on_this_host() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.storage = StorageBackend::Keyring;

        let manager = CredentialManager::new(config).unwrap();
        if KeyringStore::new().is_ok() {
            assert_eq!(manager.backends(), vec!["keyring"]);
        } else {
            assert_eq!(manager.backends(), vec!["encrypted_file"]);
        }
    }

    #[test]
    fn test_credential_manager_weak_password() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.master_password = Some("short".to_string());

        assert!(matches!(
            CredentialManager::new(config),
            Err(StoreError::WeakPassword)
        ));
    }

    #[test]
    fn test_credential_manager_load_falls_through_not_found() {
        let primary = MemoryStore::new();
        let fallback = MemoryStore::with_credentials(sample_credentials());

        let manager = CredentialManager::with_stores(
            vec![Box::new(primary), Box::new(fallback)],
            CredentialConfig::default(),
        );

        assert!(manager.exists().unwrap());
        assert_eq!(manager.load().unwrap(), sample_credentials());
        assert_eq!(manager.backend_name(), "memory");
    }

    #[test]
    fn test_credential_manager_saves_to_primary() {
        let temp_dir = TempDir::new().unwrap();
        let encrypted =
            EncryptedFileStore::new(temp_dir.path().to_path_buf(), TEST_PASSWORD).unwrap();

        let manager = CredentialManager::with_stores(
            vec![Box::new(MemoryStore::new()), Box::new(encrypted)],
            CredentialConfig::default(),
        );

        manager.save(&sample_credentials()).unwrap();
        assert!(!temp_dir.path().join(ENCRYPTED_FILE_NAME).exists());

        manager.delete().unwrap();
        assert!(matches!(manager.load(), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_credential_manager_empty_store_list() {
        let manager = CredentialManager::with_stores(vec![], CredentialConfig::default());
        assert!(matches!(
            manager.save(&sample_credentials()),
            Err(StoreError::NoStoreAvailable)
        ));
        assert_eq!(manager.backend_name(), "none");
    }

    #[test]
    #[serial]
    fn test_master_password_from_env() {
        std::env::set_var("SOCIALHUB_MASTER_PASSWORD", "env_password_123");
        let mut config = CredentialConfig::default();
        config.load_master_password_from_env();
        assert_eq!(config.master_password.as_deref(), Some("env_password_123"));

        std::env::set_var("SOCIALHUB_MASTER_PASSWORD", "");
        let mut config = CredentialConfig::default();
        config.load_master_password_from_env();
        assert!(config.master_password.is_none());

        std::env::remove_var("SOCIALHUB_MASTER_PASSWORD");
    }

    #[test]
    fn test_expand_path() {
        let config = CredentialConfig {
            storage: StorageBackend::Encrypted,
            path: "~/.config/socialhub/credentials".to_string(),
            master_password: None,
        };

        let expanded = config.expand_path();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".config/socialhub/credentials"));
    }
}
