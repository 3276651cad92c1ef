//! Secure credential storage for SocialHub
//!
//! All platform secrets live in one flat record, [`PlatformCredentials`],
//! which is always written and read as a whole. Backends:
//!
//! - `KeyringStore`: OS-native secure storage (primary)
//! - `EncryptedFileStore`: `age` passphrase-encrypted file (fallback)
//! - `MemoryStore`: in-process store for tests
//! - `CredentialManager`: facade that picks a backend from configuration
//!
//! # Example
//!
//! ```no_run
//! use libsocialhub::credentials::{CredentialConfig, CredentialManager, CredentialStore};
//! use libsocialhub::credentials::PlatformCredentials;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CredentialManager::new(CredentialConfig::default())?;
//!
//! let creds = PlatformCredentials::default()
//!     .with_bluesky("user.bsky.social", "app-password");
//! manager.save(&creds)?;
//!
//! if manager.exists()? {
//!     let loaded = manager.load()?;
//!     assert_eq!(loaded.bluesky_identifier, "user.bsky.social");
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{PlatformError, StoreError};
use crate::types::PlatformId;

#[cfg(test)]
mod tests;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every secret any publisher needs, keyed by field name
///
/// Values are wiped from memory on drop. `Debug` output masks secrets.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PlatformCredentials {
    #[serde(default)]
    pub bluesky_identifier: String,
    #[serde(default)]
    pub bluesky_app_password: String,
    #[serde(default)]
    pub x_consumer_key: String,
    #[serde(default)]
    pub x_consumer_secret: String,
    #[serde(default)]
    pub x_access_token: String,
    #[serde(default)]
    pub x_access_token_secret: String,
    #[serde(default)]
    pub threads_user_id: String,
    #[serde(default)]
    pub threads_access_token: String,
}

/// Field names in the persisted record, grouped by platform
pub const CREDENTIAL_FIELDS: [(&str, PlatformId, bool); 8] = [
    ("bluesky_identifier", PlatformId::Bluesky, false),
    ("bluesky_app_password", PlatformId::Bluesky, true),
    ("x_consumer_key", PlatformId::X, false),
    ("x_consumer_secret", PlatformId::X, true),
    ("x_access_token", PlatformId::X, false),
    ("x_access_token_secret", PlatformId::X, true),
    ("threads_user_id", PlatformId::Threads, false),
    ("threads_access_token", PlatformId::Threads, true),
];

impl PlatformCredentials {
    pub fn with_bluesky(mut self, identifier: &str, app_password: &str) -> Self {
        self.bluesky_identifier = identifier.to_string();
        self.bluesky_app_password = app_password.to_string();
        self
    }

    pub fn with_x(
        mut self,
        consumer_key: &str,
        consumer_secret: &str,
        access_token: &str,
        access_token_secret: &str,
    ) -> Self {
        self.x_consumer_key = consumer_key.to_string();
        self.x_consumer_secret = consumer_secret.to_string();
        self.x_access_token = access_token.to_string();
        self.x_access_token_secret = access_token_secret.to_string();
        self
    }

    pub fn with_threads(mut self, user_id: &str, access_token: &str) -> Self {
        self.threads_user_id = user_id.to_string();
        self.threads_access_token = access_token.to_string();
        self
    }

    /// Look up a field by its persisted name
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "bluesky_identifier" => &self.bluesky_identifier,
            "bluesky_app_password" => &self.bluesky_app_password,
            "x_consumer_key" => &self.x_consumer_key,
            "x_consumer_secret" => &self.x_consumer_secret,
            "x_access_token" => &self.x_access_token,
            "x_access_token_secret" => &self.x_access_token_secret,
            "threads_user_id" => &self.threads_user_id,
            "threads_access_token" => &self.threads_access_token,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Set a field by its persisted name; returns false for unknown names
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "bluesky_identifier" => &mut self.bluesky_identifier,
            "bluesky_app_password" => &mut self.bluesky_app_password,
            "x_consumer_key" => &mut self.x_consumer_key,
            "x_consumer_secret" => &mut self.x_consumer_secret,
            "x_access_token" => &mut self.x_access_token,
            "x_access_token_secret" => &mut self.x_access_token_secret,
            "threads_user_id" => &mut self.threads_user_id,
            "threads_access_token" => &mut self.threads_access_token,
            _ => return false,
        };
        slot.zeroize();
        *slot = value;
        true
    }

    /// Platforms whose fields are all filled in
    pub fn configured_platforms(&self) -> Vec<PlatformId> {
        PlatformId::ALL
            .into_iter()
            .filter(|platform| self.missing_fields(*platform).is_empty())
            .collect()
    }

    /// Names of blank fields required by `platform`
    pub fn missing_fields(&self, platform: PlatformId) -> Vec<&'static str> {
        CREDENTIAL_FIELDS
            .iter()
            .filter(|(_, owner, _)| *owner == platform)
            .filter(|(name, _, _)| self.field(name).map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _, _)| *name)
            .collect()
    }

    fn require(&self, platform: PlatformId) -> Result<(), PlatformError> {
        let missing = self.missing_fields(platform);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlatformError::Credentials(format!(
                "{} requires {}",
                platform.display_name(),
                missing.join(", ")
            )))
        }
    }

    pub fn bluesky(&self) -> Result<BlueskyCredentials, PlatformError> {
        self.require(PlatformId::Bluesky)?;
        Ok(BlueskyCredentials {
            identifier: self.bluesky_identifier.trim().to_string(),
            app_password: self.bluesky_app_password.clone(),
        })
    }

    pub fn x(&self) -> Result<XCredentials, PlatformError> {
        self.require(PlatformId::X)?;
        Ok(XCredentials {
            consumer_key: self.x_consumer_key.trim().to_string(),
            consumer_secret: self.x_consumer_secret.clone(),
            access_token: self.x_access_token.trim().to_string(),
            access_token_secret: self.x_access_token_secret.clone(),
        })
    }

    pub fn threads(&self) -> Result<ThreadsCredentials, PlatformError> {
        self.require(PlatformId::Threads)?;
        Ok(ThreadsCredentials {
            user_id: self.threads_user_id.trim().to_string(),
            access_token: self.threads_access_token.clone(),
        })
    }
}

/// Render a value for display without revealing it
pub fn mask(value: &str) -> String {
    if value.is_empty() {
        "<empty>".to_string()
    } else {
        "********".to_string()
    }
}

impl std::fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("bluesky_identifier", &self.bluesky_identifier)
            .field("bluesky_app_password", &mask(&self.bluesky_app_password))
            .field("x_consumer_key", &mask(&self.x_consumer_key))
            .field("x_consumer_secret", &mask(&self.x_consumer_secret))
            .field("x_access_token", &mask(&self.x_access_token))
            .field("x_access_token_secret", &mask(&self.x_access_token_secret))
            .field("threads_user_id", &self.threads_user_id)
            .field("threads_access_token", &mask(&self.threads_access_token))
            .finish()
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BlueskyCredentials {
    pub identifier: String,
    pub app_password: String,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct XCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ThreadsCredentials {
    pub user_id: String,
    pub access_token: String,
}

/// Storage backend for the credential record
///
/// `save` must be atomic: a concurrent `load` sees the old record or the new
/// one, never a mix.
pub trait CredentialStore: Send + Sync {
    /// Persist the whole record, replacing any previous one
    fn save(&self, credentials: &PlatformCredentials) -> StoreResult<()>;

    /// Most recently saved record, or `StoreError::NotFound`
    fn load(&self) -> StoreResult<PlatformCredentials>;

    /// Whether a record has been saved
    fn exists(&self) -> StoreResult<bool>;

    /// Remove the record. Deleting a missing record is not an error.
    fn delete(&self) -> StoreResult<()>;

    /// Backend identifier for logging ("keyring", "encrypted_file", ...)
    fn backend_name(&self) -> &str;
}

/// Keyring service name for the credential record
pub const KEYRING_SERVICE: &str = "socialhub.credentials";

/// Keyring account name for the credential record
pub const KEYRING_ACCOUNT: &str = "default";

/// OS-native keyring storage backend
///
/// - **macOS**: Keychain
/// - **Windows**: Credential Manager
/// - **Linux**: Secret Service (GNOME Keyring/KWallet) via D-Bus
///
/// The record is stored as a single JSON document in one entry, so a save is
/// a single `set_password` call.
pub struct KeyringStore {
    service: String,
    account: String,
}

impl KeyringStore {
    /// # Errors
    ///
    /// Returns `StoreError::KeyringUnavailable` if the OS keyring cannot be
    /// accessed (e.g. headless Linux without Secret Service).
    pub fn new() -> StoreResult<Self> {
        Self::with_service(KEYRING_SERVICE, KEYRING_ACCOUNT)
    }

    /// Use a custom service/account pair (isolates tests from real data)
    ///
    /// The entry is read once so a missing Secret Service or locked-down
    /// keychain is reported here rather than on the first save.
    pub fn with_service(service: &str, account: &str) -> StoreResult<Self> {
        let entry = keyring::Entry::new(service, account).map_err(|e| {
            StoreError::KeyringUnavailable(format!("OS keyring not accessible: {}", e))
        })?;
        check_keyring_access(entry.get_password())?;

        Ok(Self {
            service: service.to_string(),
            account: account.to_string(),
        })
    }

    fn entry(&self) -> StoreResult<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| StoreError::KeyringUnavailable(e.to_string()))
    }
}

/// Interpret a trial read of a keyring entry
///
/// Any answer from the facility, including "no such entry", means it is
/// reachable. Only platform and access failures mean it is not.
pub(crate) fn check_keyring_access(read: keyring::Result<String>) -> StoreResult<()> {
    match read {
        Ok(document) => {
            drop(Zeroizing::new(document));
            Ok(())
        }
        Err(keyring::Error::PlatformFailure(e)) | Err(keyring::Error::NoStorageAccess(e)) => Err(
            StoreError::KeyringUnavailable(format!("OS keyring not accessible: {}", e)),
        ),
        Err(_) => Ok(()),
    }
}

impl CredentialStore for KeyringStore {
    fn save(&self, credentials: &PlatformCredentials) -> StoreResult<()> {
        let document = Zeroizing::new(serde_json::to_string(credentials)?);

        self.entry()?
            .set_password(&document)
            .map_err(|e| StoreError::Keyring(e.to_string()))?;

        tracing::debug!("Stored credential record {} in OS keyring", self.service);
        Ok(())
    }

    fn load(&self) -> StoreResult<PlatformCredentials> {
        match self.entry()?.get_password() {
            Ok(document) => {
                let document = Zeroizing::new(document);
                let credentials = serde_json::from_str(&document)?;
                tracing::debug!("Retrieved credential record {} from OS keyring", self.service);
                Ok(credentials)
            }
            Err(keyring::Error::NoEntry) => Err(StoreError::NotFound(format!(
                "{}.{}",
                self.service, self.account
            ))),
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }

    fn exists(&self) -> StoreResult<bool> {
        match self.entry()?.get_password() {
            Ok(document) => {
                drop(Zeroizing::new(document));
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }

    fn delete(&self) -> StoreResult<()> {
        match self.entry()?.delete_password() {
            Ok(()) => {
                tracing::debug!("Deleted credential record {} from OS keyring", self.service);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                tracing::debug!("Credential record {} not found (already deleted)", self.service);
                Ok(())
            }
            Err(e) => Err(StoreError::Keyring(e.to_string())),
        }
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

/// Reject symlinked credential files
///
/// Credential files must be regular files so a swapped-in link can't redirect
/// reads or writes.
pub fn validate_not_symlink(path: &Path) -> StoreResult<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read metadata for '{}': {}", path.display(), e),
        ))
    })?;

    if metadata.is_symlink() {
        return Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "Credential file '{}' is a symbolic link; credential files must be regular files",
                path.display()
            ),
        )));
    }

    Ok(())
}

/// File name of the encrypted credential record
pub const ENCRYPTED_FILE_NAME: &str = "credentials.age";

/// Encrypted file storage backend
///
/// Stores the record in `{base_path}/credentials.age`, encrypted with an
/// `age` passphrase. Writes go to a temporary file that is renamed into
/// place, so the record on disk is always complete. On Unix the file mode is
/// 600.
pub struct EncryptedFileStore {
    base_path: PathBuf,
    master_password: secrecy::SecretString,
}

impl EncryptedFileStore {
    /// # Errors
    ///
    /// Returns `StoreError::WeakPassword` if the password is shorter than 8
    /// characters.
    pub fn new(base_path: PathBuf, master_password: &str) -> StoreResult<Self> {
        if master_password.chars().count() < 8 {
            return Err(StoreError::WeakPassword);
        }

        Ok(Self {
            base_path,
            master_password: secrecy::SecretString::from(master_password.to_string()),
        })
    }

    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(ENCRYPTED_FILE_NAME)
    }

    fn passphrase(&self) -> age::secrecy::Secret<String> {
        use secrecy::ExposeSecret;
        age::secrecy::Secret::new(self.master_password.expose_secret().to_string())
    }

    pub(crate) fn encrypt(&self, data: &str) -> StoreResult<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase());

        let mut encrypted = vec![];
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        writer
            .write_all(data.as_bytes())
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        writer
            .finish()
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        Ok(encrypted)
    }

    fn decrypt(&self, data: &[u8]) -> StoreResult<Zeroizing<String>> {
        let decryptor = match age::Decryptor::new(data) {
            Ok(age::Decryptor::Passphrase(d)) => d,
            Ok(_) => {
                return Err(StoreError::Encryption(
                    "Invalid encryption format (expected passphrase)".to_string(),
                ))
            }
            Err(e) => return Err(StoreError::Encryption(e.to_string())),
        };

        let mut reader = decryptor
            .decrypt(&self.passphrase(), None)
            .map_err(|e| match e {
                age::DecryptError::DecryptionFailed | age::DecryptError::NoMatchingKeys => {
                    StoreError::DecryptionFailed
                }
                other => StoreError::Encryption(other.to_string()),
            })?;

        let mut decrypted = Zeroizing::new(vec![]);
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        let text = std::str::from_utf8(&decrypted)
            .map_err(|e| StoreError::Encryption(format!("Invalid UTF-8: {}", e)))?;

        Ok(Zeroizing::new(text.to_string()))
    }
}

impl CredentialStore for EncryptedFileStore {
    fn save(&self, credentials: &PlatformCredentials) -> StoreResult<()> {
        let document = Zeroizing::new(serde_json::to_string(credentials)?);
        let encrypted = self.encrypt(&document)?;

        std::fs::create_dir_all(&self.base_path)?;

        let file_path = self.file_path();

        // Dropping the temp file on any early return removes it
        let mut temp = tempfile::NamedTempFile::new_in(&self.base_path)?;
        temp.write_all(&encrypted)?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            temp.as_file().set_permissions(perms)?;
        }

        temp.persist(&file_path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!("Stored encrypted credential record at {:?}", file_path);
        Ok(())
    }

    fn load(&self) -> StoreResult<PlatformCredentials> {
        let file_path = self.file_path();

        if !file_path.exists() {
            return Err(StoreError::NotFound(file_path.display().to_string()));
        }

        validate_not_symlink(&file_path)?;

        let encrypted = std::fs::read(&file_path)?;
        let document = self.decrypt(&encrypted)?;
        let credentials = serde_json::from_str(&document)?;

        tracing::debug!("Retrieved encrypted credential record from {:?}", file_path);
        Ok(credentials)
    }

    fn exists(&self) -> StoreResult<bool> {
        Ok(self.file_path().exists())
    }

    fn delete(&self) -> StoreResult<()> {
        let file_path = self.file_path();

        if file_path.exists() {
            std::fs::remove_file(&file_path)?;
            tracing::debug!("Deleted encrypted credential record at {:?}", file_path);
        } else {
            tracing::debug!("Credential record {:?} not found (already deleted)", file_path);
        }

        Ok(())
    }

    fn backend_name(&self) -> &str {
        "encrypted_file"
    }
}

/// In-process store, for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    record: RwLock<Option<PlatformCredentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `credentials`
    pub fn with_credentials(credentials: PlatformCredentials) -> Self {
        Self {
            record: RwLock::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn save(&self, credentials: &PlatformCredentials) -> StoreResult<()> {
        let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
        *record = Some(credentials.clone());
        Ok(())
    }

    fn load(&self) -> StoreResult<PlatformCredentials> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::NotFound("memory".to_string()))
    }

    fn exists(&self) -> StoreResult<bool> {
        Ok(self
            .record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some())
    }

    fn delete(&self) -> StoreResult<()> {
        *self.record.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Storage backend type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS-native keyring (macOS Keychain, Windows Credential Manager, Linux Secret Service)
    #[default]
    Keyring,
    /// Encrypted file with master password
    Encrypted,
}

/// Credential storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    #[serde(default)]
    pub storage: StorageBackend,

    /// Directory for the encrypted file backend (keyring doesn't use files)
    #[serde(default = "default_credential_path")]
    pub path: String,

    /// Master password for encrypted storage (never serialized)
    #[serde(skip)]
    pub master_password: Option<String>,
}

fn default_credential_path() -> String {
    "~/.config/socialhub/credentials".to_string()
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Keyring,
            path: default_credential_path(),
            master_password: None,
        }
    }
}

impl CredentialConfig {
    /// Pick up `SOCIALHUB_MASTER_PASSWORD` if set and non-empty
    pub fn load_master_password_from_env(&mut self) {
        if let Ok(password) = std::env::var("SOCIALHUB_MASTER_PASSWORD") {
            if !password.is_empty() {
                self.master_password = Some(password);
                tracing::debug!(
                    "Loaded master password from SOCIALHUB_MASTER_PASSWORD environment variable"
                );
            }
        }
    }

    /// Expand `~` and environment variables in the credential path
    pub fn expand_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Credential manager facade
///
/// Builds a priority list of backends from configuration:
///
/// 1. `KeyringStore` (if configured and available)
/// 2. `EncryptedFileStore` (if configured, or as fallback when the keyring is
///    unavailable and a master password can be obtained)
///
/// Saves go to the first backend; loads try each backend in order.
pub struct CredentialManager {
    stores: Vec<Box<dyn CredentialStore>>,
    config: CredentialConfig,
}

impl CredentialManager {
    /// # Errors
    ///
    /// Returns `StoreError::NoStoreAvailable` if no backend can be used, or
    /// `StoreError::WeakPassword` if the configured master password is too
    /// short.
    pub fn new(config: CredentialConfig) -> StoreResult<Self> {
        Self::with_keyring(config, KeyringStore::new)
    }

    fn with_keyring(
        config: CredentialConfig,
        open_keyring: impl FnOnce() -> StoreResult<KeyringStore>,
    ) -> StoreResult<Self> {
        let mut stores: Vec<Box<dyn CredentialStore>> = vec![];

        if config.storage == StorageBackend::Keyring {
            match open_keyring() {
                Ok(store) => {
                    tracing::info!("Using OS keyring for credential storage");
                    stores.push(Box::new(store));
                }
                Err(e) => {
                    tracing::warn!("{}. Falling back to encrypted file storage.", e);
                }
            }
        }

        if config.storage == StorageBackend::Encrypted || stores.is_empty() {
            let path = config.expand_path();

            if let Some(password) = &config.master_password {
                stores.push(Box::new(EncryptedFileStore::new(path, password)?));
                tracing::info!("Using encrypted file storage for credentials");
            } else if atty::is(atty::Stream::Stdin) {
                let prompt = "Enter master password for credential encryption: ";
                match rpassword::prompt_password(prompt) {
                    Ok(password) if !password.is_empty() => {
                        let password = Zeroizing::new(password);
                        stores.push(Box::new(EncryptedFileStore::new(path, &password)?));
                        tracing::info!("Using encrypted file storage for credentials");
                    }
                    Ok(_) => {
                        tracing::error!(
                            "Empty master password provided. No secure storage available."
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to prompt for master password: {}. \
                             No secure storage available.",
                            e
                        );
                    }
                }
            } else {
                tracing::error!(
                    "Master password not set and no TTY available. No secure storage available."
                );
            }
        }

        if stores.is_empty() {
            if config.storage == StorageBackend::Encrypted {
                return Err(StoreError::MasterPasswordNotSet);
            }
            return Err(StoreError::NoStoreAvailable);
        }

        Ok(Self { stores, config })
    }

    /// Wrap an explicit list of backends, highest priority first
    pub fn with_stores(stores: Vec<Box<dyn CredentialStore>>, config: CredentialConfig) -> Self {
        Self { stores, config }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Names of the configured backends, highest priority first
    pub fn backends(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.backend_name()).collect()
    }
}

impl CredentialStore for CredentialManager {
    fn save(&self, credentials: &PlatformCredentials) -> StoreResult<()> {
        let store = self.stores.first().ok_or(StoreError::NoStoreAvailable)?;
        store.save(credentials)?;
        tracing::debug!("Stored credential record using {} backend", store.backend_name());
        Ok(())
    }

    fn load(&self) -> StoreResult<PlatformCredentials> {
        let mut last_error = None;

        for store in &self.stores {
            match store.load() {
                Ok(credentials) => {
                    tracing::debug!(
                        "Retrieved credential record from {} backend",
                        store.backend_name()
                    );
                    return Ok(credentials);
                }
                Err(e @ StoreError::NotFound(_)) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| StoreError::NotFound("credential record".to_string())))
    }

    fn exists(&self) -> StoreResult<bool> {
        for store in &self.stores {
            if store.exists()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn delete(&self) -> StoreResult<()> {
        for store in &self.stores {
            store.delete()?;
        }
        tracing::debug!("Deleted credential record from all backends");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        self.stores
            .first()
            .map(|s| s.backend_name())
            .unwrap_or("none")
    }
}
