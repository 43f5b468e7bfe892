//! Dashboard credential store
//!
//! One account per deployment, persisted as a small JSON file:
//!
//! ```json
//! {"username": "test", "salt": "<hex>", "password_hash": "<hex>"}
//! ```
//!
//! Salted hashes are PBKDF2-HMAC-SHA256 over a 16-byte random salt. Files
//! written by the first dashboard release carry no salt and an unsalted
//! SHA-256 hex digest; a successful verification against such a file rewrites
//! it in salted form with the same plaintext.
//!
//! A missing file is provisioned with the configured default account on first
//! access. It is never an error.

use std::path::{Path, PathBuf};

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::CredentialSettings;
use crate::{Error, Result};

const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;
const SESSION_TOKEN_BYTES: usize = 32;

/// On-disk credential record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub username: String,
    /// Absent or empty for legacy unsalted hashes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    pub password_hash: String,
}

impl StoredCredential {
    /// Salt, if one is stored and non-empty
    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn is_legacy(&self) -> bool {
        self.salt().is_none()
    }
}

/// Result of a password check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub ok: bool,
    /// Storage was rewritten from the legacy unsalted form
    pub upgraded: bool,
}

/// File-backed single-account credential store
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    settings: CredentialSettings,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, settings: CredentialSettings) -> Self {
        Self {
            path: path.into(),
            settings,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provision the default account if no credential file exists
    pub async fn ensure_storage(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_storage_locked().await
    }

    /// Read the stored credential, provisioning it first if necessary
    pub async fn load(&self) -> Result<StoredCredential> {
        let _guard = self.lock.lock().await;
        self.load_locked().await
    }

    /// Check `password` against the stored hash.
    ///
    /// A match against a legacy unsalted hash immediately rotates storage to a
    /// freshly salted hash of the same plaintext and reports `upgraded`.
    pub async fn verify_and_maybe_upgrade(&self, password: &str) -> Result<VerifyOutcome> {
        let _guard = self.lock.lock().await;
        let stored = self.load_locked().await?;
        self.check_and_upgrade_locked(&stored, password).await
    }

    /// Username + password check for login.
    ///
    /// Any mismatch is `Error::Authentication`; the error does not say which part failed.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<VerifyOutcome> {
        let _guard = self.lock.lock().await;
        let stored = self.load_locked().await?;

        // Hash even for an unknown user; only a full match may touch storage
        let user_ok = constant_time_eq(username.as_bytes(), stored.username.as_bytes());
        let password_ok = self.matches(&stored, password)?;

        if !(user_ok && password_ok) {
            return Err(Error::Authentication);
        }

        self.upgrade_if_legacy_locked(&stored, password).await
    }

    /// Replace the password: new salt, new hash, persisted
    pub async fn rotate(&self, new_password: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let stored = self.load_locked().await?;
        self.rotate_locked(stored.username, new_password).await
    }

    /// Verify `old_password`, then rotate to `new_password`.
    ///
    /// Wrong old password is `Error::Authentication` and leaves storage untouched.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::InvalidInput("new password must not be empty".to_string()));
        }

        let _guard = self.lock.lock().await;
        let stored = self.load_locked().await?;

        if !self.matches(&stored, old_password)? {
            return Err(Error::Authentication);
        }

        self.rotate_locked(stored.username, new_password).await?;
        info!("Dashboard password changed");
        Ok(())
    }

    async fn ensure_storage_locked(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }

        let username = self.settings.default_username.clone();
        warn!(
            "No credential file at {}, provisioning default account '{}'",
            self.path.display(),
            username
        );
        let password = self.settings.default_password.clone();
        self.rotate_locked(username, &password).await
    }

    async fn load_locked(&self) -> Result<StoredCredential> {
        self.ensure_storage_locked().await?;
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    fn matches(&self, stored: &StoredCredential, password: &str) -> Result<bool> {
        let computed = match stored.salt() {
            Some(salt) => hash_password(password, salt, self.settings.pbkdf2_iterations)?,
            None => legacy_hash(password),
        };
        Ok(constant_time_eq(computed.as_bytes(), stored.password_hash.as_bytes()))
    }

    async fn check_and_upgrade_locked(
        &self,
        stored: &StoredCredential,
        password: &str,
    ) -> Result<VerifyOutcome> {
        if !self.matches(stored, password)? {
            return Ok(VerifyOutcome { ok: false, upgraded: false });
        }

        self.upgrade_if_legacy_locked(stored, password).await
    }

    /// Caller has already verified `password` against `stored`
    async fn upgrade_if_legacy_locked(
        &self,
        stored: &StoredCredential,
        password: &str,
    ) -> Result<VerifyOutcome> {
        if !stored.is_legacy() {
            return Ok(VerifyOutcome { ok: true, upgraded: false });
        }

        self.rotate_locked(stored.username.clone(), password).await?;
        info!("Upgraded legacy unsalted credential to salted PBKDF2 hash");
        Ok(VerifyOutcome { ok: true, upgraded: true })
    }

    async fn rotate_locked(&self, username: String, new_password: &str) -> Result<()> {
        let salt = generate_salt();
        let password_hash = hash_password(new_password, &salt, self.settings.pbkdf2_iterations)?;
        let record = StoredCredential {
            username,
            salt: Some(salt),
            password_hash,
        };
        self.write_locked(&record).await
    }

    /// Write to a sibling temp file, then rename over the original
    async fn write_locked(&self, record: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, serde_json::to_vec(record)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Random 16-byte salt, hex encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Random 32-byte session token, hex encoded
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// PBKDF2-HMAC-SHA256 of `password` with a hex-encoded salt, hex encoded
pub fn hash_password(password: &str, salt_hex: &str, iterations: u32) -> Result<String> {
    let salt = hex::decode(salt_hex.trim())
        .map_err(|e| Error::Internal(format!("Stored salt is not valid hex: {}", e)))?;

    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut out);
    Ok(hex::encode(out))
}

/// Unsalted SHA-256 hex digest used by the first dashboard release
pub fn legacy_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
