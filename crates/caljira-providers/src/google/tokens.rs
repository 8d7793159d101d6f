//! OAuth token persistence.
//!
//! Tokens live in a JSON file readable only by the owner. The file is
//! rewritten through a temporary file and a rename.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds shaved off the reported lifetime so refresh happens early.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token for Calendar API calls.
    pub access_token: String,

    /// Long-lived; Google only returns it on the first consent.
    pub refresh_token: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes granted at consent time.
    #[serde(default)]
    pub scopes: Vec<String>,

    pub last_refresh: DateTime<Utc>,
}

fn expiry_from(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs
        .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS))
}

impl TokenInfo {
    /// Creates a token set from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expiry_from(expires_in_secs),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// True within a minute of expiry.
    ///
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// True if every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh.
    ///
    /// Google does not always return a new refresh token, so the old one
    /// is kept.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expiry_from(expires_in_secs);
        self.last_refresh = Utc::now();
    }
}

/// File-backed token store with an in-memory copy.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Creates a token store at the given path. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TokenInfo>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenInfo>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the token file. A missing file is not an error.
    ///
    /// Returns `Ok(false)` when no token file exists.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!("no token file at {}", self.path.display());
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to parse token file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("loaded tokens from {}", self.path.display());
        *self.write() = Some(tokens);
        Ok(true)
    }

    fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                ProviderError::configuration(format!("failed to restrict token file: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
        })?;

        debug!("saved tokens to {}", self.path.display());
        Ok(())
    }

    pub fn get(&self) -> Option<TokenInfo> {
        self.read().clone()
    }

    /// Stores new tokens and writes them to disk.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        self.save(&tokens)?;
        *self.write() = Some(tokens);
        Ok(())
    }

    /// Replaces the access token and writes the result to disk.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        let mut tokens = self
            .get()
            .ok_or_else(|| ProviderError::internal("no tokens to update"))?;
        tokens.update_access_token(access_token, expires_in_secs);
        self.set(tokens)
    }

    /// Removes the tokens from memory and disk.
    pub fn clear(&self) -> ProviderResult<()> {
        *self.write() = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
            })?;
            info!("cleared tokens from {}", self.path.display());
        }
        Ok(())
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if tokens are missing or lack a required scope.
    pub fn needs_reauth(&self, required_scopes: &[String]) -> bool {
        self.read()
            .as_ref()
            .is_none_or(|tokens| !tokens.has_scopes(required_scopes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(dir: &tempfile::TempDir) -> TokenStorage {
        TokenStorage::new(dir.path().join("caljira").join("google-tokens-default.json"))
    }

    #[test]
    fn token_info_creation() {
        let token = TokenInfo::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope1".to_string()],
        );

        assert_eq!(token.access_token, "access-token");
        assert!(token.expires_at.is_some());
        assert!(!token.is_expired());
    }

    #[test]
    fn token_info_expiry() {
        let mut token = TokenInfo::new("access", None, Some(3600), vec![]);
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());

        // Lifetimes shorter than the margin count as already expired.
        assert!(TokenInfo::new("access", None, Some(30), vec![]).is_expired());
        assert!(!TokenInfo::new("access", None, None, vec![]).is_expired());
    }

    #[test]
    fn token_refresh_keeps_refresh_token() {
        let mut token = TokenInfo::new("old", Some("r".to_string()), Some(30), vec![]);
        token.update_access_token("new", Some(3600));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
        assert!(!token.is_expired());
    }

    #[test]
    fn token_storage_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);

        storage
            .set(TokenInfo::new(
                "access-token",
                Some("refresh-token".to_string()),
                Some(3600),
                vec!["scope1".to_string()],
            ))
            .unwrap();
        assert!(storage.path().exists());

        let reloaded = storage_in(&dir);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.get().unwrap().access_token, "access-token");
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        storage
            .set(TokenInfo::new("access", None, None, vec![]))
            .unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn token_storage_update_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(storage.update_access_token("x", None).is_err());

        storage
            .set(TokenInfo::new("a", Some("r".to_string()), Some(10), vec![]))
            .unwrap();
        storage.update_access_token("b", Some(3600)).unwrap();

        let reloaded = storage_in(&dir);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get().unwrap().access_token, "b");
    }

    #[test]
    fn token_storage_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        storage
            .set(TokenInfo::new("access", None, None, vec![]))
            .unwrap();

        storage.clear().unwrap();
        assert!(!storage.path().exists());
        assert!(storage.get().is_none());
    }

    #[test]
    fn token_storage_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(!storage.load().unwrap());
        assert!(storage.get().is_none());
    }

    #[test]
    fn token_storage_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        fs::write(storage.path(), "{not json").unwrap();
        assert!(storage.load().is_err());
    }

    #[test]
    fn token_storage_needs_reauth() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(storage.needs_reauth(&["scope1".to_string()]));

        storage
            .set(TokenInfo::new("access", None, None, vec!["scope1".to_string()]))
            .unwrap();
        assert!(!storage.needs_reauth(&["scope1".to_string()]));
        assert!(storage.needs_reauth(&["scope2".to_string()]));
    }
}
