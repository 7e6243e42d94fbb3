use crate::config::AuthSettings;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no refresh token in {0}; run `codex login` again")]
    MissingRefreshToken(String),

    #[error("token refresh failed: HTTP {status}: {body}")]
    RefreshFailed { status: u16, body: String },

    #[error("token refresh request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credential file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of backend credentials. The bridge calls `ensure_fresh` before every
/// backend request and then reads the token and account id.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    fn current_access_token(&self) -> String;
    fn account_id(&self) -> Option<String>;
    async fn ensure_fresh(&self) -> Result<(), AuthError>;
    fn is_expired(&self) -> bool;
}

/// On-disk layout written by `codex login`. Unknown fields survive a rewrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AuthDocument {
    #[serde(default)]
    tokens: AuthTokens,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_refresh: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AuthTokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Tokens backed by the Codex CLI credential file, refreshed in place.
#[derive(Debug)]
pub struct CodexAuthFile {
    path: PathBuf,
    settings: AuthSettings,
    http_client: reqwest::Client,
    document: RwLock<AuthDocument>,
    refresh_lock: Mutex<()>,
}

impl CodexAuthFile {
    pub fn load(
        path: impl Into<PathBuf>,
        settings: AuthSettings,
        http_client: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let path = path.into();
        let document = read_document(&path)?;
        Ok(Self {
            path,
            settings,
            http_client,
            document: RwLock::new(document),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file after an outside change, e.g. a new `codex login`.
    pub fn reload(&self) -> Result<(), AuthError> {
        let document = read_document(&self.path)?;
        *self.write_document() = document;
        debug!("Reloaded credentials from {}", self.path.display());
        Ok(())
    }

    fn read_document(&self) -> RwLockReadGuard<'_, AuthDocument> {
        self.document.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_document(&self) -> RwLockWriteGuard<'_, AuthDocument> {
        self.document.write().unwrap_or_else(|e| e.into_inner())
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        let refresh_token = self
            .read_document()
            .tokens
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MissingRefreshToken(self.path.display().to_string()))?;

        info!("Access token expired, refreshing");
        let response = self
            .http_client
            .post(&self.settings.token_url)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
                "client_id": self.settings.client_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Token refresh rejected with {}", status);
            return Err(AuthError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }
        let refreshed: RefreshResponse = response.json().await?;

        let snapshot = {
            let mut document = self.write_document();
            document.tokens.access_token = Some(refreshed.access_token);
            if let Some(token) = refreshed.refresh_token {
                document.tokens.refresh_token = Some(token);
            }
            document.last_refresh = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));
            document.clone()
        };

        let content = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| AuthError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        info!("Access token refreshed");
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for CodexAuthFile {
    fn current_access_token(&self) -> String {
        self.read_document()
            .tokens
            .access_token
            .clone()
            .unwrap_or_default()
    }

    fn account_id(&self) -> Option<String> {
        self.read_document().tokens.account_id.clone()
    }

    async fn ensure_fresh(&self) -> Result<(), AuthError> {
        if !self.is_expired() {
            return Ok(());
        }
        let _guard = self.refresh_lock.lock().await;
        // another request may have refreshed while we waited
        if !self.is_expired() {
            return Ok(());
        }
        self.refresh().await
    }

    fn is_expired(&self) -> bool {
        let token = self.current_access_token();
        match jwt_expiry(&token) {
            Some(exp) => exp < Utc::now().timestamp() + self.settings.refresh_margin_secs,
            None => true,
        }
    }
}

fn read_document(path: &Path) -> Result<AuthDocument, AuthError> {
    let content = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// `exp` claim of a JWT, without verifying the signature.
pub fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
}

/// Fixed credentials for tests.
#[cfg(test)]
pub struct StaticTokens {
    pub access_token: String,
    pub account_id: Option<String>,
    pub fail_refresh: bool,
}

#[cfg(test)]
impl StaticTokens {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            account_id: None,
            fail_refresh: false,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TokenProvider for StaticTokens {
    fn current_access_token(&self) -> String {
        self.access_token.clone()
    }

    fn account_id(&self) -> Option<String> {
        self.account_id.clone()
    }

    async fn ensure_fresh(&self) -> Result<(), AuthError> {
        if self.fail_refresh {
            Err(AuthError::MissingRefreshToken("auth.json".to_string()))
        } else {
            Ok(())
        }
    }

    fn is_expired(&self) -> bool {
        self.fail_refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use tempfile::NamedTempFile;

    fn jwt(exp: i64) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(json!({"exp": exp, "sub": "user"}).to_string())
        )
    }

    fn auth_file(document: Value) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), document.to_string()).unwrap();
        file
    }

    fn settings(token_url: String) -> AuthSettings {
        AuthSettings {
            token_url,
            ..AuthSettings::default()
        }
    }

    #[test]
    fn test_jwt_expiry() {
        assert_eq!(jwt_expiry(&jwt(1_900_000_000)), Some(1_900_000_000));
        assert_eq!(jwt_expiry("not-a-jwt"), None);
        assert_eq!(jwt_expiry("a.%%%.c"), None);
    }

    #[tokio::test]
    async fn test_fresh_token_skips_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/oauth/token").expect(0).create_async().await;

        let token = jwt(Utc::now().timestamp() + 3600);
        let file = auth_file(json!({"tokens": {"access_token": token, "refresh_token": "rt", "account_id": "acct_1"}}));
        let store = CodexAuthFile::load(
            file.path(),
            settings(format!("{}/oauth/token", server.url())),
            reqwest::Client::new(),
        )
        .unwrap();

        assert!(!store.is_expired());
        store.ensure_fresh().await.unwrap();
        assert_eq!(store.current_access_token(), token);
        assert_eq!(store.account_id().as_deref(), Some("acct_1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_saved() {
        let mut server = mockito::Server::new_async().await;
        let new_token = jwt(Utc::now().timestamp() + 3600);
        let mock = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::Json(json!({
                "grant_type": "refresh_token",
                "refresh_token": "rt_old",
                "client_id": "app_EMoamEEZ73f0CkXaXp7hrann"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"access_token": new_token, "refresh_token": "rt_new", "expires_in": 3600}).to_string())
            .create_async()
            .await;

        // expires inside the 60 second margin
        let file = auth_file(json!({
            "OPENAI_API_KEY": null,
            "tokens": {"access_token": jwt(Utc::now().timestamp() + 30), "refresh_token": "rt_old", "id_token": "idt"}
        }));
        let store = CodexAuthFile::load(
            file.path(),
            settings(format!("{}/oauth/token", server.url())),
            reqwest::Client::new(),
        )
        .unwrap();

        assert!(store.is_expired());
        store.ensure_fresh().await.unwrap();
        mock.assert_async().await;
        assert!(!store.is_expired());
        assert_eq!(store.current_access_token(), new_token);

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(saved["tokens"]["access_token"], new_token);
        assert_eq!(saved["tokens"]["refresh_token"], "rt_new");
        assert_eq!(saved["tokens"]["id_token"], "idt");
        assert!(saved["OPENAI_API_KEY"].is_null());
        assert!(saved["last_refresh"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body("invalid_grant")
            .create_async()
            .await;

        let file = auth_file(json!({"tokens": {"access_token": "garbage", "refresh_token": "rt"}}));
        let store = CodexAuthFile::load(
            file.path(),
            settings(format!("{}/oauth/token", server.url())),
            reqwest::Client::new(),
        )
        .unwrap();

        match store.ensure_fresh().await {
            Err(AuthError::RefreshFailed { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_grant");
            }
            other => panic!("expected RefreshFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_refresh_token() {
        let file = auth_file(json!({"tokens": {"access_token": jwt(0)}}));
        let store = CodexAuthFile::load(
            file.path(),
            settings("http://127.0.0.1:9/oauth/token".to_string()),
            reqwest::Client::new(),
        )
        .unwrap();

        assert!(matches!(
            store.ensure_fresh().await,
            Err(AuthError::MissingRefreshToken(_))
        ));
    }

    #[test]
    fn test_reload_picks_up_new_login() {
        let file = auth_file(json!({"tokens": {"access_token": "old"}}));
        let store = CodexAuthFile::load(
            file.path(),
            AuthSettings::default(),
            reqwest::Client::new(),
        )
        .unwrap();
        assert_eq!(store.current_access_token(), "old");

        std::fs::write(file.path(), json!({"tokens": {"access_token": "new", "account_id": "a2"}}).to_string()).unwrap();
        store.reload().unwrap();
        assert_eq!(store.current_access_token(), "new");
        assert_eq!(store.account_id().as_deref(), Some("a2"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = CodexAuthFile::load(
            dir.path().join("auth.json"),
            AuthSettings::default(),
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(AuthError::Io { .. })));
    }
}
