//! CSRF tokens for HTML forms
//!
//! Each client holds a signed session cookie `{session_id}.{signature}`. Form
//! tokens are `{nonce}.{issued_at}.{signature}` where the signature is an
//! HMAC-SHA256 over the session id, nonce and timestamp, so a token only
//! verifies together with the cookie of the client it was issued to. A token is
//! accepted while it is no older than the configured time limit.

use std::fmt;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

use crate::config::{ConfigError, StartupEnv};

type HmacSha256 = Hmac<Sha256>;

/// Form field carrying the token
pub const CSRF_FIELD: &str = "csrf_token";

/// Cookie carrying the signed per-client session id
pub const CSRF_COOKIE: &str = "formguard_csrf";

const NONCE_BYTES: usize = 16;
const SESSION_ID_BYTES: usize = 16;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CsrfError {
    #[error("The CSRF token is missing.")]
    Missing,

    #[error("The CSRF token is invalid.")]
    Invalid,

    #[error("The CSRF token has expired.")]
    Expired,
}

/// Verified per-client session that tokens are bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfSession {
    id: String,
    cookie_value: String,
}

impl CsrfSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `Set-Cookie` value for handing the session to the client
    pub fn set_cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict",
            CSRF_COOKIE, self.cookie_value
        )
    }
}

/// Issues and verifies signed CSRF sessions and tokens
#[derive(Clone)]
pub struct CsrfSigner {
    mac: HmacSha256,
    time_limit_secs: i64,
}

impl fmt::Debug for CsrfSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfSigner")
            .field("key", &"[REDACTED]")
            .field("time_limit_secs", &self.time_limit_secs)
            .finish()
    }
}

impl CsrfSigner {
    pub fn new(secret: &[u8], time_limit: Duration) -> Result<Self, ConfigError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| ConfigError::invalid_secret_key(e.to_string()))?;

        Ok(Self {
            mac,
            time_limit_secs: i64::try_from(time_limit.as_secs()).unwrap_or(i64::MAX),
        })
    }

    /// Key the signer with the startup secret
    pub fn from_startup(env: &StartupEnv, time_limit: Duration) -> Result<Self, ConfigError> {
        Self::new(env.secret_bytes(), time_limit)
    }

    /// Start a session for a client that has none
    pub fn new_session(&self) -> CsrfSession {
        let id = random_segment(SESSION_ID_BYTES);
        let signature = self.sign(&session_payload(&id));

        CsrfSession {
            cookie_value: format!("{}.{}", id, signature),
            id,
        }
    }

    /// Check the signature of a session cookie value
    pub fn session_from_cookie(&self, value: Option<&str>) -> Result<CsrfSession, CsrfError> {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(CsrfError::Missing)?;

        let (id, signature) = value.split_once('.').ok_or(CsrfError::Invalid)?;

        if id.is_empty() {
            return Err(CsrfError::Invalid);
        }

        self.check_signature(&session_payload(id), signature)?;

        Ok(CsrfSession {
            id: id.to_string(),
            cookie_value: value.to_string(),
        })
    }

    /// Session from the request's `Cookie` headers
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Result<CsrfSession, CsrfError> {
        self.session_from_cookie(read_cookie(headers, CSRF_COOKIE))
    }

    pub fn issue(&self, session: &CsrfSession) -> String {
        self.issue_at(session, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, session: &CsrfSession, now: i64) -> String {
        let payload = format!("{}.{}", random_segment(NONCE_BYTES), now);
        let signature = self.sign(&token_payload(&session.id, &payload));

        format!("{}.{}", payload, signature)
    }

    pub fn verify(&self, session: &CsrfSession, token: Option<&str>) -> Result<(), CsrfError> {
        self.verify_at(session, token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        session: &CsrfSession,
        token: Option<&str>,
        now: i64,
    ) -> Result<(), CsrfError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CsrfError::Missing)?;

        let (payload, signature) = token.rsplit_once('.').ok_or(CsrfError::Invalid)?;
        let (nonce, issued_at) = payload.split_once('.').ok_or(CsrfError::Invalid)?;

        if nonce.is_empty() {
            return Err(CsrfError::Invalid);
        }

        self.check_signature(&token_payload(&session.id, payload), signature)?;

        let issued_at: i64 = issued_at.parse().map_err(|_| CsrfError::Invalid)?;

        if issued_at > now {
            return Err(CsrfError::Invalid);
        }

        if now.saturating_sub(issued_at) > self.time_limit_secs {
            return Err(CsrfError::Expired);
        }

        Ok(())
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn check_signature(&self, payload: &str, signature: &str) -> Result<(), CsrfError> {
        let signature = hex::decode(signature).map_err(|_| CsrfError::Invalid)?;
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| CsrfError::Invalid)
    }
}

// Distinct prefixes keep a session signature from ever passing as a token one
fn session_payload(id: &str) -> String {
    format!("session:{}", id)
}

fn token_payload(session_id: &str, payload: &str) -> String {
    format!("token:{}:{}", session_id, payload)
}

fn random_segment(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// First value of the named cookie across all `Cookie` headers
fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
