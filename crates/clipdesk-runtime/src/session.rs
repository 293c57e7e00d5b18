//! Session registry: bearer tokens mapped to interpreter identities.
//!
//! Sessions live only in process memory. A restart invalidates every token.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid interpreter credentials")]
    InvalidCredentials,
    #[error("unknown or missing session token")]
    UnknownToken,
    #[error("interpreter name must not be empty")]
    EmptyIdentity,
}

/// How interpreter secrets are configured.
#[derive(Clone)]
pub enum Credentials {
    /// One secret shared by every interpreter name.
    Shared(String),
    PerInterpreter(HashMap<String, String>),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shared(_) => f.write_str("Credentials::Shared(<redacted>)"),
            Self::PerInterpreter(map) => {
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                f.debug_tuple("Credentials::PerInterpreter")
                    .field(&names)
                    .finish()
            }
        }
    }
}

impl Credentials {
    fn accepts(&self, interpreter: &str, secret: &str) -> bool {
        let expected = match self {
            Self::Shared(shared) => shared.as_str(),
            Self::PerInterpreter(map) => match map.get(interpreter) {
                Some(secret) => secret.as_str(),
                None => return false,
            },
        };
        !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(secret.as_bytes()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub interpreter: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub session: Session,
}

#[derive(Clone)]
pub struct SessionRegistry {
    credentials: Arc<Credentials>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issues a fresh token when `secret` matches the credential for `interpreter`.
    pub async fn authenticate(
        &self,
        interpreter: &str,
        secret: &str,
    ) -> Result<IssuedToken, SessionError> {
        let interpreter = interpreter.trim();
        if interpreter.is_empty() {
            return Err(SessionError::EmptyIdentity);
        }
        if !self.credentials.accepts(interpreter, secret) {
            log::warn!("desk_login_rejected interpreter={}", interpreter);
            return Err(SessionError::InvalidCredentials);
        }
        let token = new_token();
        let session = Session {
            interpreter: interpreter.to_string(),
            issued_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(token.clone(), session.clone());
        log::info!("desk_login interpreter={}", interpreter);
        Ok(IssuedToken { token, session })
    }

    pub async fn resolve(&self, token: &str) -> Result<Session, SessionError> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(SessionError::UnknownToken)
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
