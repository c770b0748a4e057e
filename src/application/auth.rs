//! Session tokens and the request-scoped viewer.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{CreateSessionParams, RepoError, SessionsRepo, UsersRepo};
use crate::domain::entities::{SessionRecord, UserRecord};

const TOKEN_PREFIX: &str = "ss";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("user `{0}` not found")]
    UnknownUser(String),
    #[error("session lifetime must be positive")]
    InvalidTtl,
}

#[derive(Debug, Error)]
pub enum SessionAuthError {
    #[error("malformed session token")]
    Malformed,
    #[error("unknown session")]
    Unknown,
    #[error("expired session")]
    Expired,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Who is making the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(UserRecord),
}

impl Viewer {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_user(&self, user_id: i64) -> bool {
        self.user().is_some_and(|user| user.id == user_id)
    }
}

#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub record: SessionRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionsRepo>, users: Arc<dyn UsersRepo>) -> Self {
        Self { sessions, users }
    }

    pub async fn issue(&self, username: &str, ttl: Duration) -> Result<SessionIssued, SessionError> {
        if !ttl.is_positive() {
            return Err(SessionError::InvalidTtl);
        }

        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| SessionError::UnknownUser(username.to_string()))?;

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .sessions
            .create_session(CreateSessionParams {
                prefix,
                hashed_secret: Self::hash_secret(&secret),
                user_id: user.id,
                expires_at: OffsetDateTime::now_utc() + ttl,
            })
            .await?;

        Ok(SessionIssued { record, token })
    }

    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, SessionAuthError> {
        let parsed = Self::parse_token(token).ok_or(SessionAuthError::Malformed)?;
        let record = self
            .sessions
            .find_session_by_prefix(&parsed.prefix)
            .await?
            .ok_or(SessionAuthError::Unknown)?;

        if record.is_expired(OffsetDateTime::now_utc()) {
            return Err(SessionAuthError::Expired);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(SessionAuthError::Unknown);
        }

        self.users
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(SessionAuthError::Unknown)
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

/// Login entry point carrying the path to return to, e.g. `/auth/login/?next=/create/`.
pub fn login_redirect_url(login_url: &str, next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    let encoded = encoded.replace("%2F", "/");
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{separator}next={encoded}")
}
