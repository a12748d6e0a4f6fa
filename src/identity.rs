use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// Session
///
/// One authenticated identity-provider login: the opaque session key plus the
/// email it was established for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: Uuid,
    pub email: String,
}

/// SessionHandle
///
/// A freshly established session together with the bearer token that proves
/// it on subsequent requests.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session: Session,
    pub access_token: String,
}

/// AuthError
///
/// Failure taxonomy of the identity provider surface. Credential errors are
/// mapped to localized messages at the call site; raw provider codes never
/// reach a user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredential,
    #[error("no account matches that email")]
    UserNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("malformed email address")]
    InvalidEmail,
    #[error("password does not meet strength requirements")]
    WeakPassword,
    #[error("email is already registered")]
    EmailAlreadyInUse,
    /// The federated sign-in window was dismissed by the user. Explicitly not
    /// surfaced as an error: the caller returns to the idle form state.
    #[error("sign-in window closed before completion")]
    PopupClosed,
    #[error("session token expired or invalid")]
    SessionExpired,
    #[error("identity provider failure: {0}")]
    Provider(String),
}

/// Claims
///
/// The payload structure inside the HS256 session tokens the provider issues.
/// Validated on every authenticated request before any role lookup happens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the session `uid`, which is also the profile document key.
    pub sub: Uuid,
    /// Email the session was established for.
    pub email: Option<String>,
    /// Expiration time. Prevents replay of stale tokens.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
}

/// IdentityProvider
///
/// The capability surface of the hosted authentication service: credential
/// verification, registration, federated sign-in, sign-out, password-reset
/// dispatch, and session-token verification.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError>;
    /// Exchanges a federated provider's id token for a session.
    async fn sign_in_federated(&self, provider_token: &str) -> Result<SessionHandle, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
    /// Validates a bearer token and returns the session it represents.
    async fn verify_session(&self, access_token: &str) -> Result<Session, AuthError>;
}

/// The concrete type used to share identity access across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// Decodes and validates an HS256 session token.
fn decode_session(secret: &str, token: &str) -> Result<Session, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::SessionExpired,
        _ => AuthError::InvalidCredential,
    })?;

    Ok(Session {
        uid: data.claims.sub,
        email: data.claims.email.unwrap_or_default(),
    })
}

/// Minimal email shape check, matching the registration form's validation.
fn email_shape_ok(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

// --- Hosted Implementation ---

/// HostedIdentityClient
///
/// reqwest-backed client for the hosted authentication HTTP API. The portal
/// delegates all credential handling to this service; only the resulting
/// session tokens are inspected locally (HS256, project secret).
pub struct HostedIdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    jwt_secret: String,
}

#[derive(Deserialize)]
struct HostedUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Deserialize)]
struct HostedSession {
    access_token: String,
    user: HostedUser,
}

#[derive(Deserialize, Default)]
struct HostedError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl HostedIdentityClient {
    pub fn new(base_url: &str, api_key: &str, jwt_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            jwt_secret: jwt_secret.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Translates a failed provider response into the local taxonomy.
    async fn map_failure(&self, response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body: HostedError = response.json().await.unwrap_or_default();
        match body.error_code.as_deref() {
            Some("user_already_exists") | Some("email_exists") => AuthError::EmailAlreadyInUse,
            Some("weak_password") => AuthError::WeakPassword,
            Some("validation_failed") => AuthError::InvalidEmail,
            Some("invalid_credentials") => AuthError::InvalidCredential,
            Some("user_not_found") => AuthError::UserNotFound,
            Some(other) => AuthError::Provider(other.to_string()),
            None => AuthError::Provider(
                body.msg.unwrap_or_else(|| format!("status {}", status.as_u16())),
            ),
        }
    }

    async fn token_request(
        &self,
        grant_type: &str,
        payload: serde_json::Value,
    ) -> Result<SessionHandle, AuthError> {
        let url = format!("{}?grant_type={}", self.endpoint("token"), grant_type);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_failure(response).await);
        }

        let session: HostedSession = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        Ok(SessionHandle {
            session: Session {
                uid: session.user.id,
                email: session.user.email.unwrap_or_default(),
            },
            access_token: session.access_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        self.token_request(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_failure(response).await);
        }

        // Some deployments return the session with the signup response; when
        // email confirmation is enabled they do not, so fall back to the
        // password grant.
        match response.json::<HostedSession>().await {
            Ok(session) => Ok(SessionHandle {
                session: Session {
                    uid: session.user.id,
                    email: session.user.email.unwrap_or_default(),
                },
                access_token: session.access_token,
            }),
            Err(_) => self.sign_in(email, password).await,
        }
    }

    async fn sign_in_federated(&self, provider_token: &str) -> Result<SessionHandle, AuthError> {
        self.token_request(
            "id_token",
            serde_json::json!({ "id_token": provider_token, "provider": "google" }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_failure(response).await);
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("recover"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_failure(response).await);
        }
        Ok(())
    }

    async fn verify_session(&self, access_token: &str) -> Result<Session, AuthError> {
        decode_session(&self.jwt_secret, access_token)
    }
}

// --- In-Process Implementation (Local Development & Tests) ---

struct MemoryAccount {
    uid: Uuid,
    password: String,
}

/// MemoryIdentity
///
/// An in-process `IdentityProvider` used for `Env::Local` runs and tests. It
/// keeps accounts in memory but issues real HS256 tokens, so the verification
/// path is identical to production.
pub struct MemoryIdentity {
    jwt_secret: String,
    accounts: RwLock<HashMap<String, MemoryAccount>>,
    federated: RwLock<HashMap<String, (Uuid, String)>>,
    reset_requests: Mutex<Vec<String>>,
}

impl MemoryIdentity {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            accounts: RwLock::new(HashMap::new()),
            federated: RwLock::new(HashMap::new()),
            reset_requests: Mutex::new(Vec::new()),
        }
    }

    /// Seeds an account without going through sign-up validation. Returns the
    /// uid the account was given.
    pub fn register_account(&self, email: &str, password: &str) -> Uuid {
        let uid = Uuid::new_v4();
        self.accounts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                email.to_owned(),
                MemoryAccount {
                    uid,
                    password: password.to_owned(),
                },
            );
        uid
    }

    /// Registers a federated provider token that resolves to `email`.
    pub fn register_federated(&self, provider_token: &str, email: &str) -> Uuid {
        let uid = Uuid::new_v4();
        self.federated
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider_token.to_owned(), (uid, email.to_owned()));
        uid
    }

    /// The emails password-reset dispatch was requested for, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn issue_token(&self, uid: Uuid, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: uid,
            email: Some(email.to_owned()),
            iat: now,
            exp: now + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Provider(e.to_string()))
    }

    fn handle(&self, uid: Uuid, email: &str) -> Result<SessionHandle, AuthError> {
        Ok(SessionHandle {
            session: Session {
                uid,
                email: email.to_owned(),
            },
            access_token: self.issue_token(uid, email)?,
        })
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let account = accounts.get(email).ok_or(AuthError::UserNotFound)?;
        if account.password != password {
            return Err(AuthError::WrongPassword);
        }
        let uid = account.uid;
        drop(accounts);
        self.handle(uid, email)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        if !email_shape_ok(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        {
            let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
            if accounts.contains_key(email) {
                return Err(AuthError::EmailAlreadyInUse);
            }
        }
        let uid = self.register_account(email, password);
        self.handle(uid, email)
    }

    async fn sign_in_federated(&self, provider_token: &str) -> Result<SessionHandle, AuthError> {
        let federated = self.federated.read().unwrap_or_else(|e| e.into_inner());
        let (uid, email) = federated
            .get(provider_token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)?;
        drop(federated);
        self.handle(uid, &email)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        // Tokens are short-lived and stateless; nothing to revoke in memory.
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        if !accounts.contains_key(email) {
            return Err(AuthError::UserNotFound);
        }
        drop(accounts);
        self.reset_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(email.to_owned());
        Ok(())
    }

    async fn verify_session(&self, access_token: &str) -> Result<Session, AuthError> {
        decode_session(&self.jwt_secret, access_token)
    }
}
