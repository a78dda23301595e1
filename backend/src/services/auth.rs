//! Authentication service: login, role resolution and token issuance
//!
//! Roles come from a static allow-list in configuration, keyed by email.
//! An email on neither list is denied outright; no token is ever issued for
//! an unrecognized account.

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::config::{AuthConfig, Config};
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    auth: AuthConfig,
}

/// Access roles on the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Dashboard plus the stock and sales import flows
    Admin,
    /// Dashboard only
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Resolve the role for an email against the configured allow-lists
///
/// Returns `None` for unrecognized emails; there is no default role.
pub fn resolve_role(auth: &AuthConfig, email: &str) -> Option<Role> {
    let email = email.to_lowercase();
    if auth.admin_emails.iter().any(|e| e.to_lowercase() == email) {
        Some(Role::Admin)
    } else if auth.viewer_emails.iter().any(|e| e.to_lowercase() == email) {
        Some(Role::Viewer)
    } else {
        None
    }
}

/// Input for logging in
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response after a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub email: String,
    pub role: Role,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            auth: config.auth.clone(),
        }
    }

    /// Authenticate a user and issue an access token
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        input.validate().map_err(|e| AppError::Validation {
            field: "email".to_string(),
            message: e.to_string(),
        })?;

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, is_active FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let password_ok = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !password_ok {
            return Err(AppError::InvalidCredentials);
        }

        // Allow-list check happens after credential verification so the
        // denial message never leaks whether the account exists
        let role = resolve_role(&self.auth, &user.email).ok_or_else(|| {
            tracing::warn!(email = %user.email, "login denied: email not on any allow-list");
            AppError::Unauthorized("You are not authorized to access this system".to_string())
        })?;

        let access_token = self.issue_token(user.id, &user.email, role)?;

        tracing::info!(email = %user.email, role = role.as_str(), "user logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            email: user.email,
            role,
        })
    }

    /// Sign a JWT for an authenticated, allow-listed user
    fn issue_token(&self, user_id: Uuid, email: &str, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            admin_emails: vec!["ops@example.com".to_string()],
            viewer_emails: vec!["warehouse@example.com".to_string()],
        }
    }

    #[test]
    fn admin_list_wins() {
        assert_eq!(resolve_role(&auth_config(), "ops@example.com"), Some(Role::Admin));
    }

    #[test]
    fn viewer_list_resolves() {
        assert_eq!(
            resolve_role(&auth_config(), "warehouse@example.com"),
            Some(Role::Viewer)
        );
    }

    #[test]
    fn unknown_email_gets_no_role() {
        assert_eq!(resolve_role(&auth_config(), "guest@example.com"), None);
    }

    #[test]
    fn role_lookup_is_case_insensitive() {
        assert_eq!(resolve_role(&auth_config(), "OPS@Example.COM"), Some(Role::Admin));
    }
}
