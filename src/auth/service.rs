use crate::auth::password::verify_password_blocking;
use crate::auth::rate_limit::{RateLimitConfig, RateLimiter};
use crate::config::AuthConfig;
use crate::db::models::User;
use crate::db::operations::DbOperations;
use crate::error::{AppError, AuthError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct AuthService {
    db: DbOperations,
    secret_key: String,
    algorithm: Algorithm,
    token_lifetime: Duration,
    signin_limiter: RateLimiter,
}

impl AuthService {
    pub fn new(db: DbOperations, config: &AuthConfig) -> Result<Self, AppError> {
        let limit = RateLimitConfig::per_minute(config.signin_attempts_per_minute);
        Ok(Self {
            db,
            secret_key: config.secret_key.clone(),
            algorithm: config.jwt_algorithm()?,
            token_lifetime: Duration::minutes(config.access_token_expire_minutes),
            signin_limiter: RateLimiter::new(limit),
        })
    }

    /// Checks a username/password pair and returns the matching user.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        if !self.signin_limiter.record_attempt(username).await {
            warn!("Signin rate limit hit for {}", username);
            return Err(AuthError::RateLimited.into());
        }

        let user = self.db.get_user_by_username(username).await?;
        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password_blocking(password, &user.password).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.signin_limiter.reset(username).await;
        Ok(user)
    }

    /// Resolves a bearer token to its user. Any failure is `Unauthorized`.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token).map_err(|e| {
            debug!("Rejected token: {}", e);
            AppError::AuthError(AuthError::Unauthorized)
        })?;

        let user = self
            .db
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        Ok(user)
    }

    pub fn generate_token(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            exp: (now + self.token_lifetime).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_key.as_bytes()),
            &validation,
        )?;

        Ok(claims.claims)
    }

    pub async fn cleanup(&self) {
        self.signin_limiter.cleanup().await;
    }
}
