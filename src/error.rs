use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    AuthError(#[from] AuthError),

    #[error(transparent)]
    ApiError(#[from] ApiError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provisioning error: {0}")]
    ProvisionError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl AppError {
    /// Message placed in the `detail` field of the response body.
    ///
    /// Server-side failures are reported generically; the cause only goes to the log.
    pub fn detail(&self) -> String {
        match self {
            AppError::AuthError(e) => e.to_string(),
            AppError::ApiError(e) => e.to_string(),
            AppError::ValidationError(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::DatabaseError(DatabaseError::NotFound),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::DatabaseError(DatabaseError::Duplicate)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                AppError::DatabaseError(DatabaseError::ConnectionError(err.to_string()))
            }
            _ => AppError::DatabaseError(DatabaseError::QueryError(err.to_string())),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(DatabaseError::MigrationError(err.to_string()))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AppError::AuthError(AuthError::Unauthorized),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = json!({ "detail": self.detail() });
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::WrongPassword => StatusCode::UNAUTHORIZED,
                AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            },
            AppError::ApiError(ApiError::UserNotFound) => StatusCode::NOT_FOUND,
            AppError::ApiError(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Unauthorized user")]
    Unauthorized,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Too many signin attempts")]
    RateLimited,
}

/// Business-rule violations reported back to API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Birthday must be less then current date")]
    BirthdayInFuture,

    #[error("Username already in use")]
    UsernameInUse,

    #[error("New password matches the current one")]
    PasswordMatchesCurrent,

    #[error("User not found")]
    UserNotFound,

    #[error("Already subscribed")]
    AlreadySubscribed,

    #[error("There is no subscription")]
    NoSubscription,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let db_err = sqlx::Error::RowNotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::DatabaseError(DatabaseError::NotFound)));

        let db_err = sqlx::Error::PoolTimedOut;
        let app_err: AppError = db_err.into();
        assert!(matches!(
            app_err,
            AppError::DatabaseError(DatabaseError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_jwt_errors_become_unauthorized() {
        let jwt_err = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature);
        let app_err: AppError = jwt_err.into();
        assert!(matches!(app_err, AppError::AuthError(AuthError::Unauthorized)));
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::RateLimited);
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err = AppError::ValidationError("invalid input".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = AppError::ApiError(ApiError::UserNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        for conflict in [
            ApiError::BirthdayInFuture,
            ApiError::UsernameInUse,
            ApiError::PasswordMatchesCurrent,
            ApiError::AlreadySubscribed,
            ApiError::NoSubscription,
        ] {
            let err = AppError::ApiError(conflict);
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }

        let err = AppError::DatabaseError(DatabaseError::Duplicate);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_detail() {
        let err = AppError::AuthError(AuthError::Unauthorized);
        assert_eq!(err.detail(), "Unauthorized user");

        let err = AppError::ApiError(ApiError::NoSubscription);
        assert_eq!(err.detail(), "There is no subscription");

        let cause = "relation \"user\" does not exist".to_string();
        let err = AppError::DatabaseError(DatabaseError::QueryError(cause));
        assert_eq!(err.detail(), "Internal server error");
        assert_eq!(
            err.to_string(),
            "Database error: Query error: relation \"user\" does not exist"
        );
    }
}
