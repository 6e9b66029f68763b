//! Request and response bodies of the HTTP API, with their validation rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::Profile;
use crate::error::{ApiError, AppError};

pub const USERNAME_MIN: usize = 4;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 100;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 30;

/// OAuth2 password-flow form. Extra fields such as `grant_type` or `scope` are ignored.
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub birthday: NaiveDate,
}

impl RegistrationRequest {
    /// Checks field formats and trims names in place.
    pub fn validate(&mut self) -> Result<(), AppError> {
        validate_username(&self.username)?;
        validate_password("password", &self.password)?;
        self.name = normalize_name("name", &self.name)?;
        self.surname = normalize_name("surname", &self.surname)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: String,
    pub surname: String,
    pub birthday: NaiveDate,
}

impl ProfileUpdateRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.name = normalize_name("name", &self.name)?;
        self.surname = normalize_name("surname", &self.surname)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub password: String,
    pub new_password: String,
}

impl PasswordChangeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_password("new_password", &self.new_password)
    }
}

#[derive(Debug, Deserialize)]
pub struct FindUserRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationsResponse {
    pub today_birthdays: Vec<Profile>,
    pub tomorrow_birthdays: Vec<Profile>,
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.';
    if (USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) && username.chars().all(allowed) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters of a-z, 0-9, '_' or '.'"
        )))
    }
}

pub fn validate_password(field: &str, password: &str) -> Result<(), AppError> {
    if (PASSWORD_MIN..=PASSWORD_MAX).contains(&password.chars().count()) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "{field} must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )))
    }
}

/// Trims surrounding whitespace and checks the remaining length.
pub fn normalize_name(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if (NAME_MIN..=NAME_MAX).contains(&trimmed.chars().count()) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::ValidationError(format!(
            "{field} must be between {NAME_MIN} and {NAME_MAX} characters"
        )))
    }
}

/// A birthday may be today but not later.
pub fn check_birthday(birthday: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if birthday > today {
        return Err(ApiError::BirthdayInFuture.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_username_rules() {
        for ok in ["abcd", "john.doe_99", "a".repeat(20).as_str()] {
            assert!(validate_username(ok).is_ok(), "{ok:?}");
        }
        let too_long = "a".repeat(21);
        for bad in ["abc", "John", "john-doe", "jöhn", "", too_long.as_str()] {
            assert!(
                matches!(validate_username(bad), Err(AppError::ValidationError(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_registration_trims_names() {
        let mut req = RegistrationRequest {
            username: "alice".into(),
            password: "secret1".into(),
            name: "  Alice ".into(),
            surname: "Liddell".into(),
            birthday: date(1990, 5, 4),
        };
        req.validate().unwrap();
        assert_eq!(req.name, "Alice");

        req.surname = " X ".into();
        match req.validate() {
            Err(AppError::ValidationError(msg)) => assert!(msg.starts_with("surname")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("password", "12345").is_err());
        assert!(validate_password("password", "123456").is_ok());
        assert!(validate_password("password", &"x".repeat(100)).is_ok());
        assert!(validate_password("password", &"x".repeat(101)).is_err());

        let change = PasswordChangeRequest {
            password: "anything".into(),
            new_password: "short".into(),
        };
        match change.validate() {
            Err(AppError::ValidationError(msg)) => assert!(msg.starts_with("new_password")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_birthday_not_in_future() {
        let today = date(2024, 6, 5);
        assert!(check_birthday(date(2000, 1, 1), today).is_ok());
        assert!(check_birthday(today, today).is_ok());
        assert!(matches!(
            check_birthday(date(2024, 6, 6), today),
            Err(AppError::ApiError(ApiError::BirthdayInFuture))
        ));
    }

    #[test]
    fn test_registration_deserializes_iso_dates() {
        let body = serde_json::json!({
            "username": "alice",
            "password": "secret1",
            "name": "Alice",
            "surname": "Liddell",
            "birthday": "1990-05-04"
        });
        let req: RegistrationRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.birthday, date(1990, 5, 4));

        let body = serde_json::json!({
            "username": "alice",
            "name": "Alice",
            "surname": "Liddell",
            "birthday": "1990-05-04"
        });
        let missing_password = serde_json::from_value::<RegistrationRequest>(body);
        assert!(missing_password.is_err());
    }
}
