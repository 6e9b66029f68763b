use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `user` table. `password` holds the PBKDF2 hash, never the plain text.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub birthday: NaiveDate,
}

impl User {
    pub fn new(
        username: String,
        password_hash: String,
        name: String,
        surname: String,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password: password_hash,
            name,
            surname,
            birthday,
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            name: self.name.clone(),
            surname: self.surname.clone(),
            birthday: self.birthday,
        }
    }
}

/// Public view of a user returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub birthday: NaiveDate,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
            surname: user.surname,
            birthday: user.birthday,
        }
    }
}

/// `user_id` follows the birthday of `user_sub_id`.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_sub_id: Uuid,
}

impl Subscription {
    pub fn new(user_id: Uuid, user_sub_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            user_sub_id,
        }
    }
}
