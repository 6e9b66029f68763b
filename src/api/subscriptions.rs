use actix_web::{web, HttpResponse};
use chrono::Local;
use tracing::info;

use crate::api::models::{FindUserRequest, NotificationsResponse};
use crate::auth::AuthorizedUser;
use crate::birthdays::BirthdayDigest;
use crate::db::models::{Profile, Subscription, User};
use crate::error::{ApiError, AppError, DatabaseError};
use crate::AppState;

pub async fn subscriptions(
    AuthorizedUser(user): AuthorizedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let followed: Vec<Profile> = state
        .db
        .list_subscribed_users(user.id)
        .await?
        .into_iter()
        .map(Profile::from)
        .collect();

    Ok(HttpResponse::Ok().json(followed))
}

pub async fn notifications(
    AuthorizedUser(user): AuthorizedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let followed = state.db.list_subscribed_users(user.id).await?;
    let digest = BirthdayDigest::build(followed, Local::now().date_naive());

    Ok(HttpResponse::Ok().json(NotificationsResponse {
        today_birthdays: digest.today,
        tomorrow_birthdays: digest.tomorrow,
    }))
}

pub async fn subscribe(
    AuthorizedUser(user): AuthorizedUser,
    req: web::Json<FindUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let target = find_user(&state, &req.username).await?;

    let existing = state.db.find_subscription(user.id, target.id).await?;
    if existing.is_some() {
        return Err(ApiError::AlreadySubscribed.into());
    }

    let sub = Subscription::new(user.id, target.id);
    match state.db.create_subscription(&sub).await {
        Ok(_) => {}
        Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
            return Err(ApiError::AlreadySubscribed.into());
        }
        Err(e) => return Err(e),
    }

    info!("{} subscribed to {}", user.username, target.username);
    Ok(HttpResponse::Ok().json(target.profile()))
}

pub async fn unsubscribe(
    AuthorizedUser(user): AuthorizedUser,
    req: web::Json<FindUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let target = find_user(&state, &req.username).await?;

    let sub = state
        .db
        .find_subscription(user.id, target.id)
        .await?
        .ok_or(ApiError::NoSubscription)?;

    if state.db.delete_subscription(sub.id).await? == 0 {
        // Removed concurrently between lookup and delete.
        return Err(ApiError::NoSubscription.into());
    }

    info!("{} unsubscribed from {}", user.username, target.username);
    Ok(HttpResponse::Ok().json(target.profile()))
}

async fn find_user(state: &AppState, username: &str) -> Result<User, AppError> {
    state
        .db
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| ApiError::UserNotFound.into())
}
