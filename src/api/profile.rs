use actix_web::{web, HttpResponse};
use chrono::Local;
use tracing::info;

use crate::api::models::{check_birthday, PasswordChangeRequest, ProfileUpdateRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthorizedUser;
use crate::error::{ApiError, AppError, AuthError};
use crate::AppState;

pub async fn profile(AuthorizedUser(user): AuthorizedUser) -> HttpResponse {
    HttpResponse::Ok().json(user.profile())
}

pub async fn update_profile(
    AuthorizedUser(user): AuthorizedUser,
    req: web::Json<ProfileUpdateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let mut req = req.into_inner();
    req.validate()?;
    check_birthday(req.birthday, Local::now().date_naive())?;

    let updated = state
        .db
        .update_profile(user.id, &req.name, &req.surname, req.birthday)
        .await?;

    info!("Profile updated for username: {}", updated.username);
    Ok(HttpResponse::Ok().json(updated.profile()))
}

pub async fn change_password(
    AuthorizedUser(user): AuthorizedUser,
    req: web::Json<PasswordChangeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    req.validate()?;

    let current_hash = user.password.clone();
    let new_hash = web::block(move || {
        if !verify_password(&req.password, &current_hash) {
            return Err(AppError::from(AuthError::WrongPassword));
        }
        if verify_password(&req.new_password, &current_hash) {
            return Err(AppError::from(ApiError::PasswordMatchesCurrent));
        }
        Ok(hash_password(&req.new_password))
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))??;

    state.db.update_password(user.id, &new_hash).await?;

    info!("Password changed for username: {}", user.username);
    Ok(HttpResponse::Ok().json(user.profile()))
}
