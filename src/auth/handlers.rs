use actix_web::{web, HttpResponse};
use chrono::Local;
use tracing::{error, info};

use crate::api::models::{check_birthday, RegistrationRequest, SigninForm, TokenResponse};
use crate::auth::password::hash_password;
use crate::db::models::User;
use crate::error::{ApiError, AppError, DatabaseError};
use crate::AppState;

pub async fn signin(
    form: web::Form<SigninForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received signin request for username: {}", form.username);
    let auth = &state.auth_service;
    let user = match auth.authenticate(&form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            error!("Signin failed for username: {}: {}", form.username, e);
            return Err(e);
        }
    };

    let token = state.auth_service.generate_token(&user.username)?;
    info!("Signin successful for username: {}", user.username);
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

pub async fn signup(
    req: web::Json<RegistrationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let mut req = req.into_inner();
    info!("Received signup request for username: {}", req.username);

    req.validate()?;
    check_birthday(req.birthday, Local::now().date_naive())?;

    let existing = state.db.get_user_by_username(&req.username).await?;
    if existing.is_some() {
        error!("Signup failed, username already in use: {}", req.username);
        return Err(ApiError::UsernameInUse.into());
    }

    let password = std::mem::take(&mut req.password);
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let user = User::new(
        req.username,
        password_hash,
        req.name,
        req.surname,
        req.birthday,
    );

    // Two concurrent signups can both pass the lookup above; the unique constraint decides.
    let user = match state.db.create_user(&user).await {
        Ok(user) => user,
        Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
            return Err(ApiError::UsernameInUse.into());
        }
        Err(e) => return Err(e),
    };

    info!("Signup successful for username: {}", user.username);
    Ok(HttpResponse::Ok().json(user.profile()))
}
