use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// The user behind a valid `Authorization: Bearer <token>` header.
///
/// Handlers taking this argument reject anonymous requests with 401.
#[derive(Debug)]
pub struct AuthorizedUser(pub User);

impl FromRequest for AuthorizedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req).map(str::to_owned);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let token = token.ok_or(AuthError::Unauthorized)?;
            let missing = || AppError::InternalError("application state not registered".into());
            let state = state.ok_or_else(missing)?;
            let user = state.auth_service.validate_token(&token).await?;
            Ok(AuthorizedUser(user))
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
