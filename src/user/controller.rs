use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, current_user, removal_cookie, token_cookie,
};
use crate::user::model::{CreateUserRequest, LoginRequest, RefreshTokenRequest};
use crate::user::service::UserService;
use crate::utils::config::AuthConfig;
use crate::utils::error::CustomError;
use crate::utils::model::api_response;

pub async fn register_user(
    user_service: web::Data<UserService>,
    user_info: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.create_user(user_info.into_inner()).await?;
    Ok(api_response(
        StatusCode::CREATED,
        "User registered successfully",
        user,
    ))
}

pub async fn login_user(
    user_service: web::Data<UserService>,
    auth_config: web::Data<AuthConfig>,
    login_info: web::Json<LoginRequest>,
) -> Result<HttpResponse, CustomError> {
    let login = user_service
        .login(login_info.into_inner(), &auth_config)
        .await?;

    let mut response = api_response(StatusCode::OK, "User logged in successfully", &login);
    add_token_cookies(&mut response, &login.access_token, &login.refresh_token)?;
    Ok(response)
}

pub async fn logout_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let user = current_user(&req)?;
    user_service.logout(&user.id).await?;

    let mut response = api_response(StatusCode::OK, "User logged out", json!({}));
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        response
            .add_cookie(&removal_cookie(name))
            .map_err(|e| CustomError::InternalServerError(e.to_string()))?;
    }
    Ok(response)
}

pub async fn get_current_user(req: HttpRequest) -> Result<HttpResponse, CustomError> {
    let user = current_user(&req)?;
    Ok(api_response(
        StatusCode::OK,
        "Current user fetched successfully",
        user,
    ))
}

pub async fn renew_access_token(
    user_service: web::Data<UserService>,
    auth_config: web::Data<AuthConfig>,
    body: Option<web::Json<RefreshTokenRequest>>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CustomError::UnauthorizedError("Unauthorized request".to_string()))?;

    let tokens = user_service
        .refresh_tokens(&incoming, &auth_config)
        .await?;

    let mut response = api_response(StatusCode::OK, "Access token refreshed", &tokens);
    add_token_cookies(&mut response, &tokens.access_token, &tokens.refresh_token)?;
    Ok(response)
}

fn add_token_cookies(
    response: &mut HttpResponse,
    access_token: &str,
    refresh_token: &str,
) -> Result<(), CustomError> {
    response
        .add_cookie(&token_cookie(ACCESS_TOKEN_COOKIE, access_token.to_string()))
        .map_err(|e| CustomError::InternalServerError(e.to_string()))?;
    response
        .add_cookie(&token_cookie(REFRESH_TOKEN_COOKIE, refresh_token.to_string()))
        .map_err(|e| CustomError::InternalServerError(e.to_string()))
}
