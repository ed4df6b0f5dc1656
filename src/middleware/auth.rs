use actix_web::cookie::{Cookie, SameSite};
use actix_web::{Error, HttpMessage, HttpRequest, dev::ServiceRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{debug, error};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::user::model::{User, UserResponse};
use crate::user::service::UserService;
use crate::utils::config::AuthConfig;
use crate::utils::error::CustomError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Claims carried by short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub iat: usize,
    pub exp: usize,
}

/// Claims carried by refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub iat: usize,
    pub exp: usize,
}

fn issued_and_expiry(ttl_seconds: i64) -> (usize, usize) {
    let now = chrono::Utc::now().timestamp();
    (now as usize, now.saturating_add(ttl_seconds) as usize)
}

pub fn create_access_token(user: &User, config: &AuthConfig) -> Result<String, CustomError> {
    let id = user
        .id
        .ok_or_else(|| CustomError::InternalServerError("User ID missing".to_string()))?;
    let (iat, exp) = issued_and_expiry(config.access_token_ttl);

    let claims = AccessClaims {
        id: id.to_hex(),
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".to_string()))
}

pub fn create_refresh_token(user_id: &ObjectId, config: &AuthConfig) -> Result<String, CustomError> {
    let (iat, exp) = issued_and_expiry(config.refresh_token_ttl);
    let claims = RefreshClaims {
        id: user_id.to_hex(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".to_string()))
}

pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn decode_refresh_token(
    token: &str,
    config: &AuthConfig,
) -> Result<RefreshClaims, jsonwebtoken::errors::Error> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

fn invalid_access_token() -> Error {
    CustomError::UnauthorizedError("Invalid Access Token".to_string()).into()
}

/// Resolve the access token (cookie first, then bearer header) to a stored user.
///
/// On success the user's public projection is attached to the request extensions.
pub async fn verify_access_token(
    req: ServiceRequest,
    credentials: Option<BearerAuth>,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let token = req
        .cookie(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| credentials.map(|c| c.token().to_string()));

    let Some(token) = token else {
        return Err((
            CustomError::UnauthorizedError("Unauthorized request".to_string()).into(),
            req,
        ));
    };

    let Some(config) = req.app_data::<web::Data<AuthConfig>>().cloned() else {
        error!("AuthConfig is not registered as app data");
        return Err((invalid_access_token(), req));
    };

    let claims = match decode_access_token(&token, &config) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Rejected access token: {}", e);
            return Err((invalid_access_token(), req));
        }
    };

    let Ok(user_id) = ObjectId::parse_str(&claims.id) else {
        return Err((invalid_access_token(), req));
    };

    let Some(user_service) = req.app_data::<web::Data<UserService>>().cloned() else {
        error!("UserService is not registered as app data");
        return Err((invalid_access_token(), req));
    };

    match user_service.find_public_by_id(&user_id).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Ok(None) => Err((invalid_access_token(), req)),
        Err(e) => {
            error!("Failed to load user for access token: {}", e);
            Err((invalid_access_token(), req))
        }
    }
}

/// Get the authenticated user from request extensions (use after auth middleware)
pub fn current_user(req: &HttpRequest) -> Result<UserResponse, CustomError> {
    req.extensions()
        .get::<UserResponse>()
        .cloned()
        .ok_or_else(|| CustomError::UnauthorizedError("Unauthorized request".to_string()))
}

pub fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = token_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as atest};
    use actix_web_httpauth::middleware::HttpAuthentication;
    use chrono::Utc;

    fn config() -> AuthConfig {
        AuthConfig::new("access-secret", 3600, "refresh-secret", 7200)
    }

    fn user() -> User {
        User {
            id: Some(ObjectId::new()),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            password: "hash".to_string(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_profile_claims() {
        let user = user();
        let token = create_access_token(&user, &config()).unwrap();
        let claims = decode_access_token(&token, &config()).unwrap();

        assert_eq!(claims.id, user.id.unwrap().to_hex());
        assert_eq!(claims.username, "jane");
        assert_eq!(claims.full_name, "Jane Doe");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let id = ObjectId::new();
        let token = create_refresh_token(&id, &config()).unwrap();

        assert_eq!(decode_refresh_token(&token, &config()).unwrap().id, id.to_hex());
        assert!(decode_access_token(&token, &config()).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = AuthConfig::new("access-secret", -7200, "refresh-secret", -7200);
        let token = create_access_token(&user(), &expired).unwrap();
        assert!(decode_access_token(&token, &config()).is_err());
    }

    #[test]
    fn unsaved_user_cannot_get_a_token() {
        let mut unsaved = user();
        unsaved.id = None;
        assert!(create_access_token(&unsaved, &config()).is_err());
    }

    #[test]
    fn cookies_are_http_only_and_secure() {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "abc".to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));

        let removal = removal_cookie(ACCESS_TOKEN_COOKIE);
        assert_eq!(removal.value(), "");
        assert!(removal.max_age().is_some());
    }

    async fn call(req: atest::TestRequest) -> (StatusCode, serde_json::Value) {
        let app = atest::init_service(
            App::new().app_data(web::Data::new(config())).service(
                web::resource("/me")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let (status, body) = match atest::try_call_service(&app, req.uri("/me").to_request()).await {
            Ok(res) => {
                let status = res.status();
                (status, atest::read_body(res).await)
            }
            Err(err) => {
                let res = err.error_response();
                let status = res.status();
                (status, res.into_body().try_into_bytes().unwrap_or_default())
            }
        };
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let (status, body) = call(atest::TestRequest::get()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: Unauthorized request");
    }

    #[actix_web::test]
    async fn garbage_bearer_token_is_invalid() {
        let req = atest::TestRequest::get()
            .insert_header(("Authorization", "Bearer not-a-jwt"));
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: Invalid Access Token");
    }

    #[actix_web::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let other = AuthConfig::new("someone-else", 3600, "refresh-secret", 3600);
        let token = create_access_token(&user(), &other).unwrap();
        let req = atest::TestRequest::get()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, token));
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: Invalid Access Token");
    }
}
