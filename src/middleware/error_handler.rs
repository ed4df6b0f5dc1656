use actix_web::dev::ServiceResponse;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpRequest, HttpResponse, Result};
use serde_json::json;

use crate::utils::error::CustomError;
use crate::utils::helpers::service_name;

/// Whether a response already carries a JSON body (our own error envelopes do).
pub fn is_json<B>(res: &ServiceResponse<B>) -> bool {
    res.response()
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn error_code(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST_ERROR".to_string(),
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED_ERROR".to_string(),
        StatusCode::NOT_FOUND => "NOT_FOUND_ERROR".to_string(),
        StatusCode::CONFLICT => "CONFLICT_ERROR".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "INTERNAL_SERVER_ERROR".to_string(),
        other => other
            .canonical_reason()
            .unwrap_or("UNKNOWN")
            .to_uppercase()
            .replace(' ', "_"),
    }
}

/// Rewrite framework-generated error responses into the JSON error envelope.
pub fn handle_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status = res.status();
    let message = res
        .response()
        .error()
        .map(|e| e.to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    let new_response = HttpResponse::build(status).json(json!({
        "success": false,
        "message": message,
        "httpStatusCode": status.as_u16(),
        "error": error_code(status),
        "service": service_name(),
    }));

    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, new_response.map_into_right_body());

    Ok(ErrorHandlerResponse::Response(res))
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    CustomError::BadRequestError(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    CustomError::BadRequestError(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{App, test, web};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn plain_error() -> HttpResponse {
        HttpResponse::MethodNotAllowed().body("nope")
    }

    async fn custom_error() -> Result<HttpResponse, CustomError> {
        Err(CustomError::ConflictError("Slug taken".into()))
    }

    async fn echo(_payload: web::Json<Payload>) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                    .route("/plain", web::get().to(plain_error))
                    .route("/custom", web::get().to(custom_error))
                    .route("/json", web::post().to(echo))
                    .wrap(ErrorHandlers::new().default_handler(handle_error)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn plain_errors_become_envelopes() {
        let app = app!();
        let req = test::TestRequest::get().uri("/plain").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["httpStatusCode"], 405);
        assert_eq!(body["error"], "METHOD_NOT_ALLOWED");
    }

    #[actix_web::test]
    async fn json_errors_pass_through() {
        let app = app!();
        let req = test::TestRequest::get().uri("/custom").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Conflict: Slug taken");
        assert_eq!(body["error"], "CONFLICT_ERROR");
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/json")
            .insert_header((CONTENT_TYPE, "application/json"))
            .set_payload("{\"name\":")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "BAD_REQUEST_ERROR");
    }
}
