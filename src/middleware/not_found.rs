use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result, dev::ServiceResponse};
use serde_json::json;

use crate::middleware::error_handler::is_json;
use crate::utils::helpers::service_name;

/// Unmatched routes get a JSON 404; handler-raised 404s keep their own message.
pub fn not_found<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let new_response = HttpResponse::build(StatusCode::NOT_FOUND).json(json!({
        "success": false,
        "message": "Route does not exist",
        "httpStatusCode": StatusCode::NOT_FOUND.as_u16(),
        "error": "NOT_FOUND_ERROR",
        "service": service_name(),
    }));
    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, new_response.map_into_right_body());

    Ok(ErrorHandlerResponse::Response(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CustomError;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{App, test, web};

    async fn missing_post() -> Result<HttpResponse, CustomError> {
        Err(CustomError::NotFoundError("Post not found".into()))
    }

    #[actix_web::test]
    async fn unknown_route_and_missing_resource_differ() {
        let app = test::init_service(
            App::new()
                .route("/posts/1", web::get().to(missing_post))
                .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Route does not exist");

        let req = test::TestRequest::get().uri("/posts/1").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Not Found: Post not found");
    }
}
