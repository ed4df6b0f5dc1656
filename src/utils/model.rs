use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use serde_json::json;

use crate::utils::helpers::service_name;

/// Success envelope shared by every handler.
pub fn api_response<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "success": true,
        "message": message,
        "httpStatusCode": status.as_u16(),
        "service": service_name(),
        "data": data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn wraps_data_in_envelope() {
        let response = api_response(StatusCode::CREATED, "Created", json!({ "id": 7 }));
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Created");
        assert_eq!(value["httpStatusCode"], 201);
        assert_eq!(value["data"]["id"], 7);
    }
}
