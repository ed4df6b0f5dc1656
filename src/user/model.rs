use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    chrono_datetime_as_bson_datetime, serialize_object_id_as_hex_string,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// User as exposed to clients and attached to authenticated requests.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Option<Self> {
        Some(Self {
            id: user.id?,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Some(ObjectId::new()),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            password: "$2b$12$hash".to_string(),
            refresh_token: Some("refresh".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_projection_hides_credentials() {
        let public = UserResponse::from_user(&user()).unwrap();
        let value = serde_json::to_value(&public).unwrap();

        assert_eq!(value["fullName"], "Jane Doe");
        assert_eq!(value["_id"], public.id.to_hex());
        assert!(value.get("password").is_none());
        assert!(value.get("refreshToken").is_none());
    }

    #[test]
    fn unsaved_user_has_no_public_projection() {
        let mut unsaved = user();
        unsaved.id = None;
        assert!(UserResponse::from_user(&unsaved).is_none());
    }

    #[test]
    fn stored_document_uses_camel_case() {
        let document = mongodb::bson::to_document(&user()).unwrap();
        assert!(document.contains_key("fullName"));
        assert!(document.contains_key("refreshToken"));
        assert!(!document.contains_key("full_name"));
    }

    #[test]
    fn timestamps_are_stored_as_bson_dates() {
        let stored = user();
        let document = mongodb::bson::to_document(&stored).unwrap();

        assert!(matches!(
            document.get("createdAt"),
            Some(mongodb::bson::Bson::DateTime(_))
        ));
        assert!(matches!(
            document.get("updatedAt"),
            Some(mongodb::bson::Bson::DateTime(_))
        ));

        let read_back: User = mongodb::bson::from_document(document).unwrap();
        assert_eq!(
            read_back.created_at.timestamp_millis(),
            stored.created_at.timestamp_millis()
        );
    }
}
