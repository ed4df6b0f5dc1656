use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    chrono_datetime_as_bson_datetime, serialize_object_id_as_hex_string,
};
use serde::{Deserialize, Serialize};

use crate::utils::error::CustomError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = CustomError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(CustomError::ValidationError(format!(
                "Status must be 'draft' or 'published', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedImage {
    pub url: String,
    pub public_id: String,
}

/// Post document as stored in the `posts` collection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub featured_image: FeaturedImage,
    #[serde(default)]
    pub status: PostStatus,
    pub owner: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Post returned from create and update, with ids rendered as hex strings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub featured_image: FeaturedImage,
    pub status: PostStatus,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub owner: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            featured_image: post.featured_image,
            status: post.status,
            owner: post.owner,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedImageSummary {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

/// Post joined with its owner's name, as produced by the listing and detail pipelines
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithOwner {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub featured_image: FeaturedImageSummary,
    #[serde(default)]
    pub status: PostStatus,
    pub owner: OwnerSummary,
    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// Fields a post update may change; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub featured_image: Option<FeaturedImage>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.content.is_none()
            && self.status.is_none()
            && self.featured_image.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub query: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, doc};

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(" published ".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert!("archived".parse::<PostStatus>().is_err());
        assert_eq!(PostStatus::default(), PostStatus::Published);
    }

    #[test]
    fn post_response_renders_hex_ids() {
        let post = Post {
            id: ObjectId::new(),
            title: "Title".to_string(),
            slug: "title".to_string(),
            content: "Body".to_string(),
            featured_image: FeaturedImage {
                url: "http://res.cloudinary.com/demo/cover.png".to_string(),
                public_id: "cover".to_string(),
            },
            status: PostStatus::Draft,
            owner: ObjectId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let (id, owner) = (post.id, post.owner);

        let value = serde_json::to_value(PostResponse::from(post)).unwrap();
        assert_eq!(value["_id"], id.to_hex());
        assert_eq!(value["owner"], owner.to_hex());
        assert_eq!(value["status"], "draft");
        assert_eq!(value["featuredImage"]["publicId"], "cover");
    }

    #[test]
    fn stored_post_keeps_dates_as_bson_dates() {
        let post = Post {
            id: ObjectId::new(),
            title: "Title".to_string(),
            slug: "title".to_string(),
            content: "Body".to_string(),
            featured_image: FeaturedImage {
                url: "http://res.cloudinary.com/demo/cover.png".to_string(),
                public_id: "cover".to_string(),
            },
            status: PostStatus::Published,
            owner: ObjectId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let document = mongodb::bson::to_document(&post).unwrap();
        assert!(matches!(document.get("createdAt"), Some(Bson::DateTime(_))));
        assert!(matches!(document.get("updatedAt"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn joined_post_reads_bson_dates_and_renders_rfc3339() {
        let created = mongodb::bson::DateTime::from_millis(1_700_000_000_000);
        let document = doc! {
            "_id": ObjectId::new(),
            "title": "Title",
            "slug": "title",
            "content": "Body",
            "featuredImage": { "url": "http://res.cloudinary.com/demo/cover.png" },
            "status": "draft",
            "owner": { "_id": ObjectId::new(), "fullName": "Jane Doe" },
            "createdAt": created,
            "updatedAt": created,
        };

        let post: PostWithOwner = mongodb::bson::from_document(document).unwrap();
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(value["owner"]["fullName"], "Jane Doe");
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(PostUpdate::default().is_empty());
        let update = PostUpdate {
            status: Some(PostStatus::Draft),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
