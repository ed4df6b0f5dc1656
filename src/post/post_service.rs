use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc, oid::ObjectId, to_bson};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};

use crate::post::post_model::{ListPostsQuery, Post, PostUpdate, PostWithOwner};
use crate::utils::error::CustomError;
use crate::utils::helpers::now_bson;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";
pub const SORTABLE_FIELDS: [&str; 5] = ["createdAt", "updatedAt", "title", "slug", "status"];

/// Validated listing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub query: String,
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    pub ascending: bool,
}

impl ListOptions {
    pub fn from_query(query: ListPostsQuery) -> Result<Self, CustomError> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(CustomError::BadRequestError(
                "page must be 1 or greater".to_string(),
            ));
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(CustomError::BadRequestError(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let sort_by = query
            .sort_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string());
        if !SORTABLE_FIELDS.contains(&sort_by.as_str()) {
            return Err(CustomError::BadRequestError(format!(
                "sortBy must be one of: {}",
                SORTABLE_FIELDS.join(", ")
            )));
        }

        Ok(Self {
            query: query.query.unwrap_or_default().trim().to_string(),
            page,
            limit,
            sort_by,
            ascending: query.sort_type.as_deref().unwrap_or("asc") == "asc",
        })
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn owner_lookup_stages() -> [Document; 2] {
    [
        doc! {
            "$lookup": {
                "from": "users",
                "localField": "owner",
                "foreignField": "_id",
                "as": "owner",
                "pipeline": [ { "$project": { "fullName": 1 } } ],
            }
        },
        doc! { "$unwind": "$owner" },
    ]
}

/// Search, join owner names, sort, then page through posts.
pub fn list_pipeline(options: &ListOptions) -> Vec<Document> {
    let mut pipeline = vec![doc! {
        "$match": {
            "title": { "$regex": regex::escape(&options.query), "$options": "i" }
        }
    }];
    pipeline.extend(owner_lookup_stages());

    let mut sort = Document::new();
    sort.insert(options.sort_by.clone(), if options.ascending { 1 } else { -1 });

    pipeline.extend([
        doc! {
            "$project": {
                "title": 1,
                "slug": 1,
                "content": 1,
                "featuredImage": 1,
                "status": 1,
                "createdAt": 1,
                "updatedAt": 1,
                "owner": 1,
            }
        },
        doc! { "$sort": sort },
        doc! { "$skip": options.skip() },
        doc! { "$limit": options.limit },
    ]);
    pipeline
}

/// Single post joined with its owner's name; only the image URL is exposed.
pub fn detail_pipeline(id: ObjectId) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": { "_id": id } }];
    pipeline.extend(owner_lookup_stages());
    pipeline.push(doc! {
        "$project": {
            "title": 1,
            "slug": 1,
            "content": 1,
            "featuredImage.url": 1,
            "status": 1,
            "createdAt": 1,
            "updatedAt": 1,
            "owner": 1,
        }
    });
    pipeline
}

/// `$set` document for an update; always refreshes `updatedAt`.
pub fn update_document(update: &PostUpdate) -> Result<Document, CustomError> {
    let mut set = doc! { "updatedAt": now_bson() };

    if let Some(title) = &update.title {
        set.insert("title", title.as_str());
    }
    if let Some(slug) = &update.slug {
        set.insert("slug", slug.as_str());
    }
    if let Some(content) = &update.content {
        set.insert("content", content.as_str());
    }
    if let Some(status) = update.status {
        set.insert("status", status.as_str());
    }
    if let Some(image) = &update.featured_image {
        let image = to_bson(image).map_err(|e| CustomError::InternalServerError(e.to_string()))?;
        set.insert("featuredImage", image);
    }

    Ok(doc! { "$set": set })
}

pub struct PostService {
    collection: Collection<Post>,
}

impl PostService {
    pub fn new(client: &Client, database_name: &str) -> Self {
        let collection = client.database(database_name).collection::<Post>("posts");
        PostService { collection }
    }

    pub async fn list_posts(&self, options: &ListOptions) -> Result<Vec<PostWithOwner>, CustomError> {
        let cursor = self
            .collection
            .aggregate(list_pipeline(options))
            .with_type::<PostWithOwner>()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch posts: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to collect posts: {}", e)))
    }

    pub async fn get_post_with_owner(&self, id: ObjectId) -> Result<Option<PostWithOwner>, CustomError> {
        let mut cursor = self
            .collection
            .aggregate(detail_pipeline(id))
            .with_type::<PostWithOwner>()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch post: {}", e)))?;

        cursor
            .try_next()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch post: {}", e)))
    }

    pub async fn find_post(&self, id: ObjectId) -> Result<Option<Post>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|_| CustomError::InternalServerError("Failed to fetch post".into()))
    }

    pub async fn create_post(&self, post: Post) -> Result<Post, CustomError> {
        self.collection
            .insert_one(&post)
            .await
            .map_err(|_| CustomError::InternalServerError("Error while creating the post".into()))?;

        Ok(post)
    }

    pub async fn update_post(&self, id: ObjectId, update: &PostUpdate) -> Result<Option<Post>, CustomError> {
        self.collection
            .find_one_and_update(doc! { "_id": id }, update_document(update)?)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|_| CustomError::InternalServerError("Error while updating post".into()))
    }

    pub async fn delete_post(&self, id: ObjectId) -> Result<Option<Post>, CustomError> {
        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(|_| CustomError::InternalServerError("Error while deleting post".into()))
    }
}
