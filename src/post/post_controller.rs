use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use log::{error, info, warn};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::middleware::auth::current_user;
use crate::post::post_model::{
    FeaturedImage, ListPostsQuery, Post, PostResponse, PostStatus, PostUpdate,
};
use crate::post::post_service::{ListOptions, PostService};
use crate::user::model::UserResponse;
use crate::utils::error::CustomError;
use crate::utils::helpers::{non_blank, parse_object_id};
use crate::utils::model::api_response;
use crate::utils::multipart::{MultipartForm, read_multipart};
use crate::utils::uploads::{FileUpload, FileValidator, UploadService};

const FEATURED_IMAGE_FIELD: &str = "featuredImage";

async fn upload_featured_image(
    uploads: &UploadService,
    file: FileUpload,
) -> Result<FeaturedImage, CustomError> {
    FileValidator::new()
        .validate(&file)
        .map_err(CustomError::ValidationError)?;

    let uploaded = uploads.upload_image(file).await.map_err(|e| {
        error!("Featured image upload failed: {}", e);
        CustomError::InternalServerError("Error while uploading the image".into())
    })?;

    Ok(FeaturedImage {
        url: uploaded.url,
        public_id: uploaded.public_id,
    })
}

/// Remove an asset that was uploaded for a write that did not go through.
async fn discard_upload(uploads: &UploadService, image: &FeaturedImage) {
    if let Err(e) = uploads.delete_resource(&image.public_id).await {
        warn!("Failed to discard orphaned image {}: {}", image.public_id, e);
    }
}

fn parse_status(form: &MultipartForm) -> Result<Option<PostStatus>, CustomError> {
    non_blank(form.text("status"))
        .map(|status| status.parse::<PostStatus>())
        .transpose()
}

fn ensure_owner(post: &Post, user: &UserResponse) -> Result<(), CustomError> {
    if post.owner != user.id {
        return Err(CustomError::UnauthorizedError(
            "You do not have permission to perform this action".into(),
        ));
    }
    Ok(())
}

/// Load a post and make sure the caller owns it.
async fn owned_post(
    post_service: &PostService,
    post_id: ObjectId,
    user: &UserResponse,
) -> Result<Post, CustomError> {
    let post = post_service
        .find_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))?;

    ensure_owner(&post, user)?;
    Ok(post)
}

pub async fn get_all_posts(
    query: web::Query<ListPostsQuery>,
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let options = ListOptions::from_query(query.into_inner())?;
    let posts = post_service.list_posts(&options).await?;

    Ok(api_response(
        StatusCode::OK,
        "Posts fetched successfully",
        posts,
    ))
}

pub async fn get_post_by_id(
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "Post")?;

    match post_service.get_post_with_owner(post_id).await? {
        Some(post) => Ok(api_response(
            StatusCode::OK,
            "Post fetched successfully",
            post,
        )),
        None => Err(CustomError::NotFoundError("Post not found".into())),
    }
}

pub async fn create_post(
    req: HttpRequest,
    payload: Multipart,
    post_service: web::Data<PostService>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, CustomError> {
    let user = current_user(&req)?;
    let mut form = read_multipart(payload, &[FEATURED_IMAGE_FIELD]).await?;

    let (Some(title), Some(slug), Some(content)) = (
        non_blank(form.text("title")),
        non_blank(form.text("slug")),
        non_blank(form.text("content")),
    ) else {
        return Err(CustomError::ValidationError(
            "All fields are required".into(),
        ));
    };
    let status = parse_status(&form)?.unwrap_or_default();

    let file = form
        .take_file(FEATURED_IMAGE_FIELD)
        .ok_or_else(|| CustomError::ValidationError("Featured Image is required".into()))?;
    let featured_image = upload_featured_image(&uploads, file).await?;

    let now = Utc::now();
    let new_post = Post {
        id: ObjectId::new(),
        title,
        slug,
        content,
        featured_image: featured_image.clone(),
        status,
        owner: user.id,
        created_at: now,
        updated_at: now,
    };

    let post = match post_service.create_post(new_post).await {
        Ok(post) => post,
        Err(e) => {
            discard_upload(&uploads, &featured_image).await;
            return Err(e);
        }
    };

    info!("User {} created post {}", user.username, post.id);

    Ok(api_response(
        StatusCode::CREATED,
        "Post created successfully",
        PostResponse::from(post),
    ))
}

pub async fn update_post(
    req: HttpRequest,
    post_id: web::Path<String>,
    payload: Multipart,
    post_service: web::Data<PostService>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, CustomError> {
    let user = current_user(&req)?;
    let post_id = parse_object_id(&post_id, "Post")?;
    let post = owned_post(&post_service, post_id, &user).await?;

    let mut form = read_multipart(payload, &[FEATURED_IMAGE_FIELD]).await?;
    let mut update = PostUpdate {
        title: non_blank(form.text("title")),
        slug: non_blank(form.text("slug")),
        content: non_blank(form.text("content")),
        status: parse_status(&form)?,
        featured_image: None,
    };

    if update.is_empty() && form.files.is_empty() {
        return Ok(api_response(
            StatusCode::OK,
            "Post updated successfully",
            PostResponse::from(post),
        ));
    }

    if let Some(file) = form.take_file(FEATURED_IMAGE_FIELD) {
        update.featured_image = Some(upload_featured_image(&uploads, file).await?);
    }

    let updated = match post_service.update_post(post_id, &update).await {
        Ok(Some(updated)) => updated,
        result => {
            if let Some(image) = &update.featured_image {
                discard_upload(&uploads, image).await;
            }
            return match result {
                Err(e) => Err(e),
                _ => Err(CustomError::NotFoundError("Post not found".into())),
            };
        }
    };

    if update.featured_image.is_some() {
        uploads
            .delete_resource(&post.featured_image.public_id)
            .await
            .map_err(|e| {
                error!(
                    "Failed to delete replaced image {}: {}",
                    post.featured_image.public_id, e
                );
                CustomError::InternalServerError(
                    "Error while deleting featured image from cloudinary".into(),
                )
            })?;
    }

    Ok(api_response(
        StatusCode::OK,
        "Post updated successfully",
        PostResponse::from(updated),
    ))
}

pub async fn delete_post(
    req: HttpRequest,
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, CustomError> {
    let user = current_user(&req)?;
    let post_id = parse_object_id(&post_id, "Post")?;
    owned_post(&post_service, post_id, &user).await?;

    let deleted = post_service
        .delete_post(post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))?;

    uploads
        .delete_resource(&deleted.featured_image.public_id)
        .await
        .map_err(|e| {
            error!(
                "Failed to delete image {} of post {}: {}",
                deleted.featured_image.public_id, post_id, e
            );
            CustomError::InternalServerError("Error while deleting image".into())
        })?;

    info!("User {} deleted post {}", user.username, post_id);

    Ok(api_response(
        StatusCode::OK,
        "Post deleted successfully",
        json!({}),
    ))
}
