use chrono::Utc;
use log::{info, warn};
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::middleware::auth::{create_access_token, create_refresh_token, decode_refresh_token};
use crate::user::model::{
    CreateUserRequest, LoginRequest, LoginResponse, TokenPair, User, UserResponse,
};
use crate::utils::config::AuthConfig;
use crate::utils::error::CustomError;
use crate::utils::helpers::{is_valid_email, non_blank, now_bson};
use crate::utils::{hashing, password_validation};

pub struct UserService {
    collection: Collection<User>,
}

/// Trim and normalise registration input; username and email are stored lower-case.
pub fn validate_registration(request: CreateUserRequest) -> Result<CreateUserRequest, CustomError> {
    let (Some(username), Some(email), Some(full_name)) = (
        non_blank(Some(request.username.as_str())),
        non_blank(Some(request.email.as_str())),
        non_blank(Some(request.full_name.as_str())),
    ) else {
        return Err(CustomError::ValidationError(
            "All fields are required".to_string(),
        ));
    };
    if request.password.trim().is_empty() {
        return Err(CustomError::ValidationError(
            "All fields are required".to_string(),
        ));
    }

    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        return Err(CustomError::ValidationError(
            "Email address is not valid".to_string(),
        ));
    }

    password_validation::validate_password(&request.password)?;

    Ok(CreateUserRequest {
        username: username.to_lowercase(),
        email,
        full_name,
        password: request.password,
    })
}

/// Filter matching a user by username or email, whichever the caller supplied.
pub fn login_filter(request: &LoginRequest) -> Result<Document, CustomError> {
    let mut clauses = Vec::new();
    if let Some(username) = non_blank(request.username.as_deref()) {
        clauses.push(doc! { "username": username.to_lowercase() });
    }
    if let Some(email) = non_blank(request.email.as_deref()) {
        clauses.push(doc! { "email": email.to_lowercase() });
    }

    if clauses.is_empty() {
        return Err(CustomError::BadRequestError(
            "username or email is required".to_string(),
        ));
    }

    Ok(doc! { "$or": clauses })
}

/// Unique indexes on the login identifiers.
pub fn user_indexes() -> Vec<IndexModel> {
    ["username", "email"]
        .into_iter()
        .map(|field| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        })
        .collect()
}

/// Matches the stored user only while `incoming` is still its current refresh token.
pub fn rotation_filter(user_id: &ObjectId, incoming: &str) -> Document {
    doc! { "_id": *user_id, "refreshToken": incoming }
}

fn store_refresh_token(refresh_token: &str) -> Document {
    doc! { "$set": { "refreshToken": refresh_token, "updatedAt": now_bson() } }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

fn user_exists() -> CustomError {
    CustomError::ConflictError("User with email or username already exists".to_string())
}

impl UserService {
    pub fn new(client: &Client, database_name: &str) -> Self {
        let collection = client.database(database_name).collection::<User>("users");
        UserService { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<(), CustomError> {
        self.collection
            .create_indexes(user_indexes())
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to create user indexes: {}", e))
            })?;
        Ok(())
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, CustomError> {
        let request = validate_registration(request)?;

        let existing = self
            .collection
            .count_documents(doc! {
                "$or": [
                    { "username": request.username.as_str() },
                    { "email": request.email.as_str() },
                ]
            })
            .await
            .map_err(|_| {
                CustomError::InternalServerError("Failed to check user existence".to_string())
            })?;
        if existing > 0 {
            return Err(user_exists());
        }

        let hashed_password = hashing::hash_password(&request.password)
            .map_err(|e| CustomError::InternalServerError(e.to_string()))?;

        let now = Utc::now();
        let mut new_user = User {
            id: None,
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            password: hashed_password,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        // the unique indexes settle registrations racing past the count above
        let result = self.collection.insert_one(&new_user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                warn!("Duplicate registration for {}", new_user.username);
                user_exists()
            } else {
                CustomError::InternalServerError(format!(
                    "Something went wrong while registering the user: {}",
                    e
                ))
            }
        })?;

        new_user.id = Some(result.inserted_id.as_object_id().ok_or_else(|| {
            CustomError::InternalServerError("Failed to get inserted ID".to_string())
        })?);

        info!("Registered user {}", new_user.username);

        UserResponse::from_user(&new_user)
            .ok_or_else(|| CustomError::InternalServerError("User ID missing".to_string()))
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError> {
        self.collection
            .find_one(doc! { "_id": *id })
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch user: {}", e)))
    }

    pub async fn find_public_by_id(&self, id: &ObjectId) -> Result<Option<UserResponse>, CustomError> {
        Ok(self
            .find_by_id(id)
            .await?
            .as_ref()
            .and_then(UserResponse::from_user))
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        config: &AuthConfig,
    ) -> Result<LoginResponse, CustomError> {
        let filter = login_filter(&request)?;

        let user = self
            .collection
            .find_one(filter)
            .await
            .map_err(|_| CustomError::InternalServerError("Database error".to_string()))?
            .ok_or_else(|| CustomError::NotFoundError("User does not exist".to_string()))?;

        if !hashing::verify_password(&request.password, &user.password)
            .map_err(|_| CustomError::InternalServerError("Failed to verify password".to_string()))?
        {
            return Err(CustomError::UnauthorizedError(
                "Invalid user credentials".to_string(),
            ));
        }

        let tokens = self.issue_tokens(&user, config).await?;
        let user = UserResponse::from_user(&user)
            .ok_or_else(|| CustomError::InternalServerError("User ID missing".to_string()))?;

        info!("User {} logged in", user.username);

        Ok(LoginResponse {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    pub async fn logout(&self, user_id: &ObjectId) -> Result<(), CustomError> {
        self.collection
            .update_one(
                doc! { "_id": *user_id },
                doc! {
                    "$unset": { "refreshToken": 1 },
                    "$set": { "updatedAt": now_bson() },
                },
            )
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to log out: {}", e)))?;

        Ok(())
    }

    /// Exchange a refresh token for a new token pair. The presented token must be the
    /// one currently stored for the user; it is swapped for the new one atomically, so
    /// a token can be redeemed once.
    pub async fn refresh_tokens(
        &self,
        incoming: &str,
        config: &AuthConfig,
    ) -> Result<TokenPair, CustomError> {
        let claims = decode_refresh_token(incoming, config)
            .map_err(|_| CustomError::UnauthorizedError("Invalid refresh token".to_string()))?;
        let user_id = ObjectId::parse_str(&claims.id)
            .map_err(|_| CustomError::UnauthorizedError("Invalid refresh token".to_string()))?;

        let user = self
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| CustomError::UnauthorizedError("Invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(incoming) {
            return Err(token_already_used());
        }

        let tokens = new_token_pair(&user, config)?;

        self.collection
            .find_one_and_update(
                rotation_filter(&user_id, incoming),
                store_refresh_token(&tokens.refresh_token),
            )
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to store refresh token: {}", e))
            })?
            .ok_or_else(|| {
                warn!("Refresh token for user {} was already rotated", user_id);
                token_already_used()
            })?;

        Ok(tokens)
    }

    async fn issue_tokens(&self, user: &User, config: &AuthConfig) -> Result<TokenPair, CustomError> {
        let tokens = new_token_pair(user, config)?;

        self.collection
            .update_one(
                doc! { "_id": user.id },
                store_refresh_token(&tokens.refresh_token),
            )
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to store refresh token: {}", e))
            })?;

        Ok(tokens)
    }
}

fn token_already_used() -> CustomError {
    CustomError::UnauthorizedError("Refresh token is expired or used".to_string())
}

fn new_token_pair(user: &User, config: &AuthConfig) -> Result<TokenPair, CustomError> {
    let user_id = user
        .id
        .ok_or_else(|| CustomError::InternalServerError("User ID missing".to_string()))?;

    Ok(TokenPair {
        access_token: create_access_token(user, config)?,
        refresh_token: create_refresh_token(&user_id, config)?,
    })
}
