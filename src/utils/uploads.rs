use log::warn;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::env;

/// Cloudinary configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
}

impl CloudinaryConfig {
    /// Load Cloudinary configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| "CLOUDINARY_CLOUD_NAME is required")?,
            api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| "CLOUDINARY_API_KEY is required")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .map_err(|_| "CLOUDINARY_API_SECRET is required")?,
            folder: env::var("CLOUDINARY_UPLOAD_FOLDER")
                .ok()
                .filter(|f| !f.trim().is_empty()),
        })
    }

    /// Endpoint for an image action such as `upload` or `destroy`
    pub fn image_url(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud_name, action
        )
    }

    /// Sign request parameters: sorted `key=value` pairs joined by `&`, followed by the secret.
    pub fn generate_signature(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Response from Cloudinary upload API
#[derive(Debug, Deserialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: String,
    pub url: String,
}

/// Response from Cloudinary destroy API
#[derive(Debug, Deserialize)]
pub struct CloudinaryDestroyResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorResponse {
    pub error: CloudinaryError,
}

/// Upload service for Cloudinary
pub struct UploadService {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl UploadService {
    pub fn new() -> Result<Self, String> {
        Ok(Self::with_config(CloudinaryConfig::from_env()?))
    }

    pub fn with_config(config: CloudinaryConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Upload an image to Cloudinary
    pub async fn upload_image(
        &self,
        file: FileUpload,
    ) -> Result<CloudinaryUploadResponse, String> {
        let timestamp = chrono::Utc::now().timestamp();

        let mut params = vec![("timestamp", timestamp.to_string())];
        if let Some(folder) = &self.config.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.config.generate_signature(&params);

        let mime = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_part = Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&mime)
            .map_err(|e| format!("Failed to create file part: {}", e))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.config.image_url("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send upload request: {}", e))?;

        if response.status().is_success() {
            response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| format!("Failed to parse upload response: {}", e))
        } else {
            let error_response = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map_err(|e| format!("Failed to parse error response: {}", e))?;
            Err(format!(
                "Cloudinary upload failed: {}",
                error_response.error.message
            ))
        }
    }

    /// Delete an image from Cloudinary
    pub async fn delete_resource(&self, public_id: &str) -> Result<(), String> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = self.config.generate_signature(&params);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.config.image_url("destroy"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send delete request: {}", e))?;

        if !response.status().is_success() {
            return Err("Failed to delete resource from Cloudinary".to_string());
        }

        let destroyed = response
            .json::<CloudinaryDestroyResponse>()
            .await
            .map_err(|e| format!("Failed to parse delete response: {}", e))?;

        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                warn!("Cloudinary asset {} was already gone", public_id);
                Ok(())
            }
            other => Err(format!("Cloudinary delete failed: {}", other)),
        }
    }
}

/// Represents a file to be uploaded
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: String, data: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            file_name,
            data,
            content_type,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

/// File validation configuration
#[derive(Debug, Clone)]
pub struct FileValidator {
    /// Allowed file extensions (e.g., ["jpg", "png", "gif"])
    pub allowed_extensions: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: usize,
}

impl FileValidator {
    /// Featured images: jpg, jpeg, png, gif, webp up to 5MB
    pub fn new() -> Self {
        Self {
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
            max_file_size: 5 * 1024 * 1024,
        }
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), String> {
        if file.data.is_empty() {
            return Err("File is empty".to_string());
        }

        let extension = file.extension().ok_or("File has no extension")?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(format!(
                "Invalid file type '{}'. Allowed types: {}",
                extension,
                self.allowed_extensions.join(", ")
            ));
        }

        if file.size() > self.max_file_size {
            return Err(format!(
                "File too large. Maximum size: {} bytes, file size: {} bytes",
                self.max_file_size,
                file.size()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "abcd".to_string(),
            folder: None,
        }
    }

    fn png(name: &str, size: usize) -> FileUpload {
        FileUpload::new(name.to_string(), vec![1; size], Some("image/png".to_string()))
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let signature = config().generate_signature(&[
            ("timestamp", "1700000000".to_string()),
            ("folder", "posts".to_string()),
        ]);
        assert_eq!(signature, "46cd7b833e69405b4c97a7666176e0e39cd760a6");
    }

    #[test]
    fn signature_for_destroy() {
        let signature = config().generate_signature(&[
            ("public_id", "posts/cover".to_string()),
            ("timestamp", "1700000000".to_string()),
        ]);
        assert_eq!(signature, "a9fa254a4e7593a913bbcb9159229ed7a8b7c507");
    }

    #[test]
    fn builds_image_endpoints() {
        assert_eq!(
            config().image_url("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(png("Cover.PNG", 1).extension(), Some("png".to_string()));
        assert_eq!(png("cover", 1).extension(), None);
        assert_eq!(png("cover.", 1).extension(), None);
    }

    #[test]
    fn validator_accepts_default_image() {
        assert!(FileValidator::new().validate(&png("cover.png", 2048)).is_ok());
    }

    #[test]
    fn validator_rejects_bad_files() {
        let validator = FileValidator {
            max_file_size: 1024,
            ..FileValidator::new()
        };

        assert_eq!(
            validator.validate(&png("cover.png", 0)),
            Err("File is empty".to_string())
        );
        assert!(validator.validate(&png("notes.txt", 100)).is_err());
        assert!(validator.validate(&png("logo.svg", 100)).is_err());
        assert!(validator.validate(&png("cover.png", 2048)).is_err());
        assert!(validator.validate(&png("cover", 100)).is_err());
    }

    #[test]
    fn default_limit_is_five_megabytes() {
        let validator = FileValidator::new();
        assert!(validator.validate(&png("cover.webp", 5 * 1024 * 1024)).is_ok());
        assert!(validator.validate(&png("cover.webp", 5 * 1024 * 1024 + 1)).is_err());
    }
}
