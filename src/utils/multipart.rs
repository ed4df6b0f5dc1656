use std::collections::{HashMap, HashSet};

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::utils::error::CustomError;
use crate::utils::uploads::FileUpload;

/// Size and count caps applied while buffering a multipart form.
#[derive(Debug, Clone, Copy)]
pub struct MultipartLimits {
    pub text_field_bytes: usize,
    pub file_bytes: usize,
    pub total_bytes: usize,
    pub max_parts: usize,
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            // text fields are capped the same way JSON bodies are
            text_field_bytes: 16 * 1024,
            file_bytes: 10 * 1024 * 1024,
            total_bytes: 10 * 1024 * 1024 + 64 * 1024,
            max_parts: 16,
        }
    }
}

/// A multipart form read fully into memory
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, FileUpload>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<FileUpload> {
        self.files.remove(name)
    }
}

/// Read a multipart payload with the default limits.
pub async fn read_multipart(
    payload: Multipart,
    file_fields: &[&str],
) -> Result<MultipartForm, CustomError> {
    read_multipart_with_limits(payload, file_fields, MultipartLimits::default()).await
}

/// Read text fields and files from a multipart payload.
///
/// A part carrying a filename is treated as a file, everything else as text.
/// Files are only accepted under the names in `file_fields`, at most once each.
/// Empty file parts are dropped.
pub async fn read_multipart_with_limits(
    mut payload: Multipart,
    file_fields: &[&str],
    limits: MultipartLimits,
) -> Result<MultipartForm, CustomError> {
    let mut form = MultipartForm::default();
    let mut seen_files = HashSet::new();
    let mut parts = 0;
    let mut total = 0;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        parts += 1;
        if parts > limits.max_parts {
            return Err(CustomError::BadRequestError(format!(
                "Form has more than {} parts",
                limits.max_parts
            )));
        }

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        let Some(name) = content_disposition.get_name().map(str::to_string) else {
            continue;
        };
        let file_name = content_disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|ct| ct.to_string());

        let limit = if file_name.is_some() {
            if !file_fields.contains(&name.as_str()) {
                return Err(CustomError::BadRequestError(format!(
                    "Unexpected file field '{}'",
                    name
                )));
            }
            if !seen_files.insert(name.clone()) {
                return Err(CustomError::BadRequestError(format!(
                    "Only one '{}' file is allowed",
                    name
                )));
            }
            limits.file_bytes
        } else {
            limits.text_field_bytes
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                CustomError::BadRequestError(format!("Error reading multipart chunk: {}", e))
            })?;
            if data.len() + chunk.len() > limit {
                return Err(CustomError::BadRequestError(format!(
                    "Field '{}' exceeds the {} byte limit",
                    name, limit
                )));
            }
            total += chunk.len();
            if total > limits.total_bytes {
                return Err(CustomError::BadRequestError(format!(
                    "Form exceeds the {} byte limit",
                    limits.total_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => {
                if !data.is_empty() {
                    form.files
                        .insert(name, FileUpload::new(file_name, data, content_type));
                }
            }
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    CustomError::BadRequestError(format!("Field '{}' is not valid UTF-8", name))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
