use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::errors::{AppError, Result};
use crate::models::UploadedFile;

const MAX_FILE_NAME_LENGTH: usize = 255;

/// Rejects names that would escape the version directory or be awkward to serve.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILE_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "File name must be 1-{} bytes long",
            MAX_FILE_NAME_LENGTH
        )));
    }
    if name == "." || name == ".." || name.starts_with('.') {
        return Err(AppError::Validation(format!("Invalid file name: {}", name)));
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err(AppError::Validation(format!(
            "File name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}

/// Every file must have a valid name and no two files in one upload may share it.
pub fn validate_upload_names(files: &[UploadedFile]) -> Result<()> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        validate_file_name(&file.file_name)?;
        if !seen.insert(file.file_name.as_str()) {
            return Err(AppError::DuplicateFileName(file.file_name.clone()));
        }
    }
    Ok(())
}

pub fn detect_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
