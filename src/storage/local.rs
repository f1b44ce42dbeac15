use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::{
    errors::{AppError, Result},
    storage::Storage,
};

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AppError::Storage(format!("Failed to create storage directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn get_full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::Storage(format!("Invalid storage path: {}", path)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.get_full_path(path)?;

        fs::read(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read file: {}", e)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        fs::remove_file(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file: {}", e)))?;

        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.get_full_path(path)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let full_path = self.get_full_path(path)?;

        let metadata = fs::metadata(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to get file metadata: {}", e)))?;

        Ok(metadata.len())
    }
}
