use async_trait::async_trait;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::Result;

pub mod local;

pub use local::LocalStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>>;

    async fn delete(&self, path: &str) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn size(&self, path: &str) -> Result<u64>;
}

pub fn create_storage(config: &Config) -> Result<LocalStorage> {
    LocalStorage::new(&config.upload_dir)
}

/// Storage key for an uploaded release file.
pub fn file_path(project_id: Uuid, version_id: Uuid, file_name: &str) -> String {
    format!("{}/{}/{}", project_id, version_id, file_name)
}
