use chrono::Duration;
use serde::Deserialize;

use crate::errors::Result;
use crate::models::QuotaLimitSet;

const MB: i64 = 1024 * 1024;

/// Read-only view of the settings the policy services depend on.
pub trait ConfigProvider: Send + Sync {
    /// Global quota defaults; an unset field is unlimited.
    fn quota_defaults(&self) -> QuotaLimitSet;

    /// Whether new projects skip the review queue.
    fn auto_approve(&self) -> bool;

    /// How long a soft-deleted project may still be restored.
    fn restore_window(&self) -> Duration;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub port: u16,
    pub upload_dir: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub max_upload_size: usize,
    pub auto_approve: bool,
    pub restore_window_days: i64,
    #[serde(default)]
    pub quota: QuotaLimitSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/project_hosting".to_string(),
            redis_url: None,
            port: 3000,
            upload_dir: "./uploads".to_string(),
            jwt_secret: "your-secret-key".to_string(),
            jwt_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_upload_size: 512 * MB as usize,
            auto_approve: false,
            restore_window_days: 14,
            quota: QuotaLimitSet {
                pending_projects_max: Some(3),
                total_storage_max: Some(1024 * MB),
                project_storage_max: Some(512 * MB),
                versions_per_day_max: Some(10),
                version_size_max: Some(256 * MB),
                files_per_version_max: Some(10),
                file_size_max: Some(100 * MB),
            },
        }
    }
}

impl Config {
    /// Loads `.env`, then overlays environment variables on the defaults.
    /// Quota defaults use `QUOTA__<FIELD>`, e.g. `QUOTA__TOTAL_STORAGE_MAX`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let quota = defaults.quota;

        let mut builder = config::Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("port", defaults.port as i64)?
            .set_default("upload_dir", defaults.upload_dir)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_ttl_hours", defaults.jwt_ttl_hours)?
            .set_default("bcrypt_cost", defaults.bcrypt_cost as i64)?
            .set_default("max_upload_size", defaults.max_upload_size as i64)?
            .set_default("auto_approve", defaults.auto_approve)?
            .set_default("restore_window_days", defaults.restore_window_days)?;

        for field in crate::models::QuotaField::ALL {
            if let Some(value) = quota.get(field) {
                builder = builder.set_default(format!("quota.{}", field.as_str()), value)?;
            }
        }

        let settings = builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl ConfigProvider for Config {
    fn quota_defaults(&self) -> QuotaLimitSet {
        self.quota
    }

    fn auto_approve(&self) -> bool {
        self.auto_approve
    }

    fn restore_window(&self) -> Duration {
        Duration::days(self.restore_window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_uses_defaults() {
        std::env::remove_var("AUTO_APPROVE");
        std::env::remove_var("QUOTA__PENDING_PROJECTS_MAX");

        let config = Config::from_env().unwrap();
        assert!(!config.auto_approve);
        assert_eq!(config.restore_window_days, 14);
        assert_eq!(config.quota.pending_projects_max, Some(3));
        assert_eq!(config.quota.total_storage_max, Some(1024 * MB));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_quota_defaults() {
        std::env::set_var("AUTO_APPROVE", "true");
        std::env::set_var("QUOTA__PENDING_PROJECTS_MAX", "7");

        let config = Config::from_env().unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.quota_defaults().pending_projects_max, Some(7));

        std::env::remove_var("AUTO_APPROVE");
        std::env::remove_var("QUOTA__PENDING_PROJECTS_MAX");
    }
}
