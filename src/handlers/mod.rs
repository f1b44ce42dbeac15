use std::sync::Arc;

use crate::{
    auth::{JwtService, PasswordService},
    config::{Config, ConfigProvider},
    errors::Result,
    repository::Repository,
    services::{
        AccountService, ApprovalService, DependencyNotifier, MetricsService, NotificationSink,
        ProjectService, QuotaManager, VersionService,
    },
    storage::Storage,
};

pub mod account;
pub mod admin;
pub mod auth;
pub mod docs;
pub mod health;
pub mod metrics;
pub mod projects;
pub mod user;
pub mod versions;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<dyn Repository>,
    pub jwt: Arc<JwtService>,
    pub quota: Arc<QuotaManager>,
    pub projects: Arc<ProjectService>,
    pub approvals: Arc<ApprovalService>,
    pub versions: Arc<VersionService>,
    pub accounts: Arc<AccountService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    /// Wires every service over one repository, file store and notification sink.
    pub fn new(
        config: Config,
        repo: Arc<dyn Repository>,
        storage: Arc<dyn Storage>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let provider: Arc<dyn ConfigProvider> = config.clone();
        let metrics = Arc::new(MetricsService::new()?);

        let quota = Arc::new(QuotaManager::new(repo.clone(), provider.clone(), metrics.clone()));
        let projects = ProjectService::new(repo.clone(), provider, quota.clone(), metrics.clone());
        let approvals = ApprovalService::new(
            repo.clone(),
            quota.clone(),
            notifications.clone(),
            metrics.clone(),
        );
        let notifier = DependencyNotifier::new(repo.clone(), notifications.clone(), metrics.clone());
        let versions = VersionService::new(
            repo.clone(),
            storage,
            quota.clone(),
            notifier,
            metrics.clone(),
        );
        let accounts = AccountService::new(
            repo.clone(),
            PasswordService::new(config.bcrypt_cost),
            notifications,
            metrics.clone(),
        );

        Ok(Self {
            jwt: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_ttl_hours)),
            config,
            repo,
            quota,
            projects: Arc::new(projects),
            approvals: Arc::new(approvals),
            versions: Arc::new(versions),
            accounts: Arc::new(accounts),
            metrics,
        })
    }
}
