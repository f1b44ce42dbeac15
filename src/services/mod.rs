pub mod accounts;
pub mod approval;
pub mod dependency_notifier;
pub mod metrics;
pub mod notifications;
pub mod projects;
pub mod quota_manager;
pub mod quota_resolver;
pub mod quota_usage;
pub mod redis;
pub mod versions;

pub use accounts::AccountService;
pub use approval::{ApprovalAction, ApprovalService};
pub use dependency_notifier::DependencyNotifier;
pub use metrics::MetricsService;
pub use notifications::{
    LogNotificationSink, MemoryNotificationSink, NotificationSink, RedisNotificationSink,
};
pub use projects::ProjectService;
pub use quota_manager::{QuotaCheckResult, QuotaManager, QuotaViolation};
pub use quota_resolver::QuotaLayers;
pub use quota_usage::QuotaUsageAccumulator;
pub use self::redis::RedisService;
pub use versions::{DeletionReport, VersionService};
